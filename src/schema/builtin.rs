//! Built-in schema description for the review analytics database.
//!
//! This is the text the translator sees; it carries value hints (example
//! stores, platforms, sentiments) that plain introspection cannot provide.

/// Review analytics schema, store list and query notes.
pub const REVIEWS_SCHEMA: &str = "\
DATABASE SCHEMA:

Table: reviews
    id              INTEGER PRIMARY KEY
    store_name      TEXT (e.g., 'Social Places V&A Waterfront')
    brand_name      TEXT (always 'Social Places' for this database)
    platform        TEXT (Google, Facebook, TripAdvisor)
    review_date     DATETIME
    review_comment  TEXT
    reviewer_name   TEXT
    review_status   TEXT (Resolved, Open, Pending)
    rating          INTEGER (1-5)

Table: review_categories
    id              INTEGER PRIMARY KEY
    review_id       INTEGER (foreign key to reviews.id)
    category_name   TEXT (e.g., 'Service', 'Food', 'Cleanliness', 'Atmosphere', 'Environment')
    sentiment       TEXT (Positive, Negative, Neutral)

Table: review_ratings (dynamic rating fields)
    id              INTEGER PRIMARY KEY
    review_id       INTEGER (foreign key to reviews.id)
    field_name      TEXT (e.g., 'Service', 'Cleanliness')
    rating_value    INTEGER (1-5)

Table: review_extras (dynamic extra fields)
    id              INTEGER PRIMARY KEY
    review_id       INTEGER (foreign key to reviews.id)
    field_name      TEXT (e.g., 'Waitron Name', 'Meal Ordered')
    field_value     TEXT

AVAILABLE STORES:
  - Social Places V&A Waterfront
  - Social Places Canal Walk
  - Social Places Cavendish Square
  - Social Places Century City
  - Social Places Stellenbosch
  - Social Places Camps Bay
  - Social Places Sea Point
  - Social Places Claremont
  - Social Places Tyger Valley
  - Social Places Somerset West

IMPORTANT NOTES:
- This is a READ-ONLY database. Only SELECT queries are allowed.
- For sentiment analysis, join reviews with review_categories.
- Use proper JOINs when accessing related tables.
- For performance with large datasets, always include WHERE clauses where possible.
";

/// Tables described by [`REVIEWS_SCHEMA`].
pub const REVIEWS_TABLES: [&str; 4] =
    ["reviews", "review_categories", "review_ratings", "review_extras"];
