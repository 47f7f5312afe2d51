//! Shared fixtures for integration tests.

#![allow(dead_code)]

use rusqlite::{params, Connection};
use std::path::PathBuf;
use tempfile::TempDir;

pub const STORES: [&str; 10] = [
    "Social Places V&A Waterfront",
    "Social Places Canal Walk",
    "Social Places Cavendish Square",
    "Social Places Century City",
    "Social Places Stellenbosch",
    "Social Places Camps Bay",
    "Social Places Sea Point",
    "Social Places Claremont",
    "Social Places Tyger Valley",
    "Social Places Somerset West",
];

pub const BOTTOM_FIVE_SQL: &str = "SELECT store_name, AVG(rating) AS avg_rating FROM reviews \
     GROUP BY store_name ORDER BY avg_rating ASC LIMIT 5";

pub const ENDLESS_SQL: &str =
    "WITH RECURSIVE c(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM c) SELECT count(*) FROM c";

/// Review database with no index on `store_name`, so grouping by store
/// scans the whole table.
///
/// Each store gets four reviews; store `i` is rated `1 + i % 5` on average.
pub fn seed_reviews_db() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reviews.db");
    let conn = Connection::open(&path).unwrap();

    conn.execute_batch(
        "CREATE TABLE reviews (
            id INTEGER PRIMARY KEY,
            store_name TEXT NOT NULL,
            brand_name TEXT NOT NULL,
            platform TEXT,
            review_date DATETIME,
            review_comment TEXT,
            reviewer_name TEXT,
            review_status TEXT,
            rating INTEGER
        );
        CREATE TABLE review_ratings (
            id INTEGER PRIMARY KEY,
            review_id INTEGER REFERENCES reviews(id),
            field_name TEXT,
            rating_value INTEGER
        );
        CREATE INDEX idx_ratings_review ON review_ratings(review_id);",
    )
    .unwrap();

    let mut id = 0;
    for (i, store) in STORES.iter().enumerate() {
        for _ in 0..4 {
            id += 1;
            let rating = 1 + (i % 5) as i64;
            conn.execute(
                "INSERT INTO reviews (id, store_name, brand_name, platform, review_date,
                     review_comment, reviewer_name, review_status, rating)
                 VALUES (?1, ?2, 'Social Places', 'Google', '2024-06-01 12:00:00',
                     'Fine', 'Sam', 'Open', ?3)",
                params![id, store, rating],
            )
            .unwrap();
            conn.execute(
                "INSERT INTO review_ratings (review_id, field_name, rating_value) \
                 VALUES (?1, 'Service', ?2)",
                params![id, rating],
            )
            .unwrap();
        }
    }

    (dir, path)
}
