//! Declarative pattern tables shared by the guard stages and the plan analyzer.
//!
//! Every table is a list of `{category, term, matcher}` declarations compiled
//! once into an immutable [`PatternTable`]. Evaluation is uniform: the first
//! entry in declaration order that matches wins, regardless of where in the
//! input the match occurs.

use regex::{Regex, RegexBuilder};
use std::sync::LazyLock;

/// What a pattern guards against (or recognizes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    /// Competitor brand named in a question
    CompetitorBrand,
    /// Statement that mutates data or schema
    MutatingKeyword,
    /// Administrative/privileged statement
    AdministrativeKeyword,
    /// Statement opener for a pure read
    ReadOnlyMarker,
    /// Sort clause in query text
    SortClause,
}

/// How a term is matched against text. All matchers are case-insensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Matcher {
    /// Term appears anywhere, even inside a longer word
    Substring,
    /// Term appears as a standalone word; inner spaces match any whitespace run
    Word,
    /// Trimmed text begins with the term as a whole word
    Leading,
}

/// Single table declaration.
#[derive(Debug, Clone, Copy)]
pub struct PatternDecl {
    pub category: Category,
    pub term: &'static str,
    pub matcher: Matcher,
}

const fn decl(category: Category, term: &'static str, matcher: Matcher) -> PatternDecl {
    PatternDecl { category, term, matcher }
}

/// Result of a table lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternMatch {
    pub category: Category,
    pub term: &'static str,
}

#[derive(Debug)]
enum Compiled {
    Substring(String),
    Regex(Regex),
}

#[derive(Debug)]
struct Entry {
    decl: PatternDecl,
    compiled: Compiled,
}

impl Entry {
    fn compile(decl: PatternDecl) -> Self {
        let escaped = regex::escape(decl.term).replace(' ', r"\s+");
        let compiled = match decl.matcher {
            Matcher::Substring => Compiled::Substring(decl.term.to_lowercase()),
            Matcher::Word => Compiled::Regex(build_regex(&format!(r"\b{}\b", escaped))),
            Matcher::Leading => Compiled::Regex(build_regex(&format!(r"^\s*{}\b", escaped))),
        };
        Self { decl, compiled }
    }

    fn is_match(&self, text: &str, lowered: &str) -> bool {
        match &self.compiled {
            Compiled::Substring(term) => lowered.contains(term.as_str()),
            Compiled::Regex(re) => re.is_match(text),
        }
    }
}

fn build_regex(pattern: &str) -> Regex {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .expect("pattern terms are escaped and always form a valid regex")
}

/// Immutable compiled table.
#[derive(Debug)]
pub struct PatternTable {
    entries: Vec<Entry>,
}

impl PatternTable {
    /// Compile declarations, preserving their order.
    pub fn compile(decls: &[PatternDecl]) -> Self {
        Self {
            entries: decls.iter().copied().map(Entry::compile).collect(),
        }
    }

    /// First declared entry that matches `text`.
    pub fn first_match(&self, text: &str) -> Option<PatternMatch> {
        let lowered = text.to_lowercase();
        self.entries
            .iter()
            .find(|entry| entry.is_match(text, &lowered))
            .map(|entry| PatternMatch {
                category: entry.decl.category,
                term: entry.decl.term,
            })
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.first_match(text).is_some()
    }

    /// Declared terms, in order.
    pub fn terms(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|e| e.decl.term)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

use Category::*;
use Matcher::*;

const COMPETITOR_DECLS: &[PatternDecl] = &[
    decl(CompetitorBrand, "mcdonald", Substring),
    decl(CompetitorBrand, "mcdonalds", Substring),
    decl(CompetitorBrand, "kfc", Substring),
    decl(CompetitorBrand, "spur", Substring),
    decl(CompetitorBrand, "nando", Substring),
    decl(CompetitorBrand, "nandos", Substring),
    decl(CompetitorBrand, "wimpy", Substring),
    decl(CompetitorBrand, "steers", Substring),
    decl(CompetitorBrand, "burger king", Substring),
    decl(CompetitorBrand, "ocean basket", Substring),
    decl(CompetitorBrand, "pizza hut", Substring),
    decl(CompetitorBrand, "dominos", Substring),
    decl(CompetitorBrand, "debonairs", Substring),
    decl(CompetitorBrand, "roman's pizza", Substring),
    decl(CompetitorBrand, "fishaways", Substring),
    decl(CompetitorBrand, "vida", Substring),
    decl(CompetitorBrand, "mugg & bean", Substring),
    decl(CompetitorBrand, "seattle coffee", Substring),
];

const BLOCKED_KEYWORD_DECLS: &[PatternDecl] = &[
    decl(MutatingKeyword, "INSERT", Word),
    decl(MutatingKeyword, "UPDATE", Word),
    decl(MutatingKeyword, "DELETE", Word),
    decl(MutatingKeyword, "DROP", Word),
    decl(MutatingKeyword, "ALTER", Word),
    decl(MutatingKeyword, "CREATE", Word),
    decl(MutatingKeyword, "TRUNCATE", Word),
    decl(AdministrativeKeyword, "EXEC", Word),
    decl(AdministrativeKeyword, "EXECUTE", Word),
    decl(AdministrativeKeyword, "GRANT", Word),
    decl(AdministrativeKeyword, "REVOKE", Word),
    decl(AdministrativeKeyword, "ATTACH", Word),
    decl(AdministrativeKeyword, "DETACH", Word),
    decl(AdministrativeKeyword, "PRAGMA", Word),
    decl(AdministrativeKeyword, "VACUUM", Word),
    decl(AdministrativeKeyword, "REINDEX", Word),
];

const READ_ONLY_MARKER_DECLS: &[PatternDecl] = &[
    decl(ReadOnlyMarker, "SELECT", Leading),
    decl(ReadOnlyMarker, "WITH", Leading),
];

const SORT_CLAUSE_DECLS: &[PatternDecl] = &[decl(SortClause, "ORDER BY", Word)];

/// Competitor brands that may not be discussed.
pub static COMPETITORS: LazyLock<PatternTable> =
    LazyLock::new(|| PatternTable::compile(COMPETITOR_DECLS));

/// Mutating and administrative SQL keywords.
pub static BLOCKED_KEYWORDS: LazyLock<PatternTable> =
    LazyLock::new(|| PatternTable::compile(BLOCKED_KEYWORD_DECLS));

/// Accepted statement openers.
pub static READ_ONLY_MARKERS: LazyLock<PatternTable> =
    LazyLock::new(|| PatternTable::compile(READ_ONLY_MARKER_DECLS));

/// Sort clauses inspected by the plan analyzer.
pub static SORT_CLAUSES: LazyLock<PatternTable> =
    LazyLock::new(|| PatternTable::compile(SORT_CLAUSE_DECLS));
