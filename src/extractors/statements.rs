// src/extractors/statements.rs
use crate::extractors::manifest::{StatementEntry, StatementMap};
use std::str::FromStr;

/// Default positional guess: R1 is the cover page, the primary statements follow.
pub const DEFAULT_FIRST_SLOT: u32 = 2;
pub const DEFAULT_LAST_SLOT: u32 = 10;

/// How statement documents are picked inside a filing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentSelection {
    /// Resolve the primary statements through the filing manifest; falls back to slots
    /// when nothing resolves.
    ByName,
    /// Take `R<first>.htm` ..= `R<last>.htm` regardless of the manifest.
    Slots { first: u32, last: u32 },
}

impl Default for DocumentSelection {
    fn default() -> Self {
        DocumentSelection::ByName
    }
}

impl FromStr for DocumentSelection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "names" | "name" => Ok(DocumentSelection::ByName),
            "slots" | "slot" => Ok(DocumentSelection::Slots {
                first: DEFAULT_FIRST_SLOT,
                last: DEFAULT_LAST_SLOT,
            }),
            other => Err(format!("unknown selection '{}', expected 'names' or 'slots'", other)),
        }
    }
}

/// A primary financial statement and the ways issuers have been seen to name it.
struct StatementKind {
    canonical: &'static str,
    keywords: &'static [&'static str],
    excludes: &'static [&'static str],
}

// Order matters: the first resolved statement supplies the period header, and income
// statements carry the "12 Months Ended" / dates header pair.
static PRIMARY_STATEMENTS: &[StatementKind] = &[
    StatementKind {
        canonical: "CONSOLIDATED STATEMENTS OF OPERATIONS",
        keywords: &["OPERATIONS", "INCOME STATEMENT", "STATEMENTS OF INCOME", "STATEMENTS OF EARNINGS"],
        excludes: &["COMPREHENSIVE"],
    },
    StatementKind {
        canonical: "CONSOLIDATED STATEMENTS OF COMPREHENSIVE INCOME",
        keywords: &["COMPREHENSIVE INCOME", "COMPREHENSIVE LOSS"],
        excludes: &[],
    },
    StatementKind {
        canonical: "CONSOLIDATED BALANCE SHEETS",
        keywords: &["BALANCE SHEET", "FINANCIAL CONDITION", "FINANCIAL POSITION"],
        excludes: &[],
    },
    StatementKind {
        canonical: "CONSOLIDATED STATEMENTS OF CASH FLOWS",
        keywords: &["CASH FLOW"],
        excludes: &[],
    },
];

// Parenthesized suffixes that are part of a statement's real name, not a variant.
const NAME_QUALIFIERS: &[&str] = &["(LOSS)", "(DEFICIT)", "(LOSS) INCOME", "(INCOME)"];

/// `"... BALANCE SHEETS (PARENTHETICAL)"`, `"... (RESTATED)"` and the like.
fn is_parenthesized_variant(name: &str) -> bool {
    name.contains("PARENTHETICAL")
        || (name.ends_with(')') && !NAME_QUALIFIERS.iter().any(|q| name.ends_with(q)))
}

fn is_statement_entry(entry: &StatementEntry) -> bool {
    match entry.category.as_deref() {
        Some(category) => category.eq_ignore_ascii_case("Statements"),
        None => true,
    }
}

/// Documents of `R<first>.htm` ..= `R<last>.htm`.
pub fn slot_documents(first: u32, last: u32) -> Vec<String> {
    (first..=last).map(|i| format!("R{}.htm", i)).collect()
}

/// Picks the statement documents to scrape for one filing, in scrape order.
pub fn select_documents(map: &StatementMap, selection: DocumentSelection) -> Vec<String> {
    match selection {
        DocumentSelection::Slots { first, last } => slot_documents(first, last),
        DocumentSelection::ByName => {
            let documents = resolve_primary_statements(map);
            if documents.is_empty() {
                tracing::warn!(
                    "No primary statements resolved from {} manifest entries; guessing R{}..R{}",
                    map.len(),
                    DEFAULT_FIRST_SLOT,
                    DEFAULT_LAST_SLOT
                );
                return slot_documents(DEFAULT_FIRST_SLOT, DEFAULT_LAST_SLOT);
            }
            documents
        }
    }
}

/// Exact canonical name first, then the first non-parenthesized entry containing one of the
/// statement's keywords. A document is never selected twice.
pub fn resolve_primary_statements(map: &StatementMap) -> Vec<String> {
    let mut documents: Vec<String> = Vec::new();

    for kind in PRIMARY_STATEMENTS {
        if let Some(entry) = map.get(kind.canonical) {
            if !documents.contains(&entry.file_name) {
                tracing::debug!("Found {} -> {}", kind.canonical, entry.file_name);
                documents.push(entry.file_name.clone());
                continue;
            }
        }

        tracing::debug!("Trying keyword search for {}", kind.canonical);
        let found = map.iter().find(|entry| {
            is_statement_entry(entry)
                && !is_parenthesized_variant(&entry.name)
                && !documents.contains(&entry.file_name)
                && kind.keywords.iter().any(|k| entry.name.contains(k))
                && !kind.excludes.iter().any(|x| entry.name.contains(x))
        });

        match found {
            Some(entry) => {
                tracing::debug!("Keyword search for {} found '{}' -> {}", kind.canonical, entry.name, entry.file_name);
                documents.push(entry.file_name.clone());
            }
            None => tracing::warn!("Keyword search for {} failed", kind.canonical),
        }
    }

    documents
}
