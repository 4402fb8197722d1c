// src/extractors/mod.rs
pub mod manifest;
pub mod normalize;
pub mod statements;
pub mod table;

// Re-export key extraction types for convenience
pub use manifest::{fetch_statement_map, StatementMap};
pub use normalize::normalize_filing;
pub use statements::{select_documents, DocumentSelection};
pub use table::{scrape_table, RawTableRecord};
