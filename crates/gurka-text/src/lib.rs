//! gurka-text
//!
//! Tantivy indexing and search over Gherkin test-run reports. `index` flattens
//! runs into documents, `search` translates user queries, runs them against a
//! product index and attributes each hit to the field that most likely matched.

pub mod attribution;
pub mod index;
pub mod normalize;
pub mod query_builder;
pub mod search;
pub mod tantivy_utils;

pub use index::TantivyReportIndexer;
pub use search::{ReportSearchEngine, TOP_K};
