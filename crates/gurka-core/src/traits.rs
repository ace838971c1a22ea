use crate::report::Testrun;
use crate::types::SearchResponse;

/// Writes report documents into a product index.
pub trait ReportIndexer: Send + Sync {
    /// Index one run; returns the number of documents written.
    fn index_testrun(&self, run: &Testrun, file_name: &str, product: &str) -> anyhow::Result<usize>;
}

/// Answers free-text queries against a product's index.
pub trait ReportSearcher: Send + Sync {
    /// Request-level failures yield an empty response rather than an error.
    fn search(&self, product: &str, raw_query: &str) -> SearchResponse;
}
