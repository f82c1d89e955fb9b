#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchAction {
    QueryChanged(String),
    ResultsLoaded { query: String, results: Vec<String> },
    SearchFailed { query: String, message: String },
}
