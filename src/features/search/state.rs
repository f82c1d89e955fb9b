use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchState {
    pub query: String,
    pub results: Vec<String>,
    /// True between a query change and the matching response.
    pub loading: bool,
    pub error: Option<String>,
    /// Number of responses applied so far.
    pub completed_searches: u32,
}
