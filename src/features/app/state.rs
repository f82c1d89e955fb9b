use std::sync::Arc;

use serde::Serialize;

use crate::features::counter::CounterState;
use crate::features::detail::DetailState;
use crate::features::search::SearchState;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AppState {
    pub counter: Arc<CounterState>,
    pub search: Arc<SearchState>,
    pub detail: Option<Arc<DetailState>>,
}
