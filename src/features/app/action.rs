use crate::features::counter::CounterAction;
use crate::features::detail::DetailAction;
use crate::features::search::SearchAction;
use crate::reducer::PresentationAction;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppAction {
    Counter(CounterAction),
    Search(SearchAction),
    Detail(PresentationAction<DetailAction>),
    /// Present the detail screen for a search result.
    OpenDetail { id: u32, title: String },
}

impl AppAction {
    pub fn counter(&self) -> Option<&CounterAction> {
        match self {
            AppAction::Counter(action) => Some(action),
            _ => None,
        }
    }

    pub fn search(&self) -> Option<&SearchAction> {
        match self {
            AppAction::Search(action) => Some(action),
            _ => None,
        }
    }
}
