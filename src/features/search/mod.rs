mod action;
mod client;
mod reducer;
mod state;

pub use action::SearchAction;
pub use client::{InMemorySearchClient, SearchClient};
pub use reducer::{SearchReducer, SEARCH_KEY};
pub use state::SearchState;
