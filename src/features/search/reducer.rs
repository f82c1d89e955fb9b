use std::sync::Arc;

use crate::effect::Effect;
use crate::features::search::action::SearchAction;
use crate::features::search::state::SearchState;
use crate::features::Env;
use crate::reducer::{Reducer, Reduction};

/// Key of the debounced search effect.
pub const SEARCH_KEY: &str = "search";

pub struct SearchReducer;

impl Reducer for SearchReducer {
    type State = SearchState;
    type Action = SearchAction;
    type Dependencies = Env;

    fn reduce(
        &self,
        mut state: Arc<SearchState>,
        action: SearchAction,
        env: &Env,
    ) -> Reduction<SearchState, SearchAction> {
        match action {
            SearchAction::QueryChanged(query) => {
                if query.trim().is_empty() {
                    let next = SearchState {
                        completed_searches: state.completed_searches,
                        ..SearchState::default()
                    };
                    return (Arc::new(next), Effect::cancel(SEARCH_KEY));
                }

                let draft = Arc::make_mut(&mut state);
                draft.query = query.clone();
                draft.loading = true;
                draft.error = None;

                let client = Arc::clone(&env.search_client);
                let effect = Effect::debounced(SEARCH_KEY, env.search_debounce, move |send| async move {
                    match client.search(&query).await {
                        Ok(results) => send.send(SearchAction::ResultsLoaded { query, results }),
                        Err(err) => send.send(SearchAction::SearchFailed {
                            query,
                            message: format!("{:#}", err),
                        }),
                    }
                    Ok(())
                });
                (state, effect)
            }
            SearchAction::ResultsLoaded { query, results } => {
                if query != state.query {
                    tracing::debug!(%query, current = %state.query, "Stale search response ignored");
                    return (state, Effect::none());
                }
                let draft = Arc::make_mut(&mut state);
                draft.results = results;
                draft.loading = false;
                draft.completed_searches += 1;
                (state, Effect::none())
            }
            SearchAction::SearchFailed { query, message } => {
                if query != state.query {
                    return (state, Effect::none());
                }
                let draft = Arc::make_mut(&mut state);
                draft.error = Some(message);
                draft.loading = false;
                (state, Effect::none())
            }
        }
    }
}
