use std::sync::Arc;

use crate::effect::Effect;
use crate::features::app::action::AppAction;
use crate::features::app::state::AppState;
use crate::features::counter::CounterReducer;
use crate::features::detail::{self, DetailReducer, DetailState};
use crate::features::search::SearchReducer;
use crate::features::Env;
use crate::reducer::{IfLet, Reducer, Reduction, Scope};

/// Root reducer of the demo app.
///
/// Routes each action to the one child that owns it; the children never
/// see each other's state.
pub struct AppReducer {
    counter: Scope<AppState, AppAction, CounterReducer>,
    search: Scope<AppState, AppAction, SearchReducer>,
    detail: IfLet<AppState, AppAction, DetailReducer>,
}

impl AppReducer {
    pub fn new() -> Self {
        let counter = Scope::new(
            |app: &AppState| Arc::clone(&app.counter),
            |app: &AppState, counter| AppState {
                counter,
                ..app.clone()
            },
            |action| match action {
                AppAction::Counter(action) => Some(action),
                _ => None,
            },
            AppAction::Counter,
            CounterReducer,
        );
        let search = Scope::new(
            |app: &AppState| Arc::clone(&app.search),
            |app: &AppState, search| AppState {
                search,
                ..app.clone()
            },
            |action| match action {
                AppAction::Search(action) => Some(action),
                _ => None,
            },
            AppAction::Search,
            SearchReducer,
        );
        let detail = IfLet::new(
            |app: &AppState| app.detail.clone(),
            |app: &AppState, detail| AppState {
                detail,
                ..app.clone()
            },
            |action| match action {
                AppAction::Detail(action) => Some(action),
                _ => None,
            },
            AppAction::Detail,
            DetailReducer,
        )
        .cancel_on_dismiss(detail::TIMER_KEY);

        Self {
            counter,
            search,
            detail,
        }
    }
}

impl Default for AppReducer {
    fn default() -> Self {
        Self::new()
    }
}

impl Reducer for AppReducer {
    type State = AppState;
    type Action = AppAction;
    type Dependencies = Env;

    fn reduce(&self, state: Arc<AppState>, action: AppAction, env: &Env) -> Reduction<AppState, AppAction> {
        match action {
            action @ AppAction::Counter(_) => self.counter.reduce(state, action, env),
            action @ AppAction::Search(_) => self.search.reduce(state, action, env),
            action @ AppAction::Detail(_) => self.detail.reduce(state, action, env),
            AppAction::OpenDetail { id, title } => {
                if state.detail.as_ref().is_some_and(|d| d.id == id) {
                    return (state, Effect::none());
                }
                // Replacing a presented screen tears down its timer first.
                let effect = if state.detail.is_some() {
                    Effect::cancel(detail::TIMER_KEY)
                } else {
                    Effect::none()
                };
                let next = AppState {
                    detail: Some(Arc::new(DetailState::new(id, title))),
                    ..AppState::clone(&state)
                };
                (Arc::new(next), effect)
            }
        }
    }
}
