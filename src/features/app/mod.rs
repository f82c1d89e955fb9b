mod action;
mod reducer;
mod state;

pub use action::AppAction;
pub use reducer::AppReducer;
pub use state::AppState;
