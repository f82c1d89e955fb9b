mod action;
mod reducer;
mod state;

pub use action::DetailAction;
pub use reducer::{DetailReducer, TIMER_KEY};
pub use state::DetailState;
