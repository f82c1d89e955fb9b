mod action;
mod reducer;
mod state;

pub use action::CounterAction;
pub use reducer::{CounterReducer, TAP_KEY};
pub use state::CounterState;
