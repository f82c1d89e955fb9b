use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CounterAction {
    Increment,
    Decrement,
    Reset,
    /// Throttled tap: the first one increments, taps during the cooldown are dropped.
    Tap,
    IncrementAfter(Duration),
}
