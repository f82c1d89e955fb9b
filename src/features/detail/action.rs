#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailAction {
    /// Start the once-per-tick timer subscription.
    StartTimer,
    StopTimer,
    Tick,
    Rename(String),
    /// Ask whoever presented this screen to close it.
    Close,
}
