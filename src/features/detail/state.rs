use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetailState {
    pub id: u32,
    pub title: String,
    pub ticks: u32,
    pub timer_running: bool,
}

impl DetailState {
    pub fn new(id: u32, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            ticks: 0,
            timer_running: false,
        }
    }
}
