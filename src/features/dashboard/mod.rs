//! Counter plus activity log, combined over one action type.

use std::sync::Arc;

use serde::Serialize;

use crate::effect::Effect;
use crate::features::counter::{CounterAction, CounterReducer, CounterState};
use crate::features::Env;
use crate::reducer::{reducer_fn, Combine, Reducer};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DashboardState {
    pub counter: Arc<CounterState>,
    pub activity: Arc<ActivityLog>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActivityLog {
    pub entries: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DashboardAction {
    Counter(CounterAction),
    /// Appended to the activity log; blank notes are ignored.
    Note(String),
}

pub type DashboardReducer = Combine<DashboardState, DashboardAction, Env>;

/// Counter slice and activity slice, both seeing every action.
pub fn dashboard_reducer() -> DashboardReducer {
    Combine::new()
        .slice(
            |d: &DashboardState| Arc::clone(&d.counter),
            |d: &mut DashboardState, counter| d.counter = counter,
            reducer_fn(|counter: Arc<CounterState>, action: DashboardAction, env: &Env| match action {
                DashboardAction::Counter(action) => {
                    let (next, effect) = CounterReducer.reduce(counter, action, env);
                    (next, effect.map(DashboardAction::Counter))
                }
                DashboardAction::Note(_) => (counter, Effect::none()),
            }),
        )
        .slice(
            |d: &DashboardState| Arc::clone(&d.activity),
            |d: &mut DashboardState, activity| d.activity = activity,
            reducer_fn(|mut log: Arc<ActivityLog>, action: DashboardAction, _: &Env| {
                let entry = match action {
                    DashboardAction::Note(note) if !note.trim().is_empty() => note,
                    DashboardAction::Counter(CounterAction::Reset) => "counter reset".to_string(),
                    _ => return (log, Effect::none()),
                };
                Arc::make_mut(&mut log).entries.push(entry);
                (log, Effect::none())
            }),
        )
}
