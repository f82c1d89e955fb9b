use std::sync::Arc;

use crate::effect::Effect;
use crate::features::counter::action::CounterAction;
use crate::features::counter::state::CounterState;
use crate::features::Env;
use crate::reducer::{Reducer, Reduction};

/// Key of the throttled tap effect.
pub const TAP_KEY: &str = "counter-tap";

pub struct CounterReducer;

impl Reducer for CounterReducer {
    type State = CounterState;
    type Action = CounterAction;
    type Dependencies = Env;

    fn reduce(
        &self,
        mut state: Arc<CounterState>,
        action: CounterAction,
        env: &Env,
    ) -> Reduction<CounterState, CounterAction> {
        match action {
            CounterAction::Increment => {
                Arc::make_mut(&mut state).count += 1;
                (state, Effect::none())
            }
            CounterAction::Decrement => {
                Arc::make_mut(&mut state).count -= 1;
                (state, Effect::none())
            }
            CounterAction::Reset => {
                if state.count == 0 {
                    return (state, Effect::none());
                }
                (Arc::new(CounterState::default()), Effect::none())
            }
            CounterAction::Tap => (
                state,
                Effect::throttled(TAP_KEY, env.throttle, |send| async move {
                    send.send(CounterAction::Increment);
                    Ok(())
                }),
            ),
            CounterAction::IncrementAfter(delay) => (
                state,
                Effect::after_delay(delay, |send| async move {
                    send.send(CounterAction::Increment);
                    Ok(())
                }),
            ),
        }
    }
}
