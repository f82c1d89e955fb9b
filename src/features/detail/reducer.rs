use std::sync::Arc;

use crate::effect::{Dispatch, Effect};
use crate::features::detail::action::DetailAction;
use crate::features::detail::state::DetailState;
use crate::features::Env;
use crate::reducer::{Reducer, Reduction};

/// Key of the timer subscription. Cancelled when the screen is dismissed.
pub const TIMER_KEY: &str = "detail-timer";

pub struct DetailReducer;

impl Reducer for DetailReducer {
    type State = DetailState;
    type Action = DetailAction;
    type Dependencies = Env;

    fn reduce(
        &self,
        mut state: Arc<DetailState>,
        action: DetailAction,
        env: &Env,
    ) -> Reduction<DetailState, DetailAction> {
        match action {
            DetailAction::StartTimer => {
                Arc::make_mut(&mut state).timer_running = true;
                (state, timer(env))
            }
            DetailAction::StopTimer => {
                if !state.timer_running {
                    return (state, Effect::none());
                }
                Arc::make_mut(&mut state).timer_running = false;
                (state, Effect::cancel(TIMER_KEY))
            }
            DetailAction::Tick => {
                Arc::make_mut(&mut state).ticks += 1;
                (state, Effect::none())
            }
            DetailAction::Rename(title) => {
                if title == state.title {
                    return (state, Effect::none());
                }
                Arc::make_mut(&mut state).title = title;
                (state, Effect::none())
            }
            DetailAction::Close => (state, Effect::dismiss()),
        }
    }
}

fn timer(env: &Env) -> Effect<DetailAction> {
    let period = env.tick;
    let clock = Arc::clone(&env.clock);
    Effect::subscription(TIMER_KEY, move |send: Dispatch<DetailAction>| {
        let ticker = tokio::spawn(async move {
            loop {
                clock.sleep(period).await;
                send.send(DetailAction::Tick);
            }
        });
        move || ticker.abort()
    })
}
