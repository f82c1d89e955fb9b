//! Optional child features that can be presented and dismissed.

use std::sync::Arc;

use super::{Reducer, Reduction};
use crate::effect::{CancelKey, Dispatch, Effect};

/// Action addressed to a presented child.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresentationAction<A> {
    /// Forwarded to the child reducer if the child is present.
    Presented(A),
    /// Clears the child state.
    Dismiss,
}

type Get<P, C> = Box<dyn Fn(&P) -> Option<Arc<C>> + Send + Sync>;
type Set<P, C> = Box<dyn Fn(&P, Option<Arc<C>>) -> P + Send + Sync>;
type ToChild<PA, CA> = Box<dyn Fn(PA) -> Option<PresentationAction<CA>> + Send + Sync>;
type FromChild<CA, PA> = Arc<dyn Fn(PresentationAction<CA>) -> PA + Send + Sync>;

/// Runs `child` only while the optional child state is present.
///
/// Child effects receive a dispatch whose [`Dispatch::dismiss`] sends the
/// parent's `Dismiss` action, so a child can close itself without knowing
/// who presented it. Keys registered with [`IfLet::cancel_on_dismiss`] are
/// cancelled whenever the child is dismissed.
pub struct IfLet<P, PA, R: Reducer> {
    get: Get<P, R::State>,
    set: Set<P, R::State>,
    to_child_action: ToChild<PA, R::Action>,
    from_child_action: FromChild<R::Action, PA>,
    child: R,
    dismiss_cancels: Vec<CancelKey>,
}

impl<P, PA, R: Reducer> IfLet<P, PA, R> {
    pub fn new(
        get: impl Fn(&P) -> Option<Arc<R::State>> + Send + Sync + 'static,
        set: impl Fn(&P, Option<Arc<R::State>>) -> P + Send + Sync + 'static,
        to_child_action: impl Fn(PA) -> Option<PresentationAction<R::Action>> + Send + Sync + 'static,
        from_child_action: impl Fn(PresentationAction<R::Action>) -> PA + Send + Sync + 'static,
        child: R,
    ) -> Self {
        Self {
            get: Box::new(get),
            set: Box::new(set),
            to_child_action: Box::new(to_child_action),
            from_child_action: Arc::new(from_child_action),
            child,
            dismiss_cancels: Vec::new(),
        }
    }

    /// Cancel the child's long-running effect under `key` when it is dismissed.
    pub fn cancel_on_dismiss(mut self, key: impl Into<CancelKey>) -> Self {
        self.dismiss_cancels.push(key.into());
        self
    }
}

impl<P, PA, R> IfLet<P, PA, R>
where
    PA: Send + 'static,
    R: Reducer,
{
    fn lift(&self, effect: Effect<R::Action>) -> Effect<PA> {
        if effect.is_none() {
            return Effect::none();
        }
        let from_child_action = Arc::clone(&self.from_child_action);
        effect.map_dispatch(Arc::new(move |parent: &Dispatch<PA>| {
            let wrap = Arc::clone(&from_child_action);
            let dismiss = Arc::clone(&from_child_action);
            let target = parent.clone();
            parent
                .map(move |action| wrap(PresentationAction::Presented(action)))
                .with_dismiss(move || target.send(dismiss(PresentationAction::Dismiss)))
        }))
    }
}

impl<P, PA, R> Reducer for IfLet<P, PA, R>
where
    P: Send + Sync + 'static,
    PA: Send + 'static,
    R: Reducer,
{
    type State = P;
    type Action = PA;
    type Dependencies = R::Dependencies;

    fn reduce(&self, state: Arc<P>, action: PA, deps: &R::Dependencies) -> Reduction<P, PA> {
        let Some(action) = (self.to_child_action)(action) else {
            return (state, Effect::none());
        };

        match action {
            PresentationAction::Dismiss => {
                if (self.get)(&state).is_none() {
                    tracing::debug!("Dismiss with no child presented");
                    return (state, Effect::none());
                }
                let next = Arc::new((self.set)(&state, None));
                let cancels = Effect::batch(self.dismiss_cancels.iter().cloned().map(Effect::cancel));
                (next, cancels)
            }
            PresentationAction::Presented(action) => {
                let Some(child) = (self.get)(&state) else {
                    tracing::warn!("Action sent to a child that is not presented, ignored");
                    return (state, Effect::none());
                };
                let (next_child, effect) = self.child.reduce(Arc::clone(&child), action, deps);
                let effect = self.lift(effect);
                if Arc::ptr_eq(&child, &next_child) {
                    return (state, effect);
                }
                (Arc::new((self.set)(&state, Some(next_child))), effect)
            }
        }
    }
}
