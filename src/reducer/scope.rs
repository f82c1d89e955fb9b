//! Embed a child reducer in a parent's state and action space.

use std::sync::Arc;

use super::{Reducer, Reduction};
use crate::effect::Effect;

type Get<P, C> = Box<dyn Fn(&P) -> Arc<C> + Send + Sync>;
type Set<P, C> = Box<dyn Fn(&P, Arc<C>) -> P + Send + Sync>;
type ToChild<PA, CA> = Box<dyn Fn(PA) -> Option<CA> + Send + Sync>;
type FromChild<CA, PA> = Arc<dyn Fn(CA) -> PA + Send + Sync>;

/// Runs `child` on the part of the parent state selected by `get`.
///
/// Parent actions that `to_child_action` rejects leave the parent untouched
/// and return the very same `Arc`. Child effects are lifted so every action
/// they dispatch is wrapped by `from_child_action`.
pub struct Scope<P, PA, R: Reducer> {
    get: Get<P, R::State>,
    set: Set<P, R::State>,
    to_child_action: ToChild<PA, R::Action>,
    from_child_action: FromChild<R::Action, PA>,
    child: R,
}

impl<P, PA, R: Reducer> Scope<P, PA, R> {
    pub fn new(
        get: impl Fn(&P) -> Arc<R::State> + Send + Sync + 'static,
        set: impl Fn(&P, Arc<R::State>) -> P + Send + Sync + 'static,
        to_child_action: impl Fn(PA) -> Option<R::Action> + Send + Sync + 'static,
        from_child_action: impl Fn(R::Action) -> PA + Send + Sync + 'static,
        child: R,
    ) -> Self {
        Self {
            get: Box::new(get),
            set: Box::new(set),
            to_child_action: Box::new(to_child_action),
            from_child_action: Arc::new(from_child_action),
            child,
        }
    }
}

impl<P, PA, R> Reducer for Scope<P, PA, R>
where
    P: Send + Sync + 'static,
    PA: Send + 'static,
    R: Reducer,
{
    type State = P;
    type Action = PA;
    type Dependencies = R::Dependencies;

    fn reduce(&self, state: Arc<P>, action: PA, deps: &R::Dependencies) -> Reduction<P, PA> {
        let Some(child_action) = (self.to_child_action)(action) else {
            return (state, Effect::none());
        };

        let child = (self.get)(&state);
        let (next_child, effect) = self.child.reduce(Arc::clone(&child), child_action, deps);
        let from_child_action = Arc::clone(&self.from_child_action);
        let effect = effect.map(move |action| from_child_action(action));

        if Arc::ptr_eq(&child, &next_child) {
            return (state, effect);
        }
        (Arc::new((self.set)(&state, next_child)), effect)
    }
}
