//! Run several reducers over disjoint slices of one parent state.

use std::sync::Arc;

use super::{Reducer, Reduction};
use crate::effect::Effect;

type SliceWrite<'a, P> = Box<dyn FnOnce(&mut P) + 'a>;

trait SliceReducer<P, A, D>: Send + Sync {
    /// Reduce one slice. Returns a deferred write when the slice changed.
    fn reduce_slice<'a>(&'a self, parent: &P, action: A, deps: &D) -> (Option<SliceWrite<'a, P>>, Effect<A>);
}

struct Slice<P, R: Reducer> {
    get: Box<dyn Fn(&P) -> Arc<R::State> + Send + Sync>,
    set: Box<dyn Fn(&mut P, Arc<R::State>) + Send + Sync>,
    reducer: R,
}

impl<P, R> SliceReducer<P, R::Action, R::Dependencies> for Slice<P, R>
where
    P: 'static,
    R: Reducer,
{
    fn reduce_slice<'a>(
        &'a self,
        parent: &P,
        action: R::Action,
        deps: &R::Dependencies,
    ) -> (Option<SliceWrite<'a, P>>, Effect<R::Action>) {
        let current = (self.get)(parent);
        let (next, effect) = self.reducer.reduce(Arc::clone(&current), action, deps);
        if Arc::ptr_eq(&current, &next) {
            return (None, effect);
        }
        (Some(Box::new(move |parent: &mut P| (self.set)(parent, next))), effect)
    }
}

/// Runs every slice reducer, in registration order, on the same action.
///
/// Each slice sees the parent state as it was before the action. Changed
/// slices are written into a single copy of the parent; when no slice
/// changed, the original `Arc` is returned. Effects are batched.
pub struct Combine<P, A, D> {
    slices: Vec<Box<dyn SliceReducer<P, A, D>>>,
}

impl<P, A, D> Default for Combine<P, A, D> {
    fn default() -> Self {
        Self { slices: Vec::new() }
    }
}

impl<P, A, D> Combine<P, A, D>
where
    P: Send + Sync + 'static,
    A: Send + 'static,
    D: Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a reducer owning the slice reached through `get` and `set`.
    pub fn slice<R>(
        mut self,
        get: impl Fn(&P) -> Arc<R::State> + Send + Sync + 'static,
        set: impl Fn(&mut P, Arc<R::State>) + Send + Sync + 'static,
        reducer: R,
    ) -> Self
    where
        R: Reducer<Action = A, Dependencies = D>,
    {
        self.slices.push(Box::new(Slice {
            get: Box::new(get),
            set: Box::new(set),
            reducer,
        }));
        self
    }

    pub fn len(&self) -> usize {
        self.slices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }
}

impl<P, A, D> Reducer for Combine<P, A, D>
where
    P: Clone + Send + Sync + 'static,
    A: Clone + Send + 'static,
    D: Send + Sync + 'static,
{
    type State = P;
    type Action = A;
    type Dependencies = D;

    fn reduce(&self, state: Arc<P>, action: A, deps: &D) -> Reduction<P, A> {
        let mut writes = Vec::new();
        let mut effects = Vec::with_capacity(self.slices.len());
        for slice in &self.slices {
            let (write, effect) = slice.reduce_slice(&state, action.clone(), deps);
            writes.extend(write);
            effects.push(effect);
        }

        let effect = Effect::batch(effects);
        if writes.is_empty() {
            return (state, effect);
        }
        let mut next = P::clone(&state);
        for write in writes {
            write(&mut next);
        }
        (Arc::new(next), effect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reducer::reducer_fn;

    #[derive(Debug, Clone, Default)]
    struct Pair {
        left: Arc<i32>,
        right: Arc<i32>,
    }

    #[derive(Debug, Clone, PartialEq)]
    enum Act {
        Left(i32),
        Right(i32),
        Both(i32),
    }

    fn side(
        pick: fn(&Act) -> Option<i32>,
    ) -> impl Reducer<State = i32, Action = Act, Dependencies = ()> {
        reducer_fn(move |n: Arc<i32>, action: Act, _: &()| match pick(&action) {
            Some(delta) if delta != 0 => (Arc::new(*n + delta), Effect::none()),
            _ => (n, Effect::none()),
        })
    }

    fn combined() -> Combine<Pair, Act, ()> {
        Combine::new()
            .slice(
                |p: &Pair| Arc::clone(&p.left),
                |p: &mut Pair, left| p.left = left,
                side(|a| match a {
                    Act::Left(d) | Act::Both(d) => Some(*d),
                    Act::Right(_) => None,
                }),
            )
            .slice(
                |p: &Pair| Arc::clone(&p.right),
                |p: &mut Pair, right| p.right = right,
                side(|a| match a {
                    Act::Right(d) | Act::Both(d) => Some(*d),
                    Act::Left(_) => None,
                }),
            )
    }

    #[test]
    fn only_touched_slice_changes() {
        let state = Arc::new(Pair::default());
        let (next, _) = combined().reduce(Arc::clone(&state), Act::Left(2), &());
        assert_eq!(*next.left, 2);
        assert!(Arc::ptr_eq(&state.right, &next.right));
    }

    #[test]
    fn every_slice_sees_the_action() {
        let (next, _) = combined().reduce(Arc::new(Pair::default()), Act::Both(5), &());
        assert_eq!((*next.left, *next.right), (5, 5));
    }

    #[test]
    fn no_change_returns_original_arc() {
        let state = Arc::new(Pair::default());
        let (next, effect) = combined().reduce(Arc::clone(&state), Act::Right(0), &());
        assert!(Arc::ptr_eq(&state, &next));
        assert!(effect.is_none());
    }

    #[test]
    fn empty_combine_is_identity() {
        let combine: Combine<Pair, Act, ()> = Combine::new();
        assert!(combine.is_empty());
        assert_eq!(combined().len(), 2);
        let state = Arc::new(Pair::default());
        let (next, _) = combine.reduce(Arc::clone(&state), Act::Left(1), &());
        assert!(Arc::ptr_eq(&state, &next));
    }
}
