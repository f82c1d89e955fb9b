mod common;

use common::{ms, recording_hook, yield_a_bit};
use parking_lot::Mutex;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use unistore::{reducer_fn, Clock, Dispatch, Effect, Store, StoreOptions, TestStore, VirtualClock};

#[derive(Debug, Clone, PartialEq)]
enum Job {
    Start(u32),
    Debounce(u32),
    Stop,
    Done(u32),
}

fn push(log: &Arc<Vec<u32>>, n: u32) -> Arc<Vec<u32>> {
    let mut next = Vec::clone(log);
    next.push(n);
    Arc::new(next)
}

fn job_reducer() -> impl unistore::Reducer<State = Vec<u32>, Action = Job, Dependencies = VirtualClock> {
    reducer_fn(|log: Arc<Vec<u32>>, action: Job, clock: &VirtualClock| match action {
        Job::Start(n) => {
            let clock = clock.clone();
            let effect = Effect::cancellable("load", move |send| async move {
                clock.sleep(ms(100)).await;
                send.send(Job::Done(n));
                Ok(())
            });
            (log, effect)
        }
        Job::Debounce(n) => (
            log,
            Effect::debounced("save", ms(300), move |send| async move {
                send.send(Job::Done(n));
                Ok(())
            }),
        ),
        Job::Stop => (log, Effect::batch([Effect::cancel("load"), Effect::cancel("save")])),
        Job::Done(n) => (push(&log, n), Effect::none()),
    })
}

fn job_store(clock: &VirtualClock) -> Store<impl unistore::Reducer<State = Vec<u32>, Action = Job, Dependencies = VirtualClock>> {
    Store::with_options(
        Vec::<u32>::new(),
        job_reducer(),
        clock.clone(),
        StoreOptions::new().clock(clock.clone()),
    )
    .expect("store")
}

#[tokio::test]
async fn superseded_cancellable_never_dispatches() {
    let clock = VirtualClock::new();
    let store = job_store(&clock);

    store.dispatch(Job::Start(1));
    clock.advance(ms(50)).await;
    // The first load is parked in its sleep when the second one arrives.
    assert!(store.state().is_empty());
    assert_eq!(clock.pending_timers(), 1);

    store.dispatch(Job::Start(2));
    clock.advance(ms(100)).await;

    assert_eq!(*store.state(), vec![2]);
    assert!(store.active_effect_keys().is_empty());
}

#[tokio::test]
async fn superseded_cancellable_queues_only_the_replacement() {
    let clock = VirtualClock::new();
    let mut store = TestStore::with_clock(Vec::<u32>::new(), job_reducer(), clock.clone(), clock);

    store.send(Job::Start(1), |_| {});
    store.advance_time(ms(50)).await;
    store.send(Job::Start(2), |_| {});
    store.advance_time(ms(100)).await;

    assert_eq!(store.pending_count(), 1);
    store.receive(Job::Done(2), |log| assert_eq!(*log, vec![2])).await;
    store.advance_time(ms(1000)).await;
    store.assert_no_pending_actions();
}

#[tokio::test]
async fn debounce_fires_once_after_last_call() {
    let clock = VirtualClock::new();
    let store = job_store(&clock);

    store.dispatch(Job::Debounce(1));
    clock.advance(ms(200)).await;
    store.dispatch(Job::Debounce(2));
    clock.advance(ms(200)).await;
    store.dispatch(Job::Debounce(3));
    clock.advance(ms(299)).await;
    assert!(store.state().is_empty());

    clock.advance(ms(1)).await;
    assert_eq!(*store.state(), vec![3]);

    clock.advance(ms(1000)).await;
    assert_eq!(*store.state(), vec![3]);
}

#[tokio::test]
async fn cancel_clears_pending_debounce_and_running_work() {
    let clock = VirtualClock::new();
    let store = job_store(&clock);

    store.dispatch(Job::Start(1));
    store.dispatch(Job::Debounce(2));
    assert_eq!(store.active_effect_keys().len(), 2);

    store.dispatch(Job::Stop);
    assert!(store.active_effect_keys().is_empty());

    clock.advance(ms(1000)).await;
    assert!(store.state().is_empty());
    assert_eq!(clock.pending_timers(), 0);
}

#[tokio::test]
async fn after_delay_fires_once_and_stops_with_store() {
    let clock = VirtualClock::new();
    let fired = Arc::new(AtomicUsize::new(0));
    let reducer = reducer_fn(|n: Arc<u32>, _: (), fired: &Arc<AtomicUsize>| {
        let fired = Arc::clone(fired);
        (
            n,
            Effect::after_delay(ms(200), move |_| async move {
                fired.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }),
        )
    });
    let store = Store::with_options(0u32, reducer, Arc::clone(&fired), StoreOptions::new().clock(clock.clone()))
        .expect("store");

    store.dispatch(());
    clock.advance(ms(199)).await;
    assert_eq!(fired.load(Ordering::SeqCst), 0);
    clock.advance(ms(1)).await;
    assert_eq!(fired.load(Ordering::SeqCst), 1);

    store.dispatch(());
    store.destroy();
    clock.advance(ms(500)).await;
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

#[derive(Debug, Clone, PartialEq)]
enum Feed {
    Subscribe,
    Unsubscribe,
    Ping,
}

#[derive(Default)]
struct FeedDeps {
    cleanups: AtomicUsize,
    retained: Mutex<Option<Dispatch<Feed>>>,
}

fn feed_store(hook: StoreOptions) -> (Store<impl unistore::Reducer<State = u32, Action = Feed, Dependencies = Arc<FeedDeps>>>, Arc<FeedDeps>) {
    let deps = Arc::new(FeedDeps::default());
    let reducer = reducer_fn(|pings: Arc<u32>, action: Feed, deps: &Arc<FeedDeps>| match action {
        Feed::Subscribe => {
            let deps = Arc::clone(deps);
            (
                pings,
                Effect::subscription("feed", move |send: Dispatch<Feed>| {
                    send.send(Feed::Ping);
                    *deps.retained.lock() = Some(send);
                    move || {
                        deps.cleanups.fetch_add(1, Ordering::SeqCst);
                    }
                }),
            )
        }
        Feed::Unsubscribe => (pings, Effect::cancel("feed")),
        Feed::Ping => (Arc::new(*pings + 1), Effect::none()),
    });
    let store = Store::with_options(0u32, reducer, Arc::clone(&deps), hook).expect("store");
    (store, deps)
}

#[tokio::test]
async fn subscription_cleanup_runs_exactly_once_per_registration() {
    let (store, deps) = feed_store(StoreOptions::new());
    assert!(Arc::ptr_eq(store.dependencies(), &deps));

    store.dispatch(Feed::Subscribe);
    // Setup dispatched synchronously; the loop re-entered without deadlock.
    assert_eq!(*store.state(), 1);

    store.dispatch(Feed::Subscribe);
    assert_eq!(deps.cleanups.load(Ordering::SeqCst), 1);

    store.dispatch(Feed::Unsubscribe);
    store.dispatch(Feed::Unsubscribe);
    assert_eq!(deps.cleanups.load(Ordering::SeqCst), 2);

    store.dispatch(Feed::Subscribe);
    store.destroy();
    store.destroy();
    assert_eq!(deps.cleanups.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn cancelled_subscription_dispatch_is_discarded() {
    let (store, deps) = feed_store(StoreOptions::new());
    store.dispatch(Feed::Subscribe);
    store.dispatch(Feed::Unsubscribe);

    let retained = deps.retained.lock().take().expect("setup kept its dispatch");
    assert!(retained.is_cancelled());
    retained.send(Feed::Ping);
    assert_eq!(*store.state(), 1);
}

async fn explode() -> anyhow::Result<()> {
    panic!("kaboom")
}

#[tokio::test]
async fn executor_failures_reach_the_store_hook() {
    let (options, errors) = recording_hook();
    let reducer = reducer_fn(|n: Arc<u32>, action: u32, _: &()| {
        let effect = match action {
            0 => Effect::run(|_| async { Err(anyhow::anyhow!("boom")) }),
            1 => Effect::cancellable("k", |_| explode()),
            _ => Effect::fire_and_forget(|| async { Err(anyhow::anyhow!("lost")) }),
        };
        (n, effect)
    });
    let store = Store::with_options(0u32, reducer, (), options).expect("store");

    store.dispatch(0);
    store.dispatch(1);
    store.dispatch(2);
    yield_a_bit().await;

    let mut seen = errors.lock().clone();
    seen.sort();
    assert_eq!(
        seen,
        vec![
            "cancellable effect 'k' panicked: kaboom".to_string(),
            "fire_and_forget effect failed: lost".to_string(),
            "run effect failed: boom".to_string(),
        ]
    );
    assert!(store.active_effect_keys().is_empty());
}

#[tokio::test]
async fn cleanup_panic_is_reported_and_key_freed() {
    let (options, errors) = recording_hook();
    let reducer = reducer_fn(|n: Arc<u32>, subscribe: bool, _: &()| {
        if subscribe {
            (n, Effect::subscription("fragile", |_: Dispatch<bool>| || panic!("cleanup exploded")))
        } else {
            (n, Effect::cancel("fragile"))
        }
    });
    let store = Store::with_options(0u32, reducer, (), options).expect("store");

    store.dispatch(true);
    store.dispatch(false);

    assert!(store.active_effect_keys().is_empty());
    assert_eq!(
        *errors.lock(),
        vec!["subscription 'fragile' cleanup panicked: cleanup exploded".to_string()]
    );
}

fn keep_then_panic(send: Dispatch<u32>, kept: &Mutex<Option<Dispatch<u32>>>) -> fn() {
    *kept.lock() = Some(send);
    panic!("setup exploded")
}

#[tokio::test]
async fn setup_panic_frees_key_and_silences_kept_dispatch() {
    let (options, errors) = recording_hook();
    let kept = Arc::new(Mutex::new(None));
    let reducer = reducer_fn(|n: Arc<u32>, action: u32, kept: &Arc<Mutex<Option<Dispatch<u32>>>>| {
        if action > 0 {
            return (Arc::new(*n + action), Effect::none());
        }
        let kept = Arc::clone(kept);
        (n, Effect::subscription("doomed", move |send: Dispatch<u32>| keep_then_panic(send, &kept)))
    });
    let store = Store::with_options(0u32, reducer, Arc::clone(&kept), options).expect("store");

    store.dispatch(0);
    assert!(store.active_effect_keys().is_empty());
    assert_eq!(
        *errors.lock(),
        vec!["subscription 'doomed' setup panicked: setup exploded".to_string()]
    );

    let orphan = kept.lock().take().expect("setup kept its dispatch");
    assert!(orphan.is_cancelled());
    orphan.send(5);
    assert_eq!(*store.state(), 0);
}

#[tokio::test]
async fn reducer_panic_propagates_and_keeps_state() {
    let reducer = reducer_fn(|n: Arc<u32>, action: u32, _: &()| {
        if action == 13 {
            panic!("unlucky");
        }
        (Arc::new(*n + action), Effect::none())
    });
    let store = Store::new(1u32, reducer, ()).expect("store");

    let outcome = catch_unwind(AssertUnwindSafe(|| store.dispatch(13)));
    assert!(outcome.is_err());
    assert_eq!(*store.state(), 1);

    store.dispatch(2);
    assert_eq!(*store.state(), 3);
}
