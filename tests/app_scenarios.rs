mod common;

use common::{demo_env, ms};
use std::sync::Arc;
use unistore::features::app::{AppAction, AppReducer, AppState};
use unistore::features::counter::{CounterAction, CounterReducer, CounterState, TAP_KEY};
use unistore::features::dashboard::{dashboard_reducer, DashboardAction, DashboardState};
use unistore::features::detail::{DetailAction, TIMER_KEY};
use unistore::features::search::{SearchAction, SEARCH_KEY};
use unistore::{PresentationAction, Scope, TestStore, VirtualClock};

fn app_store() -> TestStore<AppReducer> {
    TestStore::new(AppState::default(), AppReducer::new(), demo_env())
}

fn open_detail(store: &mut TestStore<AppReducer>) {
    store.send(
        AppAction::OpenDetail {
            id: 7,
            title: "tokio".into(),
        },
        |state| assert_eq!(state.detail.as_ref().map(|d| d.id), Some(7)),
    );
}

#[tokio::test]
async fn counter_change_leaves_sibling_reference_untouched() {
    let mut store = app_store();
    let before = store.state();

    store.send(AppAction::Counter(CounterAction::Increment), |state| {
        assert_eq!(state.counter.count, 1);
    });

    let after = store.state();
    assert!(!Arc::ptr_eq(&before, &after));
    assert!(Arc::ptr_eq(&before.search, &after.search));
    assert!(!Arc::ptr_eq(&before.counter, &after.counter));

    store.send(AppAction::Counter(CounterAction::Reset), |state| {
        assert_eq!(state.counter.count, 0);
    });
    let reset = store.state();
    store.send(AppAction::Counter(CounterAction::Reset), |_| {});
    assert!(Arc::ptr_eq(&reset, &store.state()));
}

#[tokio::test]
async fn debounced_search_only_runs_last_query() {
    let mut store = app_store();

    // Typed at t=0, t=100 and t=200.
    for (i, query) in ["t", "to", "tok"].into_iter().enumerate() {
        if i > 0 {
            store.advance_time(ms(100)).await;
        }
        store.send(AppAction::Search(SearchAction::QueryChanged(query.into())), |state| {
            assert_eq!(state.search.query, query);
            assert!(state.search.loading);
        });
    }
    assert_eq!(store.store().active_effect_keys(), vec![SEARCH_KEY]);

    store.advance_time(ms(400)).await;
    store
        .receive(
            AppAction::Search(SearchAction::ResultsLoaded {
                query: "tok".into(),
                results: vec!["tokio".into()],
            }),
            |state| {
                assert_eq!(state.search.results, vec!["tokio".to_string()]);
                assert!(!state.search.loading);
                assert_eq!(state.search.completed_searches, 1);
            },
        )
        .await;

    store.advance_time(ms(1000)).await;
    store.assert_no_pending_actions();
    assert!(store.store().active_effect_keys().is_empty());
}

#[tokio::test]
async fn clearing_query_cancels_pending_search() {
    let mut store = app_store();
    store.send(AppAction::Search(SearchAction::QueryChanged("serde".into())), |_| {});
    store.send(AppAction::Search(SearchAction::QueryChanged(String::new())), |state| {
        assert!(state.search.query.is_empty());
        assert!(!state.search.loading);
    });

    store.advance_time(ms(1000)).await;
    store.assert_no_pending_actions();
}

#[tokio::test]
async fn dismiss_cancels_detail_timer() {
    let mut store = app_store();
    open_detail(&mut store);

    store.send(
        AppAction::Detail(PresentationAction::Presented(DetailAction::StartTimer)),
        |state| assert!(state.detail.as_ref().is_some_and(|d| d.timer_running)),
    );
    assert_eq!(store.store().active_effect_keys(), vec![TIMER_KEY]);

    store.send(AppAction::Detail(PresentationAction::Dismiss), |state| {
        assert!(state.detail.is_none());
    });
    assert!(store.store().active_effect_keys().is_empty());

    store.send(
        AppAction::Detail(PresentationAction::Presented(DetailAction::Tick)),
        |state| assert!(state.detail.is_none()),
    );
}

#[tokio::test]
async fn child_can_dismiss_itself() {
    let mut store = app_store();
    open_detail(&mut store);

    store.send(
        AppAction::Detail(PresentationAction::Presented(DetailAction::Close)),
        |state| assert!(state.detail.is_some()),
    );
    store
        .receive(AppAction::Detail(PresentationAction::Dismiss), |state| {
            assert!(state.detail.is_none());
        })
        .await;
}

#[tokio::test]
async fn throttled_tap_fires_immediately_then_cools_down() {
    let env = demo_env();
    let cooldown = env.throttle;
    let mut store = TestStore::new(CounterState::default(), CounterReducer, env);

    store.send(CounterAction::Tap, |state| assert_eq!(state.count, 0));
    store
        .receive(CounterAction::Increment, |state| assert_eq!(state.count, 1))
        .await;

    store.send(CounterAction::Tap, |_| {});
    store.settle().await;
    store.assert_no_pending_actions();
    assert_eq!(store.store().active_effect_keys(), vec![TAP_KEY]);

    store.advance_time(cooldown).await;
    assert!(store.store().active_effect_keys().is_empty());

    store.send(CounterAction::Tap, |_| {});
    store
        .receive(CounterAction::Increment, |state| assert_eq!(state.count, 2))
        .await;
}

#[tokio::test]
async fn delayed_increment_waits_for_virtual_time() {
    let mut store = TestStore::new(CounterState::default(), CounterReducer, demo_env());
    store.send(CounterAction::IncrementAfter(ms(500)), |_| {});

    store.advance_time(ms(499)).await;
    store.assert_no_pending_actions();

    store.advance_time(ms(1)).await;
    store
        .receive(CounterAction::Increment, |state| assert_eq!(state.count, 1))
        .await;
}

#[tokio::test]
async fn dashboard_ignores_blank_notes() {
    let mut store = TestStore::new(DashboardState::default(), dashboard_reducer(), demo_env());
    let before = store.state();

    store.send(DashboardAction::Note("   ".into()), |_| {});
    assert!(Arc::ptr_eq(&before, &store.state()));

    store.send(DashboardAction::Counter(CounterAction::Increment), |state| {
        assert_eq!(state.counter.count, 1);
        assert!(state.activity.entries.is_empty());
    });
    assert!(Arc::ptr_eq(&before.activity, &store.state().activity));
}

#[tokio::test]
async fn receive_matching_accepts_partial_match() {
    let mut store = app_store();
    store.send(AppAction::Search(SearchAction::QueryChanged("serde".into())), |_| {});
    store.advance_time(ms(300)).await;
    store
        .receive_matching(
            |action| {
                matches!(
                    action.search(),
                    Some(SearchAction::ResultsLoaded { query, .. }) if query == "serde"
                )
            },
            |state| assert_eq!(state.search.results.len(), 2),
        )
        .await;
}

#[tokio::test]
async fn detail_timer_ticks_on_virtual_time() {
    let clock = VirtualClock::new();
    let env = demo_env().with_clock(clock.clone());
    let mut store = TestStore::with_clock(AppState::default(), AppReducer::new(), env, clock);
    open_detail(&mut store);

    store.send(
        AppAction::Detail(PresentationAction::Presented(DetailAction::StartTimer)),
        |_| {},
    );
    store.advance_time(ms(2000)).await;
    for expected in 1..=2 {
        store
            .receive(
                AppAction::Detail(PresentationAction::Presented(DetailAction::Tick)),
                |state| assert_eq!(state.detail.as_ref().map(|d| d.ticks), Some(expected)),
            )
            .await;
    }

    store.send(AppAction::Detail(PresentationAction::Dismiss), |state| {
        assert!(state.detail.is_none());
    });
    store.advance_time(ms(5000)).await;
    store.assert_no_pending_actions();
}

#[tokio::test]
async fn delayed_counter_action_is_lifted_into_app() {
    let mut store = app_store();
    store.send(AppAction::Counter(CounterAction::IncrementAfter(ms(200))), |_| {});
    store.advance_time(ms(200)).await;
    store
        .receive_matching(
            |action| action.counter() == Some(&CounterAction::Increment),
            |state| assert_eq!(state.counter.count, 1),
        )
        .await;
}

#[derive(Debug, Clone)]
struct Profile {
    counter: Arc<CounterState>,
    user: Arc<String>,
}

#[derive(Debug, Clone, PartialEq)]
enum ProfileAction {
    Counter(CounterAction),
}

#[tokio::test]
async fn scoped_counter_leaves_user_untouched() {
    let reducer = Scope::new(
        |profile: &Profile| Arc::clone(&profile.counter),
        |profile: &Profile, counter| Profile {
            counter,
            ..profile.clone()
        },
        |action: ProfileAction| match action {
            ProfileAction::Counter(action) => Some(action),
        },
        ProfileAction::Counter,
        CounterReducer,
    );
    let initial = Profile {
        counter: Arc::new(CounterState::new(0)),
        user: Arc::new("Alice".to_string()),
    };
    let user = Arc::clone(&initial.user);
    let mut store = TestStore::new(initial, reducer, demo_env());

    store.send(ProfileAction::Counter(CounterAction::Increment), |profile| {
        assert_eq!(profile.counter.count, 1);
        assert_eq!(*profile.user, "Alice");
    });
    assert!(Arc::ptr_eq(&store.state().user, &user));
}
