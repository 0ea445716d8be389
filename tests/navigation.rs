//! End-to-end navigation scenarios.

use serde_json::{json, Value};
use std::cell::RefCell;
use std::rc::Rc;
use waypoint::builder::EngineBuilder;
use waypoint::checkpoint::{MemoryStore, SnapshotStore};
use waypoint::core::{Guard, StateDefinition};
use waypoint::engine::{EngineConfig, EngineError, EngineEvent, Rejection, Transition};
use waypoint::{graph, TransitionEngine};

fn abc_builder() -> EngineBuilder {
    graph! {
        initial: "A",
        "A" => ["B"],
        "B" => ["A", "C"],
        "C" => [],
    }
}

fn abc() -> TransitionEngine {
    abc_builder().build().unwrap()
}

fn abc_persisted(store: &MemoryStore) -> TransitionEngine {
    abc_builder().persist_to(store.clone()).build().unwrap()
}

fn record_events(engine: &TransitionEngine) -> Rc<RefCell<Vec<EngineEvent>>> {
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    engine.subscribe(move |event| sink.borrow_mut().push(event.clone()));
    events
}

#[test]
fn walkthrough_with_truncating_history() {
    let engine = abc();

    assert_eq!(
        engine.transition("C").unwrap(),
        Transition::Rejected(Rejection::NotAllowed)
    );
    assert_eq!(engine.current_name(), "A");

    assert!(engine.transition("B").unwrap().is_committed());
    assert_eq!(engine.current_name(), "B");

    assert!(engine.transition("C").unwrap().is_committed());
    assert_eq!(engine.current_name(), "C");
    assert_eq!(engine.history().entries(), ["A", "B", "C"]);
    assert_eq!(engine.cursor(), 2);

    assert!(engine.back().unwrap());
    assert_eq!(engine.current_name(), "B");
    assert_eq!(engine.cursor(), 1);

    assert!(engine.transition("A").unwrap().is_committed());
    assert_eq!(engine.history().entries(), ["A", "B", "A"]);
    assert_eq!(engine.cursor(), 2);
}

#[test]
fn vetoing_before_hook_blocks_legal_transition() {
    let engine = abc();
    let events = record_events(&engine);
    engine.before_transition(|_, _| false);

    assert_eq!(
        engine.transition("B").unwrap(),
        Transition::Rejected(Rejection::Vetoed)
    );
    assert_eq!(engine.current_name(), "A");
    assert_eq!(engine.history().entries(), ["A"]);
    assert!(events.borrow().is_empty());
}

#[test]
fn failing_before_hook_vetoes() {
    let engine = abc();
    engine.try_before_transition(|_, _| Err("unsaved changes".into()));

    assert_eq!(
        engine.transition("B").unwrap().rejection(),
        Some(Rejection::Vetoed)
    );
    assert_eq!(engine.current_name(), "A");
}

#[test]
fn guard_rejection_leaves_state_untouched() {
    let engine = EngineBuilder::new()
        .initial("home")
        .state(StateDefinition::new("home").to("admin"))
        .state(StateDefinition::new("admin").guard(Guard::new(|_| false)))
        .build()
        .unwrap();
    let events = record_events(&engine);

    assert_eq!(
        engine.transition("admin").unwrap(),
        Transition::Rejected(Rejection::GuardRejected)
    );
    assert_eq!(engine.current_name(), "home");
    assert!(events.borrow().is_empty());
}

#[test]
fn guard_fault_is_an_error_not_a_rejection() {
    let engine = EngineBuilder::new()
        .initial("home")
        .state(StateDefinition::new("home").to("admin"))
        .state(
            StateDefinition::new("admin")
                .guard(Guard::fallible(|_| Err("auth service down".into())).named("auth")),
        )
        .build()
        .unwrap();

    match engine.transition("admin") {
        Err(EngineError::Guard { from, to, failure }) => {
            assert_eq!(from, "home");
            assert_eq!(to, "admin");
            assert_eq!(failure.name.as_deref(), Some("auth"));
            assert_eq!(failure.message, "auth service down");
        }
        other => panic!("expected guard error, got {other:?}"),
    }
    assert_eq!(engine.current_name(), "home");
}

#[test]
fn guards_receive_from_to_and_payload() {
    let seen = Rc::new(RefCell::new(None));
    let sink = Rc::clone(&seen);
    let engine = EngineBuilder::new()
        .initial("list")
        .state(StateDefinition::new("list").to("detail"))
        .state(StateDefinition::new("detail").to("list"))
        .guard(
            "detail",
            Guard::new(move |ctx| {
                *sink.borrow_mut() = Some((
                    ctx.from.to_string(),
                    ctx.to.to_string(),
                    ctx.payload.clone(),
                ));
                true
            }),
        )
        .build()
        .unwrap();

    engine.transition_to("detail", json!({"id": 42})).unwrap();

    assert_eq!(
        *seen.borrow(),
        Some(("list".to_string(), "detail".to_string(), json!({"id": 42})))
    );
}

#[test]
fn commit_then_after_hooks_then_subscribers() {
    let engine = abc();
    let order = Rc::new(RefCell::new(Vec::new()));

    let log = Rc::clone(&order);
    engine.before_transition(move |from, to| {
        log.borrow_mut().push(format!("before {from}->{to}"));
        true
    });

    let log = Rc::clone(&order);
    engine.after_transition(move |from, to| log.borrow_mut().push(format!("after {from}->{to}")));

    for n in 0..2 {
        let log = Rc::clone(&order);
        engine.subscribe(move |event| {
            if let Some(change) = event.as_state_change() {
                log.borrow_mut()
                    .push(format!("subscriber{n} {}->{}", change.from, change.to));
            }
        });
    }

    engine.transition_to("B", json!({"source": "menu"})).unwrap();

    assert_eq!(
        *order.borrow(),
        vec![
            "before A->B",
            "after A->B",
            "subscriber0 A->B",
            "subscriber1 A->B",
        ]
    );
}

#[test]
fn state_change_event_carries_payload() {
    let engine = abc();
    let events = record_events(&engine);

    engine.transition_to("B", json!({"tab": 2})).unwrap();

    let events = events.borrow();
    let change = events[0].as_state_change().unwrap();
    assert_eq!(change.from, "A");
    assert_eq!(change.to, "B");
    assert_eq!(change.payload, json!({"tab": 2}));
}

#[test]
fn after_hook_fault_is_reported_without_rollback() {
    let engine = abc();
    let events = record_events(&engine);
    engine.try_after_transition(|_, _| Err("metrics endpoint unreachable".into()));

    assert!(engine.transition("B").unwrap().is_committed());
    assert_eq!(engine.current_name(), "B");

    let events = events.borrow();
    assert_eq!(events.len(), 2);
    assert_eq!(
        events[0],
        EngineEvent::HookFailed {
            from: "A".to_string(),
            to: "B".to_string(),
            message: "metrics endpoint unreachable".to_string(),
        }
    );
    assert!(events[1].as_state_change().is_some());
}

#[test]
fn after_hooks_see_committed_state() {
    let engine = Rc::new(abc());
    let seen = Rc::new(RefCell::new(String::new()));

    let observer = Rc::downgrade(&engine);
    let sink = Rc::clone(&seen);
    engine.after_transition(move |_, _| {
        if let Some(engine) = observer.upgrade() {
            *sink.borrow_mut() = engine.current_name();
        }
    });

    engine.transition("B").unwrap();
    assert_eq!(*seen.borrow(), "B");
}

#[test]
fn reentrant_transition_is_rejected() {
    let engine = Rc::new(abc());
    let inner_result = Rc::new(RefCell::new(None));

    let handle = Rc::downgrade(&engine);
    let sink = Rc::clone(&inner_result);
    engine.before_transition(move |_, to| {
        if to == "B" {
            if let Some(engine) = handle.upgrade() {
                *sink.borrow_mut() = Some(engine.transition("A"));
            }
        }
        true
    });

    assert!(engine.transition("B").unwrap().is_committed());
    assert!(matches!(
        inner_result.borrow().as_ref(),
        Some(Err(EngineError::Reentrancy))
    ));
    assert_eq!(engine.history().entries(), ["A", "B"]);

    // The flag is released once the outer call returns.
    assert!(engine.transition("A").unwrap().is_committed());
}

#[test]
fn removed_hook_and_subscriber_stop_running() {
    let engine = abc();
    let events = Rc::new(RefCell::new(0));

    let veto = engine.before_transition(|_, _| false);
    let counter = Rc::clone(&events);
    let subscription = engine.subscribe(move |_| *counter.borrow_mut() += 1);

    assert!(!engine.transition("B").unwrap().is_committed());
    assert!(engine.remove_hook(veto));
    assert!(engine.unsubscribe(subscription));
    assert!(!engine.unsubscribe(subscription));

    assert!(engine.transition("B").unwrap().is_committed());
    assert_eq!(*events.borrow(), 0);
}

#[test]
fn time_travel_bypasses_guards_and_hooks() {
    let engine = EngineBuilder::new()
        .initial("A")
        .state(StateDefinition::new("A").to("B"))
        .state(StateDefinition::new("B").to("C"))
        .state(StateDefinition::new("C"))
        .build()
        .unwrap();
    engine.transition("B").unwrap();
    engine.transition("C").unwrap();

    let hook_calls = Rc::new(RefCell::new(0));
    let counter = Rc::clone(&hook_calls);
    engine.before_transition(move |_, _| {
        *counter.borrow_mut() += 1;
        false
    });
    let events = record_events(&engine);

    // C has no edge back to A, and every hook vetoes, yet time travel works.
    assert!(engine.go_to(0).unwrap());
    assert_eq!(engine.current_name(), "A");
    assert!(engine.forward().unwrap());
    assert_eq!(engine.current_name(), "B");
    assert_eq!(*hook_calls.borrow(), 0);

    let events = events.borrow();
    assert_eq!(
        events[0],
        EngineEvent::TimeTravel {
            from: "C".to_string(),
            to: "A".to_string(),
            cursor: 0,
        }
    );
    assert!(events.iter().all(|e| e.as_state_change().is_none()));
}

#[test]
fn back_and_forward_stop_at_the_ends() {
    let engine = abc();
    let events = record_events(&engine);

    assert!(!engine.back().unwrap());
    assert!(!engine.forward().unwrap());
    assert!(!engine.go_to(0).unwrap());
    assert!(events.borrow().is_empty());

    assert!(matches!(
        engine.go_to(1),
        Err(EngineError::IndexOutOfRange { index: 1, len: 1 })
    ));
}

#[test]
fn save_and_restore_round_trip() {
    let store = MemoryStore::new();
    let engine = abc_persisted(&store);
    engine.transition("B").unwrap();
    engine.transition("C").unwrap();
    engine.back().unwrap();

    let reloaded = abc_persisted(&store);
    assert_eq!(reloaded.current_name(), "A");
    let events = record_events(&reloaded);

    assert!(reloaded.restore().unwrap());
    assert_eq!(reloaded.current_name(), "B");
    assert_eq!(reloaded.history().entries(), ["A", "B", "C"]);
    assert_eq!(reloaded.cursor(), 1);
    assert_eq!(
        events.borrow()[0],
        EngineEvent::Restored {
            current: "B".to_string(),
            cursor: 1,
        }
    );

    assert!(reloaded.forward().unwrap());
    assert_eq!(reloaded.current_name(), "C");
}

#[test]
fn restore_without_snapshot_keeps_initial_state() {
    let store = MemoryStore::new();
    let engine = abc_persisted(&store);

    assert!(!engine.restore().unwrap());
    assert_eq!(engine.current_name(), "A");
}

#[test]
fn stale_snapshot_falls_back_to_initial_state() {
    let store = MemoryStore::new();
    let engine = abc_persisted(&store);
    engine.transition("B").unwrap();

    // A snapshot written by an older graph that had a "Removed" state.
    store
        .set(
            "waypoint.snapshot",
            json!({"current": "Removed", "history": ["A", "Removed"], "cursor": 1}).to_string(),
        )
        .unwrap();

    match engine.restore() {
        Err(EngineError::StaleSnapshot { state }) => assert_eq!(state, "Removed"),
        other => panic!("expected stale snapshot, got {other:?}"),
    }
    assert_eq!(engine.current_name(), "A");
    assert_eq!(engine.history().entries(), ["A"]);

    // The fresh snapshot replaces the stale one, so the next restore succeeds.
    let stored: Value =
        serde_json::from_str(&store.get("waypoint.snapshot").unwrap().unwrap()).unwrap();
    assert_eq!(stored, json!({"current": "A", "history": ["A"], "cursor": 0}));
    assert!(engine.restore().unwrap());
    assert_eq!(engine.current_name(), "A");
}

#[test]
fn inconsistent_snapshot_changes_nothing() {
    let store = MemoryStore::new();
    let engine = abc_persisted(&store);
    engine.transition("B").unwrap();

    store
        .set(
            "waypoint.snapshot",
            json!({"current": "A", "history": ["A"], "cursor": 4}).to_string(),
        )
        .unwrap();

    assert!(matches!(
        engine.restore(),
        Err(EngineError::Persistence(_))
    ));
    assert_eq!(engine.current_name(), "B");
}

#[test]
fn time_travel_persistence_can_be_disabled() {
    let store = MemoryStore::new();
    let engine = EngineBuilder::new()
        .initial("A")
        .states([StateDefinition::new("A").to("B"), StateDefinition::new("B")])
        .config(EngineConfig {
            persist_time_travel: false,
            ..EngineConfig::default()
        })
        .persist_to(store.clone())
        .build()
        .unwrap();

    engine.transition("B").unwrap();
    engine.back().unwrap();

    let stored: Value =
        serde_json::from_str(&store.get("waypoint.snapshot").unwrap().unwrap()).unwrap();
    assert_eq!(stored["current"], "B");
    assert_eq!(stored["cursor"], 1);
}

#[test]
fn history_limit_keeps_cursor_valid() {
    let engine = graph! {
        initial: "A",
        "A" => ["B"],
        "B" => ["A"],
    }
    .config(EngineConfig {
        history_limit: Some(3),
        ..EngineConfig::default()
    })
    .build()
    .unwrap();

    for target in ["B", "A", "B", "A", "B"] {
        engine.transition(target).unwrap();
    }

    let history = engine.history();
    assert_eq!(history.entries(), ["B", "A", "B"]);
    assert_eq!(history.cursor(), 2);
    assert_eq!(history.transitions().len(), 3);
    assert_eq!(engine.entries(), ["B", "A", "B"]);
    assert_eq!(engine.current_name(), "B");
}

#[test]
fn long_session_keeps_bounded_history() {
    let engine = graph! {
        initial: "A",
        "A" => ["B"],
        "B" => ["A"],
    }
    .config(EngineConfig {
        history_limit: Some(2),
        ..EngineConfig::default()
    })
    .build()
    .unwrap();

    for i in 0..10_000 {
        engine.transition(if i % 2 == 0 { "B" } else { "A" }).unwrap();
    }

    let history = engine.history();
    assert_eq!(history.len(), 2);
    assert_eq!(history.transitions().len(), 2);
    assert_eq!(engine.entries(), ["B", "A"]);
}

#[test]
fn independent_engines_do_not_interfere() {
    let first = abc();
    let second = abc();

    first.transition("B").unwrap();

    assert_eq!(first.current_name(), "B");
    assert_eq!(second.current_name(), "A");
}

#[test]
fn export_round_trips_through_json_definition() {
    let engine = abc();
    let export = engine.export_state_graph();

    let json = serde_json::to_value(&export).unwrap();
    assert_eq!(json["initial"], "A");
    assert_eq!(json["states"][1]["name"], "B");
    assert_eq!(json["states"][1]["allowedTransitions"], json!(["A", "C"]));
    assert_eq!(json["states"][1]["hasGuards"], false);

    let rebuilt = EngineBuilder::from_definition((&export).into())
        .build()
        .unwrap();
    assert_eq!(rebuilt.export_state_graph(), export);
}

#[test]
fn current_state_exposes_metadata() {
    let engine = EngineBuilder::from_json(
        r#"{
            "initial": "home",
            "states": {
                "home": { "allowedTransitions": ["about"], "metadata": { "title": "Home" } },
                "about": { "allowedTransitions": ["home"] }
            }
        }"#,
    )
    .unwrap()
    .build()
    .unwrap();

    assert_eq!(
        engine.current_state().get_metadata(),
        Some(&json!({"title": "Home"}))
    );
}
