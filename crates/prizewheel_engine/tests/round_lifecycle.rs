//! Integration test for the synchronous round lifecycle.

use prizewheel_core::{
    Phase, PurchaseRejection, ResetPolicy, Segment, WheelConfig, WheelError, CAPACITY,
};
use prizewheel_engine::{
    EventChannel, GameStateMachine, RoundObserver, RoundSnapshot, RoundState, TickOutcome,
    WheelEvent,
};

fn seeded(countdown_ticks: u32) -> WheelConfig {
    WheelConfig {
        countdown_ticks,
        rng_seed: Some(2024),
        ..WheelConfig::default()
    }
}

#[test]
fn test_fill_then_reject_late_buyer() {
    let mut wheel = GameStateMachine::new(seeded(10)).unwrap();

    wheel.submit_purchase("wallet-a", 40).unwrap();
    let filled = wheel.submit_purchase("wallet-b", 60).unwrap();
    assert!(filled.countdown_started);
    assert_eq!(wheel.phase(), Phase::CountingDown);
    assert_eq!(wheel.remaining_space(), 0);

    let late = wheel.submit_purchase("wallet-c", 5).unwrap_err();
    assert_eq!(
        late,
        PurchaseRejection::RoundNotAccepting {
            phase: Phase::CountingDown
        }
    );
    assert!(late.to_string().contains("round not accepting purchases"));
}

#[test]
fn test_overfill_rejected_and_ledger_unchanged() {
    let mut wheel = GameStateMachine::new(seeded(10)).unwrap();

    wheel.submit_purchase("wallet-a", 50).unwrap();
    let err = wheel.submit_purchase("wallet-b", 60).unwrap_err();
    assert!(err.to_string().contains("exceeds remaining space"));
    assert_eq!(wheel.committed(), 50);
    assert_eq!(wheel.phase(), Phase::Open);

    // Wrapped as a wheel error for callers that use `?`
    let wrapped: WheelError = err.into();
    assert!(matches!(wrapped, WheelError::InvalidPurchase(_)));
}

#[test]
fn test_countdown_starts_on_exact_fill_not_before() {
    let mut wheel = GameStateMachine::new(seeded(2)).unwrap();
    for i in 0..9 {
        let receipt = wheel.submit_purchase(format!("w{i}"), 11).unwrap();
        assert!(!receipt.countdown_started);
        assert_eq!(wheel.phase(), Phase::Open);
    }
    assert_eq!(wheel.remaining_space(), 1);

    let receipt = wheel.submit_purchase("w9", 1).unwrap();
    assert!(receipt.countdown_started);
    assert_eq!(wheel.phase(), Phase::CountingDown);
}

#[test]
fn test_many_rounds_reset_cleanly() {
    let mut wheel = GameStateMachine::new(seeded(1)).unwrap();

    for round in 1..=25u64 {
        assert_eq!(wheel.round(), round);
        wheel.submit_purchase("whale", 100).unwrap();
        let TickOutcome::DrawStarted(draw) = wheel.tick().unwrap() else {
            panic!("round {round}: expected the draw");
        };
        assert_eq!(draw.round, round);

        let result = wheel.notify_animation_complete().unwrap();
        assert_eq!(result.winning_index, draw.winning_index);
        assert_eq!(result.purchases.len(), 1);

        wheel.reset().unwrap();
        assert_eq!(wheel.phase(), Phase::Open);
        assert_eq!(wheel.committed(), 0);
        assert!(wheel.purchases().is_empty());
    }
}

#[test]
fn test_drawn_segment_is_under_pointer() {
    let mut wheel = GameStateMachine::new(WheelConfig {
        reset_policy: ResetPolicy::Immediate,
        ..seeded(0)
    })
    .unwrap();

    for _ in 0..200 {
        wheel.submit_purchase("a", 100).unwrap();
        let draw = wheel.pending_draw().unwrap().clone();
        let shown = wheel.segments().index_at_angle(draw.plan.resting_angle());
        assert_eq!(shown, draw.winning_index);
        wheel.notify_animation_complete().unwrap();
    }
}

#[test]
fn test_event_stream_for_one_round() {
    let channel = EventChannel::unbounded();
    let mut wheel = GameStateMachine::new(seeded(2))
        .unwrap()
        .with_observer(Box::new(channel.observer()));

    wheel.submit_purchase("wallet-a", 30).unwrap();
    wheel.submit_purchase("wallet-b", 70).unwrap();
    wheel.tick().unwrap();
    wheel.tick().unwrap();
    wheel.notify_animation_complete().unwrap();
    wheel.record_receipt("SALE-0001").unwrap();

    let events = channel.drain();
    let kinds: Vec<&str> = events
        .iter()
        .map(|e| match e {
            WheelEvent::PhaseChanged { .. } => "phase",
            WheelEvent::PurchaseAccepted { .. } => "purchase",
            WheelEvent::CountdownTick { .. } => "tick",
            WheelEvent::DrawStarted(_) => "draw",
            WheelEvent::RoundResolved(_) => "resolved",
            WheelEvent::ReceiptRecorded { .. } => "receipt",
        })
        .collect();
    assert_eq!(
        kinds,
        [
            "purchase", "purchase", "phase", "tick", "tick", "phase", "draw", "phase",
            "resolved", "receipt", "phase"
        ]
    );
    assert_eq!(
        events.last(),
        Some(&WheelEvent::PhaseChanged {
            phase: Phase::Open,
            remaining_space: CAPACITY
        })
    );
    let Some(WheelEvent::ReceiptRecorded { result, receipt }) = events.get(9) else {
        panic!("expected receipt event");
    };
    assert_eq!(receipt, "SALE-0001");
    assert_eq!(result.receipt.as_deref(), Some("SALE-0001"));
}

#[test]
fn test_several_observers_each_see_events() {
    let first = EventChannel::unbounded();
    let second = EventChannel::unbounded();
    let observers: Vec<Box<dyn RoundObserver>> =
        vec![Box::new(first.observer()), Box::new(second.observer())];

    let mut wheel = GameStateMachine::new(seeded(3))
        .unwrap()
        .with_observer(Box::new(observers));
    wheel.submit_purchase("a", 100).unwrap();

    assert_eq!(first.drain(), second.drain());
}

#[test]
fn test_new_segments_apply_to_next_round() {
    let mut wheel = GameStateMachine::new(WheelConfig {
        reset_policy: ResetPolicy::Immediate,
        ..seeded(0)
    })
    .unwrap();

    wheel.submit_purchase("a", 100).unwrap();
    assert!(wheel.load_segments(vec![Segment::new("x", 1.0, "")]).is_err());
    wheel.notify_animation_complete().unwrap();

    wheel
        .load_segments(vec![Segment::new("Only prize", 5.0, "#000000")])
        .unwrap();
    wheel.submit_purchase("a", 100).unwrap();
    assert_eq!(wheel.winner().unwrap().label, "Only prize");
}

#[test]
fn test_restore_after_interruption() {
    let mut wheel = GameStateMachine::new(seeded(6)).unwrap();
    wheel.submit_purchase("wallet-a", 25).unwrap();
    wheel.submit_purchase("wallet-b", 75).unwrap();
    for _ in 0..4 {
        wheel.tick().unwrap();
    }
    let snapshot = wheel.snapshot();
    assert_eq!(
        snapshot.state,
        RoundState::CountingDown { ticks_remaining: 2 }
    );
    drop(wheel);

    let mut resumed = GameStateMachine::restore(seeded(6), snapshot).unwrap();
    assert_eq!(resumed.round(), 1);
    assert_eq!(resumed.committed(), CAPACITY);
    assert_eq!(
        resumed.tick().unwrap(),
        TickOutcome::Counting { ticks_remaining: 1 }
    );
    assert!(matches!(resumed.tick().unwrap(), TickOutcome::DrawStarted(_)));
}

fn through_toml(snapshot: &RoundSnapshot) -> RoundSnapshot {
    let text = toml::to_string(snapshot).unwrap();
    let parsed: RoundSnapshot = toml::from_str(&text).unwrap();
    assert_eq!(&parsed, snapshot, "snapshot changed on disk:\n{text}");
    parsed
}

#[test]
fn test_snapshot_survives_toml_round_trip() {
    let mut wheel = GameStateMachine::new(seeded(3)).unwrap();
    wheel.submit_purchase("wallet-a", 45).unwrap();
    wheel.submit_purchase("wallet-b", 55).unwrap();
    wheel.tick().unwrap();

    // Counting down: the remaining ticks carry over
    let counting = through_toml(&wheel.snapshot());
    let mut resumed = GameStateMachine::restore(seeded(3), counting).unwrap();
    assert_eq!(resumed.ticks_remaining(), Some(2));
    assert_eq!(resumed.purchases(), wheel.purchases());
    assert_eq!(
        resumed.tick().unwrap(),
        TickOutcome::Counting { ticks_remaining: 1 }
    );

    // Drawing: the display can replay the same spin
    wheel.tick().unwrap();
    let TickOutcome::DrawStarted(draw) = wheel.tick().unwrap() else {
        panic!("expected the draw");
    };
    let drawing = through_toml(&wheel.snapshot());
    let mut resumed = GameStateMachine::restore(seeded(3), drawing).unwrap();
    assert_eq!(resumed.pending_draw(), Some(&draw));
    let replayed = resumed.notify_animation_complete().unwrap();
    assert_eq!(replayed.winner, draw.winner);

    // Resolved: the receipt can still be recorded
    let result = wheel.notify_animation_complete().unwrap();
    let resolved = through_toml(&wheel.snapshot());
    let mut resumed = GameStateMachine::restore(seeded(3), resolved).unwrap();
    assert_eq!(resumed.phase(), Phase::Resolved);
    assert_eq!(resumed.result(), Some(&result));
    let recorded = resumed.record_receipt("SALE-0007").unwrap();
    assert_eq!(recorded.receipt.as_deref(), Some("SALE-0007"));
    assert_eq!(resumed.phase(), Phase::Open);
    assert_eq!(resumed.round(), 2);
}
