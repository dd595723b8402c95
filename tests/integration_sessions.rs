use assert_matches::assert_matches;
use lockbuster::{
    best_key, Category, Difficulty, EngineError, EngineSettings, GestureChallenge, GesturePicker,
    ManualClock, MemoryScoreStore, Mode, Phase, SessionEngine, StoreError,
};
use lockbuster::mode::MAX_SEQUENCE_LEN;
use proptest::prelude::*;

fn engine_with(
    store: MemoryScoreStore,
    clock: ManualClock,
    seed: u64,
) -> SessionEngine<MemoryScoreStore, ManualClock> {
    SessionEngine::new(
        store,
        clock,
        GesturePicker::seeded(seed),
        EngineSettings::default(),
    )
}

fn engine(seed: u64) -> SessionEngine<MemoryScoreStore, ManualClock> {
    engine_with(MemoryScoreStore::new(), ManualClock::new(), seed)
}

/// Complete every challenge of the current chess clock round
fn finish_round(engine: &mut SessionEngine<MemoryScoreStore, ManualClock>) -> bool {
    loop {
        let step = engine.on_gesture_completed().unwrap();
        if step.round_completed {
            return step.tier_advanced;
        }
    }
}

#[test]
fn speedrun_to_25_reaches_tier_3_with_elapsed_time() {
    let clock = ManualClock::new();
    let mut engine = engine_with(MemoryScoreStore::new(), clock.clone(), 3);
    engine
        .start(Mode::Speedrun, Category::TargetScore(25))
        .unwrap();
    assert_eq!(engine.thresholds(), &[7, 14, 21]);

    for i in 0..25 {
        clock.advance_secs(0.25);
        let step = engine.on_gesture_completed().unwrap();
        assert_eq!(step.finished, i == 24);
    }

    assert!(engine.is_terminal());
    assert_eq!(engine.tier(), 3);
    assert_eq!(engine.final_metric(), Some(6.25));
}

#[test]
fn countdown_expires_in_one_tick_with_zero_score() {
    let mut engine = engine(9);
    engine.start(Mode::Countdown, Category::TimeLimit(30)).unwrap();
    assert_eq!(engine.thresholds(), &[6, 12, 18, 24, 30]);

    let step = engine.on_clock_tick(30.0).unwrap();
    assert!(step.finished);
    assert!(engine.is_terminal());
    assert_eq!(engine.final_metric(), Some(0.0));
}

#[test]
fn events_after_termination_are_rejected() {
    let mut engine = engine(9);
    engine.start(Mode::Countdown, Category::TimeLimit(30)).unwrap();
    engine.on_gesture_completed().unwrap();
    engine.on_clock_tick(31.0).unwrap();
    assert_eq!(engine.final_metric(), Some(1.0));

    assert_matches!(
        engine.on_gesture_completed(),
        Err(EngineError::InvalidTransition {
            phase: Phase::Terminal,
            ..
        })
    );
    assert_matches!(
        engine.on_clock_tick(1.0),
        Err(EngineError::InvalidTransition {
            phase: Phase::Terminal,
            ..
        })
    );
    assert_eq!(engine.final_metric(), Some(1.0));
}

#[test]
fn frozen_clock_holds_then_resumes() {
    let settings = EngineSettings {
        countdown_freeze: lockbuster::mode::FreezeRule {
            chance: 1.0,
            duration: 3.0,
        },
        ..EngineSettings::default()
    };
    let mut engine = SessionEngine::new(
        MemoryScoreStore::new(),
        ManualClock::new(),
        GesturePicker::seeded(21),
        settings,
    );
    engine.start(Mode::Countdown, Category::TimeLimit(60)).unwrap();
    assert_eq!(engine.current_challenge(), Some(GestureChallenge::Freeze));

    engine.on_gesture_completed().unwrap();
    assert!(engine.is_frozen());

    for _ in 0..5 {
        engine.on_clock_tick(0.5).unwrap();
        assert_eq!(engine.remaining_time(), Some(60.0));
    }
    let step = engine.on_clock_tick(0.5).unwrap();
    assert!(step.thawed);
    assert!(!engine.is_frozen());
    assert_eq!(engine.remaining_time(), Some(60.0));

    engine.on_clock_tick(1.0).unwrap();
    assert_eq!(engine.remaining_time(), Some(59.0));
}

#[test]
fn chess_clock_freeze_round_pauses_clock() {
    // Round draws are either a lone freeze lock or regular gestures; play until one shows up.
    let mut engine = engine(4);
    engine
        .start(Mode::ChessClock, Category::Difficulty(Difficulty::Hard))
        .unwrap();

    let mut guard = 0;
    while engine.current_challenge() != Some(GestureChallenge::Freeze) {
        finish_round(&mut engine);
        engine.on_clock_tick(0.5).unwrap();
        guard += 1;
        assert!(guard < 200, "no freeze round drawn");
    }
    assert_eq!(engine.challenges().len(), 1);

    let before = engine.remaining_time().unwrap();
    let step = engine.on_gesture_completed().unwrap();
    assert!(step.froze);
    assert!(step.round_completed);
    let after_increment = engine.remaining_time().unwrap();
    assert_eq!(after_increment, before + 2.5);

    engine.on_clock_tick(1.5).unwrap();
    assert_eq!(engine.remaining_time(), Some(after_increment));
    engine.on_clock_tick(0.5).unwrap();
    assert!(!engine.is_frozen());
}

#[test]
fn finalize_twice_returns_same_summary_and_writes_once() {
    let clock = ManualClock::new();
    let mut engine = engine_with(MemoryScoreStore::new(), clock.clone(), 8);
    engine
        .start(Mode::Speedrun, Category::TargetScore(25))
        .unwrap();
    clock.advance_secs(20.0);
    for _ in 0..25 {
        engine.on_gesture_completed().unwrap();
    }

    let first = engine.finalize().unwrap();
    let second = engine.finalize().unwrap();
    assert_eq!(first, second);
    assert!(first.summary.is_new_best);
    assert!(first.summary.persisted);
    assert_eq!(engine.store().writes(), 1);
    assert_eq!(
        engine.store().records().get("speedrun:25").copied(),
        Some(20.0)
    );
}

#[test]
fn same_seed_plays_the_same_session() {
    fn play(seed: u64) -> Vec<Vec<GestureChallenge>> {
        let mut engine = engine(seed);
        engine
            .start(Mode::ChessClock, Category::Difficulty(Difficulty::Expert))
            .unwrap();
        let mut rounds = vec![engine.challenges().to_vec()];
        for _ in 0..12 {
            finish_round(&mut engine);
            engine.on_clock_tick(0.6).unwrap();
            rounds.push(engine.challenges().to_vec());
        }
        rounds
    }

    assert_eq!(play(77), play(77));
    assert_ne!(play(77), play(78));
}

#[test]
fn chess_clock_tier_advances_entering_round_3() {
    let mut engine = engine(12);
    engine
        .start(Mode::ChessClock, Category::Difficulty(Difficulty::Standard))
        .unwrap();
    assert_eq!(engine.round_number(), 1);

    assert!(!finish_round(&mut engine));
    assert_eq!(engine.round_number(), 2);
    assert_eq!(engine.tier(), 0);

    assert!(finish_round(&mut engine));
    assert_eq!(engine.round_number(), 3);
    assert_eq!(engine.tier(), 1);

    finish_round(&mut engine);
    assert_eq!(engine.tier(), 1);
}

#[test]
fn chess_clock_rounds_ramp_up_to_the_cap() {
    for seed in [2, 19, 58] {
        let mut engine = engine(seed);
        engine
            .start(Mode::ChessClock, Category::Difficulty(Difficulty::Expert))
            .unwrap();

        let mut longest = engine.challenges().len();
        for _ in 0..300 {
            finish_round(&mut engine);
            engine.on_clock_tick(0.5).unwrap();

            let round = engine.challenges();
            assert!(round.len() <= MAX_SEQUENCE_LEN);
            // freeze rounds stand alone and say nothing about the nominal length
            if !(round.len() == 1 && round[0].is_freeze()) {
                assert!(round.len() >= longest, "round shrank (seed {seed})");
                longest = round.len();
            }
        }
        assert_eq!(longest, MAX_SEQUENCE_LEN, "seed {seed}");
    }
}

#[test]
fn unreadable_store_fails_start_and_keeps_state() {
    let mut store = MemoryScoreStore::new();
    store.set_fail_reads(true);
    let mut engine = engine_with(store, ManualClock::new(), 1);

    assert_matches!(
        engine.start(Mode::Countdown, Category::TimeLimit(60)),
        Err(EngineError::StoreUnavailable(StoreError::Io(_)))
    );
    assert_eq!(engine.phase(), Phase::NotStarted);
}

#[test]
fn failed_write_still_reports_summary() {
    let mut store = MemoryScoreStore::new().with_record("countdown:30", 2.0);
    store.set_fail_writes(true);
    let mut engine = engine_with(store, ManualClock::new(), 1);
    engine.start(Mode::Countdown, Category::TimeLimit(30)).unwrap();
    for _ in 0..3 {
        engine.on_gesture_completed().unwrap();
    }
    engine.on_clock_tick(30.0).unwrap();

    let done = engine.finalize().unwrap();
    assert_eq!(done.summary.final_metric, 3.0);
    assert_eq!(done.summary.previous_best, Some(2.0));
    assert!(done.summary.is_new_best);
    assert!(!done.summary.persisted);
    assert_matches!(done.store_error, Some(StoreError::Io(_)));
}

#[test]
fn slower_speedrun_keeps_previous_best() {
    let clock = ManualClock::new();
    let store = MemoryScoreStore::new().with_record(
        &best_key(Mode::Speedrun, Category::TargetScore(25)),
        10.0,
    );
    let mut engine = engine_with(store, clock.clone(), 2);
    engine
        .start(Mode::Speedrun, Category::TargetScore(25))
        .unwrap();
    assert_eq!(engine.prior_best(), Some(10.0));

    clock.advance_secs(11.0);
    for _ in 0..25 {
        engine.on_gesture_completed().unwrap();
    }

    let done = engine.finalize().unwrap();
    assert!(!done.summary.is_new_best);
    assert_eq!(done.summary.previous_best, Some(10.0));
    assert_eq!(engine.store().writes(), 0);
}

#[test]
fn higher_chess_clock_round_replaces_best() {
    let store = MemoryScoreStore::new().with_record("chessClock:Standard", 1.0);
    let mut engine = engine_with(store, ManualClock::new(), 6);
    engine
        .start(Mode::ChessClock, Category::Difficulty(Difficulty::Standard))
        .unwrap();
    finish_round(&mut engine);
    engine.on_clock_tick(100.0).unwrap();

    let done = engine.finalize().unwrap();
    assert_eq!(done.summary.final_metric, 2.0);
    assert!(done.summary.is_new_best);
    assert_eq!(done.summary.improvement(), Some(1.0));
    assert_eq!(
        engine.store().records().get("chessClock:Standard").copied(),
        Some(2.0)
    );
}

proptest! {
    #[test]
    fn tier_only_moves_on_thresholds(
        seed in any::<u64>(),
        target_idx in 0usize..5,
        ticks in prop::collection::vec(0.0f64..0.7, 1..120),
    ) {
        let target = lockbuster::mode::SPEEDRUN_TARGETS[target_idx];
        let mut engine = engine(seed);
        engine.start(Mode::Speedrun, Category::TargetScore(target)).unwrap();
        let thresholds = engine.thresholds().to_vec();

        for dt in ticks {
            if engine.is_terminal() {
                break;
            }
            let before = engine.tier();
            let step = engine.on_gesture_completed().unwrap();
            let expected = if thresholds.contains(&engine.score()) { before + 1 } else { before };
            prop_assert_eq!(engine.tier(), expected);
            prop_assert_eq!(step.tier_advanced, expected > before);
            if !engine.is_terminal() {
                engine.on_clock_tick(dt).unwrap();
            }
        }
    }
}
