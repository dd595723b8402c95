//! The session state machine shared by all three game modes.
//!
//! A session moves `NotStarted -> InProgress -> Terminal`. While in progress it
//! alternates between awaiting a gesture and a short settle window after each
//! broken lock. The engine is purely reactive: the host feeds it gesture
//! completions and clock ticks, and touches the score store only in
//! [`SessionEngine::start`] and [`SessionEngine::finalize`].

use log::{debug, info};
use serde::Serialize;

use crate::clock::Clock;
use crate::config::Config;
use crate::error::{EngineError, Result, StoreError};
use crate::gesture::{GestureChallenge, GesturePicker};
use crate::mode::{best_key, Category, FreezeRule, Mode};
use crate::session::{LockArt, Phase, Rules, SessionState, Transition};
use crate::store::ScoreStore;
use crate::upgrades::UpgradeTable;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineSettings {
    /// Seconds the next challenge stays inactive after a completion
    pub settle_delay: f64,
    pub strict_input_gate: bool,
    pub countdown_freeze: FreezeRule,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for EngineSettings {
    fn from(cfg: &Config) -> Self {
        let settle_delay = if cfg.settle_delay_secs.is_finite() {
            cfg.settle_delay_secs.clamp(0.0, 1.0)
        } else {
            0.0
        };

        Self {
            settle_delay,
            strict_input_gate: cfg.strict_input_gate,
            countdown_freeze: FreezeRule {
                chance: cfg.countdown_freeze_chance.clamp(0.0, 1.0),
                duration: cfg.countdown_freeze_secs.max(0.0),
            },
        }
    }
}

/// What a single event changed, for the host to react to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Step {
    pub tier_advanced: bool,
    pub round_completed: bool,
    pub froze: bool,
    pub thawed: bool,
    pub finished: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub mode: Mode,
    pub category: Category,
    /// Seconds for speedrun, locks broken for countdown, round reached for chess clock
    pub final_metric: f64,
    pub previous_best: Option<f64>,
    pub is_new_best: bool,
    /// Whether the new best actually reached the store
    pub persisted: bool,
}

impl Summary {
    /// Margin by which a new best beats the previous one
    pub fn improvement(&self) -> Option<f64> {
        if !self.is_new_best {
            return None;
        }
        let previous = self.previous_best?;
        Some((self.final_metric - previous).abs())
    }
}

/// Result of finalizing a session. A failed store read or write is reported
/// next to the summary rather than in place of it.
#[derive(Debug, Clone, PartialEq)]
pub struct Finalized {
    pub summary: Summary,
    pub store_error: Option<StoreError>,
}

pub struct SessionEngine<S: ScoreStore, C: Clock> {
    store: S,
    clock: C,
    picker: GesturePicker,
    settings: EngineSettings,
    state: Option<SessionState>,
    finalized: Option<Finalized>,
}

fn invalid(operation: &'static str, phase: Phase) -> EngineError {
    EngineError::InvalidTransition { operation, phase }
}

fn round_millis(secs: f64) -> f64 {
    (secs * 1000.0).round() / 1000.0
}

fn begin_freeze(state: &mut SessionState) {
    state.is_frozen = true;
    state.frozen_elapsed = 0.0;
    debug!("clock frozen for {:.2}s", state.rules.freeze().duration);
}

fn finish(state: &mut SessionState, metric: f64) {
    state.final_metric = Some(metric);
    state.terminal = true;
    state.transition = None;
    info!(
        "{} session ({}) finished: metric {} at tier {}",
        state.mode, state.category, metric, state.tier
    );
}

impl<S: ScoreStore, C: Clock> SessionEngine<S, C> {
    pub fn new(store: S, clock: C, picker: GesturePicker, settings: EngineSettings) -> Self {
        Self {
            store,
            clock,
            picker,
            settings,
            state: None,
            finalized: None,
        }
    }

    /// Begin a new session, replacing any session already held.
    ///
    /// Fails without touching the current session if the category is not
    /// legal for the mode or the prior best cannot be read.
    pub fn start(&mut self, mode: Mode, category: Category) -> Result<()> {
        let thresholds = UpgradeTable::thresholds_for(mode, category)?;
        let prior_best = self.store.get(&best_key(mode, category))?;

        let rules = match category {
            Category::TargetScore(target) => Rules::Speedrun { target },
            Category::TimeLimit(secs) => Rules::Countdown {
                limit: f64::from(secs),
                freeze: self.settings.countdown_freeze,
            },
            Category::Difficulty(difficulty) => Rules::ChessClock(difficulty.params()),
        };

        let mut state = SessionState::new(mode, category, rules, thresholds);
        state.prior_best = prior_best;

        match rules {
            Rules::Speedrun { .. } => {
                state.started_at = Some(self.clock.now());
                state.challenges = vec![self.picker.pick()];
            }
            Rules::Countdown { limit, freeze } => {
                state.started_at = Some(self.clock.now());
                state.remaining_time = Some(limit);
                state.challenges = vec![self.picker.pick_or_freeze(freeze.chance)];
            }
            Rules::ChessClock(params) => {
                state.remaining_time = Some(params.starting_time);
                state.sequence_len = params
                    .initial_sequence_len
                    .clamp(1, params.max_sequence_len.max(1));
                state.challenges = self
                    .picker
                    .draw_round(state.sequence_len, params.freeze.chance);
            }
        }
        state.lock_variant = self.picker.lock_variant();

        info!(
            "started {} session ({}), previous best {:?}",
            mode, category, prior_best
        );
        self.state = Some(state);
        self.finalized = None;
        Ok(())
    }

    /// The active challenge was recognized by the host
    pub fn on_gesture_completed(&mut self) -> Result<Step> {
        const OP: &str = "complete a gesture";

        let state = match self.state.as_mut() {
            Some(state) if !state.terminal => state,
            Some(_) => return Err(invalid(OP, Phase::Terminal)),
            None => return Err(invalid(OP, Phase::NotStarted)),
        };

        if state.transition.is_some() {
            if self.settings.strict_input_gate {
                return Err(invalid(OP, Phase::Transitioning));
            }
            state.transition = None;
        }

        let breaking = state.lock_art();
        let completed = state.current_challenge();
        let completed_freeze = completed.is_some_and(|c| c.is_freeze());
        let mut step = Step::default();

        match state.rules {
            Rules::Speedrun { target } => {
                state.score += 1;
                step.tier_advanced = state.escalate_at(state.score);

                if state.score >= target {
                    let started = state.started_at.unwrap_or_default();
                    let elapsed = self.clock.now().saturating_sub(started);
                    finish(state, round_millis(elapsed.as_secs_f64()));
                    step.finished = true;
                    return Ok(step);
                }

                state.challenges = vec![self.picker.pick()];
            }
            Rules::Countdown { freeze, .. } => {
                state.score += 1;
                step.tier_advanced = state.escalate_at(state.score);

                if completed_freeze {
                    begin_freeze(state);
                    step.froze = true;
                }

                state.challenges = vec![self.picker.pick_or_freeze(freeze.chance)];
            }
            Rules::ChessClock(params) => {
                if completed_freeze {
                    begin_freeze(state);
                    step.froze = true;
                }

                if state.position + 1 < state.challenges.len() {
                    state.position += 1;
                } else {
                    state.round_number += 1;
                    step.round_completed = true;
                    step.tier_advanced = state.escalate_at(state.round_number);

                    if let Some(remaining) = state.remaining_time.as_mut() {
                        *remaining += params.increment;
                    }
                    if state.sequence_len < params.max_sequence_len
                        && self.picker.roll(params.ramp_chance)
                    {
                        state.sequence_len += 1;
                    }

                    state.challenges = self
                        .picker
                        .draw_round(state.sequence_len, params.freeze.chance);
                    state.position = 0;
                    debug!(
                        "round {} drawn with {} challenge(s)",
                        state.round_number,
                        state.challenges.len()
                    );
                }
            }
        }

        if step.tier_advanced {
            debug!("tier advanced to {}", state.tier);
        }

        state.lock_variant = self.picker.lock_variant();
        if self.settings.settle_delay > 0.0 {
            state.transition = Some(Transition {
                remaining: self.settings.settle_delay,
                breaking,
            });
        }

        Ok(step)
    }

    /// Advance time by `elapsed` seconds.
    ///
    /// Settles a pending transition in every mode; counts down the clock in
    /// countdown and chess clock mode unless a freeze is active.
    pub fn on_clock_tick(&mut self, elapsed: f64) -> Result<Step> {
        const OP: &str = "advance the clock";

        let state = match self.state.as_mut() {
            Some(state) if !state.terminal => state,
            Some(_) => return Err(invalid(OP, Phase::Terminal)),
            None => return Err(invalid(OP, Phase::NotStarted)),
        };

        let mut dt = if elapsed.is_finite() && elapsed > 0.0 {
            elapsed
        } else {
            0.0
        };
        let mut step = Step::default();

        if let Some(transition) = state.transition.as_mut() {
            transition.remaining -= dt;
            if transition.remaining <= 0.0 {
                state.transition = None;
            }
        }

        let Some(remaining) = state.remaining_time else {
            return Ok(step);
        };

        if state.is_frozen {
            let duration = state.rules.freeze().duration;
            state.frozen_elapsed += dt;
            if state.frozen_elapsed >= duration {
                dt = state.frozen_elapsed - duration;
                state.is_frozen = false;
                state.frozen_elapsed = 0.0;
                step.thawed = true;
                debug!("clock thawed");
            } else {
                dt = 0.0;
            }
        }

        let remaining = remaining - dt;
        if remaining <= 0.0 {
            state.remaining_time = Some(0.0);
            let metric = match state.mode {
                Mode::ChessClock => state.round_number,
                _ => state.score,
            };
            finish(state, f64::from(metric));
            step.finished = true;
        } else {
            state.remaining_time = Some(remaining);
        }

        Ok(step)
    }

    /// Compare the final metric against the stored best and persist it if improved.
    ///
    /// Only the first call touches the store; later calls return the cached result.
    pub fn finalize(&mut self) -> Result<Finalized> {
        if let Some(done) = &self.finalized {
            return Ok(done.clone());
        }

        let state = match self.state.as_ref() {
            Some(state) if state.terminal => state,
            Some(state) => return Err(invalid("finalize", state.phase())),
            None => return Err(invalid("finalize", Phase::NotStarted)),
        };

        let final_metric = state.final_metric.unwrap_or_default();
        let key = best_key(state.mode, state.category);
        let mut store_error = None;

        let previous_best = match self.store.get(&key) {
            Ok(best) => best,
            Err(e) => {
                store_error = Some(e);
                state.prior_best
            }
        };

        let is_new_best = final_metric.is_finite()
            && previous_best.map_or(true, |prev| state.mode.is_better(final_metric, prev));

        let mut persisted = false;
        if is_new_best {
            match self.store.set(&key, final_metric) {
                Ok(()) => persisted = true,
                Err(e) => {
                    store_error.get_or_insert(e);
                }
            }
        }

        let summary = Summary {
            mode: state.mode,
            category: state.category,
            final_metric,
            previous_best,
            is_new_best,
            persisted,
        };
        info!(
            "finalized {}: {} (previous {:?}, new best: {})",
            key, final_metric, previous_best, is_new_best
        );

        let done = Finalized {
            summary,
            store_error,
        };
        self.finalized = Some(done.clone());
        Ok(done)
    }

    /// Drop the current session without persisting anything
    pub fn abandon(&mut self) {
        if let Some(state) = self.state.take() {
            debug!("abandoned {} session ({})", state.mode, state.category);
        }
        self.finalized = None;
    }

    pub fn phase(&self) -> Phase {
        self.state.as_ref().map_or(Phase::NotStarted, |s| s.phase())
    }

    /// Whether the host should route gesture input to the engine right now
    pub fn accepts_input(&self) -> bool {
        self.phase() == Phase::AwaitingGesture
    }

    pub fn state(&self) -> Option<&SessionState> {
        self.state.as_ref()
    }

    pub fn mode(&self) -> Option<Mode> {
        self.state.as_ref().map(|s| s.mode)
    }

    pub fn category(&self) -> Option<Category> {
        self.state.as_ref().map(|s| s.category)
    }

    pub fn score(&self) -> u32 {
        self.state.as_ref().map_or(0, |s| s.score)
    }

    pub fn round_number(&self) -> u32 {
        self.state.as_ref().map_or(1, |s| s.round_number)
    }

    pub fn tier(&self) -> u32 {
        self.state.as_ref().map_or(0, |s| s.tier)
    }

    pub fn thresholds(&self) -> &[u32] {
        match &self.state {
            Some(state) => state.thresholds,
            None => &[],
        }
    }

    pub fn current_challenge(&self) -> Option<GestureChallenge> {
        self.state.as_ref().and_then(|s| s.current_challenge())
    }

    /// The whole active sequence (one entry outside chess clock mode)
    pub fn challenges(&self) -> &[GestureChallenge] {
        match &self.state {
            Some(state) => &state.challenges,
            None => &[],
        }
    }

    pub fn position(&self) -> usize {
        self.state.as_ref().map_or(0, |s| s.position)
    }

    pub fn remaining_time(&self) -> Option<f64> {
        self.state.as_ref().and_then(|s| s.remaining_time)
    }

    pub fn is_frozen(&self) -> bool {
        self.state.as_ref().is_some_and(|s| s.is_frozen)
    }

    pub fn frozen_elapsed(&self) -> f64 {
        self.state.as_ref().map_or(0.0, |s| s.frozen_elapsed)
    }

    pub fn is_terminal(&self) -> bool {
        self.state.as_ref().is_some_and(|s| s.terminal)
    }

    pub fn final_metric(&self) -> Option<f64> {
        self.state.as_ref().and_then(|s| s.final_metric)
    }

    pub fn prior_best(&self) -> Option<f64> {
        self.state.as_ref().and_then(|s| s.prior_best)
    }

    pub fn lock_art(&self) -> Option<LockArt> {
        self.state.as_ref().map(|s| s.lock_art())
    }

    /// Seconds since a speedrun or countdown started, frozen at the final time once finished
    pub fn elapsed(&self) -> Option<f64> {
        let state = self.state.as_ref()?;
        if state.mode == Mode::Speedrun {
            if let Some(metric) = state.final_metric {
                return Some(metric);
            }
        }
        let started = state.started_at?;
        Some(self.clock.now().saturating_sub(started).as_secs_f64())
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }
}
