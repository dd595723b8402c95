use serde::Serialize;

use crate::gesture::GestureChallenge;
use crate::mode::{Category, ChessClockParams, FreezeRule, Mode};

/// Frames in each lock-breaking animation
pub const LOCK_FRAMES: u8 = 13;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum_macros::Display)]
pub enum Phase {
    #[strum(to_string = "not started")]
    NotStarted,
    /// Current challenge is live and accepts input
    #[strum(to_string = "awaiting gesture")]
    AwaitingGesture,
    /// A lock was just broken; the next challenge is drawn but not yet live
    #[strum(to_string = "transitioning")]
    Transitioning,
    #[strum(to_string = "terminal")]
    Terminal,
}

/// Which artwork the host should show for the lock on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LockArt {
    pub group: u32,
    pub variant: u8,
}

impl LockArt {
    /// Asset name of one animation frame, e.g. `G2L4F1`
    pub fn frame_name(&self, frame: u8) -> String {
        format!("G{}L{}F{}", self.group, self.variant, frame.clamp(1, LOCK_FRAMES))
    }
}

/// Settle window after a completed challenge
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub remaining: f64,
    /// Artwork of the lock being broken (drawn before any tier upgrade)
    pub breaking: LockArt,
}

/// Mode-specific rules resolved at start
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rules {
    Speedrun { target: u32 },
    Countdown { limit: f64, freeze: FreezeRule },
    ChessClock(ChessClockParams),
}

impl Rules {
    pub fn freeze(&self) -> FreezeRule {
        match self {
            Rules::Speedrun { .. } => FreezeRule::disabled(),
            Rules::Countdown { freeze, .. } => *freeze,
            Rules::ChessClock(params) => params.freeze,
        }
    }
}

/// Everything that changes during one play-through
#[derive(Debug, Clone)]
pub struct SessionState {
    pub mode: Mode,
    pub category: Category,
    pub rules: Rules,
    pub thresholds: &'static [u32],
    pub score: u32,
    pub round_number: u32,
    pub tier: u32,
    /// Active challenges; a single entry outside chess clock mode
    pub challenges: Vec<GestureChallenge>,
    pub position: usize,
    /// Nominal chess clock round length before any freeze substitution
    pub sequence_len: usize,
    pub lock_variant: u8,
    pub started_at: Option<std::time::Duration>,
    pub remaining_time: Option<f64>,
    pub is_frozen: bool,
    pub frozen_elapsed: f64,
    pub transition: Option<Transition>,
    pub prior_best: Option<f64>,
    pub terminal: bool,
    pub final_metric: Option<f64>,
}

impl SessionState {
    pub fn new(mode: Mode, category: Category, rules: Rules, thresholds: &'static [u32]) -> Self {
        Self {
            mode,
            category,
            rules,
            thresholds,
            score: 0,
            round_number: 1,
            tier: 0,
            challenges: Vec::new(),
            position: 0,
            sequence_len: 1,
            lock_variant: 1,
            started_at: None,
            remaining_time: None,
            is_frozen: false,
            frozen_elapsed: 0.0,
            transition: None,
            prior_best: None,
            terminal: false,
            final_metric: None,
        }
    }

    pub fn phase(&self) -> Phase {
        if self.terminal {
            Phase::Terminal
        } else if self.transition.is_some() {
            Phase::Transitioning
        } else {
            Phase::AwaitingGesture
        }
    }

    pub fn current_challenge(&self) -> Option<GestureChallenge> {
        self.challenges.get(self.position).copied()
    }

    pub fn lock_art(&self) -> LockArt {
        match self.transition {
            Some(t) => t.breaking,
            None => LockArt {
                group: self.tier + 1,
                variant: self.lock_variant,
            },
        }
    }

    /// Bump the tier if `value` is one of the upgrade thresholds
    pub fn escalate_at(&mut self, value: u32) -> bool {
        if self.thresholds.contains(&value) {
            self.tier += 1;
            true
        } else {
            false
        }
    }
}
