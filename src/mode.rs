use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{EngineError, Result};

/// Target scores a speedrun can be played to
pub const SPEEDRUN_TARGETS: [u32; 5] = [25, 50, 60, 80, 100];

/// Countdown time limits in seconds
pub const COUNTDOWN_LIMITS: [u32; 5] = [30, 60, 120, 180, 300];

/// Longest gesture sequence a chess clock round can ramp up to
pub const MAX_SEQUENCE_LEN: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display)]
pub enum Mode {
    #[strum(to_string = "speedrun")]
    Speedrun,
    #[strum(to_string = "countdown")]
    Countdown,
    #[strum(to_string = "chessClock")]
    ChessClock,
}

impl Mode {
    /// Whether `candidate` beats `previous` under this mode's ordering.
    /// Speedrun times are lower-is-better, counts are higher-is-better.
    pub fn is_better(&self, candidate: f64, previous: f64) -> bool {
        match self {
            Mode::Speedrun => candidate < previous,
            Mode::Countdown | Mode::ChessClock => candidate > previous,
        }
    }

    /// Reject categories that were never offered for this mode
    pub fn validate(&self, category: Category) -> Result<()> {
        let legal = match (self, category) {
            (Mode::Speedrun, Category::TargetScore(target)) => SPEEDRUN_TARGETS.contains(&target),
            (Mode::Countdown, Category::TimeLimit(secs)) => COUNTDOWN_LIMITS.contains(&secs),
            (Mode::ChessClock, Category::Difficulty(_)) => true,
            _ => false,
        };

        if legal {
            Ok(())
        } else {
            Err(EngineError::InvalidCategory {
                mode: *self,
                category,
            })
        }
    }

    /// Every legal category for this mode, in menu order
    pub fn categories(&self) -> Vec<Category> {
        match self {
            Mode::Speedrun => SPEEDRUN_TARGETS
                .iter()
                .map(|t| Category::TargetScore(*t))
                .collect(),
            Mode::Countdown => COUNTDOWN_LIMITS
                .iter()
                .map(|s| Category::TimeLimit(*s))
                .collect(),
            Mode::ChessClock => Difficulty::ALL
                .iter()
                .map(|d| Category::Difficulty(*d))
                .collect(),
        }
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum_macros::Display,
    clap::ValueEnum,
)]
pub enum Difficulty {
    Standard,
    Hard,
    Expert,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Standard, Difficulty::Hard, Difficulty::Expert];

    pub fn params(&self) -> ChessClockParams {
        let (increment, ramp_chance, freeze_secs) = match self {
            Difficulty::Standard => (3.0, 0.20, 3.0),
            Difficulty::Hard => (2.5, 0.35, 2.0),
            Difficulty::Expert => (2.0, 0.50, 1.5),
        };

        ChessClockParams {
            starting_time: 10.0,
            increment,
            ramp_chance,
            initial_sequence_len: 1,
            max_sequence_len: MAX_SEQUENCE_LEN,
            freeze: FreezeRule {
                chance: 0.5,
                duration: freeze_secs,
            },
        }
    }
}

/// Mode-specific selection made before a session starts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    /// Speedrun: number of locks to break
    TargetScore(u32),
    /// Countdown: seconds on the clock
    TimeLimit(u32),
    /// Chess clock: difficulty preset
    Difficulty(Difficulty),
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::TargetScore(target) => write!(f, "{}", target),
            Category::TimeLimit(secs) => write!(f, "{}", secs),
            Category::Difficulty(difficulty) => write!(f, "{}", difficulty),
        }
    }
}

/// Chance of a freeze lock replacing a draw, and how long it pauses the clock
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FreezeRule {
    pub chance: f64,
    pub duration: f64,
}

impl FreezeRule {
    pub fn disabled() -> Self {
        Self {
            chance: 0.0,
            duration: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChessClockParams {
    /// Seconds on the clock when the session starts
    pub starting_time: f64,
    /// Seconds added for every completed round
    pub increment: f64,
    /// Chance per round that the sequence grows by one gesture
    pub ramp_chance: f64,
    pub initial_sequence_len: usize,
    pub max_sequence_len: usize,
    pub freeze: FreezeRule,
}

/// Persistence key for a mode + category pair, e.g. `speedrun:100` or `chessClock:Hard`
pub fn best_key(mode: Mode, category: Category) -> String {
    format!("{}:{}", mode, category)
}
