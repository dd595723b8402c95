//! Gesture challenge catalog and the random picker that draws from it.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of distinct lock artworks per group
pub const LOCK_VARIANTS: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display)]
pub enum Edge {
    Left,
    Right,
}

/// One unit of player input the engine expects next.
///
/// The host attaches whichever recognizer matches the variant; the engine only
/// ever learns that the active challenge was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GestureChallenge {
    DoubleTap,
    TripleTap,
    Rotate,
    Pinch,
    MultiFingerTap { fingers: u8 },
    Swipe { fingers: u8, direction: Direction },
    LongPress { fingers: u8 },
    EdgePan { edge: Edge },
    /// Special lock that pauses the clock once broken; never drawn from the catalog
    Freeze,
}

use Direction::*;
use GestureChallenge::*;

/// The fixed catalog, in draw order
pub const CATALOG: [GestureChallenge; 23] = [
    DoubleTap,
    TripleTap,
    Rotate,
    Pinch,
    MultiFingerTap { fingers: 2 },
    MultiFingerTap { fingers: 3 },
    Swipe { fingers: 1, direction: Left },
    Swipe { fingers: 1, direction: Right },
    Swipe { fingers: 1, direction: Up },
    Swipe { fingers: 1, direction: Down },
    Swipe { fingers: 2, direction: Left },
    Swipe { fingers: 2, direction: Right },
    Swipe { fingers: 2, direction: Up },
    Swipe { fingers: 2, direction: Down },
    LongPress { fingers: 1 },
    LongPress { fingers: 2 },
    LongPress { fingers: 3 },
    EdgePan { edge: Edge::Left },
    EdgePan { edge: Edge::Right },
    Swipe { fingers: 3, direction: Left },
    Swipe { fingers: 3, direction: Right },
    Swipe { fingers: 3, direction: Up },
    Swipe { fingers: 3, direction: Down },
];

fn finger_prefix(fingers: u8) -> &'static str {
    match fingers {
        2 => "Two Finger ",
        3 => "Three Finger ",
        _ => "",
    }
}

impl GestureChallenge {
    /// Label shown above the lock
    pub fn name(&self) -> String {
        match self {
            DoubleTap => "Double Tap".to_string(),
            TripleTap => "Triple Tap".to_string(),
            Rotate => "Rotate".to_string(),
            Pinch => "Pinch".to_string(),
            MultiFingerTap { fingers } => format!("{}Tap", finger_prefix(*fingers)),
            Swipe { fingers, direction } => {
                format!("{}{} Swipe", finger_prefix(*fingers), direction)
            }
            LongPress { fingers } => format!("{}Long Press", finger_prefix(*fingers)),
            EdgePan { edge } => format!("{} Edge Pan", edge),
            Freeze => "Freeze".to_string(),
        }
    }

    pub fn is_freeze(&self) -> bool {
        matches!(self, Freeze)
    }
}

impl fmt::Display for GestureChallenge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Draws challenges uniformly from the catalog using a seedable PCG source.
///
/// The same seed and call sequence always yields the same challenges.
#[derive(Debug, Clone)]
pub struct GesturePicker {
    rng: Pcg32,
    catalog_size: usize,
}

impl GesturePicker {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
            catalog_size: CATALOG.len(),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: Pcg32::from_entropy(),
            catalog_size: CATALOG.len(),
        }
    }

    /// Narrow draws to the first `size` catalog entries (clamped to 1..=23)
    pub fn with_catalog_size(mut self, size: usize) -> Self {
        self.catalog_size = size.clamp(1, CATALOG.len());
        self
    }

    pub fn catalog_size(&self) -> usize {
        self.catalog_size
    }

    pub fn pick(&mut self) -> GestureChallenge {
        CATALOG[self.rng.gen_range(0..self.catalog_size)]
    }

    /// Draw a single challenge, replaced by a freeze lock with probability `freeze_chance`
    pub fn pick_or_freeze(&mut self, freeze_chance: f64) -> GestureChallenge {
        if self.roll(freeze_chance) {
            Freeze
        } else {
            self.pick()
        }
    }

    pub fn pick_sequence(&mut self, len: usize) -> Vec<GestureChallenge> {
        (0..len.max(1)).map(|_| self.pick()).collect()
    }

    /// Draw a chess clock round: either a lone freeze lock or `len` catalog gestures
    pub fn draw_round(&mut self, len: usize, freeze_chance: f64) -> Vec<GestureChallenge> {
        if self.roll(freeze_chance) {
            vec![Freeze]
        } else {
            self.pick_sequence(len)
        }
    }

    /// Bernoulli trial; out-of-range chances are clamped
    pub fn roll(&mut self, chance: f64) -> bool {
        if chance.is_nan() || chance <= 0.0 {
            return false;
        }
        self.rng.gen_bool(chance.min(1.0))
    }

    /// Artwork variant for the next lock, 1..=LOCK_VARIANTS
    pub fn lock_variant(&mut self) -> u8 {
        self.rng.gen_range(1..=LOCK_VARIANTS)
    }
}

impl Default for GesturePicker {
    fn default() -> Self {
        Self::from_entropy()
    }
}
