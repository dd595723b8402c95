use crate::error::Result;
use crate::mode::{Category, Mode};

/// Round numbers at which the chess clock lock artwork escalates
pub const CHESS_CLOCK_ESCALATION: [u32; 13] = [3, 8, 14, 21, 30, 37, 45, 56, 69, 84, 100, 118, 138];

/// Static lookup of the score (or round) values at which the lock tier goes up
pub struct UpgradeTable;

impl UpgradeTable {
    pub fn thresholds_for(mode: Mode, category: Category) -> Result<&'static [u32]> {
        mode.validate(category)?;

        let thresholds: &'static [u32] = match category {
            Category::TargetScore(25) => &[7, 14, 21],
            Category::TargetScore(50) => &[10, 20, 30, 40],
            Category::TargetScore(60) => &[12, 24, 36, 48],
            Category::TargetScore(80) => &[16, 32, 48, 64],
            Category::TargetScore(_) => &[20, 40, 60, 80],
            Category::TimeLimit(30) => &[6, 12, 18, 24, 30],
            Category::TimeLimit(60) => &[9, 18, 27, 36, 45],
            Category::TimeLimit(120) => &[15, 30, 45, 60, 75],
            Category::TimeLimit(180) => &[20, 40, 60, 80, 100],
            Category::TimeLimit(_) => &[30, 60, 90, 120, 150],
            Category::Difficulty(_) => &CHESS_CLOCK_ESCALATION,
        };

        Ok(thresholds)
    }
}
