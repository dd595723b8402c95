// Library surface for the engine, its collaborators and the headless tests.
// The terminal host in main.rs only consumes what is exported here.
pub mod app_dirs;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod gesture;
pub mod mode;
pub mod records;
pub mod runtime;
pub mod session;
pub mod store;
pub mod upgrades;

pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::{EngineSettings, Finalized, SessionEngine, Step, Summary};
pub use error::{EngineError, StoreError};
pub use gesture::{GestureChallenge, GesturePicker, CATALOG};
pub use mode::{best_key, Category, Difficulty, Mode};
pub use records::RecordsDb;
pub use session::{LockArt, Phase};
pub use store::{MemoryScoreStore, ScoreStore};
pub use upgrades::UpgradeTable;

/// Host tick cadence in milliseconds
pub const TICK_RATE_MS: u64 = 10;
