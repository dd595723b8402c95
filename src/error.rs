//! Error types for the session engine and its score store.

use thiserror::Error;

use crate::mode::{Category, Mode};
use crate::session::Phase;

/// Failure reported by a [`crate::store::ScoreStore`] backend.
///
/// Backend errors are captured as text so that a finalized session, which may
/// carry one alongside its summary, stays cloneable and comparable.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(String),

    #[error("io error: {0}")]
    Io(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Database(e.to_string())
    }
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Io(e.to_string())
    }
}

/// Errors surfaced synchronously by [`crate::engine::SessionEngine`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("category {category} is not valid for {mode} mode")]
    InvalidCategory { mode: Mode, category: Category },

    #[error("cannot {operation} while the session is {phase}")]
    InvalidTransition {
        operation: &'static str,
        phase: Phase,
    },

    #[error("score store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),
}

pub type Result<T, E = EngineError> = std::result::Result<T, E>;
