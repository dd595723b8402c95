use std::collections::HashMap;

use crate::error::StoreError;

/// Key/value persistence for best records.
///
/// Keys come from [`crate::mode::best_key`]; values are seconds (speedrun) or counts.
pub trait ScoreStore {
    fn get(&self, key: &str) -> Result<Option<f64>, StoreError>;
    fn set(&mut self, key: &str, value: f64) -> Result<(), StoreError>;
}

impl<S: ScoreStore + ?Sized> ScoreStore for &mut S {
    fn get(&self, key: &str) -> Result<Option<f64>, StoreError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: f64) -> Result<(), StoreError> {
        (**self).set(key, value)
    }
}

impl<S: ScoreStore + ?Sized> ScoreStore for Box<S> {
    fn get(&self, key: &str) -> Result<Option<f64>, StoreError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: f64) -> Result<(), StoreError> {
        (**self).set(key, value)
    }
}

/// In-process store. Can be told to fail reads or writes to exercise error paths.
#[derive(Debug, Clone, Default)]
pub struct MemoryScoreStore {
    records: HashMap<String, f64>,
    writes: usize,
    fail_reads: bool,
    fail_writes: bool,
}

impl MemoryScoreStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(mut self, key: &str, value: f64) -> Self {
        self.records.insert(key.to_string(), value);
        self
    }

    pub fn set_fail_reads(&mut self, fail: bool) {
        self.fail_reads = fail;
    }

    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    /// Number of successful `set` calls
    pub fn writes(&self) -> usize {
        self.writes
    }

    pub fn records(&self) -> &HashMap<String, f64> {
        &self.records
    }
}

impl ScoreStore for MemoryScoreStore {
    fn get(&self, key: &str) -> Result<Option<f64>, StoreError> {
        if self.fail_reads {
            return Err(StoreError::Io(format!("read of {} refused", key)));
        }
        Ok(self.records.get(key).copied())
    }

    fn set(&mut self, key: &str, value: f64) -> Result<(), StoreError> {
        if self.fail_writes {
            return Err(StoreError::Io(format!("write of {} refused", key)));
        }
        self.records.insert(key.to_string(), value);
        self.writes += 1;
        Ok(())
    }
}
