//! In-memory sink.

use super::{Mutation, PersistenceError, PersistenceResult, PersistenceSink};
use std::sync::{Arc, RwLock};

#[derive(Debug, Default)]
struct MemoryLog {
    mutations: Vec<Mutation>,
    failing: bool,
}

/// Records every mutation. Clones share the same log, so a test can keep a
/// handle while the editor owns the sink.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    log: Arc<RwLock<MemoryLog>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following `persist` call fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        if let Ok(mut log) = self.log.write() {
            log.failing = failing;
        }
    }

    /// Snapshot of the recorded mutations.
    pub fn mutations(&self) -> Vec<Mutation> {
        self.log
            .read()
            .map(|log| log.mutations.clone())
            .unwrap_or_default()
    }

    pub fn clear(&self) {
        if let Ok(mut log) = self.log.write() {
            log.mutations.clear();
        }
    }
}

impl PersistenceSink for MemorySink {
    fn persist(&mut self, mutation: &Mutation) -> PersistenceResult<()> {
        let mut log = self
            .log
            .write()
            .map_err(|e| PersistenceError::Io(format!("Lock error: {}", e)))?;
        if log.failing {
            return Err(PersistenceError::Rejected("store unavailable".to_string()));
        }
        log.mutations.push(mutation.clone());
        Ok(())
    }
}
