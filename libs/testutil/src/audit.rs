use std::sync::Mutex;

use async_trait::async_trait;
use bcast_core::{AuditError, AuditLogger, AuditRecord};

/// Keeps appended records in memory. `failing()` rejects every append.
#[derive(Debug, Default)]
pub struct MemoryAuditLogger {
    records: Mutex<Vec<AuditRecord>>,
    fail: bool,
}

impl MemoryAuditLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<AuditRecord> {
        self.records.lock().unwrap().last().cloned()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl AuditLogger for MemoryAuditLogger {
    async fn append(&self, record: &AuditRecord) -> Result<(), AuditError> {
        if self.fail {
            return Err(AuditError::new("audit store unavailable"));
        }
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}
