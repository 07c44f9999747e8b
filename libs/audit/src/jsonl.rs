use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bcast_core::{AuditError, AuditLogger, AuditRecord};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;

/// Appends one JSON document per line to a local file.
#[derive(Debug)]
pub struct JsonlAuditLogger {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlAuditLogger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl AuditLogger for JsonlAuditLogger {
    async fn append(&self, record: &AuditRecord) -> Result<(), AuditError> {
        let mut line =
            serde_json::to_vec(record).map_err(|err| AuditError::new(err.to_string()))?;
        line.push(b'\n');

        let _guard = self.write_lock.lock().await;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|err| AuditError::new(format!("{}: {err}", parent.display())))?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|err| AuditError::new(format!("{}: {err}", self.path.display())))?;
        file.write_all(&line)
            .await
            .map_err(|err| AuditError::new(format!("{}: {err}", self.path.display())))?;
        file.flush()
            .await
            .map_err(|err| AuditError::new(err.to_string()))?;

        debug!(path = %self.path.display(), job_id = %record.job_id, "audit record appended");
        Ok(())
    }
}
