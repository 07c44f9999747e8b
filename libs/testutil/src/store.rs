use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use bcast_core::{DurableStore, StoreError};

/// Store that hands out `https://store.test/<n>` URLs, except for the
/// references it was told to reject.
#[derive(Debug, Default)]
pub struct ScriptedStore {
    rejects: HashSet<String>,
    requests: Mutex<Vec<String>>,
}

impl ScriptedStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(mut self, reference: impl Into<String>) -> Self {
        self.rejects.insert(reference.into());
        self
    }

    /// References passed to `materialize`, in call order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl DurableStore for ScriptedStore {
    async fn materialize(&self, reference: &str) -> Result<String, StoreError> {
        let count = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(reference.to_string());
            requests.len()
        };
        if self.rejects.contains(reference) {
            return Err(StoreError::Unsupported(reference.to_string()));
        }
        Ok(format!("https://store.test/{count}"))
    }
}
