use bcast_core::DispatchResult;

/// Append-only log of per-recipient outcomes with running counts.
#[derive(Debug, Clone, Default)]
pub struct ResultAggregator {
    results: Vec<DispatchResult>,
    success: usize,
    failure: usize,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            results: Vec::with_capacity(capacity),
            ..Self::default()
        }
    }

    pub fn record(&mut self, result: DispatchResult) {
        if result.success {
            self.success += 1;
        } else {
            self.failure += 1;
        }
        self.results.push(result);
    }

    pub fn success_count(&self) -> usize {
        self.success
    }

    pub fn failure_count(&self) -> usize {
        self.failure
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Outcomes in attempt order.
    pub fn results(&self) -> &[DispatchResult] {
        &self.results
    }

    pub fn last(&self) -> Option<&DispatchResult> {
        self.results.last()
    }
}
