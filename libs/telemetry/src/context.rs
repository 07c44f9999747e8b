/// Dimensions attached to every metric emitted for a dispatch run.
#[derive(Debug, Clone, Default)]
pub struct TelemetryLabels {
    pub tenant: Option<String>,
    pub job_id: Option<String>,
    pub payload_kind: Option<String>,
    pub extra: Vec<(String, String)>,
}

impl TelemetryLabels {
    pub fn new(tenant: Option<String>) -> Self {
        Self {
            tenant,
            ..Self::default()
        }
    }

    pub fn with_payload_kind(mut self, kind: impl Into<String>) -> Self {
        self.payload_kind = Some(kind.into());
        self
    }

    pub fn with_job(mut self, job_id: impl Into<String>) -> Self {
        self.job_id = Some(job_id.into());
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.push((key.into(), value.into()));
        self
    }

    /// Metric tags. `job_id` is left out to keep series cardinality bounded.
    pub fn tags(&self) -> Vec<(String, String)> {
        let mut tags = Vec::with_capacity(2 + self.extra.len());
        tags.push((
            "tenant".into(),
            self.tenant.clone().unwrap_or_else(|| "default".into()),
        ));
        if let Some(kind) = &self.payload_kind {
            tags.push(("payload_kind".into(), kind.clone()));
        }
        tags.extend(self.extra.iter().cloned());
        tags
    }
}
