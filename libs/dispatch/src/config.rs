use bcast_core::DelayPolicy;

const DEFAULT_DELAY_ENV: &str = "BCAST_DEFAULT_DELAY_MS";
const MATERIALIZE_ENV: &str = "BCAST_MATERIALIZE_CAROUSEL";

/// Engine-wide settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchConfig {
    /// Policy used when a job does not ask for pacing.
    pub default_delay: DelayPolicy,
    /// Resolve transient carousel images into durable URLs at finalize.
    pub materialize_carousel: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            default_delay: DelayPolicy::default(),
            materialize_carousel: true,
        }
    }
}

impl DispatchConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(ms) = lookup(DEFAULT_DELAY_ENV).and_then(|v| v.trim().parse::<u64>().ok()) {
            cfg.default_delay = DelayPolicy::fixed(ms);
        }
        if let Some(flag) = lookup(MATERIALIZE_ENV) {
            cfg.materialize_carousel =
                !matches!(flag.to_lowercase().as_str(), "0" | "false" | "no" | "off");
        }
        cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_overrides() {
        let cfg = DispatchConfig::from_lookup(|key| match key {
            "BCAST_DEFAULT_DELAY_MS" => Some("1200".into()),
            "BCAST_MATERIALIZE_CAROUSEL" => Some("off".into()),
            _ => None,
        });
        assert_eq!(cfg.default_delay, DelayPolicy::fixed(1200));
        assert!(!cfg.materialize_carousel);
    }

    #[test]
    fn ignores_garbage() {
        let cfg = DispatchConfig::from_lookup(|key| match key {
            "BCAST_DEFAULT_DELAY_MS" => Some("soon".into()),
            _ => None,
        });
        assert_eq!(cfg, DispatchConfig::default());
    }
}
