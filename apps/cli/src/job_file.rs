use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use bcast_core::{DelayPolicy, Lead, MessagePayload, Recipient, RecipientResolver, SourceGroup};
use bcast_dispatch::DispatchJob;
use serde::Deserialize;

/// On-disk description of one broadcast (JSON or YAML).
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobFile {
    #[serde(default)]
    pub tenant: Option<String>,
    pub payload: MessagePayload,
    #[serde(default)]
    pub delay: Option<DelayPolicy>,
    #[serde(default)]
    pub exclude_admins: bool,
    #[serde(default)]
    pub display_name_digits: Option<bool>,
    #[serde(default)]
    pub groups: Vec<SourceGroup>,
    #[serde(default)]
    pub leads: Vec<Lead>,
    /// Identifiers to keep after resolution.
    #[serde(default)]
    pub selection: Option<Vec<String>>,
}

impl JobFile {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        match extension.as_str() {
            "json" => serde_json::from_str(&content)
                .with_context(|| format!("failed to parse json {}", path.display())),
            "yaml" | "yml" => serde_yaml_bw::from_str(&content)
                .with_context(|| format!("failed to parse yaml {}", path.display())),
            other => bail!("unsupported job file extension: {other:?}"),
        }
    }

    pub fn resolver(&self) -> RecipientResolver {
        let resolver = RecipientResolver::new().excluding_admins(self.exclude_admins);
        match self.display_name_digits {
            Some(enabled) => resolver.with_display_name_digits(enabled),
            None => resolver,
        }
    }

    /// Group members first, then leads; an identifier seen earlier wins.
    pub fn resolve(&self) -> Vec<Recipient> {
        let resolver = self.resolver();
        let mut seen = HashSet::new();
        resolver
            .resolve_groups(&self.groups)
            .into_iter()
            .chain(resolver.resolve_leads(&self.leads))
            .filter(|recipient| seen.insert(recipient.identifier.clone()))
            .collect()
    }

    pub fn build_job(&self, default_delay: DelayPolicy) -> Result<DispatchJob> {
        let mut job = DispatchJob::new(
            self.payload.clone(),
            self.resolve(),
            self.delay.unwrap_or(default_delay),
        )?
        .with_exclude_admins(self.exclude_admins);
        if let Some(tenant) = &self.tenant {
            job = job.with_tenant(tenant.clone());
        }
        if let Some(selection) = &self.selection {
            job = job.retain_selected(selection)?;
        }
        Ok(job)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bcast_core::{PayloadKind, ValidationError};
    use bcast_testutil::fixture_path;

    #[test]
    fn groups_resolve_in_order_without_admins_or_duplicates() {
        let file = JobFile::load(&fixture_path("jobs/carousel_groups.yaml")).unwrap();
        let recipients = file.resolve();
        let ids: Vec<&str> = recipients.iter().map(|r| r.identifier.as_str()).collect();
        assert_eq!(
            ids,
            vec!["5511999990002", "5511999990003", "11999990004", "774120010@lid"]
        );
        assert_eq!(recipients[0].display_name.as_deref(), Some("Ana"));
        assert_eq!(recipients[0].origin_label.as_deref(), Some("Runners"));
        assert_eq!(recipients[2].origin_label.as_deref(), Some("Cyclists"));

        let job = file.build_job(DelayPolicy::default()).unwrap();
        assert_eq!(job.tenant(), Some("acme"));
        assert_eq!(job.delay_policy(), DelayPolicy::ANTI_DETECTION_SHORT);
        assert_eq!(job.payload().kind(), PayloadKind::Carousel);
        assert!(job.excludes_admins());
    }

    #[test]
    fn display_name_digits_can_be_disabled() {
        let mut file = JobFile::load(&fixture_path("jobs/carousel_groups.yaml")).unwrap();
        file.display_name_digits = Some(false);
        let ids: Vec<String> = file.resolve().into_iter().map(|r| r.identifier).collect();
        assert!(ids.contains(&"774120009@lid".to_string()));
    }

    #[test]
    fn leads_are_normalized_and_selected() {
        let file = JobFile::load(&fixture_path("jobs/text_leads.json")).unwrap();
        let job = file.build_job(DelayPolicy::fixed(350)).unwrap();
        let ids: Vec<&str> = job
            .recipients()
            .iter()
            .map(|r| r.identifier.as_str())
            .collect();
        assert_eq!(ids, vec!["5511987654321", "14155550100"]);
        assert_eq!(job.delay_policy(), DelayPolicy::fixed(350));
        assert_eq!(job.recipients()[0].label(), "Carla");
    }

    #[test]
    fn empty_selection_is_rejected() {
        let mut file = JobFile::load(&fixture_path("jobs/text_leads.json")).unwrap();
        file.selection = Some(vec!["000".into()]);
        let err = file.build_job(DelayPolicy::default()).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ValidationError>(),
            Some(&ValidationError::EmptySelection)
        );
    }
}
