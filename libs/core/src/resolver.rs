//! Builds deduplicated recipient lists from group memberships or lead lists.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::phone;
use crate::recipient::Recipient;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    #[default]
    Member,
    Admin,
    #[serde(alias = "super_admin")]
    SuperAdmin,
}

impl MemberRole {
    pub fn is_admin(&self) -> bool {
        matches!(self, MemberRole::Admin | MemberRole::SuperAdmin)
    }
}

/// One participant as reported by the group directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GroupMember {
    /// Protocol address (`<digits>@s.whatsapp.net`, `<opaque>@lid`, ...).
    pub id: String,
    /// Verified number when the directory exposes one; may be masked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub push_name: Option<String>,
    #[serde(default)]
    pub role: MemberRole,
}

impl GroupMember {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            phone_number: None,
            push_name: None,
            role: MemberRole::Member,
        }
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone_number = Some(phone.into());
        self
    }

    pub fn with_push_name(mut self, name: impl Into<String>) -> Self {
        self.push_name = Some(name.into());
        self
    }

    pub fn with_role(mut self, role: MemberRole) -> Self {
        self.role = role;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceGroup {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub members: Vec<GroupMember>,
}

/// Pre-supplied contact, e.g. from an imported lead list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Lead {
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// How a member's canonical identifier was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentitySource {
    VerifiedNumber,
    PhoneAddress,
    DisplayName,
    ProtocolAddress,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedIdentity {
    pub identifier: String,
    pub source: IdentitySource,
}

/// Turns group memberships into an ordered recipient list.
///
/// Groups and members are walked in the order given; the first group a
/// member is seen in becomes its `origin_label` and later sightings are
/// dropped.
///
/// ```
/// use bcast_core::{GroupMember, MemberRole, RecipientResolver, SourceGroup};
///
/// let groups = vec![
///     SourceGroup {
///         id: "g1".into(),
///         name: "Runners".into(),
///         members: vec![
///             GroupMember::new("5511900000001@s.whatsapp.net"),
///             GroupMember::new("5511900000002@s.whatsapp.net").with_role(MemberRole::Admin),
///         ],
///     },
///     SourceGroup {
///         id: "g2".into(),
///         name: "Cyclists".into(),
///         members: vec![GroupMember::new("5511900000001@s.whatsapp.net")],
///     },
/// ];
///
/// let recipients = RecipientResolver::new().excluding_admins(true).resolve_groups(&groups);
/// assert_eq!(recipients.len(), 1);
/// assert_eq!(recipients[0].origin_label.as_deref(), Some("Runners"));
/// ```
#[derive(Debug, Clone)]
pub struct RecipientResolver {
    exclude_admins: bool,
    display_name_digits: bool,
}

impl Default for RecipientResolver {
    fn default() -> Self {
        Self {
            exclude_admins: false,
            display_name_digits: true,
        }
    }
}

impl RecipientResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn excluding_admins(mut self, exclude: bool) -> Self {
        self.exclude_admins = exclude;
        self
    }

    /// Toggles the display-name digit fallback used when a member's verified
    /// number is masked or absent.
    pub fn with_display_name_digits(mut self, enabled: bool) -> Self {
        self.display_name_digits = enabled;
        self
    }

    pub fn excludes_admins(&self) -> bool {
        self.exclude_admins
    }

    pub fn resolve_groups(&self, groups: &[SourceGroup]) -> Vec<Recipient> {
        let mut seen = HashSet::new();
        let mut recipients = Vec::new();
        let mut skipped_admins = 0usize;
        let mut duplicates = 0usize;

        for group in groups {
            for member in &group.members {
                if self.exclude_admins && member.role.is_admin() {
                    skipped_admins += 1;
                    continue;
                }
                let Some(identity) = self.identify(member) else {
                    warn!(group = %group.id, member = %member.id, "member has no usable address");
                    continue;
                };
                if !seen.insert(identity.identifier.clone()) {
                    duplicates += 1;
                    continue;
                }
                recipients.push(
                    Recipient::new(identity.identifier)
                        .with_display_name(clean_name(member.push_name.as_deref()))
                        .with_origin(group.name.clone()),
                );
            }
        }

        debug!(
            groups = groups.len(),
            recipients = recipients.len(),
            skipped_admins,
            duplicates,
            "resolved group recipients"
        );
        recipients
    }

    /// Normalizes and deduplicates a pre-built lead list; first occurrence wins.
    pub fn resolve_leads(&self, leads: &[Lead]) -> Vec<Recipient> {
        let mut seen = HashSet::new();
        let mut recipients = Vec::with_capacity(leads.len());
        for lead in leads {
            let Some(identifier) = phone::normalize_phone(&lead.phone) else {
                warn!(phone = %lead.phone, "lead phone is not a usable number");
                continue;
            };
            if seen.insert(identifier.clone()) {
                recipients
                    .push(Recipient::new(identifier).with_display_name(clean_name(lead.name.as_deref())));
            }
        }
        recipients
    }

    /// Computes the canonical identifier for one member.
    ///
    /// Order: verified number, phone-backed protocol address, display-name
    /// digits (when enabled), then the raw protocol address.
    pub fn identify(&self, member: &GroupMember) -> Option<ResolvedIdentity> {
        if let Some(number) = member.phone_number.as_deref().and_then(phone::normalize_phone) {
            return Some(ResolvedIdentity {
                identifier: number,
                source: IdentitySource::VerifiedNumber,
            });
        }
        if let Some(number) = phone::phone_from_jid(&member.id) {
            return Some(ResolvedIdentity {
                identifier: number,
                source: IdentitySource::PhoneAddress,
            });
        }
        if self.display_name_digits {
            if let Some(number) = member
                .push_name
                .as_deref()
                .and_then(phone::phone_from_display_name)
            {
                return Some(ResolvedIdentity {
                    identifier: number,
                    source: IdentitySource::DisplayName,
                });
            }
        }
        let raw = member.id.trim();
        (!raw.is_empty()).then(|| ResolvedIdentity {
            identifier: raw.to_string(),
            source: IdentitySource::ProtocolAddress,
        })
    }
}

fn clean_name(name: Option<&str>) -> Option<String> {
    name.map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
}
