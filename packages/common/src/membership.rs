//! Reconciles the three optional ways a team's members may be recorded
//! (identity references, raw emails, plain display names) into one
//! ordered list of display identities.
//!
//! This is a read-side transform used for display and reporting only, so
//! it is total: malformed entries degrade to a placeholder, never to an
//! error, and the output length always matches the selected channel's
//! length.

use serde::{Deserialize, Serialize};

/// Shown for members whose identity cannot be resolved to anything
/// printable.
pub const MEMBER_PLACEHOLDER: &str = "—";

/// A resolved identity record, as read from the identity store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberIdentity {
    pub name: Option<String>,
    pub email: Option<String>,
}

/// One entry of the identity-reference channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IdentityEntry {
    /// Reference resolved to an identity record.
    Resolved(MemberIdentity),
    /// Raw reference token that did not resolve to a record. Legacy data
    /// stored emails directly in the reference list, so an email-shaped
    /// token still yields a usable display name.
    Token(String),
    /// Null or otherwise absent entry.
    Missing,
}

/// The membership channel selected for a team, chosen once per
/// resolution. Channels are never mixed: identity references win over
/// emails, which win over plain names.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MemberSource {
    ByIdentity(Vec<IdentityEntry>),
    ByEmail(Vec<String>),
    ByName(Vec<String>),
    Empty,
}

impl MemberSource {
    /// Number of members recorded in the selected channel.
    pub fn len(&self) -> usize {
        match self {
            Self::ByIdentity(entries) => entries.len(),
            Self::ByEmail(emails) => emails.len(),
            Self::ByName(names) => names.len(),
            Self::Empty => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One member as displayed in team listings and reports.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct DisplayIdentity {
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Resolve a team's membership into an ordered list of display
/// identities. Never fails; output length equals `source.len()`.
pub fn resolve_display_names(source: &MemberSource) -> Vec<DisplayIdentity> {
    match source {
        MemberSource::ByIdentity(entries) => entries.iter().map(resolve_identity_entry).collect(),
        MemberSource::ByEmail(emails) => emails
            .iter()
            .map(|email| DisplayIdentity {
                display_name: local_part(email)
                    .unwrap_or_else(|| MEMBER_PLACEHOLDER.to_string()),
                email: non_blank(email),
            })
            .collect(),
        MemberSource::ByName(names) => names
            .iter()
            .map(|name| DisplayIdentity {
                display_name: non_blank(name).unwrap_or_else(|| MEMBER_PLACEHOLDER.to_string()),
                email: None,
            })
            .collect(),
        MemberSource::Empty => Vec::new(),
    }
}

fn resolve_identity_entry(entry: &IdentityEntry) -> DisplayIdentity {
    match entry {
        IdentityEntry::Resolved(identity) => {
            let display_name = identity
                .name
                .as_deref()
                .and_then(non_blank_str)
                .or_else(|| identity.email.as_deref().and_then(local_part))
                .unwrap_or_else(|| MEMBER_PLACEHOLDER.to_string());
            DisplayIdentity {
                display_name,
                email: identity.email.as_deref().and_then(non_blank_str),
            }
        }
        IdentityEntry::Token(token) if token.contains('@') => DisplayIdentity {
            display_name: local_part(token).unwrap_or_else(|| MEMBER_PLACEHOLDER.to_string()),
            email: non_blank(token),
        },
        IdentityEntry::Token(_) | IdentityEntry::Missing => DisplayIdentity {
            display_name: MEMBER_PLACEHOLDER.to_string(),
            email: None,
        },
    }
}

/// The part of an email-like string before the `@`, trimmed. `None` when
/// nothing printable remains.
fn local_part(s: &str) -> Option<String> {
    let trimmed = s.trim();
    let local = trimmed.split('@').next().unwrap_or(trimmed).trim();
    if local.is_empty() {
        None
    } else {
        Some(local.to_string())
    }
}

fn non_blank(s: &str) -> Option<String> {
    non_blank_str(s)
}

fn non_blank_str(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
