use std::collections::HashMap;

use chrono::{DateTime, Utc};
use common::TeamStatus;
use common::membership::{DisplayIdentity, MemberIdentity, resolve_display_names};
use serde::{Deserialize, Serialize};

use super::shared::double_option;
use crate::entity::team::{self, SubmittedFile};
use crate::error::AppError;
use crate::utils::hackathon::{json_string_list, member_source};

/// One entry of the identity-reference membership channel. Legacy
/// clients send opaque string tokens where newer ones send numeric ids.
#[derive(Clone, Debug, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(untagged)]
pub enum MemberRef {
    Id(i32),
    Token(String),
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct RegisterTeamRequest {
    pub team_name: String,
    pub problem_statement: Option<String>,
    /// Identity-reference channel. Takes precedence over the other two.
    pub member_ids: Option<Vec<MemberRef>>,
    /// Raw-email channel.
    pub member_emails: Option<Vec<String>>,
    /// Display-name channel.
    pub member_names: Option<Vec<String>>,
    /// Defaults to the first member of the populated channel.
    pub team_leader: Option<String>,
}

#[derive(Deserialize, Default, utoipa::ToSchema)]
pub struct UpdateTeamRequest {
    pub team_name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub problem_statement: Option<Option<String>>,
    pub member_ids: Option<Vec<MemberRef>>,
    pub member_emails: Option<Vec<String>>,
    pub member_names: Option<Vec<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub team_leader: Option<Option<String>>,
}

// ---------------------------------------------------------------------------
// Response DTOs
// ---------------------------------------------------------------------------

#[derive(Serialize, utoipa::ToSchema)]
pub struct TeamResponse {
    pub id: i32,
    pub hackathon_id: i32,
    pub team_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub problem_statement: Option<String>,
    /// Resolved display identities of the selected membership channel.
    pub members: Vec<DisplayIdentity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_leader: Option<String>,
    pub status: TeamStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submission_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submission_text: Option<String>,
    pub submitted_files: Vec<SubmittedFile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graded_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TeamResponse {
    /// Build a response from a team row, resolving membership through the
    /// given id → identity map.
    pub fn from_model(m: team::Model, identities: &HashMap<i32, MemberIdentity>) -> Self {
        let members = resolve_display_names(&member_source(&m, identities));
        let submitted_files = m
            .submitted_files
            .as_ref()
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or_default();
        Self {
            id: m.id,
            hackathon_id: m.hackathon_id,
            team_name: m.team_name,
            problem_statement: m.problem_statement,
            members,
            team_leader: m.team_leader,
            status: m.status,
            submission_link: m.submission_link,
            submission_text: m.submission_text,
            submitted_files,
            submitted_at: m.submitted_at,
            score: m.score,
            feedback: m.feedback,
            graded_by: m.graded_by,
            graded_at: m.graded_at,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// The channel the request populates, with ids > emails > names
/// precedence, and its member count.
pub fn requested_member_count(req: &RegisterTeamRequest) -> usize {
    if let Some(ids) = &req.member_ids
        && !ids.is_empty()
    {
        return ids.len();
    }
    if let Some(emails) = &req.member_emails
        && !emails.is_empty()
    {
        return emails.len();
    }
    req.member_names.as_ref().map_or(0, |names| names.len())
}

/// First member of the populated channel, in that channel's own
/// representation, for use as the default leader.
pub fn default_leader(req: &RegisterTeamRequest) -> Option<String> {
    if let Some(ids) = &req.member_ids
        && let Some(first) = ids.first()
    {
        return Some(match first {
            MemberRef::Id(id) => id.to_string(),
            MemberRef::Token(token) => token.clone(),
        });
    }
    if let Some(emails) = &req.member_emails
        && let Some(first) = emails.first()
    {
        return Some(first.clone());
    }
    req.member_names
        .as_ref()
        .and_then(|names| names.first().cloned())
}

pub fn validate_register_team(
    req: &RegisterTeamRequest,
    min_team_size: i32,
    max_team_size: i32,
) -> Result<(), AppError> {
    let name = req.team_name.trim();
    if name.is_empty() || name.chars().count() > 256 {
        return Err(AppError::Validation(
            "team_name must be 1-256 characters".into(),
        ));
    }
    validate_member_count(requested_member_count(req), min_team_size, max_team_size)
}

pub fn validate_member_count(count: usize, min: i32, max: i32) -> Result<(), AppError> {
    let count = count as i64;
    if count < min as i64 || count > max as i64 {
        return Err(AppError::Validation(format!(
            "Team must have between {min} and {max} members, got {count}"
        )));
    }
    Ok(())
}

/// Member count after applying a membership patch on top of the stored
/// row, honoring channel precedence. `None` when the patch leaves
/// membership untouched.
pub fn patched_member_count(req: &UpdateTeamRequest, current: &team::Model) -> Option<usize> {
    if req.member_ids.is_none() && req.member_emails.is_none() && req.member_names.is_none() {
        return None;
    }

    let ids_len = match &req.member_ids {
        Some(ids) => ids.len(),
        None => current
            .member_ids
            .as_ref()
            .and_then(|v| v.as_array())
            .map_or(0, |a| a.len()),
    };
    if ids_len > 0 {
        return Some(ids_len);
    }

    let emails_len = match &req.member_emails {
        Some(emails) => emails.len(),
        None => json_string_list(current.member_emails.as_ref()).len(),
    };
    if emails_len > 0 {
        return Some(emails_len);
    }

    Some(match &req.member_names {
        Some(names) => names.len(),
        None => json_string_list(current.member_names.as_ref()).len(),
    })
}

pub fn member_refs_to_json(refs: &[MemberRef]) -> serde_json::Value {
    serde_json::to_value(refs).unwrap_or_else(|_| serde_json::Value::Array(Vec::new()))
}
