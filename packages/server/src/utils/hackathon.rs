use std::collections::HashMap;

use chrono::{DateTime, Utc};
use common::membership::{IdentityEntry, MemberIdentity, MemberSource};
use common::{HackathonStatus, TeamStatus};
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};

use crate::entity::{hackathon, team, user};
use crate::error::AppError;

/// Look up a hackathon by ID, returning 404 if not found.
pub async fn find_hackathon<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<hackathon::Model, AppError> {
    hackathon::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Hackathon not found".into()))
}

/// Look up a team by (hackathon, team) ID pair, returning 404 if the team
/// does not exist or belongs to a different hackathon.
pub async fn find_team<C: ConnectionTrait>(
    db: &C,
    hackathon_id: i32,
    team_id: i32,
) -> Result<team::Model, AppError> {
    team::Entity::find_by_id(team_id)
        .filter(team::Column::HackathonId.eq(hackathon_id))
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Team not found".into()))
}

/// The hackathon's status as of `now`, derived from its dates. Never
/// written back; see `HackathonStatus::derive`.
pub fn effective_status(h: &hackathon::Model, now: DateTime<Utc>) -> HackathonStatus {
    HackathonStatus::derive(h.status, h.start_date, h.deadline, now)
}

/// Whether new submissions are accepted at `now`. The
/// `accepting_submissions` flag lets an instructor keep the window open
/// past the deadline.
pub fn submission_window_open(h: &hackathon::Model, now: DateTime<Utc>) -> bool {
    if effective_status(h, now) == HackathonStatus::Cancelled {
        return false;
    }
    now <= h.deadline || h.accepting_submissions
}

/// Whether new teams may register at `now`.
pub fn registration_open(h: &hackathon::Model, now: DateTime<Utc>) -> bool {
    h.accepting_submissions && !effective_status(h, now).is_closed()
}

/// Lowercased file extensions accepted by the hackathon. An empty list
/// means everything is accepted.
pub fn allowed_extensions(h: &hackathon::Model) -> Vec<String> {
    json_string_list(Some(&h.allowed_file_types))
        .into_iter()
        .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
        .filter(|ext| !ext.is_empty())
        .collect()
}

/// Extension of a file name (lowercased, without the dot), if any.
pub fn file_extension(file_name: &str) -> Option<String> {
    let name = file_name.rsplit('/').next().unwrap_or(file_name);
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => {
            Some(ext.to_ascii_lowercase())
        }
        _ => None,
    }
}

/// Read a JSON column leniently as a list of strings. Non-string entries
/// become empty strings so downstream display logic can degrade them to
/// the placeholder instead of erroring.
pub fn json_string_list(value: Option<&serde_json::Value>) -> Vec<String> {
    value
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .map(|item| item.as_str().unwrap_or_default().to_string())
                .collect()
        })
        .unwrap_or_default()
}

/// Select the team's membership channel, ids > emails > names, evaluated
/// once. `identities` maps identity ids to their resolved records.
pub fn member_source(
    t: &team::Model,
    identities: &HashMap<i32, MemberIdentity>,
) -> MemberSource {
    if let Some(ids) = t.member_ids.as_ref().and_then(|v| v.as_array())
        && !ids.is_empty()
    {
        let entries = ids
            .iter()
            .map(|entry| match entry {
                serde_json::Value::Number(n) => n
                    .as_i64()
                    .and_then(|id| i32::try_from(id).ok())
                    .and_then(|id| identities.get(&id).cloned())
                    .map(IdentityEntry::Resolved)
                    .unwrap_or(IdentityEntry::Missing),
                serde_json::Value::String(token) => IdentityEntry::Token(token.clone()),
                _ => IdentityEntry::Missing,
            })
            .collect();
        return MemberSource::ByIdentity(entries);
    }

    let emails = json_string_list(t.member_emails.as_ref());
    if !emails.is_empty() {
        return MemberSource::ByEmail(emails);
    }

    let names = json_string_list(t.member_names.as_ref());
    if !names.is_empty() {
        return MemberSource::ByName(names);
    }

    MemberSource::Empty
}

/// Batch-load the identity records referenced by `member_ids` across all
/// given teams. Unknown ids are simply absent from the returned map.
pub async fn load_member_identities<C: ConnectionTrait>(
    db: &C,
    teams: &[team::Model],
) -> Result<HashMap<i32, MemberIdentity>, AppError> {
    let ids: Vec<i32> = teams
        .iter()
        .filter_map(|t| t.member_ids.as_ref())
        .filter_map(|v| v.as_array())
        .flatten()
        .filter_map(|entry| entry.as_i64())
        .filter_map(|id| i32::try_from(id).ok())
        .collect();

    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let users = user::Entity::find()
        .filter(user::Column::Id.is_in(ids))
        .all(db)
        .await?;

    Ok(users
        .into_iter()
        .map(|u| {
            let name = u.display_name.or(Some(u.username));
            (
                u.id,
                MemberIdentity {
                    name,
                    email: u.email,
                },
            )
        })
        .collect())
}

/// Map a conditional-update miss on a team to the right error: the team
/// may not exist at all, or its status moved past the precondition.
pub async fn explain_status_miss<C: ConnectionTrait>(
    db: &C,
    hackathon_id: i32,
    team_id: i32,
    expected: TeamStatus,
    operation: &str,
) -> AppError {
    match find_team(db, hackathon_id, team_id).await {
        Ok(t) => AppError::InvalidState(format!(
            "Cannot {operation}: team status is '{}', expected '{}'",
            t.status, expected
        )),
        Err(e) => e,
    }
}
