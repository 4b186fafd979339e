use chrono::{DateTime, Utc};
use common::HackathonStatus;
use serde::{Deserialize, Serialize};

use super::shared::{Pagination, double_option};
use super::team::TeamResponse;
use crate::entity::hackathon::{HackathonResource, HackathonTask};
use crate::error::AppError;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateHackathonRequest {
    #[serde(default)]
    pub title: String,
    /// Markdown body shown to participants.
    #[serde(default)]
    pub problem_statement: String,
    #[serde(default)]
    pub challenge: String,
    pub detailed_instructions: Option<String>,
    #[serde(default)]
    pub tasks: Vec<HackathonTask>,
    #[serde(default)]
    pub resources: Vec<HackathonResource>,
    /// Accepted file extensions, e.g. `["pdf", "zip"]`. Empty accepts all.
    #[serde(default)]
    pub allowed_file_types: Vec<String>,
    #[serde(default = "default_min_team_size")]
    pub min_team_size: i32,
    #[serde(default = "default_max_team_size")]
    pub max_team_size: i32,
    pub max_participants: Option<i32>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    /// Optional in the payload so its absence is reported alongside the
    /// other validation failures rather than as a parse error.
    pub deadline: Option<DateTime<Utc>>,
    pub accepting_submissions: Option<bool>,
}

fn default_min_team_size() -> i32 {
    1
}

fn default_max_team_size() -> i32 {
    5
}

#[derive(Deserialize, Default, utoipa::ToSchema)]
pub struct UpdateHackathonRequest {
    pub title: Option<String>,
    pub problem_statement: Option<String>,
    pub challenge: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub detailed_instructions: Option<Option<String>>,
    pub tasks: Option<Vec<HackathonTask>>,
    pub resources: Option<Vec<HackathonResource>>,
    pub allowed_file_types: Option<Vec<String>>,
    pub min_team_size: Option<i32>,
    pub max_team_size: Option<i32>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<i32>)]
    pub max_participants: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<DateTime<Utc>>)]
    pub start_date: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<DateTime<Utc>>)]
    pub end_date: Option<Option<DateTime<Utc>>>,
    pub deadline: Option<DateTime<Utc>>,
    pub accepting_submissions: Option<bool>,
    /// Only `cancelled` and `completed` may be set explicitly; the other
    /// statuses are derived from the dates.
    pub status: Option<HackathonStatus>,
}

#[derive(Deserialize, utoipa::IntoParams)]
pub struct HackathonListQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    /// Filter on the date-derived status, not the stored snapshot.
    pub status: Option<HackathonStatus>,
    pub search: Option<String>,
}

// ---------------------------------------------------------------------------
// Response DTOs
// ---------------------------------------------------------------------------

#[derive(Serialize, utoipa::ToSchema)]
pub struct HackathonResponse {
    pub id: i32,
    pub title: String,
    pub problem_statement: String,
    pub challenge: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detailed_instructions: Option<String>,
    pub tasks: serde_json::Value,
    pub resources: serde_json::Value,
    pub allowed_file_types: serde_json::Value,
    pub min_team_size: i32,
    pub max_team_size: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_participants: Option<i32>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub deadline: DateTime<Utc>,
    /// Derived from the dates as of the request, never the raw snapshot.
    pub status: HackathonStatus,
    pub accepting_submissions: bool,
    pub created_by: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl HackathonResponse {
    pub fn from_model(m: crate::entity::hackathon::Model, now: DateTime<Utc>) -> Self {
        let status = crate::utils::hackathon::effective_status(&m, now);
        Self {
            id: m.id,
            title: m.title,
            problem_statement: m.problem_statement,
            challenge: m.challenge,
            detailed_instructions: m.detailed_instructions,
            tasks: m.tasks,
            resources: m.resources,
            allowed_file_types: m.allowed_file_types,
            min_team_size: m.min_team_size,
            max_team_size: m.max_team_size,
            max_participants: m.max_participants,
            start_date: m.start_date,
            end_date: m.end_date,
            deadline: m.deadline,
            status,
            accepting_submissions: m.accepting_submissions,
            created_by: m.created_by,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct HackathonDetailResponse {
    #[serde(flatten)]
    pub hackathon: HackathonResponse,
    pub teams: Vec<TeamResponse>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct HackathonListResponse {
    pub data: Vec<HackathonResponse>,
    pub pagination: Pagination,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a create request, accumulating every violation so the client
/// sees the full list in one response.
pub fn validate_create_hackathon(req: &CreateHackathonRequest) -> Result<(), AppError> {
    let mut errors = Vec::new();

    if req.title.trim().is_empty() {
        errors.push("title is required".to_string());
    } else if req.title.trim().chars().count() > 256 {
        errors.push("title must be at most 256 characters".to_string());
    }
    if req.problem_statement.trim().is_empty() {
        errors.push("problem_statement is required".to_string());
    }
    if req.challenge.trim().is_empty() {
        errors.push("challenge is required".to_string());
    }
    if req.deadline.is_none() {
        errors.push("deadline is required".to_string());
    }

    if req.min_team_size < 1 {
        errors.push("min_team_size must be at least 1".to_string());
    }
    if req.max_team_size < req.min_team_size {
        errors.push("max_team_size must be >= min_team_size".to_string());
    }
    if let Some(max) = req.max_participants
        && max < 1
    {
        errors.push("max_participants must be at least 1".to_string());
    }

    for (i, task) in req.tasks.iter().enumerate() {
        if task.title.trim().is_empty() {
            errors.push(format!("tasks[{i}].title is required"));
        }
        if task.points < 0 {
            errors.push(format!("tasks[{i}].points must be >= 0"));
        }
    }
    for (i, resource) in req.resources.iter().enumerate() {
        if resource.url.trim().is_empty() {
            errors.push(format!("resources[{i}].url is required"));
        }
    }

    if let (Some(start), Some(deadline)) = (req.start_date, req.deadline)
        && deadline < start
    {
        errors.push("deadline must not be before start_date".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::ValidationErrors(errors))
    }
}

pub fn validate_update_hackathon(req: &UpdateHackathonRequest) -> Result<(), AppError> {
    let mut errors = Vec::new();

    if let Some(ref title) = req.title {
        let title = title.trim();
        if title.is_empty() || title.chars().count() > 256 {
            errors.push("title must be 1-256 characters".to_string());
        }
    }
    if let Some(ref ps) = req.problem_statement
        && ps.trim().is_empty()
    {
        errors.push("problem_statement must not be empty".to_string());
    }
    if let Some(ref challenge) = req.challenge
        && challenge.trim().is_empty()
    {
        errors.push("challenge must not be empty".to_string());
    }
    if let Some(min) = req.min_team_size
        && min < 1
    {
        errors.push("min_team_size must be at least 1".to_string());
    }
    if let (Some(min), Some(max)) = (req.min_team_size, req.max_team_size)
        && max < min
    {
        errors.push("max_team_size must be >= min_team_size".to_string());
    }
    if let Some(Some(max)) = req.max_participants
        && max < 1
    {
        errors.push("max_participants must be at least 1".to_string());
    }
    if let Some(tasks) = &req.tasks {
        for (i, task) in tasks.iter().enumerate() {
            if task.points < 0 {
                errors.push(format!("tasks[{i}].points must be >= 0"));
            }
        }
    }
    if let Some(status) = req.status
        && status != HackathonStatus::Cancelled
        && status != HackathonStatus::Completed
    {
        errors.push("status may only be set to 'cancelled' or 'completed'".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::ValidationErrors(errors))
    }
}
