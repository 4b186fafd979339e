use std::slice;

use axum::Json;
use axum::extract::{Path, State};
use chrono::Utc;
use common::{HackathonStatus, TeamStatus};
use sea_orm::*;
use tracing::{info, instrument};

use crate::entity::team;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::submission::*;
use crate::models::team::TeamResponse;
use crate::state::AppState;
use crate::utils::hackathon::{
    allowed_extensions, effective_status, find_hackathon, find_team, load_member_identities,
    submission_window_open,
};

#[utoipa::path(
    post,
    path = "/api/v1/hackathons/{id}/teams/{team_id}/start",
    tag = "Submissions",
    operation_id = "startWork",
    summary = "Mark a team as working",
    description = "Moves the team from `not_started` to `in_progress`. Calling it again while already `in_progress` is a no-op success; a team that has submitted or been graded cannot go back to working.",
    params(
        ("id" = i32, Path, description = "Hackathon ID"),
        ("team_id" = i32, Path, description = "Team ID"),
    ),
    responses(
        (status = 200, description = "Team is in progress", body = TeamResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Team already submitted or graded (INVALID_STATE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user))]
pub async fn start_work(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path((hackathon_id, team_id)): Path<(i32, i32)>,
) -> Result<Json<TeamResponse>, AppError> {
    let hackathon = find_hackathon(&state.db, hackathon_id).await?;
    let now = Utc::now();

    if effective_status(&hackathon, now) == HackathonStatus::Cancelled {
        return Err(AppError::Conflict("The hackathon was cancelled".into()));
    }

    let active = team::ActiveModel {
        status: Set(TeamStatus::InProgress),
        updated_at: Set(now),
        ..Default::default()
    };
    let result = team::Entity::update_many()
        .set(active)
        .filter(team::Column::Id.eq(team_id))
        .filter(team::Column::HackathonId.eq(hackathon_id))
        .filter(team::Column::Status.eq(TeamStatus::NotStarted))
        .exec(&state.db)
        .await?;

    if result.rows_affected == 0 {
        let current = find_team(&state.db, hackathon_id, team_id).await?;
        // Already working: treat the repeat call as a success.
        if current.status != TeamStatus::InProgress {
            return Err(AppError::InvalidState(format!(
                "Cannot start work: team status is '{}'",
                current.status
            )));
        }
    }

    let model = find_team(&state.db, hackathon_id, team_id).await?;
    let identities = load_member_identities(&state.db, slice::from_ref(&model)).await?;
    Ok(Json(TeamResponse::from_model(model, &identities)))
}

#[utoipa::path(
    post,
    path = "/api/v1/hackathons/{id}/teams/{team_id}/submit",
    tag = "Submissions",
    operation_id = "submitWork",
    summary = "Submit a team's work",
    description = "Records the team's submission. At least one channel (text, link, files) must be provided; every file extension must be accepted by the hackathon or the whole submission is rejected. Re-submitting before grading overwrites the previous submission. After the deadline, submissions are rejected unless the instructor kept the window open.",
    params(
        ("id" = i32, Path, description = "Hackathon ID"),
        ("team_id" = i32, Path, description = "Team ID"),
    ),
    request_body = SubmitRequest,
    responses(
        (status = 200, description = "Submission recorded", body = TeamResponse),
        (status = 400, description = "Empty submission, unsupported file type, or past deadline (VALIDATION_ERROR, UNSUPPORTED_FILE_TYPE, DEADLINE_EXCEEDED)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Team already graded (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload))]
pub async fn submit_work(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((hackathon_id, team_id)): Path<(i32, i32)>,
    AppJson(payload): AppJson<SubmitRequest>,
) -> Result<Json<TeamResponse>, AppError> {
    let hackathon = find_hackathon(&state.db, hackathon_id).await?;
    let now = Utc::now();

    if effective_status(&hackathon, now) == HackathonStatus::Cancelled {
        return Err(AppError::Conflict("The hackathon was cancelled".into()));
    }
    if !submission_window_open(&hackathon, now) {
        return Err(AppError::DeadlineExceeded);
    }

    validate_submit(&payload, &allowed_extensions(&hackathon))?;

    let files = to_submitted_files(&payload.files, &auth_user.username, now);
    let active = team::ActiveModel {
        submission_text: Set(payload
            .submission_text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)),
        submission_link: Set(payload
            .submission_link
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)),
        submitted_files: Set(Some(serde_json::to_value(&files)?)),
        submitted_at: Set(Some(now)),
        status: Set(TeamStatus::Submitted),
        updated_at: Set(now),
        ..Default::default()
    };

    // Every pre-grading status may submit; a graded team may not, and the
    // filter holds even if grading lands between our read and this write.
    let result = team::Entity::update_many()
        .set(active)
        .filter(team::Column::Id.eq(team_id))
        .filter(team::Column::HackathonId.eq(hackathon_id))
        .filter(team::Column::Status.is_in([
            TeamStatus::NotStarted,
            TeamStatus::InProgress,
            TeamStatus::Submitted,
        ]))
        .exec(&state.db)
        .await?;

    if result.rows_affected == 0 {
        return match find_team(&state.db, hackathon_id, team_id).await {
            Ok(_) => Err(AppError::Conflict(
                "Cannot submit: the team has already been graded".into(),
            )),
            Err(e) => Err(e),
        };
    }

    info!(team_id, hackathon_id, "submission recorded");
    let model = find_team(&state.db, hackathon_id, team_id).await?;
    let identities = load_member_identities(&state.db, slice::from_ref(&model)).await?;
    Ok(Json(TeamResponse::from_model(model, &identities)))
}
