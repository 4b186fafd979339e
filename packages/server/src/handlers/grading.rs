use std::slice;

use axum::Json;
use axum::extract::{Path, State};
use chrono::Utc;
use common::TeamStatus;
use sea_orm::*;
use tracing::{info, instrument};

use crate::entity::team;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::grading::{GradeRequest, validate_grade};
use crate::models::team::TeamResponse;
use crate::state::AppState;
use crate::utils::hackathon::{
    explain_status_miss, find_hackathon, find_team, load_member_identities,
};

#[utoipa::path(
    post,
    path = "/api/v1/hackathons/{id}/teams/{team_id}/grade",
    tag = "Grading",
    operation_id = "gradeTeam",
    summary = "Record a team's first grade",
    description = "Records score and feedback for a submitted team. Requires `hackathon:grade` permission. Grading is single-shot: a team that is already graded is rejected with `INVALID_STATE` and its recorded score is untouched; use the regrade endpoint to override.",
    params(
        ("id" = i32, Path, description = "Hackathon ID"),
        ("team_id" = i32, Path, description = "Team ID"),
    ),
    request_body = GradeRequest,
    responses(
        (status = 200, description = "Grade recorded", body = TeamResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Team not in submitted status (INVALID_STATE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(score = payload.score))]
pub async fn grade_team(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((hackathon_id, team_id)): Path<(i32, i32)>,
    AppJson(payload): AppJson<GradeRequest>,
) -> Result<Json<TeamResponse>, AppError> {
    auth_user.require_permission("hackathon:grade")?;
    validate_grade(&payload)?;
    find_hackathon(&state.db, hackathon_id).await?;

    let now = Utc::now();
    let active = team::ActiveModel {
        score: Set(Some(payload.score)),
        feedback: Set(Some(payload.feedback.trim().to_string())),
        graded_by: Set(Some(auth_user.username.clone())),
        graded_at: Set(Some(now)),
        status: Set(TeamStatus::Graded),
        updated_at: Set(now),
        ..Default::default()
    };

    // The status filter is the whole single-shot guarantee: two graders
    // racing on one team means exactly one write lands, and the loser is
    // told the team is already graded.
    let result = team::Entity::update_many()
        .set(active)
        .filter(team::Column::Id.eq(team_id))
        .filter(team::Column::HackathonId.eq(hackathon_id))
        .filter(team::Column::Status.eq(TeamStatus::Submitted))
        .exec(&state.db)
        .await?;

    if result.rows_affected == 0 {
        return Err(explain_status_miss(
            &state.db,
            hackathon_id,
            team_id,
            TeamStatus::Submitted,
            "grade",
        )
        .await);
    }

    info!(team_id, hackathon_id, grader = %auth_user.username, "team graded");
    let model = find_team(&state.db, hackathon_id, team_id).await?;
    let identities = load_member_identities(&state.db, slice::from_ref(&model)).await?;
    Ok(Json(TeamResponse::from_model(model, &identities)))
}

#[utoipa::path(
    post,
    path = "/api/v1/hackathons/{id}/teams/{team_id}/regrade",
    tag = "Grading",
    operation_id = "regradeTeam",
    summary = "Override a recorded grade",
    description = "Overwrites score, feedback, grader, and grading time of an already graded team. Requires `hackathon:grade` permission. The team stays `graded`; a team that has not been graded yet must go through the grade endpoint first.",
    params(
        ("id" = i32, Path, description = "Hackathon ID"),
        ("team_id" = i32, Path, description = "Team ID"),
    ),
    request_body = GradeRequest,
    responses(
        (status = 200, description = "Grade overridden", body = TeamResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Team not graded yet (INVALID_STATE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(score = payload.score))]
pub async fn regrade_team(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((hackathon_id, team_id)): Path<(i32, i32)>,
    AppJson(payload): AppJson<GradeRequest>,
) -> Result<Json<TeamResponse>, AppError> {
    auth_user.require_permission("hackathon:grade")?;
    validate_grade(&payload)?;
    find_hackathon(&state.db, hackathon_id).await?;

    let now = Utc::now();
    let active = team::ActiveModel {
        score: Set(Some(payload.score)),
        feedback: Set(Some(payload.feedback.trim().to_string())),
        graded_by: Set(Some(auth_user.username.clone())),
        graded_at: Set(Some(now)),
        updated_at: Set(now),
        ..Default::default()
    };

    let result = team::Entity::update_many()
        .set(active)
        .filter(team::Column::Id.eq(team_id))
        .filter(team::Column::HackathonId.eq(hackathon_id))
        .filter(team::Column::Status.eq(TeamStatus::Graded))
        .exec(&state.db)
        .await?;

    if result.rows_affected == 0 {
        return Err(explain_status_miss(
            &state.db,
            hackathon_id,
            team_id,
            TeamStatus::Graded,
            "regrade",
        )
        .await);
    }

    info!(team_id, hackathon_id, grader = %auth_user.username, "grade overridden");
    let model = find_team(&state.db, hackathon_id, team_id).await?;
    let identities = load_member_identities(&state.db, slice::from_ref(&model)).await?;
    Ok(Json(TeamResponse::from_model(model, &identities)))
}
