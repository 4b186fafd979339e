use std::slice;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;
use common::TeamStatus;
use sea_orm::prelude::Expr;
use sea_orm::sea_query::Func;
use sea_orm::*;
use tracing::{info, instrument};

use crate::entity::team;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::team::*;
use crate::state::AppState;
use crate::utils::hackathon::{
    find_hackathon, find_team, load_member_identities, member_source, registration_open,
};

/// Whether the database rejected a write on the case-insensitive
/// `(hackathon_id, lower(team_name))` unique index.
fn is_duplicate_name(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// Whether another team in the hackathon already uses this name,
/// compared case-insensitively.
async fn team_name_taken<C: ConnectionTrait>(
    db: &C,
    hackathon_id: i32,
    name: &str,
    exclude_team: Option<i32>,
) -> Result<bool, AppError> {
    let mut select = team::Entity::find()
        .filter(team::Column::HackathonId.eq(hackathon_id))
        .filter(
            Expr::expr(Func::lower(Expr::col(team::Column::TeamName)))
                .eq(name.trim().to_lowercase()),
        );
    if let Some(id) = exclude_team {
        select = select.filter(team::Column::Id.ne(id));
    }
    Ok(select.one(db).await?.is_some())
}

/// Total member count across the hackathon's existing teams, used to
/// enforce `max_participants`.
async fn current_participant_count<C: ConnectionTrait>(
    db: &C,
    hackathon_id: i32,
) -> Result<usize, AppError> {
    let teams = team::Entity::find()
        .filter(team::Column::HackathonId.eq(hackathon_id))
        .all(db)
        .await?;
    let empty = std::collections::HashMap::new();
    Ok(teams.iter().map(|t| member_source(t, &empty).len()).sum())
}

#[utoipa::path(
    post,
    path = "/api/v1/hackathons/{id}/teams",
    tag = "Teams",
    operation_id = "registerTeam",
    summary = "Register a team for a hackathon",
    description = "Registers a new team. Membership may be given through identity references (`member_ids`), raw emails (`member_emails`), or display names (`member_names`); when several are given, ids win over emails, which win over names. The member count of the selected channel must fall within the hackathon's team-size bounds.",
    params(("id" = i32, Path, description = "Hackathon ID")),
    request_body = RegisterTeamRequest,
    responses(
        (status = 201, description = "Team registered", body = TeamResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Hackathon not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Duplicate name or closed registration (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user, payload), fields(team_name = %payload.team_name))]
pub async fn register_team(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(hackathon_id): Path<i32>,
    AppJson(payload): AppJson<RegisterTeamRequest>,
) -> Result<impl IntoResponse, AppError> {
    let hackathon = find_hackathon(&state.db, hackathon_id).await?;
    let now = Utc::now();

    if !registration_open(&hackathon, now) {
        return Err(AppError::Conflict(
            "Registration for this hackathon is closed".into(),
        ));
    }

    validate_register_team(&payload, hackathon.min_team_size, hackathon.max_team_size)?;

    if team_name_taken(&state.db, hackathon_id, &payload.team_name, None).await? {
        return Err(AppError::Conflict(format!(
            "A team named '{}' is already registered",
            payload.team_name.trim()
        )));
    }

    if let Some(max_participants) = hackathon.max_participants {
        let current = current_participant_count(&state.db, hackathon_id).await?;
        let joining = requested_member_count(&payload);
        // Widen rather than cast to usize so a non-positive cap on a
        // legacy row still rejects instead of wrapping.
        if (current + joining) as i64 > i64::from(max_participants) {
            return Err(AppError::Conflict(
                "The hackathon has reached its participant limit".into(),
            ));
        }
    }

    let team_leader = payload.team_leader.clone().or_else(|| default_leader(&payload));

    let new_team = team::ActiveModel {
        hackathon_id: Set(hackathon_id),
        team_name: Set(payload.team_name.trim().to_string()),
        problem_statement: Set(payload.problem_statement),
        member_ids: Set(payload.member_ids.as_deref().map(member_refs_to_json)),
        member_emails: Set(payload
            .member_emails
            .as_ref()
            .map(|v| serde_json::json!(v))),
        member_names: Set(payload.member_names.as_ref().map(|v| serde_json::json!(v))),
        team_leader: Set(team_leader),
        status: Set(TeamStatus::NotStarted),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    // The unique index backs up the pre-insert check: when two
    // registrations of the same name race past it, one insert loses here.
    let model = match new_team.insert(&state.db).await {
        Ok(model) => model,
        Err(err) if is_duplicate_name(&err) => {
            return Err(AppError::Conflict(format!(
                "A team named '{}' is already registered",
                payload.team_name.trim()
            )));
        }
        Err(err) => return Err(err.into()),
    };
    info!(team_id = model.id, hackathon_id, "team registered");

    let identities = load_member_identities(&state.db, slice::from_ref(&model)).await?;
    Ok((
        StatusCode::CREATED,
        Json(TeamResponse::from_model(model, &identities)),
    ))
}

#[utoipa::path(
    patch,
    path = "/api/v1/hackathons/{id}/teams/{team_id}",
    tag = "Teams",
    operation_id = "updateTeam",
    summary = "Update a team",
    description = "Partial update of a team's name, problem statement, membership, or leader. Allowed only before the team submits; membership patches are revalidated against the hackathon's team-size bounds.",
    params(
        ("id" = i32, Path, description = "Hackathon ID"),
        ("team_id" = i32, Path, description = "Team ID"),
    ),
    request_body = UpdateTeamRequest,
    responses(
        (status = 200, description = "Team updated", body = TeamResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Team already submitted or name taken (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user, payload))]
pub async fn update_team(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path((hackathon_id, team_id)): Path<(i32, i32)>,
    AppJson(payload): AppJson<UpdateTeamRequest>,
) -> Result<Json<TeamResponse>, AppError> {
    let hackathon = find_hackathon(&state.db, hackathon_id).await?;
    let current = find_team(&state.db, hackathon_id, team_id).await?;

    if !current.status.is_editable() {
        return Err(AppError::Conflict(
            "Team can no longer be edited after submission".into(),
        ));
    }

    if let Some(ref name) = payload.team_name {
        let trimmed = name.trim();
        if trimmed.is_empty() || trimmed.chars().count() > 256 {
            return Err(AppError::Validation(
                "team_name must be 1-256 characters".into(),
            ));
        }
        if team_name_taken(&state.db, hackathon_id, trimmed, Some(team_id)).await? {
            return Err(AppError::Conflict(format!(
                "A team named '{trimmed}' is already registered"
            )));
        }
    }

    if let Some(count) = patched_member_count(&payload, &current) {
        validate_member_count(count, hackathon.min_team_size, hackathon.max_team_size)?;
    }

    let now = Utc::now();
    let mut active = team::ActiveModel {
        updated_at: Set(now),
        ..Default::default()
    };
    if let Some(name) = payload.team_name {
        active.team_name = Set(name.trim().to_string());
    }
    if let Some(ps) = payload.problem_statement {
        active.problem_statement = Set(ps);
    }
    if let Some(ref ids) = payload.member_ids {
        active.member_ids = Set(Some(member_refs_to_json(ids)));
    }
    if let Some(ref emails) = payload.member_emails {
        active.member_emails = Set(Some(serde_json::json!(emails)));
    }
    if let Some(ref names) = payload.member_names {
        active.member_names = Set(Some(serde_json::json!(names)));
    }
    if let Some(leader) = payload.team_leader {
        active.team_leader = Set(leader);
    }

    // Guarded write: edits are lost the moment the team submits, even if
    // the submission raced this request.
    let result = match team::Entity::update_many()
        .set(active)
        .filter(team::Column::Id.eq(team_id))
        .filter(team::Column::HackathonId.eq(hackathon_id))
        .filter(
            team::Column::Status.is_in([TeamStatus::NotStarted, TeamStatus::InProgress]),
        )
        .exec(&state.db)
        .await
    {
        Ok(result) => result,
        Err(err) if is_duplicate_name(&err) => {
            return Err(AppError::Conflict(
                "A team with that name is already registered".into(),
            ));
        }
        Err(err) => return Err(err.into()),
    };

    if result.rows_affected == 0 {
        return match find_team(&state.db, hackathon_id, team_id).await {
            Ok(_) => Err(AppError::Conflict(
                "Team can no longer be edited after submission".into(),
            )),
            Err(e) => Err(e),
        };
    }

    let model = find_team(&state.db, hackathon_id, team_id).await?;
    let identities = load_member_identities(&state.db, slice::from_ref(&model)).await?;
    Ok(Json(TeamResponse::from_model(model, &identities)))
}
