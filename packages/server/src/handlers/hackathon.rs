use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;
use common::HackathonStatus;
use common::TeamStatus;
use common::membership::resolve_display_names;
use sea_orm::prelude::Expr;
use sea_orm::sea_query::{Func, LikeExpr};
use sea_orm::*;
use tracing::instrument;

use crate::entity::{hackathon, team};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::hackathon::*;
use crate::models::shared::{Pagination, escape_like};
use crate::models::submission::{
    SubmissionReportItem, SubmissionReportResponse, SubmissionSummary,
};
use crate::models::team::TeamResponse;
use crate::state::AppState;
use crate::utils::hackathon::{find_hackathon, load_member_identities, member_source};

#[utoipa::path(
    post,
    path = "/api/v1/hackathons",
    tag = "Hackathons",
    operation_id = "createHackathon",
    summary = "Create a new hackathon",
    description = "Creates a new hackathon. Requires `hackathon:create` permission. All validation failures are reported together in the `details` array.",
    request_body = CreateHackathonRequest,
    responses(
        (status = 201, description = "Hackathon created", body = HackathonResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(title = %payload.title))]
pub async fn create_hackathon(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateHackathonRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission("hackathon:create")?;
    validate_create_hackathon(&payload)?;

    let now = Utc::now();
    // Presence is validated above.
    let deadline = payload
        .deadline
        .ok_or_else(|| AppError::Validation("deadline is required".into()))?;

    // Snapshot the date-derived status at creation; later reads re-derive
    // it, so this value never goes stale.
    let status = match payload.start_date {
        Some(start) if now < start => HackathonStatus::Upcoming,
        _ => HackathonStatus::Active,
    };

    let allowed_file_types: Vec<String> = payload
        .allowed_file_types
        .iter()
        .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
        .filter(|ext| !ext.is_empty())
        .collect();

    let new_hackathon = hackathon::ActiveModel {
        title: Set(payload.title.trim().to_string()),
        problem_statement: Set(payload.problem_statement),
        challenge: Set(payload.challenge),
        detailed_instructions: Set(payload.detailed_instructions),
        tasks: Set(serde_json::to_value(&payload.tasks)?),
        resources: Set(serde_json::to_value(&payload.resources)?),
        allowed_file_types: Set(serde_json::to_value(&allowed_file_types)?),
        min_team_size: Set(payload.min_team_size),
        max_team_size: Set(payload.max_team_size),
        max_participants: Set(payload.max_participants),
        start_date: Set(payload.start_date),
        end_date: Set(payload.end_date),
        deadline: Set(deadline),
        status: Set(status),
        accepting_submissions: Set(payload.accepting_submissions.unwrap_or(true)),
        created_by: Set(auth_user.user_id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let model = new_hackathon.insert(&state.db).await?;

    Ok((
        StatusCode::CREATED,
        Json(HackathonResponse::from_model(model, now)),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/hackathons",
    tag = "Hackathons",
    operation_id = "listHackathons",
    summary = "List hackathons",
    description = "Returns hackathons newest first with their date-derived status. The optional `status` filter matches the derived status, not the stored snapshot.",
    params(HackathonListQuery),
    responses(
        (status = 200, description = "List of hackathons", body = HackathonListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user, query))]
pub async fn list_hackathons(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<HackathonListQuery>,
) -> Result<Json<HackathonListResponse>, AppError> {
    let page = Ord::max(query.page.unwrap_or(1), 1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    let now = Utc::now();

    let mut select = hackathon::Entity::find();

    if let Some(ref search) = query.search {
        let term = escape_like(search.trim());
        if !term.is_empty() {
            select = select.filter(
                Expr::expr(Func::lower(Expr::col(hackathon::Column::Title)))
                    .like(LikeExpr::new(format!("%{}%", term.to_lowercase())).escape('\\')),
            );
        }
    }

    select = select.order_by_desc(hackathon::Column::CreatedAt);

    // The status filter works on the derived status, which the database
    // does not know, so filtering happens after the read.
    if let Some(status) = query.status {
        let all: Vec<HackathonResponse> = select
            .all(&state.db)
            .await?
            .into_iter()
            .map(|m| HackathonResponse::from_model(m, now))
            .filter(|h| h.status == status)
            .collect();

        let total = all.len() as u64;
        let total_pages = total.div_ceil(per_page);
        let data = all
            .into_iter()
            .skip(((page - 1) * per_page) as usize)
            .take(per_page as usize)
            .collect();

        return Ok(Json(HackathonListResponse {
            data,
            pagination: Pagination {
                page,
                per_page,
                total,
                total_pages,
            },
        }));
    }

    let total = select
        .clone()
        .paginate(&state.db, per_page)
        .num_items()
        .await?;
    let total_pages = total.div_ceil(per_page);

    let data = select
        .offset(Some((page - 1) * per_page))
        .limit(Some(per_page))
        .all(&state.db)
        .await?
        .into_iter()
        .map(|m| HackathonResponse::from_model(m, now))
        .collect();

    Ok(Json(HackathonListResponse {
        data,
        pagination: Pagination {
            page,
            per_page,
            total,
            total_pages,
        },
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/hackathons/{id}",
    tag = "Hackathons",
    operation_id = "getHackathon",
    summary = "Get a hackathon with its teams",
    params(("id" = i32, Path, description = "Hackathon ID")),
    responses(
        (status = 200, description = "Hackathon details", body = HackathonDetailResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user))]
pub async fn get_hackathon(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<HackathonDetailResponse>, AppError> {
    let model = find_hackathon(&state.db, id).await?;
    let now = Utc::now();

    let teams = team::Entity::find()
        .filter(team::Column::HackathonId.eq(id))
        .order_by_asc(team::Column::CreatedAt)
        .all(&state.db)
        .await?;
    let identities = load_member_identities(&state.db, &teams).await?;

    let teams = teams
        .into_iter()
        .map(|t| TeamResponse::from_model(t, &identities))
        .collect();

    Ok(Json(HackathonDetailResponse {
        hackathon: HackathonResponse::from_model(model, now),
        teams,
    }))
}

#[utoipa::path(
    patch,
    path = "/api/v1/hackathons/{id}",
    tag = "Hackathons",
    operation_id = "updateHackathon",
    summary = "Update a hackathon",
    description = "Partial update of hackathon metadata. Requires `hackathon:manage` permission. `status` may only be set to `cancelled` or `completed`; `accepting_submissions` keeps the submission window open past the deadline or closes registration early.",
    params(("id" = i32, Path, description = "Hackathon ID")),
    request_body = UpdateHackathonRequest,
    responses(
        (status = 200, description = "Hackathon updated", body = HackathonResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload))]
pub async fn update_hackathon(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateHackathonRequest>,
) -> Result<Json<HackathonResponse>, AppError> {
    auth_user.require_permission("hackathon:manage")?;
    validate_update_hackathon(&payload)?;

    let current = find_hackathon(&state.db, id).await?;
    let now = Utc::now();

    // Cross-field checks run against the merged value, so a patch cannot
    // leave the row violating an invariant the create path enforces.
    let merged_min = payload.min_team_size.unwrap_or(current.min_team_size);
    let merged_max = payload.max_team_size.unwrap_or(current.max_team_size);
    if merged_max < merged_min {
        return Err(AppError::Validation(
            "max_team_size must be >= min_team_size".into(),
        ));
    }
    let merged_start = match payload.start_date {
        Some(patch) => patch,
        None => current.start_date,
    };
    let merged_deadline = payload.deadline.unwrap_or(current.deadline);
    if let Some(start) = merged_start
        && merged_deadline < start
    {
        return Err(AppError::Validation(
            "deadline must not be before start_date".into(),
        ));
    }

    let mut active: hackathon::ActiveModel = current.into();
    if let Some(title) = payload.title {
        active.title = Set(title.trim().to_string());
    }
    if let Some(ps) = payload.problem_statement {
        active.problem_statement = Set(ps);
    }
    if let Some(challenge) = payload.challenge {
        active.challenge = Set(challenge);
    }
    if let Some(instructions) = payload.detailed_instructions {
        active.detailed_instructions = Set(instructions);
    }
    if let Some(tasks) = payload.tasks {
        active.tasks = Set(serde_json::to_value(&tasks)?);
    }
    if let Some(resources) = payload.resources {
        active.resources = Set(serde_json::to_value(&resources)?);
    }
    if let Some(types) = payload.allowed_file_types {
        let normalized: Vec<String> = types
            .iter()
            .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect();
        active.allowed_file_types = Set(serde_json::to_value(&normalized)?);
    }
    if let Some(min) = payload.min_team_size {
        active.min_team_size = Set(min);
    }
    if let Some(max) = payload.max_team_size {
        active.max_team_size = Set(max);
    }
    if let Some(max_participants) = payload.max_participants {
        active.max_participants = Set(max_participants);
    }
    if let Some(start) = payload.start_date {
        active.start_date = Set(start);
    }
    if let Some(end) = payload.end_date {
        active.end_date = Set(end);
    }
    if let Some(deadline) = payload.deadline {
        active.deadline = Set(deadline);
    }
    if let Some(accepting) = payload.accepting_submissions {
        active.accepting_submissions = Set(accepting);
    }
    if let Some(status) = payload.status {
        active.status = Set(status);
    }
    active.updated_at = Set(now);

    let model = active.update(&state.db).await?;
    Ok(Json(HackathonResponse::from_model(model, now)))
}

#[utoipa::path(
    get,
    path = "/api/v1/hackathons/{id}/submissions",
    tag = "Hackathons",
    operation_id = "listHackathonSubmissions",
    summary = "Per-team submission and grading report",
    description = "Returns every team's submission state with resolved member display names and a summary. Requires `hackathon:grade` permission.",
    params(("id" = i32, Path, description = "Hackathon ID")),
    responses(
        (status = 200, description = "Submission report", body = SubmissionReportResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn list_submissions(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<SubmissionReportResponse>, AppError> {
    auth_user.require_permission("hackathon:grade")?;

    let model = find_hackathon(&state.db, id).await?;
    let teams = team::Entity::find()
        .filter(team::Column::HackathonId.eq(id))
        .order_by_asc(team::Column::CreatedAt)
        .all(&state.db)
        .await?;
    let identities = load_member_identities(&state.db, &teams).await?;

    let total_teams = teams.len() as u64;
    let submitted = teams
        .iter()
        .filter(|t| matches!(t.status, TeamStatus::Submitted | TeamStatus::Graded))
        .count() as u64;
    let graded = teams
        .iter()
        .filter(|t| t.status == TeamStatus::Graded)
        .count() as u64;
    let scores: Vec<i32> = teams.iter().filter_map(|t| t.score).collect();
    let average_score = if scores.is_empty() {
        None
    } else {
        Some(scores.iter().sum::<i32>() as f64 / scores.len() as f64)
    };

    let items = teams
        .into_iter()
        .map(|t| {
            let members = resolve_display_names(&member_source(&t, &identities));
            let submitted_files = t
                .submitted_files
                .as_ref()
                .and_then(|v| serde_json::from_value(v.clone()).ok())
                .unwrap_or_default();
            SubmissionReportItem {
                team_id: t.id,
                team_name: t.team_name,
                members,
                status: t.status,
                submitted_at: t.submitted_at,
                submission_link: t.submission_link,
                submission_text: t.submission_text,
                submitted_files,
                score: t.score,
                feedback: t.feedback,
                graded_by: t.graded_by,
                graded_at: t.graded_at,
            }
        })
        .collect();

    Ok(Json(SubmissionReportResponse {
        hackathon_id: model.id,
        title: model.title,
        summary: SubmissionSummary {
            total_teams,
            submitted,
            graded,
            average_score,
        },
        teams: items,
    }))
}
