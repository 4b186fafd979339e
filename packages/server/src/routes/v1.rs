use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::handlers;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().nest("/hackathons", hackathon_routes())
}

fn hackathon_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::hackathon::list_hackathons).post(handlers::hackathon::create_hackathon),
        )
        .route(
            "/{id}",
            get(handlers::hackathon::get_hackathon).patch(handlers::hackathon::update_hackathon),
        )
        .route("/{id}/submissions", get(handlers::hackathon::list_submissions))
        .nest("/{id}/teams", team_routes())
}

fn team_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::team::register_team))
        .route("/{team_id}", patch(handlers::team::update_team))
        .route("/{team_id}/start", post(handlers::submission::start_work))
        .route("/{team_id}/submit", post(handlers::submission::submit_work))
        .route("/{team_id}/grade", post(handlers::grading::grade_team))
        .route("/{team_id}/regrade", post(handlers::grading::regrade_team))
}
