use common::HackathonStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A task participants work through during the hackathon.
/// Stored as a JSON array in the database.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct HackathonTask {
    pub title: String,
    pub description: String,
    /// Points awarded for completing the task. Never negative.
    pub points: i32,
    pub required: bool,
}

/// A reference link shared with participants.
/// Stored as a JSON array in the database.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct HackathonResource {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub description: String,
}

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "hackathon")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub title: String,
    pub problem_statement: String, // in Markdown
    pub challenge: String,
    pub detailed_instructions: Option<String>,

    /// JSON array of [`HackathonTask`] objects.
    #[sea_orm(column_type = "JsonBinary")]
    pub tasks: Json,
    /// JSON array of [`HackathonResource`] objects.
    #[sea_orm(column_type = "JsonBinary")]
    pub resources: Json,
    /// JSON array of lowercase file extensions accepted in submissions.
    /// Empty array means every extension is accepted.
    #[sea_orm(column_type = "JsonBinary")]
    pub allowed_file_types: Json,

    pub min_team_size: i32,
    pub max_team_size: i32,
    pub max_participants: Option<i32>,

    pub start_date: Option<DateTimeUtc>,
    pub end_date: Option<DateTimeUtc>,
    pub deadline: DateTimeUtc,

    /// Stored status snapshot. The effective status is derived from the
    /// dates at read time; only explicit cancel/complete are written.
    pub status: HackathonStatus,
    /// Instructor override: keeps submissions open past the deadline, or
    /// closes registration early.
    pub accepting_submissions: bool,

    pub created_by: i32,

    #[sea_orm(has_many)]
    pub teams: HasMany<super::team::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
