use common::TeamStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A reference to a file the team uploaded elsewhere.
/// Stored as a JSON array in the database; the bytes themselves live in
/// external storage and only the reference is recorded here.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SubmittedFile {
    pub file_name: String,
    pub file_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uploaded_by: Option<String>,
    pub uploaded_at: chrono::DateTime<chrono::Utc>,
}

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "team")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub hackathon_id: i32,
    #[sea_orm(belongs_to, from = "hackathon_id", to = "id")]
    pub hackathon: HasOne<super::hackathon::Entity>,

    /// Unique within the hackathon, compared case-insensitively.
    pub team_name: String,
    pub problem_statement: Option<String>,

    /// Identity-reference membership channel: JSON array of identity ids.
    /// Legacy rows may hold raw string tokens instead of numbers; the
    /// read path tolerates both.
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub member_ids: Option<Json>,
    /// Raw-email membership channel: JSON array of strings.
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub member_emails: Option<Json>,
    /// Display-name membership channel: JSON array of strings.
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub member_names: Option<Json>,

    /// The leader in the same representation as the populated membership
    /// channel (identity id as string, email, or display name).
    pub team_leader: Option<String>,

    pub submission_link: Option<String>,
    pub submission_text: Option<String>,
    /// JSON array of [`SubmittedFile`] objects.
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub submitted_files: Option<Json>,
    pub submitted_at: Option<DateTimeUtc>,

    /// Set together with `feedback` when the team is graded; both present
    /// or both absent.
    pub score: Option<i32>,
    pub feedback: Option<String>,
    pub graded_by: Option<String>,
    pub graded_at: Option<DateTimeUtc>,

    pub status: TeamStatus,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
