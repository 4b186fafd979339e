use chrono::{DateTime, Utc};
use common::TeamStatus;
use common::membership::DisplayIdentity;
use serde::{Deserialize, Serialize};

use crate::entity::team::SubmittedFile;
use crate::error::AppError;

/// A file reference attached to a submission. The bytes live in external
/// storage; this service only validates and records the reference.
#[derive(Clone, Debug, Deserialize, utoipa::ToSchema)]
pub struct SubmittedFileInput {
    pub file_name: String,
    pub file_url: String,
    pub file_type: Option<String>,
}

#[derive(Deserialize, Default, utoipa::ToSchema)]
pub struct SubmitRequest {
    pub submission_text: Option<String>,
    pub submission_link: Option<String>,
    #[serde(default)]
    pub files: Vec<SubmittedFileInput>,
}

impl SubmitRequest {
    /// A submission must carry at least one non-empty channel.
    pub fn has_content(&self) -> bool {
        self.submission_text
            .as_deref()
            .is_some_and(|t| !t.trim().is_empty())
            || self
                .submission_link
                .as_deref()
                .is_some_and(|l| !l.trim().is_empty())
            || !self.files.is_empty()
    }
}

/// Validate the request against the hackathon's accepted extensions. The
/// whole submission is rejected if any single file fails, so a partial
/// submission is never recorded.
pub fn validate_submit(req: &SubmitRequest, allowed_extensions: &[String]) -> Result<(), AppError> {
    if !req.has_content() {
        return Err(AppError::Validation(
            "Submission must include text, a link, or at least one file".into(),
        ));
    }
    for file in &req.files {
        if file.file_name.trim().is_empty() || file.file_url.trim().is_empty() {
            return Err(AppError::Validation(
                "Each file needs a file_name and a file_url".into(),
            ));
        }
        if !allowed_extensions.is_empty() {
            let ext = crate::utils::hackathon::file_extension(&file.file_name);
            let allowed = ext
                .as_deref()
                .is_some_and(|e| allowed_extensions.iter().any(|a| a == e));
            if !allowed {
                return Err(AppError::UnsupportedFileType(format!(
                    "File '{}' has an unsupported type; allowed: {}",
                    file.file_name,
                    allowed_extensions.join(", ")
                )));
            }
        }
    }
    Ok(())
}

/// Convert validated file inputs into stored references.
pub fn to_submitted_files(
    files: &[SubmittedFileInput],
    uploaded_by: &str,
    now: DateTime<Utc>,
) -> Vec<SubmittedFile> {
    files
        .iter()
        .map(|f| SubmittedFile {
            file_name: f.file_name.clone(),
            file_url: f.file_url.clone(),
            file_type: f.file_type.clone(),
            uploaded_by: Some(uploaded_by.to_string()),
            uploaded_at: now,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Submission report DTOs
// ---------------------------------------------------------------------------

#[derive(Serialize, utoipa::ToSchema)]
pub struct SubmissionSummary {
    pub total_teams: u64,
    pub submitted: u64,
    pub graded: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_score: Option<f64>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct SubmissionReportItem {
    pub team_id: i32,
    pub team_name: String,
    pub members: Vec<DisplayIdentity>,
    pub status: TeamStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submission_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submission_text: Option<String>,
    pub submitted_files: Vec<SubmittedFile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graded_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graded_at: Option<DateTime<Utc>>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct SubmissionReportResponse {
    pub hackathon_id: i32,
    pub title: String,
    pub summary: SubmissionSummary,
    pub teams: Vec<SubmissionReportItem>,
}
