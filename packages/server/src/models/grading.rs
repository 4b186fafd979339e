use serde::Deserialize;

use crate::error::AppError;

/// Payload shared by the first grade and the regrade override.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct GradeRequest {
    /// Integer score in [0, 100].
    pub score: i32,
    #[serde(default)]
    pub feedback: String,
}

pub fn validate_grade(req: &GradeRequest) -> Result<(), AppError> {
    let mut errors = Vec::new();
    if !(0..=100).contains(&req.score) {
        errors.push(format!(
            "score must be an integer between 0 and 100, got {}",
            req.score
        ));
    }
    if req.feedback.trim().is_empty() {
        errors.push("feedback is required".to_string());
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::ValidationErrors(errors))
    }
}
