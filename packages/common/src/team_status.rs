#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Status of a team within its hackathon.
///
/// Transitions are forward-only: `not_started → in_progress → submitted
/// → graded`. There is no path backward; correcting a recorded grade goes
/// through the dedicated regrade operation, which leaves the status at
/// `graded`.
///
/// When the `sea-orm` feature is enabled, this enum can be used directly
/// in SeaORM entities.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "snake_case")]
pub enum TeamStatus {
    /// Registered but no member has begun work.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "not_started"))]
    NotStarted,
    /// At least one member has begun work.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "in_progress"))]
    InProgress,
    /// Work has been submitted and is awaiting a grade.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "submitted"))]
    Submitted,
    /// A grade has been recorded.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "graded"))]
    Graded,
}

impl TeamStatus {
    /// Returns true if `next` is a legal forward transition from `self`.
    ///
    /// Re-entering the same state is allowed for `in_progress` (starting
    /// work twice) and `submitted` (resubmission before grading); it is
    /// not a transition in the stored sense but callers treat it as a
    /// permitted no-op.
    pub fn can_transition_to(&self, next: TeamStatus) -> bool {
        matches!(
            (self, next),
            (Self::NotStarted, Self::InProgress)
                | (Self::NotStarted, Self::Submitted)
                | (Self::InProgress, Self::InProgress)
                | (Self::InProgress, Self::Submitted)
                | (Self::Submitted, Self::Submitted)
                | (Self::Submitted, Self::Graded)
        )
    }

    /// Returns true once the lifecycle is complete.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Graded)
    }

    /// Returns true while the team may still edit its registration.
    pub fn is_editable(&self) -> bool {
        matches!(self, Self::NotStarted | Self::InProgress)
    }

    /// All possible status values.
    pub const ALL: &'static [TeamStatus] = &[
        Self::NotStarted,
        Self::InProgress,
        Self::Submitted,
        Self::Graded,
    ];

    /// Returns the string representation (snake_case).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::InProgress => "in_progress",
            Self::Submitted => "submitted",
            Self::Graded => "graded",
        }
    }
}

impl fmt::Display for TeamStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Default for TeamStatus {
    fn default() -> Self {
        Self::NotStarted
    }
}

/// Error when parsing an invalid status string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseTeamStatusError {
    invalid: String,
}

impl fmt::Display for ParseTeamStatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid team status '{}'. Valid values: {}",
            self.invalid,
            TeamStatus::ALL
                .iter()
                .map(|s| s.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

impl std::error::Error for ParseTeamStatusError {}

impl FromStr for TeamStatus {
    type Err = ParseTeamStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_started" => Ok(Self::NotStarted),
            "in_progress" => Ok(Self::InProgress),
            "submitted" => Ok(Self::Submitted),
            "graded" => Ok(Self::Graded),
            _ => Err(ParseTeamStatusError {
                invalid: s.to_string(),
            }),
        }
    }
}
