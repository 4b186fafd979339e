#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Status of a hackathon.
///
/// Only `cancelled` (and an explicit administrative `completed`) are ever
/// written; the date-driven `upcoming → active → completed` progression is
/// derived at read time via [`HackathonStatus::derive`] so that no
/// background job is needed to flip statuses and a stale stored value can
/// never be served.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "snake_case")]
pub enum HackathonStatus {
    /// Before the start date.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "upcoming"))]
    Upcoming,
    /// Between start date and deadline.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "active"))]
    Active,
    /// Past the deadline, or explicitly closed.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "completed"))]
    Completed,
    /// Explicitly cancelled; wins over any date-derived value.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "cancelled"))]
    Cancelled,
}

impl HackathonStatus {
    /// Compute the effective status at `now` from the stored status and
    /// the hackathon's dates. Explicit `cancelled`/`completed` are
    /// sticky; otherwise the dates decide.
    pub fn derive(
        stored: HackathonStatus,
        start_date: Option<DateTime<Utc>>,
        deadline: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> HackathonStatus {
        match stored {
            Self::Cancelled => Self::Cancelled,
            Self::Completed => Self::Completed,
            _ if now > deadline => Self::Completed,
            _ if start_date.is_some_and(|start| now < start) => Self::Upcoming,
            _ => Self::Active,
        }
    }

    /// Returns true if no further registrations or submissions are
    /// possible.
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// All possible status values.
    pub const ALL: &'static [HackathonStatus] = &[
        Self::Upcoming,
        Self::Active,
        Self::Completed,
        Self::Cancelled,
    ];

    /// Returns the string representation (snake_case).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upcoming => "upcoming",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for HackathonStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Default for HackathonStatus {
    fn default() -> Self {
        Self::Upcoming
    }
}

/// Error when parsing an invalid status string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseHackathonStatusError {
    invalid: String,
}

impl fmt::Display for ParseHackathonStatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid hackathon status '{}'. Valid values: {}",
            self.invalid,
            HackathonStatus::ALL
                .iter()
                .map(|s| s.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

impl std::error::Error for ParseHackathonStatusError {}

impl FromStr for HackathonStatus {
    type Err = ParseHackathonStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upcoming" => Ok(Self::Upcoming),
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(ParseHackathonStatusError {
                invalid: s.to_string(),
            }),
        }
    }
}
