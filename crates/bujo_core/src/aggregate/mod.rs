//! Cross-type, date-bucketed item aggregation.
//!
//! # Responsibility
//! - Validate aggregation requests before any I/O.
//! - Fan out per-project fetches through the `TypeRouter` and merge the
//!   results into per-day buckets in the caller's timezone.
//!
//! # Invariants
//! - Output buckets are strictly descending by date and never empty.
//! - Output is independent of fetch completion order.
//! - A failed fetch fails the whole aggregation.

use crate::model::project::ProjectId;
use crate::source::SourceError;
use chrono::NaiveDate;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod aggregator;
pub mod timezone;

pub use aggregator::{AggregationQuery, Aggregator};

pub type AggregationResult<T> = Result<T, AggregationError>;

#[derive(Debug)]
pub enum AggregationError {
    /// Start date is after end date.
    InvalidRange { start: NaiveDate, end: NaiveDate },
    /// Date text is not `YYYY-MM-DD`.
    InvalidDate(String),
    /// Not an IANA zone identifier.
    InvalidTimezone(String),
    NoKindsRequested,
    /// Kind name is unknown or has no registered item source.
    UnsupportedKind(String),
    /// One source fetch failed; the aggregation is incomplete.
    SourceUnavailable {
        source_name: String,
        project_id: Option<ProjectId>,
        cause: SourceError,
    },
}

impl AggregationError {
    /// Stable machine-readable code for envelopes and logs.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidRange { .. } => "invalid_range",
            Self::InvalidDate(_) => "invalid_date",
            Self::InvalidTimezone(_) => "invalid_timezone",
            Self::NoKindsRequested => "no_kinds_requested",
            Self::UnsupportedKind(_) => "unsupported_kind",
            Self::SourceUnavailable { .. } => "source_unavailable",
        }
    }
}

impl Display for AggregationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRange { start, end } => {
                write!(f, "start date {start} is after end date {end}")
            }
            Self::InvalidDate(value) => write!(f, "invalid date `{value}`; expected YYYY-MM-DD"),
            Self::InvalidTimezone(value) => write!(f, "unknown timezone `{value}`"),
            Self::NoKindsRequested => write!(f, "at least one project kind must be requested"),
            Self::UnsupportedKind(value) => write!(f, "unsupported project kind `{value}`"),
            Self::SourceUnavailable {
                source_name,
                project_id: Some(project_id),
                cause,
            } => write!(
                f,
                "item source `{source_name}` failed for project {project_id}: {cause}"
            ),
            Self::SourceUnavailable {
                source_name,
                project_id: None,
                cause,
            } => write!(f, "source `{source_name}` failed: {cause}"),
        }
    }
}

impl Error for AggregationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::SourceUnavailable { cause, .. } => Some(cause),
            _ => None,
        }
    }
}
