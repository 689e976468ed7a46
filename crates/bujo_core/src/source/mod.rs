//! Collaborator contracts consumed by the core.
//!
//! # Responsibility
//! - Define the per-kind item fetch contract (`ItemSource`) and the
//!   listing contracts for projects and tracked collections.
//! - Provide reference adapters (in-memory fixture, SQLite).
//!
//! # Invariants
//! - A failed or timed-out fetch is an error, never an empty result.
//! - Implementations hold no per-request state and are safe to call from
//!   several threads at once.

use crate::db::DbError;
use crate::model::item::{ProjectItem, Task, Transaction};
use crate::model::presentation::{GroupRecord, NotificationRecord, ProjectRecord};
use crate::model::project::{Project, ProjectId, ProjectKind};
use chrono::{Days, NaiveDate};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod kinds;
pub mod memory;
pub mod router;
pub mod sqlite;

pub type SourceResult<T> = Result<T, SourceError>;

/// Failure reported by an external collaborator.
#[derive(Debug)]
pub enum SourceError {
    /// Backend could not serve the request.
    Unavailable(String),
    /// Backend did not answer within the caller's deadline.
    TimedOut { after_ms: u64 },
    Db(DbError),
    /// Stored data cannot be mapped to the domain model.
    InvalidData(String),
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(message) => write!(f, "source unavailable: {message}"),
            Self::TimedOut { after_ms } => write!(f, "source timed out after {after_ms}ms"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid stored data: {message}"),
        }
    }
}

impl Error for SourceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for SourceError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for SourceError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Inclusive calendar-date window in an item's native reference frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Extends both ends by `days`, saturating at the calendar limits.
    pub fn widen(&self, days: u32) -> Self {
        let slack = Days::new(u64::from(days));
        Self {
            start: self.start.checked_sub_days(slack).unwrap_or(NaiveDate::MIN),
            end: self.end.checked_add_days(slack).unwrap_or(NaiveDate::MAX),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Fetches the items of one kind belonging to one project.
pub trait ItemSource: Send + Sync {
    /// Kind this source serves; used as the router key.
    fn kind(&self) -> ProjectKind;

    /// Name used to identify this source in errors and logs.
    fn name(&self) -> &str;

    /// Returns every item of `project` whose native date lies in `window`.
    fn fetch(&self, project: &Project, window: &DateWindow) -> SourceResult<Vec<ProjectItem>>;
}

/// Storage of tasks, queried by native due date.
pub trait TaskStore: Send + Sync {
    fn tasks_due_within(&self, project_id: ProjectId, window: &DateWindow) -> SourceResult<Vec<Task>>;
}

/// Storage of ledger transactions, queried by native transaction date.
pub trait LedgerStore: Send + Sync {
    fn transactions_within(
        &self,
        project_id: ProjectId,
        window: &DateWindow,
    ) -> SourceResult<Vec<Transaction>>;
}

/// Access-control listing: the projects a requester may read.
pub trait ProjectDirectory: Send + Sync {
    fn accessible_projects(&self, requester: &str) -> SourceResult<Vec<Project>>;
}

/// Listing of the collections tracked by change signals, already in
/// presentation shape and in the order a client would receive them.
pub trait CollectionProvider: Send + Sync {
    fn owned_projects(&self, requester: &str) -> SourceResult<Vec<ProjectRecord>>;
    fn shared_projects(&self, requester: &str) -> SourceResult<Vec<ProjectRecord>>;
    fn notifications(&self, requester: &str) -> SourceResult<Vec<NotificationRecord>>;
    fn groups(&self, requester: &str) -> SourceResult<Vec<GroupRecord>>;
}

/// Nests rows under their parent, keeping row order among siblings.
/// Rows whose parent is not in the set become roots.
pub(crate) fn build_project_tree(
    rows: Vec<(ProjectRecord, Option<ProjectId>)>,
) -> Vec<ProjectRecord> {
    fn children_of(
        parent: Option<ProjectId>,
        rows: &[(ProjectRecord, Option<ProjectId>)],
        known: &dyn Fn(ProjectId) -> bool,
    ) -> Vec<ProjectRecord> {
        rows.iter()
            .filter(|(_, row_parent)| match (parent, row_parent) {
                (None, None) => true,
                (None, Some(id)) => !known(*id),
                (Some(parent), Some(id)) => parent == *id,
                (Some(_), None) => false,
            })
            .map(|(record, _)| {
                let mut node = record.clone();
                node.sub_projects = children_of(Some(record.id), rows, known);
                node
            })
            .collect()
    }

    let ids: Vec<ProjectId> = rows.iter().map(|(record, _)| record.id).collect();
    let known = |id: ProjectId| ids.contains(&id);
    children_of(None, &rows, &known)
}

#[cfg(test)]
mod tests {
    use super::DateWindow;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn widen_crosses_month_and_leap_day() {
        let window = DateWindow::new(date(2020, 3, 1), date(2020, 3, 31)).widen(2);
        assert_eq!(window.start, date(2020, 2, 28));
        assert_eq!(window.end, date(2020, 4, 2));
        assert!(window.contains(date(2020, 2, 29)));
        assert!(!window.contains(date(2020, 4, 3)));
    }

    #[test]
    fn widen_saturates_at_calendar_limits() {
        let window = DateWindow::new(NaiveDate::MIN, NaiveDate::MAX).widen(3);
        assert_eq!(window.start, NaiveDate::MIN);
        assert_eq!(window.end, NaiveDate::MAX);
    }
}
