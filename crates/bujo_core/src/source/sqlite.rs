//! SQLite-backed collaborator adapter.
//!
//! # Responsibility
//! - Serve items, project listings and tracked collections from the
//!   schema in `db::migrations`.
//! - Keep SQL details inside this module.
//!
//! # Invariants
//! - Read paths reject invalid persisted state instead of masking it.
//! - Item queries filter on the native date column only; timezone
//!   conversion is the aggregator's job.

use crate::db::open_db;
use crate::model::item::{Task, Transaction, TransactionType};
use crate::model::presentation::{GroupMember, GroupRecord, NotificationRecord, ProjectRecord};
use crate::model::project::{Project, ProjectId, ProjectKind};
use crate::source::{
    build_project_tree, CollectionProvider, DateWindow, LedgerStore, ProjectDirectory,
    SourceError, SourceResult, TaskStore,
};
use chrono::{NaiveDate, NaiveTime};
use chrono_tz::Tz;
use rusqlite::{params, Connection, Row};
use std::path::Path;
use std::sync::Mutex;

const DATE_FORMAT: &str = "%Y-%m-%d";

const PROJECT_COLUMNS: &str = "p.id, p.name, p.owner, p.kind, p.description, p.group_id, p.parent_id";

/// Store over one migrated connection.
///
/// The connection is serialized behind a mutex; concurrent fetches queue.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Wraps a connection returned by `open_db`/`open_db_in_memory`.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    pub fn open(path: impl AsRef<Path>) -> SourceResult<Self> {
        Ok(Self::new(open_db(path)?))
    }

    fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> SourceResult<T>) -> SourceResult<T> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| SourceError::Unavailable("sqlite connection lock poisoned".to_string()))?;
        f(&conn)
    }
}

impl TaskStore for SqliteStore {
    fn tasks_due_within(&self, project_id: ProjectId, window: &DateWindow) -> SourceResult<Vec<Task>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, project_id, name, assignee, due_date, due_time, duration, timezone
                 FROM tasks
                 WHERE project_id = ?1
                   AND due_date IS NOT NULL
                   AND due_date BETWEEN ?2 AND ?3
                 ORDER BY id ASC;",
            )?;
            let (start, end) = sql_date_bounds(window);
            let mut rows = stmt.query(params![project_id, start, end])?;
            let mut tasks = Vec::new();
            while let Some(row) = rows.next()? {
                tasks.push(parse_task_row(row)?);
            }
            Ok(tasks)
        })
    }
}

impl LedgerStore for SqliteStore {
    fn transactions_within(
        &self,
        project_id: ProjectId,
        window: &DateWindow,
    ) -> SourceResult<Vec<Transaction>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, project_id, name, payer, amount, transaction_type, date, time, timezone
                 FROM transactions
                 WHERE project_id = ?1
                   AND date BETWEEN ?2 AND ?3
                 ORDER BY id ASC;",
            )?;
            let (start, end) = sql_date_bounds(window);
            let mut rows = stmt.query(params![project_id, start, end])?;
            let mut transactions = Vec::new();
            while let Some(row) = rows.next()? {
                transactions.push(parse_transaction_row(row)?);
            }
            Ok(transactions)
        })
    }
}

impl ProjectDirectory for SqliteStore {
    fn accessible_projects(&self, requester: &str) -> SourceResult<Vec<Project>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {PROJECT_COLUMNS}
                 FROM projects p
                 WHERE p.owner = ?1
                    OR EXISTS (
                        SELECT 1 FROM project_shares s
                        WHERE s.project_id = p.id AND s.username = ?1
                    )
                 ORDER BY p.id ASC;"
            ))?;
            let mut rows = stmt.query([requester])?;
            let mut projects = Vec::new();
            while let Some(row) = rows.next()? {
                let (record, _) = parse_project_row(row)?;
                projects.push(Project {
                    id: record.id,
                    name: record.name,
                    owner: record.owner,
                    kind: record.kind,
                    group_id: record.group_id,
                });
            }
            Ok(projects)
        })
    }
}

impl CollectionProvider for SqliteStore {
    fn owned_projects(&self, requester: &str) -> SourceResult<Vec<ProjectRecord>> {
        let rows = self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {PROJECT_COLUMNS}
                 FROM projects p
                 WHERE p.owner = ?1
                 ORDER BY p.position ASC, p.id ASC;"
            ))?;
            let mut rows = stmt.query([requester])?;
            let mut out = Vec::new();
            while let Some(row) = rows.next()? {
                out.push(parse_project_row(row)?);
            }
            Ok(out)
        })?;
        Ok(build_project_tree(rows))
    }

    fn shared_projects(&self, requester: &str) -> SourceResult<Vec<ProjectRecord>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {PROJECT_COLUMNS}
                 FROM projects p
                 JOIN project_shares s ON s.project_id = p.id
                 WHERE s.username = ?1 AND p.owner <> ?1
                 ORDER BY p.owner ASC, s.position ASC, p.id ASC;"
            ))?;
            let mut rows = stmt.query([requester])?;
            let mut records = Vec::new();
            while let Some(row) = rows.next()? {
                records.push(parse_project_row(row)?.0);
            }
            Ok(records)
        })
    }

    fn notifications(&self, requester: &str) -> SourceResult<Vec<NotificationRecord>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, title, content, originator, notification_type, link, created_at
                 FROM notifications
                 WHERE recipient = ?1
                 ORDER BY created_at DESC, id DESC;",
            )?;
            let mut rows = stmt.query([requester])?;
            let mut records = Vec::new();
            while let Some(row) = rows.next()? {
                records.push(NotificationRecord {
                    id: row.get("id")?,
                    title: row.get("title")?,
                    content: row.get("content")?,
                    originator: row.get("originator")?,
                    notification_type: row.get("notification_type")?,
                    link: row.get("link")?,
                    timestamp: row.get("created_at")?,
                });
            }
            Ok(records)
        })
    }

    fn groups(&self, requester: &str) -> SourceResult<Vec<GroupRecord>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT g.id, g.name, g.owner, g.is_default
                 FROM user_groups g
                 WHERE g.owner = ?1
                    OR EXISTS (
                        SELECT 1 FROM group_users u
                        WHERE u.group_id = g.id AND u.username = ?1
                    )
                 ORDER BY g.id ASC;",
            )?;
            let mut rows = stmt.query([requester])?;
            let mut groups = Vec::new();
            while let Some(row) = rows.next()? {
                groups.push(GroupRecord {
                    id: row.get("id")?,
                    name: row.get("name")?,
                    owner: row.get("owner")?,
                    default: parse_flag(row.get("is_default")?, "user_groups.is_default")?,
                    users: Vec::new(),
                });
            }
            drop(rows);

            let mut member_stmt = conn.prepare(
                "SELECT username, accepted
                 FROM group_users
                 WHERE group_id = ?1
                 ORDER BY username ASC;",
            )?;
            for group in &mut groups {
                let mut rows = member_stmt.query([group.id])?;
                while let Some(row) = rows.next()? {
                    group.users.push(GroupMember {
                        name: row.get("username")?,
                        accepted: parse_flag(row.get("accepted")?, "group_users.accepted")?,
                    });
                }
            }
            Ok(groups)
        })
    }
}

fn parse_project_row(row: &Row<'_>) -> SourceResult<(ProjectRecord, Option<ProjectId>)> {
    let kind_text: String = row.get("kind")?;
    let kind = ProjectKind::parse(&kind_text).ok_or_else(|| {
        SourceError::InvalidData(format!("invalid project kind `{kind_text}` in projects.kind"))
    })?;
    let record = ProjectRecord {
        id: row.get("id")?,
        name: row.get("name")?,
        owner: row.get("owner")?,
        kind,
        description: row.get("description")?,
        group_id: row.get("group_id")?,
        sub_projects: Vec::new(),
    };
    Ok((record, row.get("parent_id")?))
}

fn parse_task_row(row: &Row<'_>) -> SourceResult<Task> {
    let due_date = match row.get::<_, Option<String>>("due_date")? {
        Some(text) => Some(parse_date(&text, "tasks.due_date")?),
        None => None,
    };
    let due_time = match row.get::<_, Option<String>>("due_time")? {
        Some(text) => Some(parse_time(&text, "tasks.due_time")?),
        None => None,
    };
    let duration = match row.get::<_, Option<i64>>("duration")? {
        Some(value) => Some(u32::try_from(value).map_err(|_| {
            SourceError::InvalidData(format!("invalid duration `{value}` in tasks.duration"))
        })?),
        None => None,
    };

    Ok(Task {
        id: row.get("id")?,
        project_id: row.get("project_id")?,
        name: row.get("name")?,
        assignee: row.get("assignee")?,
        due_date,
        due_time,
        duration,
        timezone: parse_zone(&row.get::<_, String>("timezone")?, "tasks.timezone")?,
    })
}

fn parse_transaction_row(row: &Row<'_>) -> SourceResult<Transaction> {
    let type_text: String = row.get("transaction_type")?;
    let transaction_type = match type_text.as_str() {
        "INCOME" => TransactionType::Income,
        "EXPENSE" => TransactionType::Expense,
        other => {
            return Err(SourceError::InvalidData(format!(
                "invalid transaction type `{other}` in transactions.transaction_type"
            )));
        }
    };
    let time = match row.get::<_, Option<String>>("time")? {
        Some(text) => Some(parse_time(&text, "transactions.time")?),
        None => None,
    };

    Ok(Transaction {
        id: row.get("id")?,
        project_id: row.get("project_id")?,
        name: row.get("name")?,
        payer: row.get("payer")?,
        amount: row.get("amount")?,
        transaction_type,
        date: parse_date(&row.get::<_, String>("date")?, "transactions.date")?,
        time,
        timezone: parse_zone(&row.get::<_, String>("timezone")?, "transactions.timezone")?,
    })
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// `BETWEEN` bounds for a date column. Stored dates are `YYYY-MM-DD` text,
/// which only orders correctly for years 0000..=9999, so the window is
/// clamped to that span before formatting.
fn sql_date_bounds(window: &DateWindow) -> (String, String) {
    let start = NaiveDate::from_ymd_opt(0, 1, 1)
        .map_or(window.start, |floor| window.start.max(floor));
    let end = NaiveDate::from_ymd_opt(9999, 12, 31)
        .map_or(window.end, |ceiling| window.end.min(ceiling));
    (format_date(start), format_date(end))
}

fn parse_date(text: &str, column: &str) -> SourceResult<NaiveDate> {
    NaiveDate::parse_from_str(text, DATE_FORMAT)
        .map_err(|_| SourceError::InvalidData(format!("invalid date `{text}` in {column}")))
}

fn parse_time(text: &str, column: &str) -> SourceResult<NaiveTime> {
    NaiveTime::parse_from_str(text, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(text, "%H:%M"))
        .map_err(|_| SourceError::InvalidData(format!("invalid time `{text}` in {column}")))
}

fn parse_zone(text: &str, column: &str) -> SourceResult<Tz> {
    text.parse::<Tz>()
        .map_err(|_| SourceError::InvalidData(format!("invalid timezone `{text}` in {column}")))
}

fn parse_flag(value: i64, column: &str) -> SourceResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(SourceError::InvalidData(format!(
            "invalid flag value `{other}` in {column}"
        ))),
    }
}
