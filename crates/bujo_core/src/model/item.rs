//! Project items: tasks and ledger transactions.
//!
//! # Responsibility
//! - Define the item variants that can be bucketed by date.
//! - Expose each item's anchor (native date, time and zone).
//!
//! # Invariants
//! - A task without a due date has no anchor and is never bucketed.
//! - A transaction always has an anchor.

use crate::model::project::ProjectId;
use chrono::{NaiveDate, NaiveTime};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Stable store-assigned item identifier. Increases with creation order.
pub type ItemId = i64;

/// Where an item sits in time, in the reference frame it was recorded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemAnchor {
    pub date: NaiveDate,
    /// `None` means start of day.
    pub time: Option<NaiveTime>,
    pub timezone: Tz,
}

/// Task presentation record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: ItemId,
    pub project_id: ProjectId,
    pub name: String,
    #[serde(default)]
    pub assignee: Option<String>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub due_time: Option<NaiveTime>,
    /// Duration in minutes.
    #[serde(default)]
    pub duration: Option<u32>,
    pub timezone: Tz,
}

impl Task {
    pub fn anchor(&self) -> Option<ItemAnchor> {
        self.due_date.map(|date| ItemAnchor {
            date,
            time: self.due_time,
            timezone: self.timezone,
        })
    }
}

/// Direction of money flow for a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Income,
    Expense,
}

/// Ledger transaction presentation record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: ItemId,
    pub project_id: ProjectId,
    pub name: String,
    pub payer: String,
    pub amount: f64,
    pub transaction_type: TransactionType,
    pub date: NaiveDate,
    #[serde(default)]
    pub time: Option<NaiveTime>,
    pub timezone: Tz,
}

impl Transaction {
    pub fn anchor(&self) -> ItemAnchor {
        ItemAnchor {
            date: self.date,
            time: self.time,
            timezone: self.timezone,
        }
    }
}

/// One item fetched from an `ItemSource`.
#[derive(Debug, Clone, PartialEq)]
pub enum ProjectItem {
    Task(Task),
    Transaction(Transaction),
}

impl ProjectItem {
    pub fn id(&self) -> ItemId {
        match self {
            Self::Task(task) => task.id,
            Self::Transaction(transaction) => transaction.id,
        }
    }

    pub fn project_id(&self) -> ProjectId {
        match self {
            Self::Task(task) => task.project_id,
            Self::Transaction(transaction) => transaction.project_id,
        }
    }

    /// Returns `None` for items that cannot be placed on a calendar day.
    pub fn anchor(&self) -> Option<ItemAnchor> {
        match self {
            Self::Task(task) => task.anchor(),
            Self::Transaction(transaction) => Some(transaction.anchor()),
        }
    }
}

impl From<Task> for ProjectItem {
    fn from(value: Task) -> Self {
        Self::Task(value)
    }
}

impl From<Transaction> for ProjectItem {
    fn from(value: Transaction) -> Self {
        Self::Transaction(value)
    }
}
