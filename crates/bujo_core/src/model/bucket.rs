//! Per-day aggregation record.
//!
//! # Invariants
//! - `tasks` and `transactions` are sorted by ascending item id once the
//!   bucket is sealed.
//! - A bucket handed to callers has at least one task or transaction.

use crate::model::item::{ProjectItem, Task, Transaction};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// All items of one calendar day in the caller's timezone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateBucket {
    /// Serialized as `YYYY-MM-DD`.
    pub date: NaiveDate,
    pub tasks: Vec<Task>,
    pub transactions: Vec<Transaction>,
}

impl DateBucket {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            tasks: Vec::new(),
            transactions: Vec::new(),
        }
    }

    /// Files an item under its variant's list.
    pub fn push(&mut self, item: ProjectItem) {
        match item {
            ProjectItem::Task(task) => self.tasks.push(task),
            ProjectItem::Transaction(transaction) => self.transactions.push(transaction),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty() && self.transactions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tasks.len() + self.transactions.len()
    }

    /// Orders both lists by item id so output is independent of fetch order.
    pub fn seal(&mut self) {
        self.tasks.sort_by_key(|task| task.id);
        self.transactions.sort_by_key(|transaction| transaction.id);
    }
}
