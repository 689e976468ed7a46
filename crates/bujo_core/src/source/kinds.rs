//! `ItemSource` implementations, one per bucketable kind.

use crate::model::item::ProjectItem;
use crate::model::project::{Project, ProjectKind};
use crate::source::{DateWindow, ItemSource, LedgerStore, SourceResult, TaskStore};
use std::sync::Arc;

/// Serves `task-list` projects from a task store.
pub struct TaskItemSource<S> {
    store: Arc<S>,
}

impl<S: TaskStore> TaskItemSource<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }
}

impl<S: TaskStore> ItemSource for TaskItemSource<S> {
    fn kind(&self) -> ProjectKind {
        ProjectKind::TaskList
    }

    fn name(&self) -> &str {
        "tasks"
    }

    fn fetch(&self, project: &Project, window: &DateWindow) -> SourceResult<Vec<ProjectItem>> {
        let tasks = self.store.tasks_due_within(project.id, window)?;
        Ok(tasks.into_iter().map(ProjectItem::Task).collect())
    }
}

/// Serves `ledger` projects from a transaction store.
pub struct LedgerItemSource<S> {
    store: Arc<S>,
}

impl<S: LedgerStore> LedgerItemSource<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }
}

impl<S: LedgerStore> ItemSource for LedgerItemSource<S> {
    fn kind(&self) -> ProjectKind {
        ProjectKind::Ledger
    }

    fn name(&self) -> &str {
        "transactions"
    }

    fn fetch(&self, project: &Project, window: &DateWindow) -> SourceResult<Vec<ProjectItem>> {
        let transactions = self.store.transactions_within(project.id, window)?;
        Ok(transactions
            .into_iter()
            .map(ProjectItem::Transaction)
            .collect())
    }
}
