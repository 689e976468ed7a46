//! Kind to `ItemSource` lookup table.
//!
//! # Invariants
//! - At most one source per kind.
//! - Resolving an unregistered kind is an error, never a silent skip.

use crate::model::project::ProjectKind;
use crate::source::kinds::{LedgerItemSource, TaskItemSource};
use crate::source::{ItemSource, LedgerStore, TaskStore};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouterError {
    DuplicateKind(ProjectKind),
    UnsupportedKind(ProjectKind),
}

impl Display for RouterError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateKind(kind) => write!(f, "item source already registered for kind: {kind}"),
            Self::UnsupportedKind(kind) => write!(f, "no item source registered for kind: {kind}"),
        }
    }
}

impl Error for RouterError {}

/// Registry built at startup; read-only afterwards.
#[derive(Default)]
pub struct TypeRouter {
    sources: BTreeMap<ProjectKind, Arc<dyn ItemSource>>,
}

impl TypeRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Router with the task and ledger sources backed by one store.
    pub fn standard<S>(store: Arc<S>) -> Self
    where
        S: TaskStore + LedgerStore + 'static,
    {
        let mut router = Self::new();
        router
            .sources
            .insert(ProjectKind::TaskList, Arc::new(TaskItemSource::new(store.clone())));
        router
            .sources
            .insert(ProjectKind::Ledger, Arc::new(LedgerItemSource::new(store)));
        router
    }

    /// Registers one source under the kind it reports.
    pub fn register(&mut self, source: Arc<dyn ItemSource>) -> Result<(), RouterError> {
        let kind = source.kind();
        if self.sources.contains_key(&kind) {
            return Err(RouterError::DuplicateKind(kind));
        }
        self.sources.insert(kind, source);
        Ok(())
    }

    pub fn resolve(&self, kind: ProjectKind) -> Result<Arc<dyn ItemSource>, RouterError> {
        self.sources
            .get(&kind)
            .cloned()
            .ok_or(RouterError::UnsupportedKind(kind))
    }

    pub fn supports(&self, kind: ProjectKind) -> bool {
        self.sources.contains_key(&kind)
    }

    /// Registered kinds in stable order.
    pub fn kinds(&self) -> Vec<ProjectKind> {
        self.sources.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
