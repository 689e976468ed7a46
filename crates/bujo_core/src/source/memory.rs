//! Fixture-backed collaborator adapter.
//!
//! # Responsibility
//! - Serve projects, items and tracked collections from an in-memory
//!   snapshot (JSON fixtures, tests, CLI).
//! - Optionally fail selected projects/collections to exercise error paths.
//!
//! # Invariants
//! - Fixture order is the user-arranged order for project listings.
//! - Item listings are ordered by ascending id.

use crate::model::item::{Task, Transaction};
use crate::model::presentation::{GroupRecord, NotificationRecord, ProjectRecord};
use crate::model::project::{Project, ProjectId};
use crate::source::{
    build_project_tree, CollectionProvider, DateWindow, LedgerStore, ProjectDirectory,
    SourceError, SourceResult, TaskStore,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

pub const COLLECTION_OWNED_PROJECTS: &str = "owned_projects";
pub const COLLECTION_SHARED_PROJECTS: &str = "shared_projects";
pub const COLLECTION_NOTIFICATIONS: &str = "notifications";
pub const COLLECTION_GROUPS: &str = "groups";
pub const COLLECTION_PROJECT_DIRECTORY: &str = "project_directory";

/// Project entry of a fixture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixtureProject {
    #[serde(flatten)]
    pub project: Project,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub parent_id: Option<ProjectId>,
    /// Users (other than the owner) the project is shared with.
    #[serde(default)]
    pub shared_with: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixtureNotification {
    pub recipient: String,
    #[serde(flatten)]
    pub record: NotificationRecord,
}

/// Whole-store snapshot, loadable from JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Fixture {
    pub projects: Vec<FixtureProject>,
    pub tasks: Vec<Task>,
    pub transactions: Vec<Transaction>,
    pub notifications: Vec<FixtureNotification>,
    pub groups: Vec<GroupRecord>,
}

impl Fixture {
    pub fn from_json(text: &str) -> SourceResult<Self> {
        serde_json::from_str(text)
            .map_err(|err| SourceError::InvalidData(format!("invalid fixture json: {err}")))
    }

    pub fn load(path: impl AsRef<Path>) -> SourceResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|err| {
            SourceError::Unavailable(format!("cannot read fixture `{}`: {err}", path.display()))
        })?;
        Self::from_json(&text)
    }
}

/// In-memory store implementing every collaborator contract.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    fixture: Fixture,
    failing_projects: BTreeSet<ProjectId>,
    failing_collections: BTreeSet<&'static str>,
}

impl InMemoryStore {
    pub fn new(fixture: Fixture) -> Self {
        Self {
            fixture,
            failing_projects: BTreeSet::new(),
            failing_collections: BTreeSet::new(),
        }
    }

    /// Makes every item fetch for `project_id` fail.
    pub fn with_failing_project(mut self, project_id: ProjectId) -> Self {
        self.failing_projects.insert(project_id);
        self
    }

    /// Makes one collection listing fail (`COLLECTION_*` names).
    pub fn with_failing_collection(mut self, collection: &'static str) -> Self {
        self.failing_collections.insert(collection);
        self
    }

    pub fn fixture(&self) -> &Fixture {
        &self.fixture
    }

    fn check_project(&self, project_id: ProjectId) -> SourceResult<()> {
        if self.failing_projects.contains(&project_id) {
            return Err(SourceError::Unavailable(format!(
                "project {project_id} is not reachable"
            )));
        }
        Ok(())
    }

    fn check_collection(&self, collection: &'static str) -> SourceResult<()> {
        if self.failing_collections.contains(collection) {
            return Err(SourceError::Unavailable(format!(
                "collection {collection} is not reachable"
            )));
        }
        Ok(())
    }

    /// Requester's projects as a tree; fixture order is sibling order.
    fn project_tree(&self, owner: &str) -> Vec<ProjectRecord> {
        let rows = self
            .fixture
            .projects
            .iter()
            .filter(|entry| entry.project.owner == owner)
            .map(|entry| (to_record(entry), entry.parent_id))
            .collect();
        build_project_tree(rows)
    }
}

fn to_record(entry: &FixtureProject) -> ProjectRecord {
    ProjectRecord {
        id: entry.project.id,
        name: entry.project.name.clone(),
        owner: entry.project.owner.clone(),
        kind: entry.project.kind,
        description: entry.description.clone(),
        group_id: entry.project.group_id,
        sub_projects: Vec::new(),
    }
}

impl TaskStore for InMemoryStore {
    fn tasks_due_within(&self, project_id: ProjectId, window: &DateWindow) -> SourceResult<Vec<Task>> {
        self.check_project(project_id)?;
        let mut tasks: Vec<Task> = self
            .fixture
            .tasks
            .iter()
            .filter(|task| task.project_id == project_id)
            .filter(|task| task.due_date.is_some_and(|date| window.contains(date)))
            .cloned()
            .collect();
        tasks.sort_by_key(|task| task.id);
        Ok(tasks)
    }
}

impl LedgerStore for InMemoryStore {
    fn transactions_within(
        &self,
        project_id: ProjectId,
        window: &DateWindow,
    ) -> SourceResult<Vec<Transaction>> {
        self.check_project(project_id)?;
        let mut transactions: Vec<Transaction> = self
            .fixture
            .transactions
            .iter()
            .filter(|transaction| {
                transaction.project_id == project_id && window.contains(transaction.date)
            })
            .cloned()
            .collect();
        transactions.sort_by_key(|transaction| transaction.id);
        Ok(transactions)
    }
}

impl ProjectDirectory for InMemoryStore {
    fn accessible_projects(&self, requester: &str) -> SourceResult<Vec<Project>> {
        self.check_collection(COLLECTION_PROJECT_DIRECTORY)?;
        let mut projects: Vec<Project> = self
            .fixture
            .projects
            .iter()
            .filter(|entry| {
                entry.project.owner == requester
                    || entry.shared_with.iter().any(|user| user == requester)
            })
            .map(|entry| entry.project.clone())
            .collect();
        projects.sort_by_key(|project| project.id);
        Ok(projects)
    }
}

impl CollectionProvider for InMemoryStore {
    fn owned_projects(&self, requester: &str) -> SourceResult<Vec<ProjectRecord>> {
        self.check_collection(COLLECTION_OWNED_PROJECTS)?;
        Ok(self.project_tree(requester))
    }

    fn shared_projects(&self, requester: &str) -> SourceResult<Vec<ProjectRecord>> {
        self.check_collection(COLLECTION_SHARED_PROJECTS)?;
        Ok(self
            .fixture
            .projects
            .iter()
            .filter(|entry| {
                entry.project.owner != requester
                    && entry.shared_with.iter().any(|user| user == requester)
            })
            .map(to_record)
            .collect())
    }

    fn notifications(&self, requester: &str) -> SourceResult<Vec<NotificationRecord>> {
        self.check_collection(COLLECTION_NOTIFICATIONS)?;
        let mut records: Vec<NotificationRecord> = self
            .fixture
            .notifications
            .iter()
            .filter(|entry| entry.recipient == requester)
            .map(|entry| entry.record.clone())
            .collect();
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        Ok(records)
    }

    fn groups(&self, requester: &str) -> SourceResult<Vec<GroupRecord>> {
        self.check_collection(COLLECTION_GROUPS)?;
        let mut records: Vec<GroupRecord> = self
            .fixture
            .groups
            .iter()
            .filter(|group| {
                group.owner == requester || group.users.iter().any(|user| user.name == requester)
            })
            .cloned()
            .collect();
        records.sort_by_key(|group| group.id);
        Ok(records)
    }
}
