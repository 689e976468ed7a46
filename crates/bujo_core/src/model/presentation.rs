//! Presentation records of the tracked collections.
//!
//! These are the shapes a client observes for owned/shared projects,
//! notifications and groups; change signals hash exactly these.

use crate::model::project::{ProjectId, ProjectKind};
use serde::{Deserialize, Serialize};

/// One node of a user's project tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRecord {
    pub id: ProjectId,
    pub name: String,
    pub owner: String,
    pub kind: ProjectKind,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub group_id: Option<i64>,
    #[serde(default)]
    pub sub_projects: Vec<ProjectRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRecord {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub content: Option<String>,
    pub originator: String,
    pub notification_type: String,
    #[serde(default)]
    pub link: Option<String>,
    /// Unix epoch milliseconds.
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMember {
    pub name: String,
    pub accepted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupRecord {
    pub id: i64,
    pub name: String,
    pub owner: String,
    #[serde(default)]
    pub default: bool,
    #[serde(default)]
    pub users: Vec<GroupMember>,
}
