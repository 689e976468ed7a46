//! Project model and kind tag.
//!
//! # Invariants
//! - A project's `kind` never changes after creation.
//! - Kind wire names are stable (`task-list`, `note-collection`, `ledger`).

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Stable store-assigned project identifier.
pub type ProjectId = i64;

/// Discriminator for what a project holds.
///
/// Open to extension; adding a variant means adding an `ItemSource` and a
/// router registration, nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectKind {
    /// Tasks bucketed by due date.
    TaskList,
    /// Notes; carry no bucket date.
    NoteCollection,
    /// Ledger transactions bucketed by transaction date.
    Ledger,
}

impl ProjectKind {
    pub const ALL: [ProjectKind; 3] = [Self::TaskList, Self::NoteCollection, Self::Ledger];

    /// Stable wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TaskList => "task-list",
            Self::NoteCollection => "note-collection",
            Self::Ledger => "ledger",
        }
    }

    /// Parses a wire name, also accepting the short legacy names
    /// `todo` and `note` (case-insensitive).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "task-list" | "task_list" | "todo" => Some(Self::TaskList),
            "note-collection" | "note_collection" | "note" => Some(Self::NoteCollection),
            "ledger" => Some(Self::Ledger),
            _ => None,
        }
    }
}

impl Display for ProjectKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| s.trim().to_string())
    }
}

/// Project metadata as handed over by the access-control collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub owner: String,
    pub kind: ProjectKind,
    /// Group the project is shared through, if any.
    #[serde(default)]
    pub group_id: Option<i64>,
}

impl Project {
    pub fn new(id: ProjectId, name: impl Into<String>, owner: impl Into<String>, kind: ProjectKind) -> Self {
        Self {
            id,
            name: name.into(),
            owner: owner.into(),
            kind,
            group_id: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ProjectKind;

    #[test]
    fn parse_accepts_wire_and_legacy_names() {
        assert_eq!(ProjectKind::parse("task-list"), Some(ProjectKind::TaskList));
        assert_eq!(ProjectKind::parse(" TODO "), Some(ProjectKind::TaskList));
        assert_eq!(ProjectKind::parse("note"), Some(ProjectKind::NoteCollection));
        assert_eq!(ProjectKind::parse("LEDGER"), Some(ProjectKind::Ledger));
        assert_eq!(ProjectKind::parse("calendar"), None);
    }

    #[test]
    fn wire_names_round_trip_through_serde() {
        let json = serde_json::to_string(&ProjectKind::NoteCollection).unwrap();
        assert_eq!(json, "\"note-collection\"");
        for kind in ProjectKind::ALL {
            assert_eq!(ProjectKind::parse(kind.as_str()), Some(kind));
        }
    }
}
