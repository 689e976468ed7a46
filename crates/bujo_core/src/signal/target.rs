//! Tracked collection names.

use crate::signal::{SignalError, SignalResult};
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

/// Legacy name older clients send for both project listings.
const LEGACY_PROJECTS_TARGET: &str = "projectsEtag";

/// One collection a polling client can track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum UpdateTarget {
    OwnedProjects,
    SharedProjects,
    Notifications,
    Groups,
}

impl UpdateTarget {
    pub const ALL: [UpdateTarget; 4] = [
        Self::OwnedProjects,
        Self::SharedProjects,
        Self::Notifications,
        Self::Groups,
    ];

    /// Field name used on the wire, both in requests and responses.
    pub fn wire_name(self) -> &'static str {
        match self {
            Self::OwnedProjects => "ownedProjectsEtag",
            Self::SharedProjects => "sharedProjectsEtag",
            Self::Notifications => "notificationsEtag",
            Self::Groups => "groupsEtag",
        }
    }

    pub fn wire_names() -> Vec<&'static str> {
        Self::ALL.iter().map(|target| target.wire_name()).collect()
    }

    /// Resolves one wire name; the legacy `projectsEtag` expands to both
    /// project listings.
    pub fn parse(name: &str) -> SignalResult<Vec<Self>> {
        let name = name.trim();
        if name == LEGACY_PROJECTS_TARGET {
            return Ok(vec![Self::OwnedProjects, Self::SharedProjects]);
        }
        Self::ALL
            .into_iter()
            .find(|target| target.wire_name() == name)
            .map(|target| vec![target])
            .ok_or_else(|| SignalError::UnsupportedTarget(name.to_string()))
    }

    /// Parses the optional comma-separated `targets` parameter.
    ///
    /// Absent or blank selects every target. Empty segments are skipped and
    /// duplicates collapse.
    pub fn parse_list(targets: Option<&str>) -> SignalResult<BTreeSet<Self>> {
        let Some(raw) = targets.map(str::trim).filter(|raw| !raw.is_empty()) else {
            return Ok(Self::ALL.into_iter().collect());
        };

        let mut selected = BTreeSet::new();
        for segment in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            selected.extend(Self::parse(segment)?);
        }
        if selected.is_empty() {
            return Ok(Self::ALL.into_iter().collect());
        }
        Ok(selected)
    }
}

impl Display for UpdateTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.wire_name())
    }
}
