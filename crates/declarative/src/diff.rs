//! Diff computation for instances

use crate::resource::{Instance, ResourceKind};
use crate::types::LifecycleState;
use serde::{Deserialize, Serialize};

/// How an instance differs from its declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Change {
    /// Declared but not yet created
    Addition,
    /// Known remotely but no longer declared
    Removal,
    /// Known remotely and declared, but the record differs
    Modification,
}

/// A diff between the declaration and the last-known record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceDiff {
    /// Resource address, e.g. `asset.s3`
    pub address: String,
    /// Type of the resource
    pub resource_type: String,
    pub change: Change,
    /// Rendering of the last-known record
    pub current: Option<String>,
    /// Rendering of the declaration
    pub desired: Option<String>,
}

impl ResourceDiff {
    /// Create a diff from an instance, returning None if no changes needed
    ///
    /// `render` turns a record into the text shown to the user.
    pub fn from_instance<K, F>(kind: &K, instance: &Instance<K::Record>, render: F) -> Option<Self>
    where
        K: ResourceKind,
        F: Fn(&K::Record) -> String,
    {
        let change = match (instance.state(), instance.desired(), instance.current()) {
            (LifecycleState::Planned, Some(_), _) => Change::Addition,
            (state, None, Some(_)) if state.is_remote() => Change::Removal,
            (state, Some(desired), Some(current))
                if state.is_remote() && kind.differs(desired, current) =>
            {
                Change::Modification
            }
            _ => return None,
        };

        Some(Self {
            address: format!("{}.{}", kind.type_name(), instance.name()),
            resource_type: kind.type_name().to_string(),
            change,
            current: instance.current().map(&render),
            desired: instance.desired().map(&render),
        })
    }

    pub fn is_addition(&self) -> bool {
        self.change == Change::Addition
    }

    pub fn is_removal(&self) -> bool {
        self.change == Change::Removal
    }

    pub fn is_modification(&self) -> bool {
        self.change == Change::Modification
    }
}

/// Compute diffs for a list of instances
///
/// Returns only instances whose declaration and record disagree.
pub fn compute_diffs<K, F>(
    kind: &K,
    instances: &[Instance<K::Record>],
    render: F,
) -> Vec<ResourceDiff>
where
    K: ResourceKind,
    F: Fn(&K::Record) -> String,
{
    instances
        .iter()
        .filter_map(|instance| ResourceDiff::from_instance(kind, instance, &render))
        .collect()
}

/// Diff summary statistics
#[derive(Debug, Clone, Default)]
pub struct DiffSummary {
    /// Number of resources to add
    pub additions: usize,
    /// Number of resources to remove
    pub removals: usize,
    /// Number of drifted resources
    pub modifications: usize,
}

impl DiffSummary {
    /// Create a summary from a list of diffs
    pub fn from_diffs(diffs: &[ResourceDiff]) -> Self {
        let mut summary = Self::default();
        for diff in diffs {
            match diff.change {
                Change::Addition => summary.additions += 1,
                Change::Removal => summary.removals += 1,
                Change::Modification => summary.modifications += 1,
            }
        }
        summary
    }

    /// Total number of changes
    pub fn total(&self) -> usize {
        self.additions + self.removals + self.modifications
    }

    /// Check if there are any changes
    pub fn has_changes(&self) -> bool {
        self.total() > 0
    }
}

/// Group diffs by resource type
pub fn group_by_type(
    diffs: &[ResourceDiff],
) -> std::collections::BTreeMap<String, Vec<&ResourceDiff>> {
    let mut groups: std::collections::BTreeMap<String, Vec<&ResourceDiff>> =
        std::collections::BTreeMap::new();
    for diff in diffs {
        groups
            .entry(diff.resource_type.clone())
            .or_default()
            .push(diff);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::collect_instances;
    use crate::resource::tests::{Note, NoteKind, note};
    use std::collections::BTreeMap;

    #[test]
    fn test_compute_diffs() {
        let kind = NoteKind::default();
        let instances = collect_instances(
            BTreeMap::from([
                ("new".to_string(), note("n")),
                ("same".to_string(), note("s")),
                ("changed".to_string(), note("after")),
            ]),
            BTreeMap::from([
                (
                    "same".to_string(),
                    Note {
                        id: Some("1".into()),
                        text: "s".into(),
                    },
                ),
                (
                    "changed".to_string(),
                    Note {
                        id: Some("2".into()),
                        text: "before".into(),
                    },
                ),
                (
                    "gone".to_string(),
                    Note {
                        id: Some("3".into()),
                        text: "g".into(),
                    },
                ),
            ]),
        );

        let diffs = compute_diffs(&kind, &instances, |n| format!("{n:?}"));
        let summary = DiffSummary::from_diffs(&diffs);
        assert_eq!(summary.additions, 1);
        assert_eq!(summary.removals, 1);
        assert_eq!(summary.modifications, 1);
        assert_eq!(summary.total(), 3);

        let changed = diffs.iter().find(|d| d.address == "note.changed").unwrap();
        assert!(changed.is_modification());
        assert!(changed.current.as_deref().unwrap().contains("before"));

        let groups = group_by_type(&diffs);
        assert_eq!(groups.get("note").map(Vec::len), Some(3));
    }
}
