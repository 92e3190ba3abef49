//! Execution planner - decides which lifecycle operation each instance needs

use crate::resource::Instance;
use crate::types::{LifecycleState, OperationKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// What the executor will do with one instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Create the declared record remotely
    Create,
    /// Read the remote record
    Refresh,
    /// Read the remote record, then update it if it drifted
    Reconcile,
    /// Delete the remote record
    Delete,
}

impl Action {
    /// The first lifecycle operation this action performs
    pub fn operation(&self) -> OperationKind {
        match self {
            Self::Create => OperationKind::Create,
            Self::Refresh | Self::Reconcile => OperationKind::Read,
            Self::Delete => OperationKind::Delete,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Create => "create",
            Self::Refresh => "refresh",
            Self::Reconcile => "reconcile",
            Self::Delete => "delete",
        };
        write!(f, "{name}")
    }
}

/// One planned operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedOperation {
    pub resource_type: String,
    pub name: String,
    pub action: Action,
}

impl PlannedOperation {
    /// Resource address, e.g. `asset.s3`
    pub fn address(&self) -> String {
        format!("{}.{}", self.resource_type, self.name)
    }
}

/// An execution plan for one or more resource types
#[derive(Debug, Clone, Default)]
pub struct ExecutionPlan {
    pub operations: Vec<PlannedOperation>,
}

impl ExecutionPlan {
    /// Create a new empty plan
    pub fn new() -> Self {
        Self::default()
    }

    /// Plan a full apply: create new declarations, reconcile known ones,
    /// delete the ones no longer declared
    pub fn for_apply<R>(resource_type: &str, instances: &[Instance<R>]) -> Self
    where
        R: Clone + PartialEq + fmt::Debug,
    {
        Self::build(resource_type, instances, |instance| {
            match (instance.state(), instance.desired().is_some()) {
                (LifecycleState::Planned, true) => Some(Action::Create),
                (state, true) if state.is_remote() => Some(Action::Reconcile),
                (state, false) if state.is_remote() => Some(Action::Delete),
                _ => None,
            }
        })
    }

    /// Plan a read of every instance with a remote identity
    pub fn for_refresh<R>(resource_type: &str, instances: &[Instance<R>]) -> Self
    where
        R: Clone + PartialEq + fmt::Debug,
    {
        Self::build(resource_type, instances, |instance| {
            instance.state().is_remote().then_some(Action::Refresh)
        })
    }

    /// Plan deletion of every instance with a remote identity
    pub fn for_destroy<R>(resource_type: &str, instances: &[Instance<R>]) -> Self
    where
        R: Clone + PartialEq + fmt::Debug,
    {
        Self::build(resource_type, instances, |instance| {
            instance.state().is_remote().then_some(Action::Delete)
        })
    }

    fn build<R, F>(resource_type: &str, instances: &[Instance<R>], decide: F) -> Self
    where
        R: Clone + PartialEq + fmt::Debug,
        F: Fn(&Instance<R>) -> Option<Action>,
    {
        let operations = instances
            .iter()
            .filter_map(|instance| {
                decide(instance).map(|action| PlannedOperation {
                    resource_type: resource_type.to_string(),
                    name: instance.name().to_string(),
                    action,
                })
            })
            .collect();
        Self { operations }
    }

    /// Append the operations of another plan
    pub fn merge(&mut self, other: ExecutionPlan) {
        self.operations.extend(other.operations);
    }

    /// Look up the planned action for an instance
    pub fn action_for(&self, resource_type: &str, name: &str) -> Option<Action> {
        self.operations
            .iter()
            .find(|op| op.resource_type == resource_type && op.name == name)
            .map(|op| op.action)
    }

    /// Filter plan to only include operations matching a target pattern
    ///
    /// Target format: "type" or "type.name"
    pub fn filter_by_target(self, target: Option<&str>) -> Self {
        match target {
            None => self,
            Some(t) => {
                let (resource_type, name) = parse_target(t);
                Self {
                    operations: self
                        .operations
                        .into_iter()
                        .filter(|op| matches_filter(op, resource_type.as_deref(), name.as_deref()))
                        .collect(),
                }
            }
        }
    }

    /// Count operations with the given action
    pub fn count(&self, action: Action) -> usize {
        self.operations.iter().filter(|op| op.action == action).count()
    }

    /// Total number of operations in the plan
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Check if plan is empty
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

/// Pair declarations with persisted records by name
///
/// Names present only in `desired` become planned instances, names present
/// in `current` become existing ones (with or without a declaration).
pub fn collect_instances<R>(
    desired: BTreeMap<String, R>,
    mut current: BTreeMap<String, R>,
) -> Vec<Instance<R>>
where
    R: Clone + PartialEq + fmt::Debug,
{
    let mut instances = Vec::with_capacity(desired.len() + current.len());
    for (name, declared) in desired {
        match current.remove(&name) {
            Some(record) => instances.push(Instance::existing(name, record, Some(declared))),
            None => instances.push(Instance::planned(name, declared)),
        }
    }
    for (name, record) in current {
        instances.push(Instance::existing(name, record, None));
    }
    instances
}

/// Parse a target string like "type.name" into (type, name)
fn parse_target(target: &str) -> (Option<String>, Option<String>) {
    match target.split_once('.') {
        None => (Some(target.to_string()), None),
        Some((resource_type, name)) => (Some(resource_type.to_string()), Some(name.to_string())),
    }
}

/// Check if an operation matches the filter criteria
fn matches_filter(op: &PlannedOperation, resource_type: Option<&str>, name: Option<&str>) -> bool {
    if let Some(rt) = resource_type {
        // Allow plural aliases
        let matches_type = match rt {
            "assets" => op.resource_type == "asset",
            "policies" => op.resource_type == "policy",
            "contract_definitions" => op.resource_type == "contract_definition",
            _ => op.resource_type == rt,
        };
        if !matches_type {
            return false;
        }
    }

    if let Some(n) = name
        && op.name != n
    {
        return false;
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::tests::{Note, note};

    fn stored(id: &str, text: &str) -> Note {
        Note {
            id: Some(id.to_string()),
            text: text.to_string(),
        }
    }

    #[test]
    fn test_parse_target() {
        assert_eq!(parse_target("asset"), (Some("asset".to_string()), None));
        assert_eq!(
            parse_target("asset.s3"),
            (Some("asset".to_string()), Some("s3".to_string()))
        );
        assert_eq!(
            parse_target("policy.a.b"),
            (Some("policy".to_string()), Some("a.b".to_string()))
        );
    }

    #[test]
    fn test_collect_instances() {
        let desired = BTreeMap::from([
            ("new".to_string(), note("n")),
            ("kept".to_string(), note("k")),
        ]);
        let current = BTreeMap::from([
            ("kept".to_string(), stored("1", "k")),
            ("removed".to_string(), stored("2", "r")),
        ]);
        let instances = collect_instances(desired, current);
        assert_eq!(instances.len(), 3);

        let plan = ExecutionPlan::for_apply("note", &instances);
        assert_eq!(plan.action_for("note", "new"), Some(Action::Create));
        assert_eq!(plan.action_for("note", "kept"), Some(Action::Reconcile));
        assert_eq!(plan.action_for("note", "removed"), Some(Action::Delete));
    }

    #[test]
    fn test_destroy_plan_skips_planned() {
        let instances = collect_instances(
            BTreeMap::from([("new".to_string(), note("n"))]),
            BTreeMap::from([("old".to_string(), stored("1", "o"))]),
        );
        let plan = ExecutionPlan::for_destroy("note", &instances);
        assert_eq!(plan.len(), 1);
        assert_eq!(plan.count(Action::Delete), 1);
        assert_eq!(plan.action_for("note", "new"), None);
    }

    #[test]
    fn test_filter_by_target() {
        let mut plan = ExecutionPlan::new();
        plan.operations.push(PlannedOperation {
            resource_type: "asset".into(),
            name: "s3".into(),
            action: Action::Create,
        });
        plan.operations.push(PlannedOperation {
            resource_type: "policy".into(),
            name: "p".into(),
            action: Action::Create,
        });

        let assets = plan.clone().filter_by_target(Some("assets"));
        assert_eq!(assets.len(), 1);
        assert_eq!(assets.operations[0].address(), "asset.s3");

        let none = plan.clone().filter_by_target(Some("asset.http"));
        assert!(none.is_empty());

        let all = plan.filter_by_target(None);
        assert_eq!(all.len(), 2);
    }
}
