//! Declared policy definitions
//!
//! The rule graph is recursive: a permission carries duties, a duty may name
//! its parent permission and a consequence duty. Records may nest as deep as
//! the declared schema allows; see [`crate::schema::MAX_RECURSION_LEVEL`].

use super::Attr;
use edc_client::types::PolicyType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A policy definition as declared in the manifest and kept in state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyModel {
    /// Requested identifier; assigned by the connector when not declared
    #[serde(default, skip_serializing_if = "Attr::is_absent")]
    pub id: Attr<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<PolicyBody>,

    #[serde(default, skip_serializing_if = "Attr::is_absent")]
    pub created_at: Attr<i64>,
}

impl PolicyModel {
    /// A copy with the connector-assigned attributes cleared
    ///
    /// A declared `id` counts as configuration, so it is only cleared when
    /// `id_declared` is false.
    pub fn declared(&self, id_declared: bool) -> Self {
        Self {
            id: if id_declared {
                self.id.clone()
            } else {
                Attr::Null
            },
            created_at: Attr::Null,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyBody {
    #[serde(default, skip_serializing_if = "Attr::is_absent")]
    pub uid: Attr<String>,

    /// Policy type tags
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub policy_type: Option<BTreeMap<String, PolicyType>>,

    #[serde(default, skip_serializing_if = "Attr::is_absent")]
    pub assignee: Attr<String>,
    #[serde(default, skip_serializing_if = "Attr::is_absent")]
    pub assigner: Attr<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensible_properties: Option<BTreeMap<String, String>>,

    #[serde(default, skip_serializing_if = "Attr::is_absent")]
    pub inherits_from: Attr<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub obligations: Option<Vec<DutyModel>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Vec<PermissionModel>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prohibitions: Option<Vec<ProhibitionModel>>,

    #[serde(default, skip_serializing_if = "Attr::is_absent")]
    pub target: Attr<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConstraintModel {
    pub edctype: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActionModel {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraint: Option<ConstraintModel>,
    #[serde(default, skip_serializing_if = "Attr::is_absent")]
    pub included_in: Attr<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Attr::is_absent")]
    pub action_type: Attr<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PermissionModel {
    #[serde(default, skip_serializing_if = "Attr::is_absent")]
    pub assignee: Attr<String>,
    #[serde(default, skip_serializing_if = "Attr::is_absent")]
    pub assigner: Attr<String>,
    #[serde(default, skip_serializing_if = "Attr::is_absent")]
    pub target: Attr<String>,
    #[serde(default, skip_serializing_if = "Attr::is_absent")]
    pub uid: Attr<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<ActionModel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<Vec<ConstraintModel>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duties: Option<Vec<DutyModel>>,
    #[serde(default, skip_serializing_if = "Attr::is_absent")]
    pub edctype: Attr<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DutyModel {
    #[serde(default, skip_serializing_if = "Attr::is_absent")]
    pub assignee: Attr<String>,
    #[serde(default, skip_serializing_if = "Attr::is_absent")]
    pub assigner: Attr<String>,
    #[serde(default, skip_serializing_if = "Attr::is_absent")]
    pub target: Attr<String>,
    #[serde(default, skip_serializing_if = "Attr::is_absent")]
    pub uid: Attr<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<ActionModel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<Vec<ConstraintModel>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consequence: Option<Box<DutyModel>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_permission: Option<Box<PermissionModel>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProhibitionModel {
    #[serde(default, skip_serializing_if = "Attr::is_absent")]
    pub assignee: Attr<String>,
    #[serde(default, skip_serializing_if = "Attr::is_absent")]
    pub assigner: Attr<String>,
    #[serde(default, skip_serializing_if = "Attr::is_absent")]
    pub target: Attr<String>,
    #[serde(default, skip_serializing_if = "Attr::is_absent")]
    pub uid: Attr<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<ActionModel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<Vec<ConstraintModel>>,
}
