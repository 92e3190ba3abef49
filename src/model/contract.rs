//! Declared contract definitions

use super::Attr;
use serde::{Deserialize, Serialize};

/// A contract definition as declared in the manifest and kept in state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContractDefinitionModel {
    /// Assigned by the connector
    #[serde(default, skip_serializing_if = "Attr::is_absent")]
    pub id: Attr<String>,

    #[serde(default, skip_serializing_if = "Attr::is_absent")]
    pub access_policy_id: Attr<String>,

    #[serde(default, skip_serializing_if = "Attr::is_absent")]
    pub contract_policy_id: Attr<String>,

    /// Validity in seconds, at least 1
    #[serde(default, skip_serializing_if = "Attr::is_absent")]
    pub validity: Attr<i64>,

    /// Asset selector, order preserved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub criteria: Option<Vec<CriterionModel>>,

    #[serde(default, skip_serializing_if = "Attr::is_absent")]
    pub created_at: Attr<i64>,
}

impl ContractDefinitionModel {
    /// A copy with the connector-assigned attributes cleared
    pub fn declared(&self) -> Self {
        Self {
            id: Attr::Null,
            created_at: Attr::Null,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CriterionModel {
    #[serde(default, skip_serializing_if = "Attr::is_absent")]
    pub operand_left: Attr<String>,
    #[serde(default, skip_serializing_if = "Attr::is_absent")]
    pub operator: Attr<String>,
    #[serde(default, skip_serializing_if = "Attr::is_absent")]
    pub operand_right: Attr<String>,
}
