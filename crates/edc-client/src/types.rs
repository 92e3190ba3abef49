//! Wire types for the management API.
//!
//! These mirror the JSON documents exchanged with the connector. Optional
//! attributes are `Option` and skipped when unset, so that an attribute the
//! caller never set is absent from the request rather than sent as a default.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// String-keyed property bag.
pub type Properties = BTreeMap<String, String>;

/// Property key the connector uses for an asset's identifier.
pub const ASSET_ID_PROPERTY: &str = "asset:prop:id";

// =============================================================================
// Common
// =============================================================================

/// Response to a create call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdResponse {
    /// Identifier assigned by the connector.
    pub id: String,
    /// Creation timestamp in milliseconds.
    #[serde(default)]
    pub created_at: i64,
}

/// One entry of an error list returned by the connector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Human-readable message.
    pub message: String,
    /// Error type reported by the connector.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Path of the offending attribute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// The rejected value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invalid_value: Option<Value>,
}

impl ApiError {
    /// Create an error with only a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: None,
            path: None,
            invalid_value: None,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(path) => write!(f, "{} (at {})", self.message, path),
            None => write!(f, "{}", self.message),
        }
    }
}

// =============================================================================
// Assets
// =============================================================================

/// An asset as stored by the connector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    /// Asset identifier.
    pub id: String,
    /// Asset properties.
    #[serde(default)]
    pub properties: Properties,
    /// Creation timestamp in milliseconds.
    #[serde(default)]
    pub created_at: i64,
}

/// The asset half of a create request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAsset {
    /// Requested identifier; the connector falls back to `asset:prop:id`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Asset properties.
    pub properties: Properties,
}

/// Where an asset's data physically lives.
///
/// The connector stores a flat property map with a `type` discriminator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataAddress {
    /// Address properties, including `type`.
    pub properties: Map<String, Value>,
}

impl DataAddress {
    /// The `type` discriminator, if present.
    #[must_use]
    pub fn type_name(&self) -> Option<&str> {
        self.properties.get("type").and_then(Value::as_str)
    }
}

/// Create request for an asset and its data address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAssetInput {
    /// The asset itself.
    pub asset: NewAsset,
    /// Its data address.
    pub data_address: DataAddress,
}

// =============================================================================
// Policies
// =============================================================================

/// Policy type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyType {
    /// A set of rules.
    Set,
    /// An offer.
    Offer,
    /// An agreed contract.
    Contract,
}

/// Opaque constraint, identified by its type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraint {
    /// Constraint type.
    pub edctype: String,
}

/// Action a rule applies to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    /// Constraint on the action.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraint: Option<Constraint>,
    /// Action this one is included in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub included_in: Option<String>,
    /// Action type.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub action_type: Option<String>,
}

/// Permission rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Permission {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<Action>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<Vec<Constraint>>,
    /// Duties attached to this permission.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duties: Option<Vec<Duty>>,
    /// Permission type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edctype: Option<String>,
}

/// Duty rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Duty {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<Action>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<Vec<Constraint>>,
    /// Duty that applies if this one is not fulfilled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consequence: Option<Box<Duty>>,
    /// Permission this duty belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_permission: Option<Box<Permission>>,
}

/// Prohibition rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prohibition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<Action>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<Vec<Constraint>>,
}

/// A usage policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Policy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    /// Policy type tags.
    #[serde(rename = "@type", default, skip_serializing_if = "Option::is_none")]
    pub policy_type: Option<BTreeMap<String, PolicyType>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensible_properties: Option<Properties>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inherits_from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub obligations: Option<Vec<Duty>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Vec<Permission>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prohibitions: Option<Vec<Prohibition>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

/// Create request for a policy definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePolicyInput {
    /// Requested identifier; the connector generates one when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// The policy.
    pub policy: Policy,
}

/// A stored policy definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyDefinition {
    /// Identifier.
    pub id: String,
    /// Creation timestamp in milliseconds.
    #[serde(default)]
    pub created_at: i64,
    /// The policy.
    pub policy: Policy,
}

// =============================================================================
// Contract definitions
// =============================================================================

/// Asset selector entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Criterion {
    /// Left operand, usually a property key.
    pub operand_left: String,
    /// Comparison operator.
    pub operator: String,
    /// Right operand.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operand_right: Option<String>,
}

/// A contract definition, used both for create requests and responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractDefinition {
    /// Identifier; absent in create requests that let the connector choose.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Policy governing who may see the offer.
    pub access_policy_id: String,
    /// Policy governing the resulting contract.
    pub contract_policy_id: String,
    /// Validity in seconds.
    pub validity: i64,
    /// Asset selector.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub criteria: Option<Vec<Criterion>>,
    /// Creation timestamp in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_attributes_are_absent() {
        let policy = Policy {
            assignee: Some("alice".to_string()),
            permissions: Some(vec![]),
            ..Default::default()
        };
        let json = serde_json::to_value(&policy).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "assignee": "alice", "permissions": [] })
        );
    }

    #[test]
    fn test_policy_type_tags() {
        let json = r#"{ "@type": { "odrl": "set", "other": "contract" } }"#;
        let policy: Policy = serde_json::from_str(json).unwrap();
        let tags = policy.policy_type.unwrap();
        assert_eq!(tags["odrl"], PolicyType::Set);
        assert_eq!(tags["other"], PolicyType::Contract);
    }

    #[test]
    fn test_duty_nesting_wire_names() {
        let duty = Duty {
            consequence: Some(Box::new(Duty::default())),
            parent_permission: Some(Box::new(Permission {
                edctype: Some("dataspaceconnector:permission".to_string()),
                ..Default::default()
            })),
            ..Default::default()
        };
        let json = serde_json::to_value(&duty).unwrap();
        assert!(json.get("consequence").is_some());
        assert_eq!(
            json["parentPermission"]["edctype"],
            "dataspaceconnector:permission"
        );
    }

    #[test]
    fn test_contract_definition_wire_names() {
        let json = r#"{
            "id": "cd-1",
            "accessPolicyId": "p1",
            "contractPolicyId": "p2",
            "validity": 600,
            "criteria": [{ "operandLeft": "test", "operator": "eq", "operandRight": "test" }],
            "createdAt": 1700000000000
        }"#;
        let cd: ContractDefinition = serde_json::from_str(json).unwrap();
        assert_eq!(cd.validity, 600);
        assert_eq!(cd.criteria.as_ref().map(Vec::len), Some(1));
        assert_eq!(cd.created_at, Some(1_700_000_000_000));
    }

    #[test]
    fn test_data_address_type_name() {
        let address: DataAddress = serde_json::from_str(
            r#"{ "properties": { "type": "AmazonS3", "bucketName": "b" } }"#,
        )
        .unwrap();
        assert_eq!(address.type_name(), Some("AmazonS3"));
    }

    #[test]
    fn test_api_error_display() {
        let err: ApiError =
            serde_json::from_str(r#"{ "message": "must not be blank", "path": "id" }"#).unwrap();
        assert_eq!(err.to_string(), "must not be blank (at id)");
    }
}
