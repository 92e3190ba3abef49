//! Attribute schemas for declared resources
//!
//! The policy rule graph is self-referential: permissions carry duties,
//! duties point back to a parent permission and forward to a consequence
//! duty. Schemas are plain values built once per call, so that recursion is
//! cut off at a fixed level: below level 0 the nested attributes do not
//! exist at all.
//!
//! A schema also validates a parsed manifest section before it is turned
//! into typed records, so that errors carry attribute paths.

use declarative::{Diagnostic, Diagnostics};
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;

/// Depth at which duty chains and permission back-references stop
pub const MAX_RECURSION_LEVEL: usize = 3;

/// Policy type tags accepted in a policy's `type` map
pub const POLICY_TYPES: &[&str] = &["set", "offer", "contract"];

// ============================================================================
// Schema types
// ============================================================================

/// Who provides an attribute's value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// Must be declared
    Required,
    /// May be declared
    Optional,
    /// Assigned by the connector, never declared
    Computed,
    /// May be declared, assigned by the connector otherwise
    OptionalComputed,
}

impl Presence {
    fn as_str(self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::Optional => "optional",
            Self::Computed => "computed",
            Self::OptionalComputed => "optional_computed",
        }
    }
}

/// Value checks beyond the type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validator {
    /// Integer must be at least this value
    AtLeast(i64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeType {
    String,
    Integer,
    /// String keys to string values
    StringMap,
    /// String keys to one of a closed set of strings
    EnumMap(&'static [&'static str]),
    /// A string holding a JSON object
    Json,
    Object(ObjectSchema),
    /// Ordered list of nested objects
    List(ObjectSchema),
}

impl AttributeType {
    fn name(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::StringMap => "map",
            Self::EnumMap(_) => "enum_map",
            Self::Json => "json",
            Self::Object(_) => "object",
            Self::List(_) => "list",
        }
    }

    fn expected(&self) -> &'static str {
        match self {
            Self::String => "a string",
            Self::Integer => "an integer",
            Self::StringMap | Self::EnumMap(_) => "a map of strings",
            Self::Json => "a string holding a JSON document",
            Self::Object(_) => "an object",
            Self::List(_) => "a list of objects",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub kind: AttributeType,
    pub presence: Presence,
    pub description: Option<&'static str>,
    pub validators: Vec<Validator>,
}

impl Attribute {
    fn new(kind: AttributeType, presence: Presence) -> Self {
        Self {
            kind,
            presence,
            description: None,
            validators: Vec::new(),
        }
    }

    pub fn required(kind: AttributeType) -> Self {
        Self::new(kind, Presence::Required)
    }

    pub fn optional(kind: AttributeType) -> Self {
        Self::new(kind, Presence::Optional)
    }

    pub fn computed(kind: AttributeType) -> Self {
        Self::new(kind, Presence::Computed)
    }

    pub fn optional_computed(kind: AttributeType) -> Self {
        Self::new(kind, Presence::OptionalComputed)
    }

    #[must_use]
    pub fn describe(mut self, description: &'static str) -> Self {
        self.description = Some(description);
        self
    }

    #[must_use]
    pub fn validate(mut self, validator: Validator) -> Self {
        self.validators.push(validator);
        self
    }
}

/// A set of named attributes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectSchema {
    attributes: BTreeMap<&'static str, Attribute>,
}

impl ObjectSchema {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, name: &'static str, attribute: Attribute) -> Self {
        self.attributes.insert(name, attribute);
        self
    }

    #[cfg(test)]
    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    /// Deepest chain of nested objects below this one
    pub fn depth(&self) -> usize {
        self.attributes
            .values()
            .map(|attr| match &attr.kind {
                AttributeType::Object(inner) | AttributeType::List(inner) => inner.depth() + 1,
                _ => 0,
            })
            .max()
            .unwrap_or(0)
    }

    /// Render as a JSON document for display
    pub fn to_json(&self) -> Value {
        let attributes: Map<String, Value> = self
            .attributes
            .iter()
            .map(|(name, attr)| ((*name).to_string(), attribute_json(attr)))
            .collect();
        json!({ "attributes": attributes })
    }

    /// Check a parsed value against this schema
    ///
    /// Attribute paths in the returned diagnostics are relative to `value`.
    pub fn validate(&self, value: &Value) -> Diagnostics {
        let mut diagnostics = Diagnostics::new();
        self.check_object(value, "", &mut diagnostics);
        diagnostics
    }

    fn check_object(&self, value: &Value, path: &str, diagnostics: &mut Diagnostics) {
        let Some(object) = value.as_object() else {
            diagnostics.push(type_mismatch(path, "an object"));
            return;
        };

        for key in object.keys() {
            if !self.attributes.contains_key(key.as_str()) {
                diagnostics.push(
                    Diagnostic::error(
                        "Unsupported Attribute",
                        format!("An attribute named \"{key}\" is not expected here."),
                    )
                    .at(join(path, key)),
                );
            }
        }

        for (name, attr) in &self.attributes {
            let attr_path = join(path, name);
            match object.get(*name) {
                None | Some(Value::Null) => {
                    if attr.presence == Presence::Required {
                        diagnostics.push(
                            Diagnostic::error(
                                "Missing Required Attribute",
                                format!("The attribute \"{name}\" is required."),
                            )
                            .at(attr_path),
                        );
                    }
                }
                Some(_) if attr.presence == Presence::Computed => {
                    diagnostics.push(
                        Diagnostic::error(
                            "Computed Attribute Set",
                            format!("\"{name}\" is assigned by the connector and cannot be declared."),
                        )
                        .at(attr_path),
                    );
                }
                Some(value) => check_value(attr, value, &attr_path, diagnostics),
            }
        }
    }
}

fn check_value(attr: &Attribute, value: &Value, path: &str, diagnostics: &mut Diagnostics) {
    match &attr.kind {
        AttributeType::String | AttributeType::Json => {
            if !value.is_string() {
                diagnostics.push(type_mismatch(path, attr.kind.expected()));
            }
        }
        AttributeType::Integer => match value.as_i64() {
            Some(n) => check_validators(&attr.validators, n, path, diagnostics),
            None => diagnostics.push(type_mismatch(path, attr.kind.expected())),
        },
        AttributeType::StringMap => match value.as_object() {
            Some(map) if map.values().all(Value::is_string) => {}
            _ => diagnostics.push(type_mismatch(path, attr.kind.expected())),
        },
        AttributeType::EnumMap(allowed) => {
            let Some(map) = value.as_object() else {
                diagnostics.push(type_mismatch(path, attr.kind.expected()));
                return;
            };
            for (key, entry) in map {
                match entry.as_str() {
                    Some(s) if allowed.contains(&s) => {}
                    _ => diagnostics.push(
                        Diagnostic::error(
                            "Invalid Attribute Value",
                            format!("Value must be one of: {}.", allowed.join(", ")),
                        )
                        .at(join(path, key)),
                    ),
                }
            }
        }
        AttributeType::Object(schema) => schema.check_object(value, path, diagnostics),
        AttributeType::List(schema) => {
            let Some(items) = value.as_array() else {
                diagnostics.push(type_mismatch(path, attr.kind.expected()));
                return;
            };
            for (index, item) in items.iter().enumerate() {
                schema.check_object(item, &format!("{path}[{index}]"), diagnostics);
            }
        }
    }
}

fn check_validators(validators: &[Validator], n: i64, path: &str, diagnostics: &mut Diagnostics) {
    for validator in validators {
        match *validator {
            Validator::AtLeast(min) if n < min => diagnostics.push(
                Diagnostic::error(
                    "Invalid Attribute Value",
                    format!("Value must be at least {min}, got {n}."),
                )
                .at(path),
            ),
            Validator::AtLeast(_) => {}
        }
    }
}

fn type_mismatch(path: &str, expected: &str) -> Diagnostic {
    let diagnostic = Diagnostic::error(
        "Incorrect Attribute Value Type",
        format!("Expected {expected}."),
    );
    if path.is_empty() {
        diagnostic
    } else {
        diagnostic.at(path)
    }
}

fn join(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{path}.{name}")
    }
}

fn attribute_json(attr: &Attribute) -> Value {
    let mut out = Map::new();
    out.insert("type".into(), json!(attr.kind.name()));
    out.insert("presence".into(), json!(attr.presence.as_str()));
    if let Some(description) = attr.description {
        out.insert("description".into(), json!(description));
    }
    for validator in &attr.validators {
        match validator {
            Validator::AtLeast(min) => out.insert("at_least".into(), json!(min)),
        };
    }
    match &attr.kind {
        AttributeType::EnumMap(allowed) => {
            out.insert("values".into(), json!(allowed));
        }
        AttributeType::Object(schema) | AttributeType::List(schema) => {
            if let Value::Object(nested) = schema.to_json() {
                out.extend(nested);
            }
        }
        _ => {}
    }
    Value::Object(out)
}

// ============================================================================
// Policy rule graph
// ============================================================================

fn optional_string() -> Attribute {
    Attribute::optional(AttributeType::String)
}

fn constraint_schema() -> ObjectSchema {
    ObjectSchema::new().with("edctype", Attribute::required(AttributeType::String))
}

fn action_schema() -> ObjectSchema {
    ObjectSchema::new()
        .with(
            "constraint",
            Attribute::optional(AttributeType::Object(constraint_schema())),
        )
        .with("included_in", optional_string())
        .with("type", optional_string())
}

/// Attributes shared by permissions, duties and prohibitions
fn rule_schema() -> ObjectSchema {
    ObjectSchema::new()
        .with("assignee", optional_string())
        .with("assigner", optional_string())
        .with("target", optional_string())
        .with("uid", optional_string())
        .with(
            "action",
            Attribute::optional(AttributeType::Object(action_schema())),
        )
        .with(
            "constraints",
            Attribute::optional(AttributeType::List(constraint_schema())),
        )
}

/// Permission schema; `duties` only exists above level 0
pub fn permission_schema(level: usize) -> ObjectSchema {
    let schema = rule_schema().with("edctype", optional_string());
    if level == 0 {
        return schema;
    }
    schema.with(
        "duties",
        Attribute::optional(AttributeType::List(duty_schema(level - 1))),
    )
}

/// Duty schema; `consequence` only exists above level 0
pub fn duty_schema(level: usize) -> ObjectSchema {
    let schema = rule_schema().with(
        "parent_permission",
        Attribute::optional(AttributeType::Object(permission_schema(level))),
    );
    if level == 0 {
        return schema;
    }
    schema.with(
        "consequence",
        Attribute::optional(AttributeType::Object(duty_schema(level - 1))),
    )
}

pub fn prohibition_schema() -> ObjectSchema {
    rule_schema()
}

/// The policy body with rules nested up to [`MAX_RECURSION_LEVEL`]
pub fn policy_body_schema() -> ObjectSchema {
    ObjectSchema::new()
        .with("uid", optional_string())
        .with(
            "type",
            Attribute::optional(AttributeType::EnumMap(POLICY_TYPES)),
        )
        .with("assignee", optional_string())
        .with("assigner", optional_string())
        .with(
            "extensible_properties",
            Attribute::optional(AttributeType::StringMap),
        )
        .with("inherits_from", optional_string())
        .with(
            "obligations",
            Attribute::optional(AttributeType::List(duty_schema(MAX_RECURSION_LEVEL))),
        )
        .with(
            "permissions",
            Attribute::optional(AttributeType::List(permission_schema(
                MAX_RECURSION_LEVEL,
            ))),
        )
        .with(
            "prohibitions",
            Attribute::optional(AttributeType::List(prohibition_schema())),
        )
        .with("target", optional_string())
}

// ============================================================================
// Resources
// ============================================================================

fn created_at() -> Attribute {
    Attribute::computed(AttributeType::Integer).describe("Creation timestamp in milliseconds")
}

pub fn policy_schema() -> ObjectSchema {
    ObjectSchema::new()
        .with(
            "id",
            Attribute::optional_computed(AttributeType::String)
                .describe("Policy definition identifier"),
        )
        .with(
            "policy",
            Attribute::optional(AttributeType::Object(policy_body_schema())),
        )
        .with("created_at", created_at())
}

fn http_address_schema() -> ObjectSchema {
    [
        "name",
        "path",
        "method",
        "base_url",
        "auth_key",
        "auth_code",
        "secret_name",
        "proxy_body",
        "proxy_path",
        "proxy_query_params",
        "proxy_method",
        "content_type",
    ]
    .into_iter()
    .fold(ObjectSchema::new(), |schema, name| {
        schema.with(name, optional_string())
    })
}

fn s3_address_schema() -> ObjectSchema {
    ObjectSchema::new()
        .with("name", optional_string())
        .with("bucket_name", optional_string())
        .with("access_key_id", optional_string())
        .with("secret_access_key", optional_string())
}

fn azure_address_schema() -> ObjectSchema {
    ObjectSchema::new()
        .with("container", optional_string())
        .with("account", optional_string())
        .with("blob_name", optional_string())
}

pub fn asset_schema() -> ObjectSchema {
    let data = ObjectSchema::new()
        .with(
            "http",
            Attribute::optional(AttributeType::Object(http_address_schema())),
        )
        .with(
            "s3",
            Attribute::optional(AttributeType::Object(s3_address_schema())),
        )
        .with(
            "azure",
            Attribute::optional(AttributeType::Object(azure_address_schema())),
        )
        .with(
            "custom",
            Attribute::optional(AttributeType::Json).describe("Arbitrary data address"),
        );

    ObjectSchema::new()
        .with(
            "id",
            Attribute::computed(AttributeType::String).describe("Asset identifier"),
        )
        .with(
            "properties",
            Attribute::required(AttributeType::StringMap).describe("Asset properties"),
        )
        .with(
            "data",
            Attribute::optional(AttributeType::Object(data))
                .describe("Data address; at most one of http, s3, azure, custom"),
        )
        .with("created_at", created_at())
}

pub fn contract_definition_schema() -> ObjectSchema {
    let criterion = ObjectSchema::new()
        .with("operand_left", Attribute::required(AttributeType::String))
        .with("operator", Attribute::required(AttributeType::String))
        .with("operand_right", optional_string());

    ObjectSchema::new()
        .with(
            "id",
            Attribute::computed(AttributeType::String).describe("Contract definition identifier"),
        )
        .with(
            "access_policy_id",
            Attribute::required(AttributeType::String),
        )
        .with(
            "contract_policy_id",
            Attribute::required(AttributeType::String),
        )
        .with(
            "validity",
            Attribute::required(AttributeType::Integer)
                .describe("Validity in seconds")
                .validate(Validator::AtLeast(1)),
        )
        .with(
            "criteria",
            Attribute::optional(AttributeType::List(criterion)).describe("Asset selector"),
        )
        .with("created_at", created_at())
}

/// The `[provider]` block of a manifest
pub fn provider_schema() -> ObjectSchema {
    let addresses = ["default", "management", "protocol", "public", "control"]
        .into_iter()
        .fold(ObjectSchema::new(), |schema, name| {
            schema.with(name, optional_string())
        });

    ObjectSchema::new()
        .with(
            "token",
            Attribute::optional(AttributeType::String).describe("Management API key"),
        )
        .with(
            "addresses",
            Attribute::optional(AttributeType::Object(addresses)),
        )
        .with(
            "request_timeout_secs",
            Attribute::optional(AttributeType::Integer).validate(Validator::AtLeast(1)),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nested(schema: &ObjectSchema, name: &str) -> Option<ObjectSchema> {
        match &schema.get(name)?.kind {
            AttributeType::Object(inner) | AttributeType::List(inner) => Some(inner.clone()),
            _ => None,
        }
    }

    #[test]
    fn test_duty_consequence_exists_above_level_zero() {
        for level in 0..=6 {
            let schema = duty_schema(level);
            match nested(&schema, "consequence") {
                Some(inner) => {
                    assert!(level > 0);
                    assert_eq!(inner, duty_schema(level - 1));
                }
                None => assert_eq!(level, 0),
            }
        }
    }

    #[test]
    fn test_permission_duties_exist_above_level_zero() {
        assert!(permission_schema(0).get("duties").is_none());
        for level in 1..=4 {
            assert_eq!(
                nested(&permission_schema(level), "duties"),
                Some(duty_schema(level - 1))
            );
        }
    }

    #[test]
    fn test_schema_is_deterministic() {
        assert_eq!(policy_schema(), policy_schema());
        assert_eq!(
            policy_schema().to_json().to_string(),
            policy_schema().to_json().to_string()
        );
    }

    #[test]
    fn test_policy_schema_depth_is_bounded() {
        let depth = policy_schema().depth();
        assert!(depth > MAX_RECURSION_LEVEL);
        assert_eq!(depth, policy_schema().depth());

        let mut chain = nested(&policy_body_schema(), "obligations").unwrap();
        for _ in 0..MAX_RECURSION_LEVEL {
            chain = nested(&chain, "consequence").unwrap();
        }
        assert!(chain.get("consequence").is_none());
    }

    #[test]
    fn test_validate_accepts_valid_asset() {
        let value = json!({
            "properties": {"asset:prop:id": "a-1"},
            "data": {"s3": {"bucket_name": "testBucket"}}
        });
        assert!(asset_schema().validate(&value).is_empty());
    }

    #[test]
    fn test_validate_reports_paths() {
        let value = json!({
            "id": "fixed",
            "data": {"ftp": {}, "custom": 3}
        });
        let diagnostics = asset_schema().validate(&value);
        let paths: Vec<_> = diagnostics
            .iter()
            .filter_map(|d| d.attribute.as_deref())
            .collect();
        assert!(paths.contains(&"id"));
        assert!(paths.contains(&"properties"));
        assert!(paths.contains(&"data.ftp"));
        assert!(paths.contains(&"data.custom"));
        assert_eq!(diagnostics.len(), 4);
    }

    #[test]
    fn test_validate_rejects_nesting_beyond_bound() {
        let mut duty = json!({"uid": "deepest"});
        for _ in 0..=MAX_RECURSION_LEVEL {
            duty = json!({"consequence": duty});
        }
        let value = json!({"policy": {"obligations": [duty]}});
        let diagnostics = policy_schema().validate(&value);
        assert_eq!(diagnostics.len(), 1);
        let diagnostic = diagnostics.iter().next().unwrap();
        assert_eq!(diagnostic.summary, "Unsupported Attribute");
        assert_eq!(
            diagnostic.attribute.as_deref(),
            Some("policy.obligations[0].consequence.consequence.consequence.consequence")
        );
    }

    #[test]
    fn test_validate_validity_at_least_one() {
        let value = json!({
            "access_policy_id": "p",
            "contract_policy_id": "p",
            "validity": 0
        });
        let diagnostics = contract_definition_schema().validate(&value);
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics.has_error());
    }

    #[test]
    fn test_validate_policy_type_values() {
        let value = json!({"policy": {"type": {"a": "set", "b": "bogus"}}});
        let diagnostics = policy_schema().validate(&value);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics.iter().next().unwrap().attribute.as_deref(),
            Some("policy.type.b")
        );
    }

    #[test]
    fn test_optional_computed_may_be_declared() {
        assert!(policy_schema().validate(&json!({"id": "p-1"})).is_empty());
        assert!(asset_schema()
            .validate(&json!({"properties": {}, "created_at": 1}))
            .has_error());
    }

    #[test]
    fn test_to_json_marks_presence() {
        let rendered = contract_definition_schema().to_json();
        assert_eq!(rendered["attributes"]["id"]["presence"], "computed");
        assert_eq!(rendered["attributes"]["validity"]["at_least"], 1);
        assert_eq!(
            rendered["attributes"]["criteria"]["attributes"]["operator"]["presence"],
            "required"
        );
    }
}
