//! Manifest loading
//!
//! A manifest declares the provider connection and named resources:
//!
//! ```toml
//! [provider]
//! token = "api-key"
//!
//! [assets.raw]
//! properties = { "asset:prop:id" = "raw-data" }
//! data.s3 = { bucket_name = "raw", access_key_id = "k", secret_access_key = "s" }
//!
//! [contract_definitions.raw]
//! access_policy_id = "open"
//! contract_policy_id = "open"
//! validity = 600
//! ```
//!
//! The document is parsed into a generic value first and checked against
//! the resource schemas, so every problem is reported with its attribute
//! path before anything is deserialized into typed records.

use crate::config::ProviderBlock;
use crate::model::{AssetModel, Attr, ContractDefinitionModel, PolicyModel};
use crate::resources::Kind;
use crate::schema;
use declarative::{Diagnostic, Diagnostics};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Manifest file formats, chosen by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Toml,
    Json,
}

impl Format {
    /// Detect the format from a file name; anything but `.json` is TOML
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Toml,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Toml => "toml",
            Self::Json => "json",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("Failed to read manifest {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid {} syntax: {message}", format.extension().to_uppercase())]
    Syntax { format: Format, message: String },

    #[error("manifest has {} error(s)", .0.errors().count())]
    Invalid(Diagnostics),
}

/// Declared provider and resources
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default)]
    pub provider: ProviderBlock,
    #[serde(default)]
    pub assets: BTreeMap<String, AssetModel>,
    #[serde(default)]
    pub policies: BTreeMap<String, PolicyModel>,
    #[serde(default)]
    pub contract_definitions: BTreeMap<String, ContractDefinitionModel>,
}

impl Manifest {
    /// Load and validate a manifest file
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        log::debug!("loading manifest from {}", path.display());
        let content = std::fs::read_to_string(path).map_err(|source| ManifestError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, Format::from_path(path))
    }

    /// Parse and validate manifest text
    pub fn parse(content: &str, format: Format) -> Result<Self, ManifestError> {
        let syntax = |message: String| ManifestError::Syntax { format, message };
        let value: Value = match format {
            Format::Toml => toml::from_str(content).map_err(|e| syntax(e.to_string()))?,
            Format::Json => serde_json::from_str(content).map_err(|e| syntax(e.to_string()))?,
        };

        let diagnostics = validate(&value);
        if diagnostics.has_error() {
            return Err(ManifestError::Invalid(diagnostics));
        }

        let mut manifest: Self =
            serde_json::from_value(value).map_err(|e| syntax(e.to_string()))?;
        manifest.mark_computed();
        Ok(manifest)
    }

    /// Connector-assigned attributes are unknown until creation
    fn mark_computed(&mut self) {
        for asset in self.assets.values_mut() {
            asset.id = Attr::Unknown;
            asset.created_at = Attr::Unknown;
        }
        for policy in self.policies.values_mut() {
            policy.id = std::mem::take(&mut policy.id).or_unknown();
            policy.created_at = Attr::Unknown;
        }
        for definition in self.contract_definitions.values_mut() {
            definition.id = Attr::Unknown;
            definition.created_at = Attr::Unknown;
        }
    }

    /// Number of declared resources
    pub fn len(&self) -> usize {
        self.assets.len() + self.policies.len() + self.contract_definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Check a parsed manifest against the provider and resource schemas
pub fn validate(value: &Value) -> Diagnostics {
    let mut diagnostics = Diagnostics::new();
    let Some(root) = value.as_object() else {
        diagnostics.add_error("Invalid Manifest", "The manifest must be a table.");
        return diagnostics;
    };

    for (key, section) in root {
        if key == "provider" {
            diagnostics.extend(schema::provider_schema().validate(section).nested("provider"));
            continue;
        }

        let Some(kind) = Kind::ALL.into_iter().find(|k| k.section() == key) else {
            diagnostics.push(
                Diagnostic::error(
                    "Unsupported Section",
                    format!(
                        "\"{key}\" is not a manifest section; expected provider, assets, \
                         policies or contract_definitions."
                    ),
                )
                .at(key.clone()),
            );
            continue;
        };

        let Some(resources) = section.as_object() else {
            diagnostics.push(
                Diagnostic::error(
                    "Invalid Section",
                    format!("\"{key}\" must map resource names to resources."),
                )
                .at(key.clone()),
            );
            continue;
        };

        let schema = kind.schema();
        for (name, resource) in resources {
            diagnostics.extend(
                schema
                    .validate(resource)
                    .nested(&format!("{}.{name}", kind.type_name())),
            );
        }
    }
    diagnostics
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DataAddressSlots;
    use std::io::Write;

    const SAMPLE: &str = r#"
[provider]
token = "api-key"
request_timeout_secs = 10

[provider.addresses]
management = "http://localhost:9193/api/v1/data"

[assets.raw]
properties = { "asset:prop:name" = "test asset", "asset:prop:id" = "test-asset-id" }

[assets.raw.data.s3]
bucket_name = "testBucket"
access_key_id = "k"
secret_access_key = "s"

[policies.open]
id = "open-policy"

[policies.open.policy]
type = { "type" = "set" }

[[policies.open.policy.permissions]]
target = "test-asset-id"
action = { type = "USE" }

[[policies.open.policy.permissions.duties]]
uid = "notify"
consequence = { uid = "delete" }

[contract_definitions.raw]
access_policy_id = "open-policy"
contract_policy_id = "open-policy"
validity = 600
criteria = [{ operand_left = "test", operator = "eq", operand_right = "test" }]
"#;

    #[test]
    fn test_parse_sample() {
        let manifest = Manifest::parse(SAMPLE, Format::Toml).unwrap();
        assert_eq!(manifest.len(), 3);
        assert_eq!(manifest.provider.token, Attr::Value("api-key".to_string()));
        assert_eq!(manifest.provider.request_timeout_secs, Some(10));

        let raw = &manifest.assets["raw"];
        assert!(raw.id.is_unknown());
        assert_eq!(
            raw.data.as_ref().and_then(|d| d.s3.as_ref()).map(|s3| s3.bucket_name.clone()),
            Some(Attr::Value("testBucket".to_string()))
        );

        let open = &manifest.policies["open"];
        assert_eq!(open.id, Attr::Value("open-policy".to_string()));
        let duties = open.policy.as_ref().unwrap().permissions.as_ref().unwrap()[0]
            .duties
            .as_ref()
            .unwrap();
        assert_eq!(
            duties[0].consequence.as_ref().unwrap().uid,
            Attr::Value("delete".to_string())
        );

        let raw = &manifest.contract_definitions["raw"];
        assert_eq!(raw.validity, Attr::Value(600));
        assert!(raw.created_at.is_unknown());
    }

    #[test]
    fn test_policy_without_id_is_unknown() {
        let manifest = Manifest::parse("[policies.p]\n", Format::Toml).unwrap();
        assert!(manifest.policies["p"].id.is_unknown());
    }

    #[test]
    fn test_json_manifest() {
        let json = r#"{
            "assets": {
                "empty": {"properties": {}, "data": {}}
            }
        }"#;
        let manifest = Manifest::parse(json, Format::Json).unwrap();
        let empty = &manifest.assets["empty"];
        assert_eq!(empty.properties, Some(BTreeMap::new()));
        assert_eq!(empty.data, Some(DataAddressSlots::default()));
    }

    #[test]
    fn test_schema_errors_carry_paths() {
        let toml = r#"
[assets.raw]
id = "fixed"

[contract_definitions.raw]
access_policy_id = "p"
contract_policy_id = "p"
validity = 0

[catalog]
"#;
        let Err(ManifestError::Invalid(diagnostics)) = Manifest::parse(toml, Format::Toml) else {
            panic!("expected schema errors");
        };
        let paths: Vec<_> = diagnostics
            .iter()
            .filter_map(|d| d.attribute.as_deref())
            .collect();
        assert!(paths.contains(&"asset.raw.id"));
        assert!(paths.contains(&"asset.raw.properties"));
        assert!(paths.contains(&"contract_definition.raw.validity"));
        assert!(paths.contains(&"catalog"));
    }

    #[test]
    fn test_provider_typo_is_reported() {
        let toml = "[provider]\ntokn = \"x\"\n";
        let Err(ManifestError::Invalid(diagnostics)) = Manifest::parse(toml, Format::Toml) else {
            panic!("expected schema errors");
        };
        assert_eq!(
            diagnostics.iter().next().unwrap().attribute.as_deref(),
            Some("provider.tokn")
        );
    }

    #[test]
    fn test_syntax_error() {
        let err = Manifest::parse("[assets", Format::Toml).unwrap_err();
        assert!(matches!(err, ManifestError::Syntax { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let manifest = Manifest::load(file.path()).unwrap();
        assert_eq!(manifest.assets.len(), 1);

        let missing = Manifest::load(Path::new("/nonexistent/edcform.toml")).unwrap_err();
        assert!(matches!(missing, ManifestError::Read { .. }));
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(Format::from_path(Path::new("a.json")), Format::Json);
        assert_eq!(Format::from_path(Path::new("a.toml")), Format::Toml);
        assert_eq!(Format::from_path(Path::new("edcform")), Format::Toml);
    }
}
