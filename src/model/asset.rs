//! Declared asset records

use super::Attr;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An asset as declared in the manifest and kept in state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssetModel {
    /// Assigned by the connector
    #[serde(default, skip_serializing_if = "Attr::is_absent")]
    pub id: Attr<String>,

    /// Asset property bag, e.g. `asset:prop:id`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, String>>,

    /// Where the data lives
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<DataAddressSlots>,

    /// Creation timestamp in milliseconds, assigned by the connector
    #[serde(default, skip_serializing_if = "Attr::is_absent")]
    pub created_at: Attr<i64>,
}

impl AssetModel {
    /// A copy with the connector-assigned attributes cleared
    pub fn declared(&self) -> Self {
        Self {
            id: Attr::Null,
            created_at: Attr::Null,
            ..self.clone()
        }
    }
}

/// The four mutually exclusive data address slots
///
/// At most one slot may be populated; see [`crate::address::resolve`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DataAddressSlots {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http: Option<HttpAddress>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s3: Option<S3Address>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azure: Option<AzureAddress>,

    /// Arbitrary data address as a JSON object document
    #[serde(default, skip_serializing_if = "Attr::is_absent")]
    pub custom: Attr<String>,
}

/// HTTP data address
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HttpAddress {
    #[serde(default, skip_serializing_if = "Attr::is_absent")]
    pub name: Attr<String>,
    #[serde(default, skip_serializing_if = "Attr::is_absent")]
    pub path: Attr<String>,
    #[serde(default, skip_serializing_if = "Attr::is_absent")]
    pub method: Attr<String>,
    #[serde(default, skip_serializing_if = "Attr::is_absent")]
    pub base_url: Attr<String>,
    #[serde(default, skip_serializing_if = "Attr::is_absent")]
    pub auth_key: Attr<String>,
    #[serde(default, skip_serializing_if = "Attr::is_absent")]
    pub auth_code: Attr<String>,
    #[serde(default, skip_serializing_if = "Attr::is_absent")]
    pub secret_name: Attr<String>,
    #[serde(default, skip_serializing_if = "Attr::is_absent")]
    pub proxy_body: Attr<String>,
    #[serde(default, skip_serializing_if = "Attr::is_absent")]
    pub proxy_path: Attr<String>,
    #[serde(default, skip_serializing_if = "Attr::is_absent")]
    pub proxy_query_params: Attr<String>,
    #[serde(default, skip_serializing_if = "Attr::is_absent")]
    pub proxy_method: Attr<String>,
    #[serde(default, skip_serializing_if = "Attr::is_absent")]
    pub content_type: Attr<String>,
}

/// S3-style object storage data address
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct S3Address {
    #[serde(default, skip_serializing_if = "Attr::is_absent")]
    pub name: Attr<String>,
    #[serde(default, skip_serializing_if = "Attr::is_absent")]
    pub bucket_name: Attr<String>,
    #[serde(default, skip_serializing_if = "Attr::is_absent")]
    pub access_key_id: Attr<String>,
    #[serde(default, skip_serializing_if = "Attr::is_absent")]
    pub secret_access_key: Attr<String>,
}

/// Azure blob storage data address
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AzureAddress {
    #[serde(default, skip_serializing_if = "Attr::is_absent")]
    pub container: Attr<String>,
    #[serde(default, skip_serializing_if = "Attr::is_absent")]
    pub account: Attr<String>,
    #[serde(default, skip_serializing_if = "Attr::is_absent")]
    pub blob_name: Attr<String>,
}
