//! Data address variants
//!
//! An asset's data lives behind exactly one binding: HTTP, S3, Azure blob
//! storage, or an arbitrary custom document. Declared records carry one slot
//! per variant; [`resolve`] turns the slots into a single [`DataBinding`] and
//! rejects records that populate more than one.
//!
//! The connector stores a flat property map with a `type` discriminator.
//! For the built-in variants the discriminator is derived from the variant,
//! never declared.

use crate::model::{Attr, AzureAddress, DataAddressSlots, HttpAddress, S3Address};
use edc_client::types::DataAddress;
use serde_json::{Map, Value};

pub const HTTP_TYPE: &str = "HttpData";
pub const S3_TYPE: &str = "AmazonS3";
pub const AZURE_TYPE: &str = "AzureStorage";

const TYPE_KEY: &str = "type";

const HTTP_KEYS: [&str; 12] = [
    "name",
    "path",
    "method",
    "baseUrl",
    "authKey",
    "authCode",
    "secretName",
    "proxyBody",
    "proxyPath",
    "proxyQueryParams",
    "proxyMethod",
    "contentType",
];
const S3_KEYS: [&str; 4] = ["name", "bucketName", "accessKeyId", "secretAccessKey"];
const AZURE_KEYS: [&str; 3] = ["container", "account", "blobname"];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    #[error("only one data address may be set, found: {}", .0.join(", "))]
    Conflict(Vec<&'static str>),

    #[error("custom data address is not a JSON object: {0}")]
    MalformedCustom(String),

    #[error("data address attribute {0} is not known yet")]
    Unknown(String),
}

/// A single normalized data address
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataBinding {
    Http(HttpAddress),
    S3(S3Address),
    Azure(AzureAddress),
    Custom(Map<String, Value>),
}

/// Pick the one populated slot
///
/// Returns `Ok(None)` when no slot is populated.
pub fn resolve(slots: &DataAddressSlots) -> Result<Option<DataBinding>, AddressError> {
    let populated = populated(slots);
    if populated.len() > 1 {
        return Err(AddressError::Conflict(populated));
    }

    if let Some(http) = &slots.http {
        return Ok(Some(DataBinding::Http(http.clone())));
    }
    if let Some(s3) = &slots.s3 {
        return Ok(Some(DataBinding::S3(s3.clone())));
    }
    if let Some(azure) = &slots.azure {
        return Ok(Some(DataBinding::Azure(azure.clone())));
    }
    match &slots.custom {
        Attr::Value(document) => parse_custom(document).map(|map| Some(DataBinding::Custom(map))),
        Attr::Unknown => Err(AddressError::Unknown("data.custom".to_string())),
        Attr::Null => Ok(None),
    }
}

/// Names of the populated slots, in declaration order
pub fn populated(slots: &DataAddressSlots) -> Vec<&'static str> {
    let mut names = Vec::new();
    if slots.http.is_some() {
        names.push("http");
    }
    if slots.s3.is_some() {
        names.push("s3");
    }
    if slots.azure.is_some() {
        names.push("azure");
    }
    if !slots.custom.is_null() {
        names.push("custom");
    }
    names
}

fn parse_custom(document: &str) -> Result<Map<String, Value>, AddressError> {
    match serde_json::from_str::<Value>(document) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(AddressError::MalformedCustom(format!(
            "expected an object, got {}",
            json_kind(&other)
        ))),
        Err(e) => Err(AddressError::MalformedCustom(e.to_string())),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

impl DataBinding {
    /// Slot name of this variant
    pub fn variant(&self) -> &'static str {
        match self {
            Self::Http(_) => "http",
            Self::S3(_) => "s3",
            Self::Azure(_) => "azure",
            Self::Custom(_) => "custom",
        }
    }

    /// The connector's `type` discriminator
    pub fn type_name(&self) -> Option<&str> {
        match self {
            Self::Http(_) => Some(HTTP_TYPE),
            Self::S3(_) => Some(S3_TYPE),
            Self::Azure(_) => Some(AZURE_TYPE),
            Self::Custom(map) => map.get(TYPE_KEY).and_then(Value::as_str),
        }
    }

    /// Build the connector representation
    ///
    /// Unset attributes are left out of the property map.
    pub fn to_data_address(&self) -> Result<DataAddress, AddressError> {
        let properties = match self {
            Self::Http(http) => typed(
                HTTP_TYPE,
                &HTTP_KEYS,
                &[
                    &http.name,
                    &http.path,
                    &http.method,
                    &http.base_url,
                    &http.auth_key,
                    &http.auth_code,
                    &http.secret_name,
                    &http.proxy_body,
                    &http.proxy_path,
                    &http.proxy_query_params,
                    &http.proxy_method,
                    &http.content_type,
                ],
                "data.http",
            )?,
            Self::S3(s3) => typed(
                S3_TYPE,
                &S3_KEYS,
                &[
                    &s3.name,
                    &s3.bucket_name,
                    &s3.access_key_id,
                    &s3.secret_access_key,
                ],
                "data.s3",
            )?,
            Self::Azure(azure) => typed(
                AZURE_TYPE,
                &AZURE_KEYS,
                &[&azure.container, &azure.account, &azure.blob_name],
                "data.azure",
            )?,
            Self::Custom(map) => map.clone(),
        };
        Ok(DataAddress { properties })
    }

    /// Decode a connector data address
    ///
    /// `prefer_custom` keeps an address that was declared as a custom
    /// document custom, even when its `type` names a built-in variant or the
    /// document is empty.
    pub fn from_data_address(address: &DataAddress, prefer_custom: bool) -> Option<Self> {
        let properties = &address.properties;
        if prefer_custom {
            return Some(Self::Custom(properties.clone()));
        }
        if properties.is_empty() {
            return None;
        }

        let field = |key: &str| -> Attr<String> {
            properties
                .get(key)
                .and_then(Value::as_str)
                .map(str::to_string)
                .into()
        };

        let binding = match address.type_name() {
            Some(HTTP_TYPE) if only_keys(properties, &HTTP_KEYS) => Self::Http(HttpAddress {
                name: field("name"),
                path: field("path"),
                method: field("method"),
                base_url: field("baseUrl"),
                auth_key: field("authKey"),
                auth_code: field("authCode"),
                secret_name: field("secretName"),
                proxy_body: field("proxyBody"),
                proxy_path: field("proxyPath"),
                proxy_query_params: field("proxyQueryParams"),
                proxy_method: field("proxyMethod"),
                content_type: field("contentType"),
            }),
            Some(S3_TYPE) if only_keys(properties, &S3_KEYS) => Self::S3(S3Address {
                name: field("name"),
                bucket_name: field("bucketName"),
                access_key_id: field("accessKeyId"),
                secret_access_key: field("secretAccessKey"),
            }),
            Some(AZURE_TYPE) if only_keys(properties, &AZURE_KEYS) => Self::Azure(AzureAddress {
                container: field("container"),
                account: field("account"),
                blob_name: field("blobname"),
            }),
            _ => Self::Custom(properties.clone()),
        };
        Some(binding)
    }

    /// Turn the binding back into declaration slots
    ///
    /// A custom document is written back as `prior_custom` when that parses
    /// to the same object, so formatting of the declared JSON survives.
    pub fn into_slots(self, prior_custom: Option<&str>) -> DataAddressSlots {
        match self {
            Self::Http(http) => DataAddressSlots {
                http: Some(http),
                ..Default::default()
            },
            Self::S3(s3) => DataAddressSlots {
                s3: Some(s3),
                ..Default::default()
            },
            Self::Azure(azure) => DataAddressSlots {
                azure: Some(azure),
                ..Default::default()
            },
            Self::Custom(map) => {
                let unchanged = prior_custom
                    .filter(|prior| parse_custom(prior).is_ok_and(|parsed| parsed == map));
                let document = match unchanged {
                    Some(prior) => prior.to_string(),
                    None => Value::Object(map).to_string(),
                };
                DataAddressSlots {
                    custom: Attr::Value(document),
                    ..Default::default()
                }
            }
        }
    }
}

/// Property map for a built-in variant
fn typed(
    type_name: &str,
    keys: &[&str],
    values: &[&Attr<String>],
    path: &str,
) -> Result<Map<String, Value>, AddressError> {
    let mut properties = Map::new();
    properties.insert(TYPE_KEY.to_string(), Value::String(type_name.to_string()));
    for (key, value) in keys.iter().zip(values) {
        match value {
            Attr::Value(v) => {
                properties.insert((*key).to_string(), Value::String(v.clone()));
            }
            Attr::Unknown => return Err(AddressError::Unknown(format!("{path}.{key}"))),
            Attr::Null => {}
        }
    }
    Ok(properties)
}

/// Whether every property is a known string field of the variant
fn only_keys(properties: &Map<String, Value>, keys: &[&str]) -> bool {
    properties
        .iter()
        .all(|(key, value)| key == TYPE_KEY || (keys.contains(&key.as_str()) && value.is_string()))
}
