//! Connector-backed resource kinds
//!
//! Each kind maps its records with [`crate::mapper`] and calls the
//! management API through a borrowed [`Client`]. None of them keeps state
//! between calls, so one kind value serves every instance concurrently.
//!
//! No kind has an update endpoint on the connector, so `update` is a
//! reconciliation without a remote call: the declared attributes are
//! recorded and the connector-assigned ones kept.

mod asset;
mod contract_definition;
mod policy;

pub use asset::AssetResource;
pub use contract_definition::ContractDefinitionResource;
pub use policy::PolicyResource;

use crate::mapper::MapError;
use crate::schema::{self, ObjectSchema};
use declarative::{Failure, ResourceKind};
use edc_client::{Error, ErrorCategory};

/// The resource kinds a manifest can declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Kind {
    Asset,
    Policy,
    ContractDefinition,
}

impl Kind {
    pub const ALL: [Self; 3] = [Self::Asset, Self::Policy, Self::ContractDefinition];

    /// Resource type name used in addresses, e.g. `asset.raw`
    pub fn type_name(self) -> &'static str {
        match self {
            Self::Asset => "asset",
            Self::Policy => "policy",
            Self::ContractDefinition => "contract_definition",
        }
    }

    /// Manifest and state section holding this kind
    pub fn section(self) -> &'static str {
        match self {
            Self::Asset => "assets",
            Self::Policy => "policies",
            Self::ContractDefinition => "contract_definitions",
        }
    }

    pub fn from_type_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.type_name() == name || kind.section() == name)
    }

    pub fn schema(self) -> ObjectSchema {
        match self {
            Self::Asset => schema::asset_schema(),
            Self::Policy => schema::policy_schema(),
            Self::ContractDefinition => schema::contract_definition_schema(),
        }
    }
}

/// Look up a remote record by id alone
pub fn lookup<K: ResourceKind>(kind: &K, id: &str) -> Result<K::Record, Failure> {
    kind.read(&kind.seed(id))
}

/// Turn a client error into an operation failure
pub(crate) fn remote_failure(err: &Error, action: &str, type_name: &str) -> Failure {
    let detail = format!("Unable to {action} {type_name}, got error: {err}");
    let category = err.category();
    log::debug!(
        "{action} {type_name}: {} ({}retryable). {}",
        category.description(),
        if category.is_retryable() { "" } else { "not " },
        category.advice()
    );
    match category {
        ErrorCategory::NotFound => Failure::not_found(detail),
        ErrorCategory::Application => Failure::application(detail),
        ErrorCategory::Transport | ErrorCategory::Format | ErrorCategory::Config => {
            Failure::transport(detail)
        }
    }
}

/// Turn a mapping error into a validation failure
pub(crate) fn invalid(err: &MapError) -> Failure {
    let failure = Failure::validation(err.to_string());
    match err.attribute() {
        Some(attribute) => failure.at(attribute),
        None => failure,
    }
}

/// The id of a record that must already exist remotely
pub(crate) fn require_id<'a>(id: Option<&'a String>, type_name: &str) -> Result<&'a str, Failure> {
    id.map(String::as_str)
        .ok_or_else(|| Failure::validation(format!("{type_name} has no id")).at("id"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use declarative::FailureKind;

    #[test]
    fn test_kind_names() {
        assert_eq!(Kind::from_type_name("asset"), Some(Kind::Asset));
        assert_eq!(Kind::from_type_name("policies"), Some(Kind::Policy));
        assert_eq!(
            Kind::from_type_name("contract_definition"),
            Some(Kind::ContractDefinition)
        );
        assert_eq!(Kind::from_type_name("catalog"), None);
    }

    #[test]
    fn test_remote_failure_categories() {
        let cases = [
            (Error::http("connection refused", None), FailureKind::Transport),
            (Error::Timeout("30s".to_string()), FailureKind::Transport),
            (Error::api(409, "duplicate id"), FailureKind::Application),
            (Error::not_found("asset", "a-1"), FailureKind::NotFound),
            (
                Error::InvalidResponse("eof".to_string()),
                FailureKind::Transport,
            ),
        ];
        for (err, expected) in cases {
            let failure = remote_failure(&err, "read", "asset");
            assert_eq!(failure.kind, expected);
            assert!(failure.detail.starts_with("Unable to read asset"));
        }
    }

    #[test]
    fn test_api_failure_surfaces_remote_message() {
        let failure = remote_failure(&Error::api(400, "validity too short"), "create", "asset");
        assert_eq!(failure.to_diagnostic().summary, "API Error");
        assert!(failure.detail.contains("validity too short"));
    }
}
