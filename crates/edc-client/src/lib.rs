//! # edc-client
//!
//! Blocking client for the EDC connector management API.
//!
//! This crate provides:
//! - Wire types for assets, data addresses, policy definitions and contract
//!   definitions
//! - A [`Backend`](backend::Backend) trait with an HTTP implementation and an
//!   in-memory mock
//! - Categorized errors that keep transport failures, connector rejections
//!   and unknown identifiers apart
//!
//! ## Example
//!
//! ```no_run
//! use edc_client::{Addresses, Client, Config};
//!
//! let config = Config::new(
//!     "api-key",
//!     Addresses {
//!         management: "http://localhost:19193/api/v1/data".to_string(),
//!         ..Default::default()
//!     },
//! );
//! let client = Client::new(&config).expect("valid configuration");
//! let asset = client.get_asset("test-asset-id").expect("asset exists");
//! println!("{} created at {}", asset.id, asset.created_at);
//! ```

#![warn(clippy::all)]

pub mod backend;
pub mod config;
pub mod error;
pub mod types;

pub use backend::MockBackend;
pub use config::{Addresses, Config};
pub use error::{Error, ErrorCategory, Result};

use backend::Backend;
use backend::http::HttpBackend;
use types::{
    Asset, ContractDefinition, CreateAssetInput, CreatePolicyInput, DataAddress, IdResponse,
    PolicyDefinition,
};

/// High-level client for management API operations.
///
/// A client is cheap to share: every call is a single bounded request and
/// no state is kept between calls.
pub struct Client {
    backend: Box<dyn Backend>,
}

impl Client {
    /// Create a client that talks HTTP to the configured connector.
    pub fn new(config: &Config) -> Result<Self> {
        log::debug!("connecting to management API at {}", config.management_base());
        Ok(Self {
            backend: Box::new(HttpBackend::new(config)?),
        })
    }

    /// Create a client with a custom backend (useful for testing).
    #[must_use]
    pub fn with_backend(backend: Box<dyn Backend>) -> Self {
        Self { backend }
    }

    // =========================================================================
    // Assets
    // =========================================================================

    /// Create an asset and its data address.
    pub fn create_asset(&self, input: &CreateAssetInput) -> Result<IdResponse> {
        let created = self.backend.create_asset(input)?;
        log::trace!("created asset {}", created.id);
        Ok(created)
    }

    /// Fetch an asset.
    pub fn get_asset(&self, id: &str) -> Result<Asset> {
        self.backend.get_asset(id)
    }

    /// Fetch an asset's data address.
    pub fn get_data_address(&self, id: &str) -> Result<DataAddress> {
        self.backend.get_data_address(id)
    }

    /// Delete an asset.
    pub fn delete_asset(&self, id: &str) -> Result<()> {
        self.backend.delete_asset(id)?;
        log::trace!("deleted asset {id}");
        Ok(())
    }

    // =========================================================================
    // Policy definitions
    // =========================================================================

    /// Create a policy definition.
    pub fn create_policy(&self, input: &CreatePolicyInput) -> Result<IdResponse> {
        let created = self.backend.create_policy(input)?;
        log::trace!("created policy definition {}", created.id);
        Ok(created)
    }

    /// Fetch a policy definition.
    pub fn get_policy(&self, id: &str) -> Result<PolicyDefinition> {
        self.backend.get_policy(id)
    }

    /// Delete a policy definition.
    pub fn delete_policy(&self, id: &str) -> Result<()> {
        self.backend.delete_policy(id)?;
        log::trace!("deleted policy definition {id}");
        Ok(())
    }

    // =========================================================================
    // Contract definitions
    // =========================================================================

    /// Create a contract definition.
    pub fn create_contract_definition(&self, input: &ContractDefinition) -> Result<IdResponse> {
        let created = self.backend.create_contract_definition(input)?;
        log::trace!("created contract definition {}", created.id);
        Ok(created)
    }

    /// Fetch a contract definition.
    pub fn get_contract_definition(&self, id: &str) -> Result<ContractDefinition> {
        self.backend.get_contract_definition(id)
    }

    /// Delete a contract definition.
    pub fn delete_contract_definition(&self, id: &str) -> Result<()> {
        self.backend.delete_contract_definition(id)?;
        log::trace!("deleted contract definition {id}");
        Ok(())
    }
}
