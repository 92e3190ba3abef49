//! Backend trait and implementations for reaching a connector.
//!
//! [`http::HttpBackend`] talks to a real management API. [`MockBackend`]
//! keeps everything in memory for tests.
//!
//! # Testing
//!
//! ```
//! use edc_client::backend::{Backend, MockBackend};
//! use edc_client::types::{CreateAssetInput, DataAddress, NewAsset};
//!
//! let mock = MockBackend::new();
//! let created = mock
//!     .create_asset(&CreateAssetInput {
//!         asset: NewAsset { id: Some("a-1".to_string()), properties: Default::default() },
//!         data_address: DataAddress::default(),
//!     })
//!     .unwrap();
//! assert_eq!(created.id, "a-1");
//! assert!(mock.get_asset("a-1").is_ok());
//! ```

pub mod http;

use crate::error::{Error, Result};
use crate::types::{
    ASSET_ID_PROPERTY, Asset, ContractDefinition, CreateAssetInput, CreatePolicyInput,
    DataAddress, IdResponse, PolicyDefinition, Properties,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Operations the management API offers per object kind.
///
/// There is no update operation: assets, policy definitions and contract
/// definitions are replaced by deleting and re-creating them.
pub trait Backend: Send + Sync {
    /// Create an asset together with its data address.
    fn create_asset(&self, input: &CreateAssetInput) -> Result<IdResponse>;

    /// Fetch an asset by identifier.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if the identifier is unknown.
    fn get_asset(&self, id: &str) -> Result<Asset>;

    /// Fetch the data address of an asset.
    fn get_data_address(&self, id: &str) -> Result<DataAddress>;

    /// Delete an asset.
    fn delete_asset(&self, id: &str) -> Result<()>;

    /// Create a policy definition.
    fn create_policy(&self, input: &CreatePolicyInput) -> Result<IdResponse>;

    /// Fetch a policy definition by identifier.
    fn get_policy(&self, id: &str) -> Result<PolicyDefinition>;

    /// Delete a policy definition.
    fn delete_policy(&self, id: &str) -> Result<()>;

    /// Create a contract definition.
    fn create_contract_definition(&self, input: &ContractDefinition) -> Result<IdResponse>;

    /// Fetch a contract definition by identifier.
    fn get_contract_definition(&self, id: &str) -> Result<ContractDefinition>;

    /// Delete a contract definition.
    fn delete_contract_definition(&self, id: &str) -> Result<()>;
}

#[derive(Debug, Default)]
struct Store {
    assets: HashMap<String, (Asset, DataAddress)>,
    policies: HashMap<String, PolicyDefinition>,
    contract_definitions: HashMap<String, ContractDefinition>,
    counter: u64,
    fail_next: Option<Error>,
}

impl Store {
    fn next_id(&mut self, prefix: &str) -> String {
        self.counter += 1;
        format!("{prefix}-{}", self.counter)
    }

    fn take_failure(&mut self) -> Result<()> {
        match self.fail_next.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn conflict(kind: &str, id: &str) -> Error {
    Error::api(409, format!("{kind} with id {id} already exists"))
}

/// In-memory backend for testing without network access.
///
/// Clones share the same store, so a test can keep a handle for inspection
/// and failure injection while a client owns another.
#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    store: Arc<Mutex<Store>>,
}

impl MockBackend {
    /// Create a new empty mock backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make the next call fail with `err`.
    pub fn fail_next(&self, err: Error) {
        self.lock().fail_next = Some(err);
    }

    /// Number of stored assets.
    #[must_use]
    pub fn asset_count(&self) -> usize {
        self.lock().assets.len()
    }

    /// Number of stored policy definitions.
    #[must_use]
    pub fn policy_count(&self) -> usize {
        self.lock().policies.len()
    }

    /// Number of stored contract definitions.
    #[must_use]
    pub fn contract_definition_count(&self) -> usize {
        self.lock().contract_definitions.len()
    }

    /// Replace an asset's properties, as another client would.
    pub fn set_asset_properties(&self, id: &str, properties: Properties) -> bool {
        match self.lock().assets.get_mut(id) {
            Some((asset, _)) => {
                asset.properties = properties;
                true
            }
            None => false,
        }
    }

    /// Remove an asset behind the client's back.
    pub fn remove_asset(&self, id: &str) -> bool {
        self.lock().assets.remove(id).is_some()
    }

    /// Remove a policy definition behind the client's back.
    pub fn remove_policy(&self, id: &str) -> bool {
        self.lock().policies.remove(id).is_some()
    }

    /// Remove a contract definition behind the client's back.
    pub fn remove_contract_definition(&self, id: &str) -> bool {
        self.lock().contract_definitions.remove(id).is_some()
    }
}

impl Backend for MockBackend {
    fn create_asset(&self, input: &CreateAssetInput) -> Result<IdResponse> {
        let mut store = self.lock();
        store.take_failure()?;

        let id = match input
            .asset
            .id
            .clone()
            .or_else(|| input.asset.properties.get(ASSET_ID_PROPERTY).cloned())
        {
            Some(id) => id,
            None => store.next_id("asset"),
        };
        if store.assets.contains_key(&id) {
            return Err(conflict("asset", &id));
        }

        let created_at = now_millis();
        let asset = Asset {
            id: id.clone(),
            properties: input.asset.properties.clone(),
            created_at,
        };
        store
            .assets
            .insert(id.clone(), (asset, input.data_address.clone()));
        Ok(IdResponse { id, created_at })
    }

    fn get_asset(&self, id: &str) -> Result<Asset> {
        let mut store = self.lock();
        store.take_failure()?;
        store
            .assets
            .get(id)
            .map(|(asset, _)| asset.clone())
            .ok_or_else(|| Error::not_found("asset", id))
    }

    fn get_data_address(&self, id: &str) -> Result<DataAddress> {
        let mut store = self.lock();
        store.take_failure()?;
        store
            .assets
            .get(id)
            .map(|(_, address)| address.clone())
            .ok_or_else(|| Error::not_found("asset", id))
    }

    fn delete_asset(&self, id: &str) -> Result<()> {
        let mut store = self.lock();
        store.take_failure()?;
        store
            .assets
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| Error::not_found("asset", id))
    }

    fn create_policy(&self, input: &CreatePolicyInput) -> Result<IdResponse> {
        let mut store = self.lock();
        store.take_failure()?;

        let id = match input.id.clone() {
            Some(id) => id,
            None => store.next_id("policy"),
        };
        if store.policies.contains_key(&id) {
            return Err(conflict("policy definition", &id));
        }

        let created_at = now_millis();
        store.policies.insert(
            id.clone(),
            PolicyDefinition {
                id: id.clone(),
                created_at,
                policy: input.policy.clone(),
            },
        );
        Ok(IdResponse { id, created_at })
    }

    fn get_policy(&self, id: &str) -> Result<PolicyDefinition> {
        let mut store = self.lock();
        store.take_failure()?;
        store
            .policies
            .get(id)
            .cloned()
            .ok_or_else(|| Error::not_found("policy definition", id))
    }

    fn delete_policy(&self, id: &str) -> Result<()> {
        let mut store = self.lock();
        store.take_failure()?;
        store
            .policies
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| Error::not_found("policy definition", id))
    }

    fn create_contract_definition(&self, input: &ContractDefinition) -> Result<IdResponse> {
        let mut store = self.lock();
        store.take_failure()?;

        if input.validity < 1 {
            return Err(Error::api(400, "validity must be at least 1"));
        }
        let id = match input.id.clone() {
            Some(id) => id,
            None => store.next_id("contract-definition"),
        };
        if store.contract_definitions.contains_key(&id) {
            return Err(conflict("contract definition", &id));
        }

        let created_at = now_millis();
        let mut stored = input.clone();
        stored.id = Some(id.clone());
        stored.created_at = Some(created_at);
        store.contract_definitions.insert(id.clone(), stored);
        Ok(IdResponse { id, created_at })
    }

    fn get_contract_definition(&self, id: &str) -> Result<ContractDefinition> {
        let mut store = self.lock();
        store.take_failure()?;
        store
            .contract_definitions
            .get(id)
            .cloned()
            .ok_or_else(|| Error::not_found("contract definition", id))
    }

    fn delete_contract_definition(&self, id: &str) -> Result<()> {
        let mut store = self.lock();
        store.take_failure()?;
        store
            .contract_definitions
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| Error::not_found("contract definition", id))
    }
}
