use super::{invalid, remote_failure, require_id};
use crate::mapper::{asset_from_remote, asset_to_remote};
use crate::model::{AssetModel, Attr};
use declarative::{Failure, ResourceKind};
use edc_client::Client;

/// Assets and their data addresses
pub struct AssetResource<'a> {
    client: &'a Client,
}

impl<'a> AssetResource<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }
}

impl ResourceKind for AssetResource<'_> {
    type Record = AssetModel;

    fn type_name(&self) -> &'static str {
        "asset"
    }

    fn identity(&self, record: &AssetModel) -> Option<String> {
        record.id.cloned()
    }

    fn seed(&self, id: &str) -> AssetModel {
        AssetModel {
            id: Attr::Value(id.to_string()),
            ..Default::default()
        }
    }

    fn create(&self, desired: &AssetModel) -> Result<AssetModel, Failure> {
        let input = asset_to_remote(desired).map_err(|e| invalid(&e))?;
        let created = self
            .client
            .create_asset(&input)
            .map_err(|e| remote_failure(&e, "create", "asset"))?;
        log::debug!("asset created with id {}", created.id);

        Ok(AssetModel {
            id: Attr::Value(created.id),
            created_at: Attr::Value(created.created_at),
            ..desired.clone()
        })
    }

    fn read(&self, prior: &AssetModel) -> Result<AssetModel, Failure> {
        let id = require_id(prior.id.value(), "asset")?;
        let asset = self
            .client
            .get_asset(id)
            .map_err(|e| remote_failure(&e, "read", "asset"))?;
        let address = self
            .client
            .get_data_address(id)
            .map_err(|e| remote_failure(&e, "read data address of", "asset"))?;
        Ok(asset_from_remote(&asset, &address, Some(prior)))
    }

    fn update(&self, prior: &AssetModel, desired: &AssetModel) -> Result<AssetModel, Failure> {
        log::debug!(
            "asset {} has no update endpoint; recording declared attributes",
            prior.id.value().map_or("?", String::as_str)
        );
        Ok(AssetModel {
            id: prior.id.clone(),
            created_at: prior.created_at.clone(),
            ..desired.clone()
        })
    }

    fn updates_remotely(&self) -> bool {
        false
    }

    fn delete(&self, current: &AssetModel) -> Result<(), Failure> {
        let id = require_id(current.id.value(), "asset")?;
        self.client
            .delete_asset(id)
            .map_err(|e| remote_failure(&e, "delete", "asset"))
    }

    fn differs(&self, desired: &AssetModel, current: &AssetModel) -> bool {
        desired.declared() != current.declared()
    }
}
