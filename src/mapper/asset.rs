use super::{MapError, Result};
use crate::address::{self, DataBinding};
use crate::model::{AssetModel, Attr, DataAddressSlots};
use edc_client::types::{Asset, CreateAssetInput, DataAddress, NewAsset};

/// Build the create request for a declared asset
pub fn asset_to_remote(model: &AssetModel) -> Result<CreateAssetInput> {
    log::trace!("transform local asset to remote object");

    let properties = model
        .properties
        .clone()
        .ok_or_else(|| MapError::Missing("properties".to_string()))?;

    let binding = match &model.data {
        Some(slots) => address::resolve(slots)?,
        None => None,
    };
    let data_address = match binding {
        Some(binding) => binding.to_data_address()?,
        None => {
            log::warn!("asset declares no data address");
            DataAddress::default()
        }
    };

    Ok(CreateAssetInput {
        asset: NewAsset {
            id: model.id.cloned(),
            properties,
        },
        data_address,
    })
}

/// Rebuild a declared asset from the connector's view
pub fn asset_from_remote(
    asset: &Asset,
    data_address: &DataAddress,
    prior: Option<&AssetModel>,
) -> AssetModel {
    log::trace!("transform remote asset {} to local record", asset.id);

    let prior_data = prior.and_then(|p| p.data.as_ref());
    let prior_custom = prior_data
        .and_then(|data| data.custom.value())
        .map(String::as_str);

    let data = match DataBinding::from_data_address(data_address, prior_custom.is_some()) {
        Some(binding) => Some(binding.into_slots(prior_custom)),
        // A data block declared with no slot set reads back as the same
        // empty block.
        None => prior_data
            .filter(|slots| address::populated(slots).is_empty())
            .map(|_| DataAddressSlots::default()),
    };

    AssetModel {
        id: Attr::Value(asset.id.clone()),
        properties: Some(asset.properties.clone()),
        data,
        created_at: Attr::Value(asset.created_at),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::AddressError;
    use crate::model::{HttpAddress, S3Address};
    use std::collections::BTreeMap;

    fn properties() -> BTreeMap<String, String> {
        BTreeMap::from([
            ("asset:prop:name".to_string(), "test asset".to_string()),
            ("asset:prop:id".to_string(), "test-asset-id".to_string()),
        ])
    }

    /// What the connector would hand back after storing `input`
    fn stored(input: &CreateAssetInput) -> (Asset, DataAddress) {
        (
            Asset {
                id: "test-asset-id".to_string(),
                properties: input.asset.properties.clone(),
                created_at: 1_700_000_000_000,
            },
            input.data_address.clone(),
        )
    }

    fn round_trip(model: &AssetModel) -> AssetModel {
        let input = asset_to_remote(model).unwrap();
        let (asset, address) = stored(&input);
        asset_from_remote(&asset, &address, Some(model))
    }

    fn created(model: AssetModel) -> AssetModel {
        AssetModel {
            id: "test-asset-id".into(),
            created_at: Attr::Value(1_700_000_000_000),
            ..model
        }
    }

    #[test]
    fn test_round_trip_s3() {
        let model = created(AssetModel {
            properties: Some(properties()),
            data: Some(DataAddressSlots {
                s3: Some(S3Address {
                    bucket_name: "testBucket".into(),
                    access_key_id: "k".into(),
                    secret_access_key: "s".into(),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        });
        assert_eq!(round_trip(&model), model);
    }

    #[test]
    fn test_round_trip_http_with_empty_string() {
        let model = created(AssetModel {
            properties: Some(BTreeMap::new()),
            data: Some(DataAddressSlots {
                http: Some(HttpAddress {
                    base_url: "https://example.com/data".into(),
                    auth_code: "".into(),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        });
        let back = round_trip(&model);
        assert_eq!(back, model);
        let http = back.data.unwrap().http.unwrap();
        assert_eq!(http.auth_code, Attr::Value(String::new()));
        assert!(http.auth_key.is_null());
    }

    #[test]
    fn test_round_trip_custom() {
        let model = created(AssetModel {
            properties: Some(properties()),
            data: Some(DataAddressSlots {
                custom: r#"{"type": "HttpData", "baseUrl": "https://x"}"#.into(),
                ..Default::default()
            }),
            ..Default::default()
        });
        assert_eq!(round_trip(&model), model);

        let empty = created(AssetModel {
            properties: Some(properties()),
            data: Some(DataAddressSlots {
                custom: "{}".into(),
                ..Default::default()
            }),
            ..Default::default()
        });
        assert_eq!(round_trip(&empty), empty);
    }

    #[test]
    fn test_round_trip_without_data() {
        let model = created(AssetModel {
            properties: Some(properties()),
            ..Default::default()
        });
        assert_eq!(round_trip(&model), model);

        let empty_block = created(AssetModel {
            properties: Some(properties()),
            data: Some(DataAddressSlots::default()),
            ..Default::default()
        });
        assert_eq!(round_trip(&empty_block), empty_block);
    }

    #[test]
    fn test_unset_id_is_absent_in_request() {
        let model = AssetModel {
            id: Attr::Unknown,
            properties: Some(properties()),
            ..Default::default()
        };
        let input = asset_to_remote(&model).unwrap();
        assert_eq!(input.asset.id, None);
        let json = serde_json::to_value(&input).unwrap();
        assert!(json["asset"].get("id").is_none());
    }

    #[test]
    fn test_conflicting_variants_fail() {
        let model = AssetModel {
            properties: Some(properties()),
            data: Some(DataAddressSlots {
                http: Some(HttpAddress::default()),
                custom: "{}".into(),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert_eq!(
            asset_to_remote(&model).unwrap_err(),
            MapError::Address(AddressError::Conflict(vec!["http", "custom"]))
        );
    }

    #[test]
    fn test_missing_properties_fail() {
        let err = asset_to_remote(&AssetModel::default()).unwrap_err();
        assert_eq!(err, MapError::Missing("properties".to_string()));
    }

    #[test]
    fn test_import_without_prior_decodes_built_in_variant() {
        let mut properties = serde_json::Map::new();
        properties.insert("type".into(), "AzureStorage".into());
        properties.insert("container".into(), "c".into());
        properties.insert("blobname".into(), "b".into());
        let asset = Asset {
            id: "a-1".to_string(),
            properties: BTreeMap::new(),
            created_at: 5,
        };
        let model = asset_from_remote(&asset, &DataAddress { properties }, None);
        let azure = model.data.unwrap().azure.unwrap();
        assert_eq!(azure.container, Attr::Value("c".to_string()));
        assert_eq!(azure.blob_name, Attr::Value("b".to_string()));
        assert!(azure.account.is_null());
        assert_eq!(model.created_at, Attr::Value(5));
    }
}
