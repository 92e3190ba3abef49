use super::{invalid, remote_failure, require_id};
use crate::mapper::{contract_definition_from_remote, contract_definition_to_remote};
use crate::model::{Attr, ContractDefinitionModel};
use declarative::{Failure, ResourceKind};
use edc_client::Client;

/// Contract definitions
pub struct ContractDefinitionResource<'a> {
    client: &'a Client,
}

impl<'a> ContractDefinitionResource<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }
}

impl ResourceKind for ContractDefinitionResource<'_> {
    type Record = ContractDefinitionModel;

    fn type_name(&self) -> &'static str {
        "contract_definition"
    }

    fn identity(&self, record: &ContractDefinitionModel) -> Option<String> {
        record.id.cloned()
    }

    fn seed(&self, id: &str) -> ContractDefinitionModel {
        ContractDefinitionModel {
            id: Attr::Value(id.to_string()),
            ..Default::default()
        }
    }

    fn create(&self, desired: &ContractDefinitionModel) -> Result<ContractDefinitionModel, Failure> {
        let request = contract_definition_to_remote(desired).map_err(|e| invalid(&e))?;
        let created = self
            .client
            .create_contract_definition(&request)
            .map_err(|e| remote_failure(&e, "create", "contract definition"))?;
        log::debug!("contract definition created with id {}", created.id);

        Ok(ContractDefinitionModel {
            id: Attr::Value(created.id),
            created_at: Attr::Value(created.created_at),
            ..desired.clone()
        })
    }

    fn read(&self, prior: &ContractDefinitionModel) -> Result<ContractDefinitionModel, Failure> {
        let id = require_id(prior.id.value(), "contract definition")?;
        let definition = self
            .client
            .get_contract_definition(id)
            .map_err(|e| remote_failure(&e, "read", "contract definition"))?;
        Ok(contract_definition_from_remote(&definition, id, Some(prior)))
    }

    fn update(
        &self,
        prior: &ContractDefinitionModel,
        desired: &ContractDefinitionModel,
    ) -> Result<ContractDefinitionModel, Failure> {
        log::debug!(
            "contract definition {} has no update endpoint; recording declared attributes",
            prior.id.value().map_or("?", String::as_str)
        );
        Ok(ContractDefinitionModel {
            id: prior.id.clone(),
            created_at: prior.created_at.clone(),
            ..desired.clone()
        })
    }

    fn updates_remotely(&self) -> bool {
        false
    }

    fn delete(&self, current: &ContractDefinitionModel) -> Result<(), Failure> {
        let id = require_id(current.id.value(), "contract definition")?;
        self.client
            .delete_contract_definition(id)
            .map_err(|e| remote_failure(&e, "delete", "contract definition"))
    }

    fn differs(&self, desired: &ContractDefinitionModel, current: &ContractDefinitionModel) -> bool {
        desired.declared() != current.declared()
    }
}
