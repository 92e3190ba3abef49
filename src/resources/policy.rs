use super::{invalid, remote_failure, require_id};
use crate::mapper::{policy_from_remote, policy_to_remote};
use crate::model::{Attr, PolicyModel};
use declarative::{Failure, ResourceKind};
use edc_client::Client;

/// Policy definitions
pub struct PolicyResource<'a> {
    client: &'a Client,
}

impl<'a> PolicyResource<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }
}

impl ResourceKind for PolicyResource<'_> {
    type Record = PolicyModel;

    fn type_name(&self) -> &'static str {
        "policy"
    }

    fn identity(&self, record: &PolicyModel) -> Option<String> {
        record.id.cloned()
    }

    fn seed(&self, id: &str) -> PolicyModel {
        PolicyModel {
            id: Attr::Value(id.to_string()),
            ..Default::default()
        }
    }

    fn create(&self, desired: &PolicyModel) -> Result<PolicyModel, Failure> {
        let input = policy_to_remote(desired).map_err(|e| invalid(&e))?;
        let created = self
            .client
            .create_policy(&input)
            .map_err(|e| remote_failure(&e, "create", "policy"))?;
        log::debug!("policy created with id {}", created.id);

        Ok(PolicyModel {
            id: Attr::Value(created.id),
            created_at: Attr::Value(created.created_at),
            ..desired.clone()
        })
    }

    fn read(&self, prior: &PolicyModel) -> Result<PolicyModel, Failure> {
        let id = require_id(prior.id.value(), "policy")?;
        let definition = self
            .client
            .get_policy(id)
            .map_err(|e| remote_failure(&e, "read", "policy"))?;
        Ok(policy_from_remote(&definition, Some(prior)))
    }

    fn update(&self, prior: &PolicyModel, desired: &PolicyModel) -> Result<PolicyModel, Failure> {
        log::debug!(
            "policy {} has no update endpoint; recording declared attributes",
            prior.id.value().map_or("?", String::as_str)
        );
        Ok(PolicyModel {
            id: prior.id.clone(),
            created_at: prior.created_at.clone(),
            ..desired.clone()
        })
    }

    fn updates_remotely(&self) -> bool {
        false
    }

    fn delete(&self, current: &PolicyModel) -> Result<(), Failure> {
        let id = require_id(current.id.value(), "policy")?;
        self.client
            .delete_policy(id)
            .map_err(|e| remote_failure(&e, "delete", "policy"))
    }

    fn differs(&self, desired: &PolicyModel, current: &PolicyModel) -> bool {
        let id_declared = desired.id.value().is_some();
        desired.declared(id_declared) != current.declared(id_declared)
    }
}
