use super::{MapError, Result, list_from_remote, list_to_remote, optional, required};
use crate::model::{Attr, ContractDefinitionModel, CriterionModel};
use edc_client::types::{ContractDefinition, Criterion};

/// Shortest validity the connector accepts, in seconds
pub const MIN_VALIDITY: i64 = 1;

/// Build the create request for a declared contract definition
pub fn contract_definition_to_remote(model: &ContractDefinitionModel) -> Result<ContractDefinition> {
    log::trace!("transform local contract definition to remote object");

    let validity = required(&model.validity, "", "validity")?;
    if validity < MIN_VALIDITY {
        return Err(MapError::Invalid {
            attribute: "validity".to_string(),
            message: format!("must be at least {MIN_VALIDITY} second, got {validity}"),
        });
    }

    Ok(ContractDefinition {
        id: model.id.cloned(),
        access_policy_id: required(&model.access_policy_id, "", "access_policy_id")?,
        contract_policy_id: required(&model.contract_policy_id, "", "contract_policy_id")?,
        validity,
        criteria: list_to_remote(model.criteria.as_deref(), "", "criteria", |criterion, path| {
            Ok(Criterion {
                operand_left: required(&criterion.operand_left, path, "operand_left")?,
                operator: required(&criterion.operator, path, "operator")?,
                operand_right: optional(&criterion.operand_right, path, "operand_right")?,
            })
        })?,
        created_at: None,
    })
}

/// Rebuild a declared contract definition from the connector's view
///
/// `fallback_id` is used when the connector leaves the id out of its
/// response.
pub fn contract_definition_from_remote(
    definition: &ContractDefinition,
    fallback_id: &str,
    prior: Option<&ContractDefinitionModel>,
) -> ContractDefinitionModel {
    log::trace!("transform remote contract definition {fallback_id} to local record");

    ContractDefinitionModel {
        id: Attr::Value(
            definition
                .id
                .clone()
                .unwrap_or_else(|| fallback_id.to_string()),
        ),
        access_policy_id: Attr::Value(definition.access_policy_id.clone()),
        contract_policy_id: Attr::Value(definition.contract_policy_id.clone()),
        validity: Attr::Value(definition.validity),
        criteria: list_from_remote(
            definition.criteria.as_deref(),
            prior.map(|p| p.criteria.as_deref()),
            |criterion, _| CriterionModel {
                operand_left: Attr::Value(criterion.operand_left.clone()),
                operator: Attr::Value(criterion.operator.clone()),
                operand_right: criterion.operand_right.clone().into(),
            },
        ),
        created_at: definition
            .created_at
            .map_or_else(|| prior.map_or(Attr::Null, |p| p.created_at.clone()), Attr::Value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn criterion(right: Option<&str>) -> CriterionModel {
        CriterionModel {
            operand_left: "test".into(),
            operator: "eq".into(),
            operand_right: right.map(str::to_string).into(),
        }
    }

    fn sample() -> ContractDefinitionModel {
        ContractDefinitionModel {
            id: "cd-1".into(),
            access_policy_id: "policy-1".into(),
            contract_policy_id: "policy-2".into(),
            validity: Attr::Value(600),
            criteria: Some(vec![criterion(Some("test")), criterion(None)]),
            created_at: Attr::Value(7),
        }
    }

    fn stored(request: &ContractDefinition) -> ContractDefinition {
        ContractDefinition {
            created_at: Some(7),
            ..request.clone()
        }
    }

    #[test]
    fn test_round_trip_preserves_criteria_order() {
        let model = sample();
        let request = contract_definition_to_remote(&model).unwrap();
        let back = contract_definition_from_remote(&stored(&request), "cd-1", Some(&model));
        assert_eq!(back, model);
    }

    #[test]
    fn test_round_trip_empty_criteria() {
        for criteria in [None, Some(Vec::new())] {
            let model = ContractDefinitionModel {
                criteria,
                ..sample()
            };
            let request = contract_definition_to_remote(&model).unwrap();
            let back = contract_definition_from_remote(&stored(&request), "cd-1", Some(&model));
            assert_eq!(back, model);
        }
    }

    #[test]
    fn test_validity_must_be_positive() {
        for validity in [0, -5] {
            let model = ContractDefinitionModel {
                validity: Attr::Value(validity),
                ..sample()
            };
            let err = contract_definition_to_remote(&model).unwrap_err();
            assert_eq!(err.attribute(), Some("validity"));
        }
    }

    #[test]
    fn test_missing_required_attributes() {
        let model = ContractDefinitionModel {
            contract_policy_id: Attr::Null,
            ..sample()
        };
        assert_eq!(
            contract_definition_to_remote(&model).unwrap_err(),
            MapError::Missing("contract_policy_id".to_string())
        );

        let model = ContractDefinitionModel {
            criteria: Some(vec![CriterionModel {
                operator: Attr::Null,
                ..criterion(None)
            }]),
            ..sample()
        };
        assert_eq!(
            contract_definition_to_remote(&model).unwrap_err(),
            MapError::Missing("criteria[0].operator".to_string())
        );
    }

    #[test]
    fn test_unset_operand_is_absent_on_the_wire() {
        let request = contract_definition_to_remote(&sample()).unwrap();
        let json = serde_json::to_value(&request).unwrap();
        assert!(json["criteria"][1].get("operandRight").is_none());
        assert_eq!(json["criteria"][0]["operandRight"], "test");
        assert!(json.get("createdAt").is_none());
    }

    #[test]
    fn test_missing_id_in_response_uses_fallback() {
        let request = contract_definition_to_remote(&ContractDefinitionModel {
            id: Attr::Unknown,
            ..sample()
        })
        .unwrap();
        assert_eq!(request.id, None);
        let back = contract_definition_from_remote(&request, "cd-9", None);
        assert_eq!(back.id, Attr::Value("cd-9".to_string()));
        assert!(back.created_at.is_null());
    }
}
