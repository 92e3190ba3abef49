use super::{Result, join, list_from_remote, list_to_remote, optional, settle_map};
use crate::model::{
    ActionModel, Attr, ConstraintModel, DutyModel, PermissionModel, PolicyBody, PolicyModel,
    ProhibitionModel,
};
use edc_client::types::{
    Action, Constraint, CreatePolicyInput, Duty, Permission, Policy, PolicyDefinition,
    Prohibition,
};

// ============================================================================
// Local to remote
// ============================================================================

/// Build the create request for a declared policy definition
pub fn policy_to_remote(model: &PolicyModel) -> Result<CreatePolicyInput> {
    log::trace!("transform local policy to remote object");

    let policy = match &model.policy {
        Some(body) => body_to_remote(body, "policy")?,
        None => Policy::default(),
    };
    Ok(CreatePolicyInput {
        // A connector-assigned id is unknown before creation.
        id: model.id.cloned(),
        policy,
    })
}

fn body_to_remote(body: &PolicyBody, path: &str) -> Result<Policy> {
    Ok(Policy {
        uid: optional(&body.uid, path, "uid")?,
        policy_type: body.policy_type.clone(),
        assignee: optional(&body.assignee, path, "assignee")?,
        assigner: optional(&body.assigner, path, "assigner")?,
        extensible_properties: body.extensible_properties.clone(),
        inherits_from: optional(&body.inherits_from, path, "inherits_from")?,
        obligations: list_to_remote(
            body.obligations.as_deref(),
            path,
            "obligations",
            duty_to_remote,
        )?,
        permissions: list_to_remote(
            body.permissions.as_deref(),
            path,
            "permissions",
            permission_to_remote,
        )?,
        prohibitions: list_to_remote(
            body.prohibitions.as_deref(),
            path,
            "prohibitions",
            prohibition_to_remote,
        )?,
        target: optional(&body.target, path, "target")?,
    })
}

fn constraints_to_remote(constraints: Option<&[ConstraintModel]>) -> Option<Vec<Constraint>> {
    constraints.map(|items| items.iter().map(constraint_to_remote).collect())
}

fn constraint_to_remote(constraint: &ConstraintModel) -> Constraint {
    Constraint {
        edctype: constraint.edctype.clone(),
    }
}

fn action_to_remote(action: Option<&ActionModel>, path: &str) -> Result<Option<Action>> {
    let Some(action) = action else {
        return Ok(None);
    };
    let path = join(path, "action");
    Ok(Some(Action {
        constraint: action.constraint.as_ref().map(constraint_to_remote),
        included_in: optional(&action.included_in, &path, "included_in")?,
        action_type: optional(&action.action_type, &path, "type")?,
    }))
}

fn permission_to_remote(permission: &PermissionModel, path: &str) -> Result<Permission> {
    Ok(Permission {
        assignee: optional(&permission.assignee, path, "assignee")?,
        assigner: optional(&permission.assigner, path, "assigner")?,
        target: optional(&permission.target, path, "target")?,
        uid: optional(&permission.uid, path, "uid")?,
        action: action_to_remote(permission.action.as_ref(), path)?,
        constraints: constraints_to_remote(permission.constraints.as_deref()),
        duties: list_to_remote(
            permission.duties.as_deref(),
            path,
            "duties",
            duty_to_remote,
        )?,
        edctype: optional(&permission.edctype, path, "edctype")?,
    })
}

fn duty_to_remote(duty: &DutyModel, path: &str) -> Result<Duty> {
    let consequence = match &duty.consequence {
        Some(next) => Some(Box::new(duty_to_remote(next, &join(path, "consequence"))?)),
        None => None,
    };
    let parent_permission = match &duty.parent_permission {
        Some(parent) => Some(Box::new(permission_to_remote(
            parent,
            &join(path, "parent_permission"),
        )?)),
        None => None,
    };

    Ok(Duty {
        assignee: optional(&duty.assignee, path, "assignee")?,
        assigner: optional(&duty.assigner, path, "assigner")?,
        target: optional(&duty.target, path, "target")?,
        uid: optional(&duty.uid, path, "uid")?,
        action: action_to_remote(duty.action.as_ref(), path)?,
        constraints: constraints_to_remote(duty.constraints.as_deref()),
        consequence,
        parent_permission,
    })
}

fn prohibition_to_remote(prohibition: &ProhibitionModel, path: &str) -> Result<Prohibition> {
    Ok(Prohibition {
        assignee: optional(&prohibition.assignee, path, "assignee")?,
        assigner: optional(&prohibition.assigner, path, "assigner")?,
        target: optional(&prohibition.target, path, "target")?,
        uid: optional(&prohibition.uid, path, "uid")?,
        action: action_to_remote(prohibition.action.as_ref(), path)?,
        constraints: constraints_to_remote(prohibition.constraints.as_deref()),
    })
}

// ============================================================================
// Remote to local
// ============================================================================

/// Rebuild a declared policy definition from the connector's view
pub fn policy_from_remote(definition: &PolicyDefinition, prior: Option<&PolicyModel>) -> PolicyModel {
    log::trace!("transform remote policy {} to local record", definition.id);

    let prior_body = prior.map(|p| p.policy.as_ref());
    let policy = if definition.policy == Policy::default() {
        // An empty policy reads back as it was declared.
        match prior_body {
            Some(Some(_)) => Some(PolicyBody::default()),
            _ => None,
        }
    } else {
        Some(body_from_remote(&definition.policy, prior_body.flatten()))
    };

    PolicyModel {
        id: Attr::Value(definition.id.clone()),
        policy,
        created_at: Attr::Value(definition.created_at),
    }
}

fn body_from_remote(policy: &Policy, prior: Option<&PolicyBody>) -> PolicyBody {
    PolicyBody {
        uid: policy.uid.clone().into(),
        policy_type: settle_map(
            policy.policy_type.clone(),
            prior.map(|p| p.policy_type.as_ref()),
        ),
        assignee: policy.assignee.clone().into(),
        assigner: policy.assigner.clone().into(),
        extensible_properties: settle_map(
            policy.extensible_properties.clone(),
            prior.map(|p| p.extensible_properties.as_ref()),
        ),
        inherits_from: policy.inherits_from.clone().into(),
        obligations: list_from_remote(
            policy.obligations.as_deref(),
            prior.map(|p| p.obligations.as_deref()),
            duty_from_remote,
        ),
        permissions: list_from_remote(
            policy.permissions.as_deref(),
            prior.map(|p| p.permissions.as_deref()),
            permission_from_remote,
        ),
        prohibitions: list_from_remote(
            policy.prohibitions.as_deref(),
            prior.map(|p| p.prohibitions.as_deref()),
            prohibition_from_remote,
        ),
        target: policy.target.clone().into(),
    }
}

fn constraints_from_remote(
    constraints: Option<&[Constraint]>,
    prior: Option<Option<&[ConstraintModel]>>,
) -> Option<Vec<ConstraintModel>> {
    list_from_remote(constraints, prior, |constraint, _| ConstraintModel {
        edctype: constraint.edctype.clone(),
    })
}

fn action_from_remote(action: &Action) -> ActionModel {
    ActionModel {
        constraint: action.constraint.as_ref().map(|c| ConstraintModel {
            edctype: c.edctype.clone(),
        }),
        included_in: action.included_in.clone().into(),
        action_type: action.action_type.clone().into(),
    }
}

fn permission_from_remote(permission: &Permission, prior: Option<&PermissionModel>) -> PermissionModel {
    PermissionModel {
        assignee: permission.assignee.clone().into(),
        assigner: permission.assigner.clone().into(),
        target: permission.target.clone().into(),
        uid: permission.uid.clone().into(),
        action: permission.action.as_ref().map(action_from_remote),
        constraints: constraints_from_remote(
            permission.constraints.as_deref(),
            prior.map(|p| p.constraints.as_deref()),
        ),
        duties: list_from_remote(
            permission.duties.as_deref(),
            prior.map(|p| p.duties.as_deref()),
            duty_from_remote,
        ),
        edctype: permission.edctype.clone().into(),
    }
}

fn duty_from_remote(duty: &Duty, prior: Option<&DutyModel>) -> DutyModel {
    DutyModel {
        assignee: duty.assignee.clone().into(),
        assigner: duty.assigner.clone().into(),
        target: duty.target.clone().into(),
        uid: duty.uid.clone().into(),
        action: duty.action.as_ref().map(action_from_remote),
        constraints: constraints_from_remote(
            duty.constraints.as_deref(),
            prior.map(|p| p.constraints.as_deref()),
        ),
        consequence: duty.consequence.as_deref().map(|next| {
            Box::new(duty_from_remote(
                next,
                prior.and_then(|p| p.consequence.as_deref()),
            ))
        }),
        parent_permission: duty.parent_permission.as_deref().map(|parent| {
            Box::new(permission_from_remote(
                parent,
                prior.and_then(|p| p.parent_permission.as_deref()),
            ))
        }),
    }
}

fn prohibition_from_remote(
    prohibition: &Prohibition,
    prior: Option<&ProhibitionModel>,
) -> ProhibitionModel {
    ProhibitionModel {
        assignee: prohibition.assignee.clone().into(),
        assigner: prohibition.assigner.clone().into(),
        target: prohibition.target.clone().into(),
        uid: prohibition.uid.clone().into(),
        action: prohibition.action.as_ref().map(action_from_remote),
        constraints: constraints_from_remote(
            prohibition.constraints.as_deref(),
            prior.map(|p| p.constraints.as_deref()),
        ),
    }
}
