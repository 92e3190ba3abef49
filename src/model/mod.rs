//! Local declarative records
//!
//! These are the shapes users write in the manifest and that the state file
//! keeps. Scalars are tri-state [`Attr`]s; collections and maps are `Option`s
//! so an absent collection and an empty one stay distinct.

mod asset;
mod attr;
mod contract;
mod policy;

pub use asset::{AssetModel, AzureAddress, DataAddressSlots, HttpAddress, S3Address};
pub use attr::Attr;
pub use contract::{ContractDefinitionModel, CriterionModel};
pub use policy::{
    ActionModel, ConstraintModel, DutyModel, PermissionModel, PolicyBody, PolicyModel,
    ProhibitionModel,
};
