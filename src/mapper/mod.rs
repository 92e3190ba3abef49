//! Mapping between declared records and connector objects
//!
//! Local to remote: unset attributes become absent fields, never empty
//! strings or zeros, so nothing the user did not declare is written.
//!
//! Remote to local: the prior record (when there is one) decides how an
//! empty collection is written back. An empty list or map stays empty when
//! it was declared empty and stays absent when it was never declared, so a
//! record survives the round trip unchanged.

mod asset;
mod contract;
mod policy;

pub use asset::{asset_from_remote, asset_to_remote};
pub use contract::{contract_definition_from_remote, contract_definition_to_remote};
pub use policy::{policy_from_remote, policy_to_remote};

use crate::address::AddressError;
use crate::model::Attr;
use std::collections::BTreeMap;

pub type Result<T> = std::result::Result<T, MapError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MapError {
    #[error(transparent)]
    Address(#[from] AddressError),

    #[error("attribute {0} is not known yet")]
    Unknown(String),

    #[error("attribute {0} is required")]
    Missing(String),

    #[error("attribute {attribute}: {message}")]
    Invalid { attribute: String, message: String },
}

impl MapError {
    /// Attribute path the error refers to
    pub fn attribute(&self) -> Option<&str> {
        match self {
            Self::Address(AddressError::Unknown(path))
            | Self::Unknown(path)
            | Self::Missing(path) => Some(path.as_str()),
            Self::Address(_) => Some("data"),
            Self::Invalid { attribute, .. } => Some(attribute.as_str()),
        }
    }
}

pub(crate) fn join(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{path}.{name}")
    }
}

/// A declared scalar as an optional wire field
pub(crate) fn optional<T: Clone>(attr: &Attr<T>, path: &str, name: &str) -> Result<Option<T>> {
    match attr {
        Attr::Value(v) => Ok(Some(v.clone())),
        Attr::Null => Ok(None),
        Attr::Unknown => Err(MapError::Unknown(join(path, name))),
    }
}

/// A declared scalar the wire format cannot do without
pub(crate) fn required<T: Clone>(attr: &Attr<T>, path: &str, name: &str) -> Result<T> {
    optional(attr, path, name)?.ok_or_else(|| MapError::Missing(join(path, name)))
}

/// Map each element of an optional list, tracking its index in the path
pub(crate) fn list_to_remote<L, R>(
    items: Option<&[L]>,
    path: &str,
    name: &str,
    map: impl Fn(&L, &str) -> Result<R>,
) -> Result<Option<Vec<R>>> {
    items
        .map(|items| {
            items
                .iter()
                .enumerate()
                .map(|(index, item)| map(item, &format!("{}[{index}]", join(path, name))))
                .collect()
        })
        .transpose()
}

/// Map each element of an optional list back, pairing it with the prior
/// element at the same position
///
/// `prior` is `None` when there is no prior record at all.
pub(crate) fn list_from_remote<R, L>(
    remote: Option<&[R]>,
    prior: Option<Option<&[L]>>,
    map: impl Fn(&R, Option<&L>) -> L,
) -> Option<Vec<L>> {
    let prior_items = prior.flatten();
    let decoded = remote.map(|items| {
        items
            .iter()
            .enumerate()
            .map(|(index, item)| map(item, prior_items.and_then(|p| p.get(index))))
            .collect::<Vec<_>>()
    });
    settle(decoded, Shape::of(prior.map(|p| p.map(<[L]>::len))))
}

/// How a collection looked in the prior record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Shape {
    /// No prior record
    Unknown,
    Absent,
    Empty,
    Filled,
}

impl Shape {
    /// From the prior length: outer `None` means no prior record
    pub(crate) fn of(len: Option<Option<usize>>) -> Self {
        match len {
            None => Self::Unknown,
            Some(None) => Self::Absent,
            Some(Some(0)) => Self::Empty,
            Some(Some(_)) => Self::Filled,
        }
    }
}

pub(crate) trait Collection: Default {
    fn is_empty(&self) -> bool;
}

impl<T> Collection for Vec<T> {
    fn is_empty(&self) -> bool {
        Vec::is_empty(self)
    }
}

impl<K, V> Collection for BTreeMap<K, V> {
    fn is_empty(&self) -> bool {
        BTreeMap::is_empty(self)
    }
}

/// Settle a decoded collection against its prior shape
///
/// Without a prior record an empty collection reads as absent.
pub(crate) fn settle<C: Collection>(remote: Option<C>, prior: Shape) -> Option<C> {
    match (remote, prior) {
        (Some(c), Shape::Absent | Shape::Unknown) if c.is_empty() => None,
        (None, Shape::Empty) => Some(C::default()),
        (remote, _) => remote,
    }
}

/// [`settle`] for a map attribute of the prior record
pub(crate) fn settle_map<K, V>(
    remote: Option<BTreeMap<K, V>>,
    prior: Option<Option<&BTreeMap<K, V>>>,
) -> Option<BTreeMap<K, V>> {
    settle(remote, Shape::of(prior.map(|p| p.map(BTreeMap::len))))
}
