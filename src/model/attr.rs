//! Tri-state attribute values
//!
//! A declared attribute is either known (`Value`), explicitly absent
//! (`Null`), or not known until the resource exists remotely (`Unknown`).
//! Serialized records never contain `Unknown`: it is written as absent.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A single attribute of a declarative record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Attr<T> {
    /// Computed remotely, not known yet
    Unknown,
    /// Not set
    #[default]
    Null,
    /// Set to a value (which may be empty)
    Value(T),
}

impl<T> Attr<T> {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }

    /// Null or unknown; used to keep both out of serialized records
    pub fn is_absent(&self) -> bool {
        !matches!(self, Self::Value(_))
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Value(v) => Some(v),
            _ => None,
        }
    }

    /// Turn a `Null` into `Unknown`, leaving set values alone
    pub fn or_unknown(self) -> Self {
        match self {
            Self::Null => Self::Unknown,
            other => other,
        }
    }
}

impl<T: Clone> Attr<T> {
    /// The value, or `None` when absent or unknown
    pub fn cloned(&self) -> Option<T> {
        self.value().cloned()
    }
}

impl<T> From<Option<T>> for Attr<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Self::Value)
    }
}

impl From<&str> for Attr<String> {
    fn from(value: &str) -> Self {
        Self::Value(value.to_string())
    }
}

impl<T: Serialize> Serialize for Attr<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Value(v) => serializer.serialize_some(v),
            Self::Null | Self::Unknown => serializer.serialize_none(),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Attr<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<T>::deserialize(deserializer).map(Self::from)
    }
}
