//! String-backed identifier types.
use std::borrow::Borrow;
use std::fmt::Display;

/// Define a new identifier type wrapping an `Rc<str>`-like shared string.
///
/// The generated type can be looked up in maps by `&str` and is cheap to clone.
macro_rules! define_id_type {
    ($name:ident) => {
        #[derive(
            Clone, std::hash::Hash, PartialEq, Eq, PartialOrd, Ord, Debug, serde::Serialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub std::sync::Arc<str>);

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                $name(std::sync::Arc::from(s))
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                $name(std::sync::Arc::from(s))
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let id: String = serde::Deserialize::deserialize(deserializer)?;
                let id = id.trim();
                if id.is_empty() {
                    return Err(serde::de::Error::custom("IDs cannot be empty"));
                }

                Ok(id.into())
            }
        }

        impl $crate::id::IDLike for $name {}
    };
}
pub(crate) use define_id_type;

/// Implement the [`HasID`] trait for a struct with an `id` field of the given ID type
macro_rules! define_id_getter {
    ($t:ty, $id_ty:ty) => {
        impl $crate::id::HasID<$id_ty> for $t {
            fn get_id(&self) -> &$id_ty {
                &self.id
            }
        }
    };
}
pub(crate) use define_id_getter;

/// Marker trait for identifier types
pub trait IDLike: Eq + std::hash::Hash + Borrow<str> + Clone + Display {}

/// Something with an identifier
pub trait HasID<ID: IDLike> {
    /// Get the struct's ID
    fn get_id(&self) -> &ID;
}
