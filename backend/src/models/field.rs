//! Three-state field used by partial-update requests.
//!
//! JSON requests distinguish between a key that was omitted, a key that was
//! sent as `null`, and a key that carries a value. Deserializing into
//! `Option<T>` collapses the first two, so partial updates use [`Field`]
//! together with `#[serde(default)]`:
//!
//! ```
//! use serde::Deserialize;
//! use yapper_users::models::Field;
//!
//! #[derive(Deserialize)]
//! struct Patch {
//!     #[serde(default)]
//!     bio: Field<String>,
//! }
//!
//! let omitted: Patch = serde_json::from_str("{}").unwrap();
//! let cleared: Patch = serde_json::from_str(r#"{"bio": null}"#).unwrap();
//! let set: Patch = serde_json::from_str(r#"{"bio": "hi"}"#).unwrap();
//!
//! assert_eq!(omitted.bio, Field::Absent);
//! assert_eq!(cleared.bio, Field::Clear);
//! assert_eq!(set.bio, Field::Set("hi".to_string()));
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A partially-specified value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Field<T> {
    /// The field was not part of the request; keep the stored value.
    #[default]
    Absent,
    /// The field was explicitly sent as `null`; clear the stored value.
    Clear,
    /// The field carries a new value.
    Set(T),
}

impl<T> Field<T> {
    /// Apply this field to a nullable stored value.
    pub fn apply_to(&self, target: &mut Option<T>)
    where
        T: Clone,
    {
        match self {
            Field::Absent => {}
            Field::Clear => *target = None,
            Field::Set(value) => *target = Some(value.clone()),
        }
    }
}

impl<T> From<Option<T>> for Field<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Field::Set(v),
            None => Field::Clear,
        }
    }
}

impl<'de, T> Deserialize<'de> for Field<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // Only reached when the key is present; omitted keys use `Default`.
        Option::<T>::deserialize(deserializer).map(Field::from)
    }
}

impl<T> Serialize for Field<T>
where
    T: Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Field::Set(value) => serializer.serialize_some(value),
            Field::Absent | Field::Clear => serializer.serialize_none(),
        }
    }
}
