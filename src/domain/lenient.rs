//! Field-level tolerant deserialization.
//!
//! Imported models come from local storage, shared links and hand-edited
//! files. A field holding the wrong JSON type must degrade to its default
//! rather than poison the whole document, so raw records route every field
//! through [`field`].

use serde::{Deserialize, Deserializer, de::DeserializeOwned};
use serde_json::Value;

/// Deserializes a field into `Some(T)`, or `None` if the value is `null` or
/// has the wrong shape.
///
/// Use together with `#[serde(default)]` so that absent fields also become
/// `None`.
pub(crate) fn field<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}
