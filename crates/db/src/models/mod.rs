//! Row models and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` create DTO for inserts
//! - A `Deserialize` update DTO (all `Option` fields) for patches
//!
//! Enumerated columns are stored as `TEXT` and read back as `String`;
//! accessors parse them into the `harmony_core` enums.

pub mod document;
pub mod notification;
pub mod pole;
pub mod project;
pub mod task;
pub mod user;

use serde::Deserialize;

/// Deserialize a field that may be explicitly `null`.
///
/// Use with `#[serde(default, deserialize_with = "nullable")]` on an
/// `Option<Option<T>>`: a missing key stays `None` (keep the stored value),
/// `null` becomes `Some(None)` (clear it).
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: serde::Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
