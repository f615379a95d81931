//! Values written to and read from the ERP models.
//!
//! | Local   | ERP model         |
//! |---------|-------------------|
//! | user    | `res.partner`     |
//! | project | `project.project` |
//! | task    | `project.task`    |

use harmony_core::task::Priority;
use harmony_core::types::{Date, DbId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ErpError;

pub const PARTNER_MODEL: &str = "res.partner";
pub const PROJECT_MODEL: &str = "project.project";
pub const TASK_MODEL: &str = "project.task";
pub const USER_MODEL: &str = "res.users";

pub(crate) const PARTNER_READ_FIELDS: &[&str] = &["name", "email", "phone"];
pub(crate) const PROJECT_READ_FIELDS: &[&str] =
    &["name", "description", "date_start", "date", "partner_id"];

// ---------------------------------------------------------------------------
// Partner
// ---------------------------------------------------------------------------

/// Fields written when creating a partner for a local user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartnerValues {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Back-reference to the local user, only set on create.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl PartnerValues {
    /// Partner name: "first last" when either is set, else the username.
    pub fn display_name(first_name: &str, last_name: &str, username: &str) -> String {
        let full = format!("{} {}", first_name.trim(), last_name.trim());
        let full = full.trim();
        if full.is_empty() {
            username.to_string()
        } else {
            full.to_string()
        }
    }

    pub fn back_reference(user_id: DbId, username: &str) -> String {
        format!("Harmony user id: {user_id} | username: {username}")
    }

    /// The subset written on update; the back-reference is left untouched.
    pub fn for_update(&self) -> Self {
        Self {
            comment: None,
            ..self.clone()
        }
    }
}

/// A partner as read back from the ERP.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PartnerRecord {
    pub id: DbId,
    #[serde(default, deserialize_with = "de::string_or_false")]
    pub name: String,
    #[serde(default, deserialize_with = "de::string_or_false")]
    pub email: String,
    #[serde(default, deserialize_with = "de::string_or_false")]
    pub phone: String,
}

// ---------------------------------------------------------------------------
// Project
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectValues {
    pub name: String,
    pub description: String,
    /// Client partner.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partner_id: Option<DbId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_start: Option<Date>,
    /// Planned end date.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<Date>,
}

impl ProjectValues {
    /// Updates only carry the name and description.
    pub fn for_update(&self) -> Value {
        serde_json::json!({ "name": self.name, "description": self.description })
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProjectRecord {
    pub id: DbId,
    #[serde(default, deserialize_with = "de::string_or_false")]
    pub name: String,
    #[serde(default, deserialize_with = "de::string_or_false")]
    pub description: String,
    #[serde(default, deserialize_with = "de::date_or_false")]
    pub date_start: Option<Date>,
    #[serde(default, deserialize_with = "de::date_or_false")]
    pub date: Option<Date>,
    #[serde(default, deserialize_with = "de::many2one")]
    pub partner_id: Option<DbId>,
}

// ---------------------------------------------------------------------------
// Task
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskValues {
    pub name: String,
    pub description: String,
    pub project_id: DbId,
    /// `"0"` (low) to `"3"` (urgent).
    pub priority: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_deadline: Option<Date>,
}

impl TaskValues {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        erp_project_id: DbId,
        priority: Priority,
        deadline: Option<Date>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            project_id: erp_project_id,
            priority: priority.erp_level().to_string(),
            date_deadline: deadline,
        }
    }
}

/// Who an ERP task concerns, as ERP partner ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskRecipients {
    /// Partners of the task's assigned ERP users.
    pub assignee_partner_ids: Vec<DbId>,
    /// Partner of the ERP project's manager.
    pub manager_partner_id: Option<DbId>,
}

// ---------------------------------------------------------------------------
// Decoding helpers
// ---------------------------------------------------------------------------

/// Id returned by `create`.
pub(crate) fn decode_id(value: Value) -> Result<DbId, ErpError> {
    value
        .as_i64()
        .ok_or_else(|| ErpError::Decode(format!("expected record id, got {value}")))
}

/// Ids returned by a multi-record `create`.
pub(crate) fn decode_ids(value: Value) -> Result<Vec<DbId>, ErpError> {
    match value {
        Value::Array(items) => items.into_iter().map(decode_id).collect(),
        single @ Value::Number(_) => Ok(vec![decode_id(single)?]),
        other => Err(ErpError::Decode(format!("expected record ids, got {other}"))),
    }
}

/// First record of a `read` result, `None` when the record does not exist.
pub(crate) fn decode_first<T: serde::de::DeserializeOwned>(
    value: Value,
) -> Result<Option<T>, ErpError> {
    let records: Vec<T> =
        serde_json::from_value(value).map_err(|e| ErpError::Decode(e.to_string()))?;
    Ok(records.into_iter().next())
}

/// A many2one value: `[id, "display name"]` or `false`.
pub(crate) fn many2one_id(value: &Value) -> Option<DbId> {
    match value {
        Value::Array(pair) => pair.first().and_then(Value::as_i64),
        Value::Number(n) => n.as_i64(),
        _ => None,
    }
}

/// A many2many value: a list of ids.
pub(crate) fn many2many_ids(value: &Value) -> Vec<DbId> {
    value
        .as_array()
        .map(|items| items.iter().filter_map(Value::as_i64).collect())
        .unwrap_or_default()
}

mod de {
    //! The ERP encodes empty fields as `false`.

    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    use super::{many2one_id, Date, DbId};

    pub fn string_or_false<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::String(s) => s,
            _ => String::new(),
        })
    }

    pub fn date_or_false<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Date>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::String(s) => s.get(..10).and_then(|s| s.parse().ok()),
            _ => None,
        })
    }

    pub fn many2one<'de, D: Deserializer<'de>>(d: D) -> Result<Option<DbId>, D::Error> {
        Ok(many2one_id(&Value::deserialize(d)?))
    }
}
