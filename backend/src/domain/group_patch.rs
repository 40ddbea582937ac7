//! Translation of SCIM PATCH operations into remote group mutations.
//!
//! Planning is pure: the whole operation list is checked before the first
//! remote call, so a malformed request never leaves a group half-patched.
//! Recognised combinations:
//!
//! | op        | path          | value                         | mutation               |
//! |-----------|---------------|-------------------------------|------------------------|
//! | `replace` | `displayName` | string                        | rename                 |
//! | `replace` | `externalId`  | string                        | change lookup name     |
//! | `replace` | absent        | object with either attribute  | rename and/or lookup   |
//! | `add`     | `members`     | list of `{ "value": id }`     | one batched add        |
//! | `remove`  | `members`     | list of `{ "value": id }`     | one batched remove     |
//!
//! Anything else is skipped with a warning.

use serde_json::Value;
use tracing::warn;

use crate::domain::RemoteId;

/// PATCH verb, compared case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchOp {
    /// `add`: only meaningful on `members`.
    Add,
    /// `remove`: only meaningful on `members`.
    Remove,
    /// `replace`: renames, or changes the lookup name.
    Replace,
    /// Verb outside the supported vocabulary, kept for logging.
    Other(String),
}

impl From<&str> for PatchOp {
    fn from(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("add") {
            Self::Add
        } else if raw.eq_ignore_ascii_case("remove") {
            Self::Remove
        } else if raw.eq_ignore_ascii_case("replace") {
            Self::Replace
        } else {
            Self::Other(raw.to_owned())
        }
    }
}

/// One entry of a PATCH request's `Operations` list.
#[derive(Debug, Clone, PartialEq)]
pub struct PatchOperation {
    pub op: PatchOp,
    /// Attribute path; `None` when the request left it out or blank.
    pub path: Option<String>,
    /// Raw operation value, checked during planning.
    pub value: Option<Value>,
}

/// Remote change derived from one PATCH operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupMutation {
    /// Change display name and/or lookup name.
    Update {
        display_name: Option<String>,
        lookup_name: Option<String>,
    },
    /// Add the listed users in one call.
    AddMembers(Vec<RemoteId>),
    /// Remove the listed users in one call.
    RemoveMembers(Vec<RemoteId>),
}

/// A mutation tagged with the position of the operation it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchStep {
    /// Zero-based position in the request's `Operations` list.
    pub index: usize,
    pub mutation: GroupMutation,
}

/// A PATCH operation whose value does not fit its op and path.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("patch operation {index} is invalid: {reason}")]
pub struct PatchPlanError {
    pub index: usize,
    pub reason: String,
}

/// Plan the remote mutations for `operations`, preserving their order.
pub fn plan(operations: &[PatchOperation]) -> Result<Vec<PatchStep>, PatchPlanError> {
    let mut steps = Vec::with_capacity(operations.len());
    for (index, operation) in operations.iter().enumerate() {
        let planned = plan_one(operation).map_err(|reason| PatchPlanError { index, reason })?;
        match planned {
            Some(mutation) => steps.push(PatchStep { index, mutation }),
            None => warn!(
                index,
                op = ?operation.op,
                path = operation.path.as_deref().unwrap_or(""),
                "skipping unsupported group patch operation"
            ),
        }
    }
    Ok(steps)
}

fn plan_one(operation: &PatchOperation) -> Result<Option<GroupMutation>, String> {
    let path = operation.path.as_deref().map(str::trim);
    let value = operation.value.as_ref();
    match (&operation.op, path) {
        (PatchOp::Replace, Some(attr)) if attr.eq_ignore_ascii_case("displayName") => {
            let display_name = required_text(value, "displayName")?;
            Ok(Some(GroupMutation::Update {
                display_name: Some(display_name),
                lookup_name: None,
            }))
        }
        (PatchOp::Replace, Some(attr)) if attr.eq_ignore_ascii_case("externalId") => {
            let lookup_name = required_text(value, "externalId")?;
            Ok(Some(GroupMutation::Update {
                display_name: None,
                lookup_name: Some(lookup_name),
            }))
        }
        (PatchOp::Replace, None) => replace_from_object(value),
        (PatchOp::Add, Some(attr)) if attr.eq_ignore_ascii_case("members") => {
            Ok(member_ids(value)?.map(GroupMutation::AddMembers))
        }
        (PatchOp::Remove, Some(attr)) if attr.eq_ignore_ascii_case("members") => {
            Ok(member_ids(value)?.map(GroupMutation::RemoveMembers))
        }
        _ => Ok(None),
    }
}

fn required_text(value: Option<&Value>, attribute: &str) -> Result<String, String> {
    match value {
        Some(Value::String(text)) if !text.trim().is_empty() => Ok(text.clone()),
        _ => Err(format!("{attribute} must be a non-empty string")),
    }
}

fn optional_text(
    object: &serde_json::Map<String, Value>,
    attribute: &str,
) -> Result<Option<String>, String> {
    match object.get(attribute) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) if !text.trim().is_empty() => Ok(Some(text.clone())),
        Some(_) => Err(format!("{attribute} must be a non-empty string")),
    }
}

fn replace_from_object(value: Option<&Value>) -> Result<Option<GroupMutation>, String> {
    let Some(Value::Object(object)) = value else {
        return Err("replace without a path requires an object value".to_owned());
    };
    let display_name = optional_text(object, "displayName")?;
    let lookup_name = optional_text(object, "externalId")?;
    if display_name.is_none() && lookup_name.is_none() {
        return Ok(None);
    }
    Ok(Some(GroupMutation::Update {
        display_name,
        lookup_name,
    }))
}

fn member_ids(value: Option<&Value>) -> Result<Option<Vec<RemoteId>>, String> {
    let Some(Value::Array(members)) = value else {
        return Err("members requires a list value".to_owned());
    };
    let ids = members
        .iter()
        .map(|member| {
            member
                .get("value")
                .and_then(Value::as_str)
                .ok_or_else(|| "each member requires a string value".to_owned())
                .and_then(|raw| RemoteId::new(raw).map_err(|error| error.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok((!ids.is_empty()).then_some(ids))
}
