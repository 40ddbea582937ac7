//! Request bodies accepted by the SCIM endpoints.
//!
//! Fields are lenient at the serde layer and validated once when converted
//! into domain resources. Unknown attributes are ignored.

use serde::Deserialize;
use serde_json::Value;

use crate::domain::{
    EmailAddress, GroupValidationError, IncomingGroupResource, IncomingUserResource, PatchOp,
    PatchOperation, PersonName, UserValidationError,
};

/// User resource body for `POST /Users` and `PUT /Users/{id}`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResourceDto {
    /// Required; a missing value fails validation, not decoding.
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub name: Option<NameDto>,
    #[serde(default)]
    pub display_name: Option<String>,
    /// Exactly one entry must be marked primary.
    #[serde(default)]
    pub emails: Vec<EmailDto>,
    /// Provider-side identifier echoed back in responses.
    #[serde(default)]
    pub external_id: Option<String>,
}

/// SCIM `name` complex attribute.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NameDto {
    #[serde(default)]
    pub formatted: Option<String>,
    #[serde(default)]
    pub family_name: Option<String>,
    #[serde(default)]
    pub given_name: Option<String>,
}

/// One `emails` entry. `type` and other attributes are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct EmailDto {
    #[serde(default)]
    pub value: String,
    /// Absent reads as `false`.
    #[serde(default)]
    pub primary: bool,
}

impl TryFrom<UserResourceDto> for IncomingUserResource {
    type Error = UserValidationError;

    fn try_from(value: UserResourceDto) -> Result<Self, Self::Error> {
        let UserResourceDto {
            user_name,
            name,
            display_name,
            emails,
            external_id,
        } = value;
        let emails = emails
            .into_iter()
            .map(|email| EmailAddress {
                value: email.value,
                primary: email.primary,
            })
            .collect();
        let name = name.unwrap_or_default();
        Ok(Self::try_new(user_name.unwrap_or_default(), emails)?
            .with_name(PersonName {
                formatted: name.formatted,
                family_name: name.family_name,
                given_name: name.given_name,
            })
            .with_display_name(display_name)
            .with_external_id(external_id))
    }
}

/// Group resource body for `POST /Groups` and `PUT /Groups/{id}`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupResourceDto {
    /// Required; also the key used to find an existing group.
    #[serde(default)]
    pub display_name: Option<String>,
    /// Stored remotely as the group's lookup name.
    #[serde(default)]
    pub external_id: Option<String>,
}

impl TryFrom<GroupResourceDto> for IncomingGroupResource {
    type Error = GroupValidationError;

    fn try_from(value: GroupResourceDto) -> Result<Self, Self::Error> {
        Self::try_new(value.display_name.unwrap_or_default(), value.external_id)
    }
}

/// `PatchOp` message body for `PATCH /Groups/{id}`.
#[derive(Debug, Deserialize)]
pub struct PatchRequestDto {
    /// Applied in order.
    #[serde(rename = "Operations", alias = "operations", default)]
    pub operations: Vec<PatchOperationDto>,
}

/// One raw PATCH operation.
#[derive(Debug, Deserialize)]
pub struct PatchOperationDto {
    /// Verb as sent; matched case-insensitively later.
    pub op: String,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub value: Option<Value>,
}

impl From<PatchOperationDto> for PatchOperation {
    fn from(value: PatchOperationDto) -> Self {
        Self {
            op: PatchOp::from(value.op.as_str()),
            path: value.path.filter(|path| !path.trim().is_empty()),
            value: value.value,
        }
    }
}

impl PatchRequestDto {
    /// Convert to domain operations, dropping blank paths.
    pub fn into_operations(self) -> Vec<PatchOperation> {
        self.operations.into_iter().map(PatchOperation::from).collect()
    }
}
