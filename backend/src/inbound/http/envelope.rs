//! SCIM resource envelopes for write responses.

use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{
    Error, IncomingGroupResource, IncomingUserResource, ProvisionedGroup, ReconciledUser,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::{
    GROUP_SCHEMA, LIST_RESPONSE_SCHEMA, SCIM_CONTENT_TYPE, USER_SCHEMA,
};

/// Builds absolute resource URLs under the configured path prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceLocator {
    base: String,
}

impl ResourceLocator {
    /// Locator rooted at `base`, e.g. `https://idp-bridge.example/scim/v2`.
    pub fn new(base: impl Into<String>) -> Self {
        let base = base.into();
        Self {
            base: base.trim_end_matches('/').to_owned(),
        }
    }

    /// Locator derived from the request's scheme and host.
    pub fn from_request(req: &HttpRequest, path_prefix: &str) -> Self {
        let info = req.connection_info();
        Self::new(format!("{}://{}{}", info.scheme(), info.host(), path_prefix))
    }

    pub fn location(&self, collection: &str, id: &str) -> String {
        format!("{}/{collection}/{id}", self.base)
    }
}

/// `meta` block of a resource envelope.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceMeta {
    /// `User` or `Group`.
    pub resource_type: &'static str,
    /// Observed time of the write; the remote graph does not expose its own
    /// creation time, so updates report the same instant.
    pub created: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
    pub location: String,
}

impl ResourceMeta {
    fn new(resource_type: &'static str, now: DateTime<Utc>, location: String) -> Self {
        Self {
            resource_type,
            created: now,
            last_modified: now,
            location,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EmailEnvelope {
    pub value: String,
    pub primary: bool,
}

/// User resource returned from user writes.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserEnvelope {
    pub schemas: [&'static str; 1],
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    pub user_name: String,
    pub display_name: String,
    pub emails: Vec<EmailEnvelope>,
    pub meta: ResourceMeta,
}

/// Group resource returned from group writes.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupEnvelope {
    pub schemas: [&'static str; 1],
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    pub display_name: String,
    pub meta: ResourceMeta,
}

pub fn user_envelope(
    outcome: &ReconciledUser,
    user: &IncomingUserResource,
    locator: &ResourceLocator,
    now: DateTime<Utc>,
) -> UserEnvelope {
    let id = outcome.id.to_string();
    UserEnvelope {
        schemas: [USER_SCHEMA],
        meta: ResourceMeta::new("User", now, locator.location("Users", &id)),
        id,
        external_id: user.external_id().map(str::to_owned),
        user_name: user.user_name().to_owned(),
        display_name: user.full_name(),
        emails: user
            .emails()
            .iter()
            .map(|email| EmailEnvelope {
                value: email.value.clone(),
                primary: email.primary,
            })
            .collect(),
    }
}

pub fn group_envelope(
    outcome: &ProvisionedGroup,
    group: &IncomingGroupResource,
    locator: &ResourceLocator,
    now: DateTime<Utc>,
) -> GroupEnvelope {
    let id = outcome.id.to_string();
    GroupEnvelope {
        schemas: [GROUP_SCHEMA],
        meta: ResourceMeta::new("Group", now, locator.location("Groups", &id)),
        id,
        external_id: group.external_id().map(str::to_owned),
        display_name: group.display_name().to_owned(),
    }
}

/// SCIM `ListResponse` message.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse<T> {
    pub schemas: [&'static str; 1],
    pub total_results: usize,
    pub items_per_page: usize,
    pub start_index: usize,
    #[serde(rename = "Resources")]
    pub resources: Vec<T>,
}

impl<T> ListResponse<T> {
    pub fn new(resources: Vec<T>) -> Self {
        Self {
            schemas: [LIST_RESPONSE_SCHEMA],
            total_results: resources.len(),
            items_per_page: resources.len(),
            start_index: 1,
            resources,
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }
}

/// Serialise `body` as a SCIM response with `status`.
pub fn scim_response<T: Serialize>(status: StatusCode, body: &T) -> ApiResult<HttpResponse> {
    let bytes = serde_json::to_vec(body)
        .map_err(|err| Error::internal(format!("failed to encode response: {err}")))?;
    Ok(HttpResponse::build(status)
        .content_type(SCIM_CONTENT_TYPE)
        .body(bytes))
}
