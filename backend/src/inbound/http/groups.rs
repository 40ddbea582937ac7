//! Group provisioning handlers.
//!
//! ```text
//! POST   /Groups        create, or update the group with the same name, 201
//! PUT    /Groups/{id}   overwrite name and lookup name, 200
//! PATCH  /Groups/{id}   apply a PatchOp message in order, 204
//! DELETE /Groups/{id}   remove the group, 204
//! GET    /Groups        always an empty list
//! ```

use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, delete, get, patch, post, put, web};
use serde_json::json;

use crate::domain::{Error, GroupValidationError, IncomingGroupResource};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::ProvisioningAuth;
use crate::inbound::http::dto::{GroupResourceDto, PatchRequestDto};
use crate::inbound::http::envelope::{
    GroupEnvelope, ListResponse, ResourceLocator, group_envelope, scim_response,
};
use crate::inbound::http::error::{patch_failure, remote_failure};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::users::parse_remote_id;

/// Create the group, or update the one already carrying its display name.
///
/// Answers 201 either way.
#[post("/Groups")]
pub async fn create_group(
    _auth: ProvisioningAuth,
    req: HttpRequest,
    state: web::Data<HttpState>,
    payload: web::Json<GroupResourceDto>,
) -> ApiResult<HttpResponse> {
    let group = validate_group(payload.into_inner())?;
    let outcome = state
        .groups
        .create(&group)
        .await
        .map_err(|err| remote_failure("Group provisioning", &err))?;
    let locator = ResourceLocator::from_request(&req, &state.path_prefix);
    let envelope = group_envelope(&outcome, &group, &locator, state.clock.utc());
    scim_response(StatusCode::CREATED, &envelope)
}

/// Overwrite display name and lookup name of the group in the path.
#[put("/Groups/{id}")]
pub async fn replace_group(
    _auth: ProvisioningAuth,
    req: HttpRequest,
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: web::Json<GroupResourceDto>,
) -> ApiResult<HttpResponse> {
    let id = parse_remote_id(path.into_inner())?;
    let group = validate_group(payload.into_inner())?;
    let outcome = state
        .groups
        .replace(&id, &group)
        .await
        .map_err(|err| remote_failure("Group update", &err))?;
    let locator = ResourceLocator::from_request(&req, &state.path_prefix);
    let envelope = group_envelope(&outcome, &group, &locator, state.clock.utc());
    scim_response(StatusCode::OK, &envelope)
}

/// Apply a SCIM PatchOp message.
///
/// The whole operation list is validated before the first remote call. A
/// remote failure midway leaves earlier operations applied.
#[patch("/Groups/{id}")]
pub async fn patch_group(
    _auth: ProvisioningAuth,
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: web::Json<PatchRequestDto>,
) -> ApiResult<HttpResponse> {
    let id = parse_remote_id(path.into_inner())?;
    let operations = payload.into_inner().into_operations();
    state
        .groups
        .apply_patch(&id, &operations)
        .await
        .map_err(|err| patch_failure(&err))?;
    Ok(HttpResponse::NoContent().finish())
}

/// Delete the group. Member accounts are left untouched.
#[delete("/Groups/{id}")]
pub async fn delete_group(
    _auth: ProvisioningAuth,
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = parse_remote_id(path.into_inner())?;
    state
        .groups
        .delete(&id)
        .await
        .map_err(|err| remote_failure("Group removal", &err))?;
    Ok(HttpResponse::NoContent().finish())
}

#[get("/Groups")]
pub async fn list_groups(_auth: ProvisioningAuth) -> ApiResult<HttpResponse> {
    scim_response(StatusCode::OK, &ListResponse::<GroupEnvelope>::empty())
}

fn validate_group(dto: GroupResourceDto) -> ApiResult<IncomingGroupResource> {
    IncomingGroupResource::try_from(dto).map_err(|err| match err {
        GroupValidationError::EmptyDisplayName => Error::invalid_request(err.to_string())
            .with_details(json!({ "field": "displayName", "code": "empty_display_name" })),
    })
}
