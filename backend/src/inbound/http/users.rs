//! User provisioning handlers.
//!
//! ```text
//! POST   /Users        reconcile into the remote graph, 201
//! PUT    /Users/{id}   overwrite the addressed account, 200
//! DELETE /Users/{id}   remove the addressed account, 204
//! GET    /Users        always an empty list
//! ```

use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, delete, get, post, put, web};
use serde_json::json;

use crate::domain::{Error, IncomingUserResource, RemoteId, UserValidationError};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::ProvisioningAuth;
use crate::inbound::http::dto::UserResourceDto;
use crate::inbound::http::envelope::{
    ListResponse, ResourceLocator, UserEnvelope, scim_response, user_envelope,
};
use crate::inbound::http::error::remote_failure;
use crate::inbound::http::state::HttpState;

/// Create or update the remote account matching the pushed user.
#[post("/Users")]
pub async fn create_user(
    _auth: ProvisioningAuth,
    req: HttpRequest,
    state: web::Data<HttpState>,
    payload: web::Json<UserResourceDto>,
) -> ApiResult<HttpResponse> {
    let user = validate_user(payload.into_inner())?;
    let outcome = state
        .users
        .reconcile(&user)
        .await
        .map_err(|err| remote_failure("User provisioning", &err))?;
    let locator = ResourceLocator::from_request(&req, &state.path_prefix);
    let envelope = user_envelope(&outcome, &user, &locator, state.clock.utc());
    scim_response(StatusCode::CREATED, &envelope)
}

/// Overwrite the account named in the path.
#[put("/Users/{id}")]
pub async fn replace_user(
    _auth: ProvisioningAuth,
    req: HttpRequest,
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: web::Json<UserResourceDto>,
) -> ApiResult<HttpResponse> {
    let id = parse_remote_id(path.into_inner())?;
    let user = validate_user(payload.into_inner())?;
    let outcome = state
        .users
        .replace(&id, &user)
        .await
        .map_err(|err| remote_failure("User update", &err))?;
    let locator = ResourceLocator::from_request(&req, &state.path_prefix);
    let envelope = user_envelope(&outcome, &user, &locator, state.clock.utc());
    scim_response(StatusCode::OK, &envelope)
}

/// Delete the account named in the path.
#[delete("/Users/{id}")]
pub async fn delete_user(
    _auth: ProvisioningAuth,
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = parse_remote_id(path.into_inner())?;
    state
        .users
        .delete(&id)
        .await
        .map_err(|err| remote_failure("User removal", &err))?;
    Ok(HttpResponse::NoContent().finish())
}

/// List users.
///
/// The bridge does not mirror remote state, so filtered lookups from the
/// identity provider always come back empty and fall through to `POST`.
#[get("/Users")]
pub async fn list_users(_auth: ProvisioningAuth) -> ApiResult<HttpResponse> {
    scim_response(StatusCode::OK, &ListResponse::<UserEnvelope>::empty())
}

fn validate_user(dto: UserResourceDto) -> ApiResult<IncomingUserResource> {
    IncomingUserResource::try_from(dto).map_err(map_user_validation_error)
}

fn map_user_validation_error(err: UserValidationError) -> Error {
    let (field, code) = match &err {
        UserValidationError::EmptyUserName => ("userName", "empty_user_name"),
        UserValidationError::MissingPrimaryEmail => ("emails", "missing_primary_email"),
        UserValidationError::MultiplePrimaryEmails { .. } => ("emails", "multiple_primary_emails"),
        UserValidationError::EmptyPrimaryEmail => ("emails", "empty_primary_email"),
    };
    Error::invalid_request(err.to_string()).with_details(json!({ "field": field, "code": code }))
}

pub(crate) fn parse_remote_id(raw: String) -> ApiResult<RemoteId> {
    RemoteId::new(raw).map_err(|err| {
        Error::invalid_request(err.to_string())
            .with_details(json!({ "field": "id", "code": "invalid_id" }))
    })
}
