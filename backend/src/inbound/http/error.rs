//! HTTP adapter mapping for domain errors.
//!
//! Purpose: keep the domain error type HTTP-agnostic while letting Actix
//! handlers turn domain failures into SCIM error envelopes.

use actix_web::error::JsonPayloadError;
use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, ResponseError};
use serde::Serialize;
use serde_json::json;
use tracing::{error, warn};

use crate::domain::ports::RemoteCallError;
use crate::domain::{Error, ErrorCode, GroupPatchError};
use crate::inbound::http::schemas::{ERROR_SCHEMA, SCIM_CONTENT_TYPE};
use crate::middleware::TRACE_ID_HEADER;

/// Convenient result alias for HTTP handlers.
pub type ApiResult<T> = Result<T, Error>;

/// SCIM error envelope.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScimErrorBody {
    schemas: [&'static str; 1],
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    scim_type: Option<&'static str>,
    detail: String,
}

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::InvalidRequest => StatusCode::BAD_REQUEST,
        ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn scim_type_for(code: ErrorCode) -> Option<&'static str> {
    match code {
        ErrorCode::InvalidRequest => Some("invalidValue"),
        _ => None,
    }
}

fn detail_for(error: &Error) -> String {
    match (error.code(), error.trace_id()) {
        (ErrorCode::InternalError, Some(id)) => format!("{} (trace id {id})", error.message()),
        _ => error.message().to_owned(),
    }
}

/// Details attached with [`Error::with_details`] are written to the log
/// alongside the trace id and never to the body.
impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        status_for(self.code())
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if let Some(details) = self.details() {
            warn!(
                trace_id = self.trace_id().unwrap_or("-"),
                status = status.as_u16(),
                %details,
                "error response details"
            );
        }
        let body = ScimErrorBody {
            schemas: [ERROR_SCHEMA],
            status: status.as_u16().to_string(),
            scim_type: scim_type_for(self.code()),
            detail: detail_for(self),
        };
        let mut builder = HttpResponse::build(status);
        builder.content_type(SCIM_CONTENT_TYPE);
        if let Some(id) = self.trace_id() {
            builder.insert_header((TRACE_ID_HEADER, id.to_owned()));
        }
        match serde_json::to_vec(&body) {
            Ok(bytes) => builder.body(bytes),
            Err(err) => {
                error!(error = %err, "failed to serialise SCIM error body");
                builder.finish()
            }
        }
    }
}

impl From<actix_web::Error> for Error {
    fn from(err: actix_web::Error) -> Self {
        error!(error = %err, "actix error promoted to domain error");
        Self::internal("Internal server error")
    }
}

/// Log a remote failure with full detail and return a caller-safe error.
///
/// Remote text never reaches the response; only `action` and the trace id
/// do.
pub(crate) fn remote_failure(action: &'static str, failure: &RemoteCallError) -> Error {
    let err = Error::internal(format!("{action} failed"))
        .with_details(json!({ "kind": failure.kind() }));
    error!(
        trace_id = err.trace_id().unwrap_or("-"),
        kind = failure.kind(),
        error = %failure,
        "{action} failed"
    );
    err
}

/// Map a PATCH failure onto the response error.
pub(crate) fn patch_failure(failure: &GroupPatchError) -> Error {
    match failure {
        GroupPatchError::Invalid(plan) => Error::invalid_request(plan.to_string()),
        GroupPatchError::Remote {
            index,
            applied,
            source,
        } => {
            let err = Error::internal("Group patch failed; the group may be partially updated")
                .with_details(json!({ "index": index, "applied": applied }));
            error!(
                trace_id = err.trace_id().unwrap_or("-"),
                index,
                applied,
                kind = source.kind(),
                error = %source,
                "group patch failed"
            );
            err
        }
    }
}

/// JSON extractor error handler producing SCIM `400` responses.
pub(crate) fn json_error_handler(err: JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    warn!(path = %req.path(), error = %err, "rejected request body");
    Error::invalid_request(format!("invalid request body: {err}")).into()
}
