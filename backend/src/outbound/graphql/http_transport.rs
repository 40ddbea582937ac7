//! Reqwest-backed GraphQL transport.
//!
//! This adapter owns transport details only: request serialisation, the
//! bearer credential, timeout handling and classification of the outcome
//! into [`RemoteCallError`] kinds. It never retries.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde_json::Value;

use super::dto::{GraphqlRequestDto, GraphqlResponseDto};
use crate::domain::RemoteOperation;
use crate::domain::ports::{GraphTransport, RemoteCallError};

const USER_AGENT: &str = concat!("scim-bridge/", env!("CARGO_PKG_VERSION"));

/// Sends operations to one GraphQL endpoint with a fixed bearer credential.
pub struct GraphqlHttpTransport {
    client: Client,
    endpoint: Url,
    token: String,
}

impl GraphqlHttpTransport {
    /// Build a transport whose requests give up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(
        endpoint: Url,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            endpoint,
            token: token.into(),
        })
    }
}

impl std::fmt::Debug for GraphqlHttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphqlHttpTransport")
            .field("endpoint", &self.endpoint.as_str())
            .field("token", &"<redacted>")
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl GraphTransport for GraphqlHttpTransport {
    async fn send(
        &self,
        operation: RemoteOperation,
        variables: &Value,
    ) -> Result<Value, RemoteCallError> {
        let body = GraphqlRequestDto {
            query: operation.document(),
            operation_name: operation.name(),
            variables,
        };
        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.token)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&body)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(map_transport_error)?;
        classify_response(status, bytes.as_ref())
    }
}

/// Sort one HTTP exchange into data or a failure kind.
///
/// - connection-level failures and `408`, `429` or `5xx` statuses are
///   transport errors;
/// - a non-empty `errors` list, or any other non-success status, is a query
///   rejection;
/// - an unreadable body or missing `data` on success is unexpected.
fn classify_response(status: StatusCode, body: &[u8]) -> Result<Value, RemoteCallError> {
    if is_transient_status(status) {
        return Err(RemoteCallError::transport(status_message(status, body)));
    }

    let decoded = serde_json::from_slice::<GraphqlResponseDto>(body);
    let response = match decoded {
        Ok(response) => response,
        Err(_) if !status.is_success() => {
            return Err(RemoteCallError::query(status_message(status, body)));
        }
        Err(error) => {
            return Err(RemoteCallError::unexpected(format!(
                "invalid GraphQL response body: {error}"
            )));
        }
    };

    if let Some(summary) = response.error_summary() {
        return Err(RemoteCallError::query(summary));
    }
    if !status.is_success() {
        return Err(RemoteCallError::query(status_message(status, body)));
    }
    match response.data {
        Some(Value::Null) | None => Err(RemoteCallError::unexpected(
            "GraphQL response carried neither data nor errors",
        )),
        Some(data) => Ok(data),
    }
}

fn is_transient_status(status: StatusCode) -> bool {
    status.is_server_error()
        || status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
}

fn map_transport_error(error: reqwest::Error) -> RemoteCallError {
    if error.is_timeout() {
        RemoteCallError::transport(format!("request timed out: {error}"))
    } else if error.is_decode() {
        RemoteCallError::unexpected(error.to_string())
    } else {
        RemoteCallError::transport(error.to_string())
    }
}

fn status_message(status: StatusCode, body: &[u8]) -> String {
    let preview = body_preview(body);
    if preview.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        format!("status {}: {}", status.as_u16(), preview)
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for non-network classification helpers.

    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case::server_error(StatusCode::INTERNAL_SERVER_ERROR)]
    #[case::bad_gateway(StatusCode::BAD_GATEWAY)]
    #[case::unavailable(StatusCode::SERVICE_UNAVAILABLE)]
    #[case::rate_limited(StatusCode::TOO_MANY_REQUESTS)]
    #[case::request_timeout(StatusCode::REQUEST_TIMEOUT)]
    fn transient_statuses_are_transport_errors(#[case] status: StatusCode) {
        let error = classify_response(status, b"{\"errors\":[{\"message\":\"busy\"}]}")
            .expect_err("status fails");
        assert!(error.is_retryable(), "{status} should be retryable");
    }

    #[test]
    fn graphql_errors_are_query_rejections() {
        let body = json!({
            "data": null,
            "errors": [{ "message": "Group not found" }, { "message": "second" }]
        });
        let error = classify_response(StatusCode::OK, body.to_string().as_bytes())
            .expect_err("errors reject");
        assert_eq!(error, RemoteCallError::query("Group not found; second"));
    }

    #[rstest]
    #[case::unauthorised(StatusCode::UNAUTHORIZED, b"".as_slice())]
    #[case::bad_request(StatusCode::BAD_REQUEST, b"<html>bad</html>".as_slice())]
    #[case::not_found(StatusCode::NOT_FOUND, b"{\"data\":{}}".as_slice())]
    fn other_client_statuses_are_query_rejections(
        #[case] status: StatusCode,
        #[case] body: &[u8],
    ) {
        let error = classify_response(status, body).expect_err("status fails");
        assert!(matches!(error, RemoteCallError::Query { .. }), "got {error:?}");
    }

    #[rstest]
    #[case::not_json(b"<html>ok</html>".as_slice())]
    #[case::missing_data(b"{}".as_slice())]
    #[case::null_data(b"{\"data\":null}".as_slice())]
    fn unreadable_success_bodies_are_unexpected(#[case] body: &[u8]) {
        let error = classify_response(StatusCode::OK, body).expect_err("body fails");
        assert!(matches!(error, RemoteCallError::Unexpected { .. }), "got {error:?}");
    }

    #[test]
    fn success_returns_data_object() {
        let body = json!({ "data": { "users": [] } });
        let data = classify_response(StatusCode::OK, body.to_string().as_bytes())
            .expect("data decodes");
        assert_eq!(data, json!({ "users": [] }));
    }

    #[test]
    fn request_body_binds_variables_separately() {
        let variables = json!({ "search": "ada@example.com" });
        let body = GraphqlRequestDto {
            query: RemoteOperation::SearchUsers.document(),
            operation_name: RemoteOperation::SearchUsers.name(),
            variables: &variables,
        };
        let encoded = serde_json::to_value(&body).expect("serialises");
        assert_eq!(encoded["operationName"], "Users");
        assert_eq!(encoded["variables"], variables);
    }

    #[test]
    fn long_bodies_are_truncated_in_messages() {
        let body = "x".repeat(400);
        let message = status_message(StatusCode::BAD_GATEWAY, body.as_bytes());
        assert!(message.ends_with("..."));
        assert!(message.len() < 200);
    }

    #[test]
    fn debug_output_redacts_the_token() {
        let transport = GraphqlHttpTransport::new(
            Url::parse("https://graph.example.test/graphql").expect("url"),
            "secret-token",
            Duration::from_secs(5),
        )
        .expect("client builds");
        let rendered = format!("{transport:?}");
        assert!(!rendered.contains("secret-token"));
    }
}
