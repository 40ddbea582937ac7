//! Wire shapes for the GraphQL-over-HTTP exchange.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Request body: document, operation name and bound variables.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct GraphqlRequestDto<'a> {
    pub(super) query: &'static str,
    pub(super) operation_name: &'static str,
    pub(super) variables: &'a Value,
}

/// Response envelope. Either half may be absent.
#[derive(Debug, Deserialize)]
pub(super) struct GraphqlResponseDto {
    #[serde(default)]
    pub(super) data: Option<Value>,
    #[serde(default)]
    pub(super) errors: Vec<GraphqlErrorDto>,
}

#[derive(Debug, Deserialize)]
pub(super) struct GraphqlErrorDto {
    #[serde(default)]
    pub(super) message: String,
}

impl GraphqlResponseDto {
    /// Error messages joined for logging, or `None` when the list is empty.
    pub(super) fn error_summary(&self) -> Option<String> {
        if self.errors.is_empty() {
            return None;
        }
        let messages: Vec<&str> = self
            .errors
            .iter()
            .map(|error| {
                if error.message.is_empty() {
                    "<no message>"
                } else {
                    error.message.as_str()
                }
            })
            .collect();
        Some(messages.join("; "))
    }
}
