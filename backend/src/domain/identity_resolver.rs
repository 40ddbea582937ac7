//! Locates an existing remote account for an incoming user.
//!
//! The remote search is free-text and fuzzy, so every candidate is filtered
//! locally for an exact match. Email matches win over username matches.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use crate::domain::RemoteOperation;
use crate::domain::RemoteId;
use crate::domain::ports::{RemoteCallError, RemoteCallExecutor};

/// One account returned by the remote user search.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteAccount {
    /// Remote identifier.
    pub id: RemoteId,
    /// Remote login name.
    pub username: String,
    /// Email on record, if any.
    #[serde(default)]
    pub email: Option<String>,
    /// Display name on record, if any.
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchUsersData {
    users: Vec<RemoteAccount>,
}

/// Resolves incoming identities against existing remote accounts.
#[derive(Clone)]
pub struct IdentityResolver {
    executor: Arc<dyn RemoteCallExecutor>,
}

impl IdentityResolver {
    /// Build a resolver that searches through `executor`.
    pub fn new(executor: Arc<dyn RemoteCallExecutor>) -> Self {
        Self { executor }
    }

    /// Find the remote account for `username` / `primary_email`.
    ///
    /// Searches by email first. Among candidates whose email equals
    /// `primary_email` exactly, one whose username also matches wins,
    /// else the first email match in remote order. With no email match and
    /// a username that differs from the email, searches by username and
    /// accepts the first candidate whose username equals `username`
    /// exactly. Search failures propagate rather than reading as "not
    /// found".
    pub async fn resolve_user(
        &self,
        username: &str,
        primary_email: &str,
    ) -> Result<Option<RemoteId>, RemoteCallError> {
        let by_email = self.search(primary_email).await?;
        if let Some(id) = best_email_match(by_email, username, primary_email) {
            debug!(remote_id = %id, "resolved user by email");
            return Ok(Some(id));
        }

        if username == primary_email {
            return Ok(None);
        }

        let by_username = self.search(username).await?;
        let found = by_username
            .into_iter()
            .find(|account| account.username == username)
            .map(|account| account.id);
        if let Some(id) = &found {
            debug!(remote_id = %id, "resolved user by username");
        }
        Ok(found)
    }

    async fn search(&self, term: &str) -> Result<Vec<RemoteAccount>, RemoteCallError> {
        let data = self
            .executor
            .execute(RemoteOperation::SearchUsers, json!({ "search": term }))
            .await?;
        decode::<SearchUsersData>(data).map(|payload| payload.users)
    }
}

fn best_email_match(
    candidates: Vec<RemoteAccount>,
    username: &str,
    primary_email: &str,
) -> Option<RemoteId> {
    let mut email_matches = candidates
        .into_iter()
        .filter(|account| account.email.as_deref() == Some(primary_email))
        .peekable();
    let first = email_matches.peek().map(|account| account.id.clone());
    email_matches
        .find(|account| account.username == username)
        .map(|account| account.id)
        .or(first)
}

/// Decode a remote `data` object into the operation's result shape.
pub(crate) fn decode<T>(data: Value) -> Result<T, RemoteCallError>
where
    T: serde::de::DeserializeOwned,
{
    serde_json::from_value(data)
        .map_err(|error| RemoteCallError::unexpected(format!("result shape mismatch: {error}")))
}
