//! Create-or-update reconciliation of identity-provider users into the
//! remote graph.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::info;

use crate::domain::identity_resolver::decode;
use crate::domain::ports::{RemoteCallError, RemoteCallExecutor};
use crate::domain::{IdentityResolver, IncomingUserResource, RemoteId, RemoteOperation};

/// What a reconciliation did to the remote graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileEffect {
    /// A new remote object was created.
    Created,
    /// An existing remote object was overwritten.
    Updated,
}

/// Outcome of a user write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciledUser {
    /// Canonical remote identifier.
    pub id: RemoteId,
    /// Whether the call created or updated the account.
    pub effect: ReconcileEffect,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddUserData {
    add_user_v2: IdOnly,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateUserData {
    update_user_by_id: UserPayload,
}

#[derive(Debug, Deserialize)]
struct UserPayload {
    user: IdOnly,
}

#[derive(Debug, Deserialize)]
struct IdOnly {
    id: RemoteId,
}

/// Writes user resources to the remote graph without creating duplicates.
#[derive(Clone)]
pub struct UserReconciler {
    executor: Arc<dyn RemoteCallExecutor>,
    resolver: IdentityResolver,
}

impl UserReconciler {
    /// Build a reconciler; resolution and writes share `executor`.
    pub fn new(executor: Arc<dyn RemoteCallExecutor>) -> Self {
        let resolver = IdentityResolver::new(Arc::clone(&executor));
        Self { executor, resolver }
    }

    /// Create the account, or overwrite the one that already represents this
    /// identity.
    ///
    /// Repeating the call with the same resource is idempotent at the remote:
    /// the second call resolves the account created by the first and updates
    /// it in place.
    pub async fn reconcile(
        &self,
        user: &IncomingUserResource,
    ) -> Result<ReconciledUser, RemoteCallError> {
        let existing = self
            .resolver
            .resolve_user(user.user_name(), user.primary_email())
            .await?;

        match existing {
            Some(id) => self.update(&id, user).await,
            None => self.create(user).await,
        }
    }

    /// Overwrite the account addressed by `id` without searching for it.
    pub async fn replace(
        &self,
        id: &RemoteId,
        user: &IncomingUserResource,
    ) -> Result<ReconciledUser, RemoteCallError> {
        self.update(id, user).await
    }

    /// Delete the account addressed by `id`.
    pub async fn delete(&self, id: &RemoteId) -> Result<(), RemoteCallError> {
        self.executor
            .execute(
                RemoteOperation::RemoveUserById,
                json!({ "input": { "id": id.as_ref() } }),
            )
            .await?;
        info!(remote_id = %id, "removed remote user");
        Ok(())
    }

    async fn create(&self, user: &IncomingUserResource) -> Result<ReconciledUser, RemoteCallError> {
        let mut input = profile_fields(user);
        input.insert("username".to_owned(), json!(user.user_name()));
        let data = self
            .executor
            .execute(RemoteOperation::AddUser, json!({ "input": input }))
            .await?;
        let id = decode::<AddUserData>(data)?.add_user_v2.id;
        info!(remote_id = %id, "created remote user");
        Ok(ReconciledUser {
            id,
            effect: ReconcileEffect::Created,
        })
    }

    async fn update(
        &self,
        id: &RemoteId,
        user: &IncomingUserResource,
    ) -> Result<ReconciledUser, RemoteCallError> {
        let mut input = profile_fields(user);
        input.insert("userId".to_owned(), json!(id.as_ref()));
        let data = self
            .executor
            .execute(RemoteOperation::UpdateUserById, json!({ "input": input }))
            .await?;
        let id = decode::<UpdateUserData>(data)?.update_user_by_id.user.id;
        info!(remote_id = %id, "updated remote user");
        Ok(ReconciledUser {
            id,
            effect: ReconcileEffect::Updated,
        })
    }
}

/// Profile attributes shared by the create and update inputs.
fn profile_fields(user: &IncomingUserResource) -> Map<String, Value> {
    let mut fields = Map::new();
    fields.insert("fullName".to_owned(), json!(user.full_name()));
    fields.insert("email".to_owned(), json!(user.primary_email()));
    if let Some(family) = user.name().family_name.as_deref() {
        fields.insert("lastName".to_owned(), json!(family));
    }
    if let Some(given) = user.name().given_name.as_deref() {
        fields.insert("firstName".to_owned(), json!(given));
    }
    fields
}
