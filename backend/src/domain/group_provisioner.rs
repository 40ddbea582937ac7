//! Group lifecycle against the remote graph: create, replace, delete and
//! ordered PATCH application.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::{debug, info, warn};

use crate::domain::group_patch::{self, GroupMutation, PatchOperation, PatchPlanError};
use crate::domain::identity_resolver::decode;
use crate::domain::ports::{RemoteCallError, RemoteCallExecutor};
use crate::domain::{IncomingGroupResource, ReconcileEffect, RemoteId, RemoteOperation};

/// Outcome of a group write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionedGroup {
    pub id: RemoteId,
    pub effect: ReconcileEffect,
}

/// Summary of a fully applied PATCH request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchOutcome {
    /// Remote mutations issued.
    pub applied: usize,
    /// Operations skipped as unsupported.
    pub skipped: usize,
}

/// Failure while applying a PATCH request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GroupPatchError {
    /// The request was rejected before any remote call.
    #[error(transparent)]
    Invalid(#[from] PatchPlanError),
    /// A remote call failed. Earlier operations stay applied.
    #[error("patch operation {index} failed after {applied} applied mutation(s): {source}")]
    Remote {
        index: usize,
        applied: usize,
        source: RemoteCallError,
    },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroupLookupData {
    group_by_display_name: Option<IdOnly>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddGroupData {
    add_group: GroupPayload,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateGroupData {
    update_group: GroupPayload,
}

#[derive(Debug, Deserialize)]
struct GroupPayload {
    group: IdOnly,
}

#[derive(Debug, Deserialize)]
struct IdOnly {
    id: RemoteId,
}

/// Writes group resources to the remote graph.
#[derive(Clone)]
pub struct GroupProvisioner {
    executor: Arc<dyn RemoteCallExecutor>,
}

impl GroupProvisioner {
    /// Build a provisioner issuing its calls through `executor`.
    pub fn new(executor: Arc<dyn RemoteCallExecutor>) -> Self {
        Self { executor }
    }

    /// Create the group, or update the group that already carries this
    /// display name.
    pub async fn create(
        &self,
        group: &IncomingGroupResource,
    ) -> Result<ProvisionedGroup, RemoteCallError> {
        if let Some(id) =
            find_group_by_display_name(self.executor.as_ref(), group.display_name()).await?
        {
            debug!(remote_id = %id, "group already exists, updating in place");
            let id = self
                .update(&id, Some(group.display_name()), group.external_id())
                .await?;
            return Ok(ProvisionedGroup {
                id,
                effect: ReconcileEffect::Updated,
            });
        }

        let data = self
            .executor
            .execute(
                RemoteOperation::AddGroup,
                json!({
                    "displayName": group.display_name(),
                    "lookupName": group.external_id(),
                }),
            )
            .await?;
        let id = decode::<AddGroupData>(data)?.add_group.group.id;
        info!(remote_id = %id, "created remote group");
        Ok(ProvisionedGroup {
            id,
            effect: ReconcileEffect::Created,
        })
    }

    /// Overwrite the group addressed by `id`.
    pub async fn replace(
        &self,
        id: &RemoteId,
        group: &IncomingGroupResource,
    ) -> Result<ProvisionedGroup, RemoteCallError> {
        let id = self
            .update(id, Some(group.display_name()), group.external_id())
            .await?;
        Ok(ProvisionedGroup {
            id,
            effect: ReconcileEffect::Updated,
        })
    }

    /// Delete the group addressed by `id`.
    pub async fn delete(&self, id: &RemoteId) -> Result<(), RemoteCallError> {
        self.executor
            .execute(
                RemoteOperation::RemoveGroup,
                json!({ "groupId": id.as_ref() }),
            )
            .await?;
        info!(remote_id = %id, "removed remote group");
        Ok(())
    }

    /// Apply `operations` to the group in request order.
    ///
    /// The list is validated up front. Execution stops at the first remote
    /// failure; mutations issued before it are not rolled back and the error
    /// reports how many there were.
    pub async fn apply_patch(
        &self,
        id: &RemoteId,
        operations: &[PatchOperation],
    ) -> Result<PatchOutcome, GroupPatchError> {
        let steps = group_patch::plan(operations)?;
        let skipped = operations.len().saturating_sub(steps.len());
        let mut applied = 0_usize;

        for step in steps {
            let result = match step.mutation {
                GroupMutation::Update {
                    display_name,
                    lookup_name,
                } => self
                    .update(id, display_name.as_deref(), lookup_name.as_deref())
                    .await
                    .map(drop),
                GroupMutation::AddMembers(members) => {
                    self.change_members(RemoteOperation::AddUsersToGroup, id, &members)
                        .await
                }
                GroupMutation::RemoveMembers(members) => {
                    self.change_members(RemoteOperation::RemoveUsersFromGroup, id, &members)
                        .await
                }
            };
            if let Err(source) = result {
                warn!(
                    remote_id = %id,
                    index = step.index,
                    applied,
                    %source,
                    "group patch stopped; earlier operations remain applied"
                );
                return Err(GroupPatchError::Remote {
                    index: step.index,
                    applied,
                    source,
                });
            }
            applied += 1;
        }

        info!(remote_id = %id, applied, skipped, "applied group patch");
        Ok(PatchOutcome { applied, skipped })
    }

    async fn update(
        &self,
        id: &RemoteId,
        display_name: Option<&str>,
        lookup_name: Option<&str>,
    ) -> Result<RemoteId, RemoteCallError> {
        let mut input = Map::new();
        input.insert("groupId".to_owned(), json!(id.as_ref()));
        if let Some(name) = display_name {
            input.insert("displayName".to_owned(), json!(name));
        }
        if let Some(lookup) = lookup_name {
            input.insert("lookupName".to_owned(), json!(lookup));
        }
        let data = self
            .executor
            .execute(RemoteOperation::UpdateGroup, json!({ "input": input }))
            .await?;
        let id = decode::<UpdateGroupData>(data)?.update_group.group.id;
        info!(remote_id = %id, "updated remote group");
        Ok(id)
    }

    async fn change_members(
        &self,
        operation: RemoteOperation,
        id: &RemoteId,
        members: &[RemoteId],
    ) -> Result<(), RemoteCallError> {
        let users: Vec<&str> = members.iter().map(|member| member.as_ref()).collect();
        self.executor
            .execute(
                operation,
                json!({ "input": { "groupId": id.as_ref(), "users": users } }),
            )
            .await
            .map(|_: Value| ())
    }
}

/// Look a group up by display name.
///
/// The remote reports a missing group as a query error, so `Query` failures
/// read as "absent"; other failures propagate.
pub(crate) async fn find_group_by_display_name(
    executor: &dyn RemoteCallExecutor,
    display_name: &str,
) -> Result<Option<RemoteId>, RemoteCallError> {
    let result = executor
        .execute(
            RemoteOperation::GroupByDisplayName,
            json!({ "displayName": display_name }),
        )
        .await;
    match result {
        Ok(data) => Ok(decode::<GroupLookupData>(data)?
            .group_by_display_name
            .map(|group| group.id)),
        Err(RemoteCallError::Query { message }) => {
            debug!(%message, "group lookup found nothing");
            Ok(None)
        }
        Err(error) => Err(error),
    }
}
