//! Bootstrap of the management roles that provisioned groups are bound to.
//!
//! Each [`RoleGrant`] upserts a role by display name and assigns it to a
//! group. The identity provider pushes that group through the bridge, so it
//! may not exist yet; the lookup is polled until it appears or the wait runs
//! out.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use mockable::Clock;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::{debug, info, warn};

use crate::domain::group_provisioner::find_group_by_display_name;
use crate::domain::identity_resolver::decode;
use crate::domain::ports::{RemoteCallError, RemoteCallExecutor};
use crate::domain::remote_executor::RetryWindow;
use crate::domain::{ReconcileEffect, RemoteId, RemoteOperation, RetryPolicy, RetrySleeper};

/// Organization permissions granted to the organization management role.
pub const ORGANIZATION_MANAGEMENT_PERMISSIONS: [&str; 17] = [
    "ChangeIPFilters",
    "DeleteAllViews",
    "DeleteAllRepositories",
    "ChangeSecurityPolicies",
    "ChangeOrganizationPermissions",
    "ViewAllInternalNotifications",
    "ChangeSessions",
    "ManageViewConnections",
    "IngestAcrossAllReposWithinOrganization",
    "ChangeFieldAliases",
    "CreateRepository",
    "ManageUsers",
    "ViewUsage",
    "ChangeTriggersToRunAsOtherUsers",
    "ViewFleetManagement",
    "ChangeAllViewOrRepositoryPermissions",
    "ChangeFleetManagement",
];

/// System permissions granted to the cluster management role.
pub const CLUSTER_MANAGEMENT_PERMISSIONS: [&str; 3] =
    ["ReadHealthCheck", "ManageCluster", "ChangeSystemPermissions"];

/// Roles the remote ships with; never updated.
const BUILT_IN_ROLES: [&str; 3] = ["Admin", "Member", "Deleter"];

/// Where a role's permissions apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleScope {
    /// Organization permissions, assigned with
    /// `assignOrganizationRoleToGroup`.
    Organization,
    /// System permissions, assigned with `assignSystemRoleToGroup`.
    Cluster,
}

impl RoleScope {
    const fn assignment(self) -> RemoteOperation {
        match self {
            Self::Organization => RemoteOperation::AssignOrganizationRoleToGroup,
            Self::Cluster => RemoteOperation::AssignSystemRoleToGroup,
        }
    }
}

/// A role to upsert and the group it is granted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleGrant {
    pub role_name: String,
    pub group_name: String,
    pub scope: RoleScope,
    /// Permission names, applied to the scope's permission set.
    pub permissions: Vec<String>,
}

impl RoleGrant {
    /// Organization management role with the default permission set.
    pub fn organization_management(
        role_name: impl Into<String>,
        group_name: impl Into<String>,
    ) -> Self {
        Self {
            role_name: role_name.into(),
            group_name: group_name.into(),
            scope: RoleScope::Organization,
            permissions: ORGANIZATION_MANAGEMENT_PERMISSIONS
                .into_iter()
                .map(str::to_owned)
                .collect(),
        }
    }

    /// Cluster management role with the default permission set.
    pub fn cluster_management(role_name: impl Into<String>, group_name: impl Into<String>) -> Self {
        Self {
            role_name: role_name.into(),
            group_name: group_name.into(),
            scope: RoleScope::Cluster,
            permissions: CLUSTER_MANAGEMENT_PERMISSIONS
                .into_iter()
                .map(str::to_owned)
                .collect(),
        }
    }

    fn role_input(&self, role_id: Option<&RemoteId>) -> Value {
        let none: &[String] = &[];
        let (organization, system) = match self.scope {
            RoleScope::Organization => (self.permissions.as_slice(), none),
            RoleScope::Cluster => (none, self.permissions.as_slice()),
        };
        let mut input = Map::new();
        input.insert("displayName".to_owned(), json!(self.role_name));
        if let Some(id) = role_id {
            input.insert("roleId".to_owned(), json!(id.as_ref()));
        }
        input.insert("organizationPermissions".to_owned(), json!(organization));
        input.insert("systemPermissions".to_owned(), json!(system));
        input.insert("viewPermissions".to_owned(), json!(none));
        json!({ "input": input })
    }
}

/// Result of one applied [`RoleGrant`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncedRole {
    pub role_name: String,
    pub role_id: RemoteId,
    pub group_id: RemoteId,
    /// Whether the role was created or overwritten.
    pub effect: ReconcileEffect,
}

/// Failure while synchronising a role.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoleSyncError {
    #[error("remote call failed while {stage}: {source}")]
    Remote {
        stage: &'static str,
        source: RemoteCallError,
    },
    #[error("group {group} did not appear within {waited_ms} ms")]
    GroupMissing { group: String, waited_ms: i64 },
}

impl RoleSyncError {
    fn at(stage: &'static str) -> impl FnOnce(RemoteCallError) -> Self {
        move |source| Self::Remote { stage, source }
    }
}

#[derive(Debug, Deserialize)]
struct RolesData {
    roles: Vec<RemoteRole>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteRole {
    id: RemoteId,
    display_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateRoleData {
    create_role: RolePayload,
}

#[derive(Debug, Deserialize)]
struct RolePayload {
    role: RoleId,
}

#[derive(Debug, Deserialize)]
struct RoleId {
    id: RemoteId,
}

/// Upserts management roles and binds them to their groups.
pub struct RoleSynchroniser {
    executor: Arc<dyn RemoteCallExecutor>,
    clock: Arc<dyn Clock>,
    sleeper: Arc<dyn RetrySleeper>,
    group_wait: RetryPolicy,
}

impl RoleSynchroniser {
    /// Default pause between group lookups.
    pub const DEFAULT_GROUP_POLL: Duration = Duration::from_secs(10);
    /// Default time to wait for a group to be provisioned.
    pub const DEFAULT_GROUP_WAIT: Duration = Duration::from_secs(300);

    /// `group_wait.interval` is the pause between lookups of a missing
    /// group; `group_wait.max_elapsed` bounds the whole wait.
    pub fn new(
        executor: Arc<dyn RemoteCallExecutor>,
        clock: Arc<dyn Clock>,
        sleeper: Arc<dyn RetrySleeper>,
        group_wait: RetryPolicy,
    ) -> Self {
        Self {
            executor,
            clock,
            sleeper,
            group_wait,
        }
    }

    /// Apply every grant in order against one snapshot of existing roles.
    ///
    /// Stops at the first failure; earlier grants stay applied.
    pub async fn sync_all(&self, grants: &[RoleGrant]) -> Result<Vec<SyncedRole>, RoleSyncError> {
        let existing = self.existing_roles().await?;
        debug!(roles = existing.len(), "loaded existing roles");
        let mut synced = Vec::with_capacity(grants.len());
        for grant in grants {
            synced.push(self.sync(&existing, grant).await?);
        }
        Ok(synced)
    }

    /// Custom roles keyed by display name. Built-in roles are left out.
    pub async fn existing_roles(&self) -> Result<BTreeMap<String, RemoteId>, RoleSyncError> {
        let data = self
            .executor
            .execute(RemoteOperation::Roles, json!({}))
            .await
            .map_err(RoleSyncError::at("listing roles"))?;
        let roles = decode::<RolesData>(data)
            .map_err(RoleSyncError::at("listing roles"))?
            .roles;
        Ok(roles
            .into_iter()
            .filter(|role| !BUILT_IN_ROLES.contains(&role.display_name.as_str()))
            .map(|role| (role.display_name, role.id))
            .collect())
    }

    /// Upsert the grant's role, wait for its group, then assign the role.
    pub async fn sync(
        &self,
        existing: &BTreeMap<String, RemoteId>,
        grant: &RoleGrant,
    ) -> Result<SyncedRole, RoleSyncError> {
        let (role_id, effect) = self.upsert_role(existing, grant).await?;
        let group_id = self.wait_for_group(&grant.group_name).await?;
        self.executor
            .execute(
                grant.scope.assignment(),
                json!({ "input": { "groupId": group_id.as_ref(), "roleId": role_id.as_ref() } }),
            )
            .await
            .map_err(RoleSyncError::at("assigning the role"))?;
        info!(
            role = %grant.role_name,
            %role_id,
            group = %grant.group_name,
            %group_id,
            "role assigned to group"
        );
        Ok(SyncedRole {
            role_name: grant.role_name.clone(),
            role_id,
            group_id,
            effect,
        })
    }

    async fn upsert_role(
        &self,
        existing: &BTreeMap<String, RemoteId>,
        grant: &RoleGrant,
    ) -> Result<(RemoteId, ReconcileEffect), RoleSyncError> {
        if let Some(id) = existing.get(&grant.role_name) {
            self.executor
                .execute(RemoteOperation::UpdateRole, grant.role_input(Some(id)))
                .await
                .map_err(RoleSyncError::at("updating the role"))?;
            info!(role = %grant.role_name, role_id = %id, "updated role");
            return Ok((id.clone(), ReconcileEffect::Updated));
        }

        let data = self
            .executor
            .execute(RemoteOperation::CreateRole, grant.role_input(None))
            .await
            .map_err(RoleSyncError::at("creating the role"))?;
        let id = decode::<CreateRoleData>(data)
            .map_err(RoleSyncError::at("creating the role"))?
            .create_role
            .role
            .id;
        info!(role = %grant.role_name, role_id = %id, "created role");
        Ok((id, ReconcileEffect::Created))
    }

    async fn wait_for_group(&self, group_name: &str) -> Result<RemoteId, RoleSyncError> {
        let window = RetryWindow::open(self.clock.utc(), &self.group_wait);
        loop {
            if let Some(id) = find_group_by_display_name(self.executor.as_ref(), group_name)
                .await
                .map_err(RoleSyncError::at("looking up the group"))?
            {
                return Ok(id);
            }

            let now = self.clock.utc();
            if !window.allows_wait(now) {
                let waited_ms = window.elapsed(now).num_milliseconds();
                warn!(group = group_name, waited_ms, "group never appeared");
                return Err(RoleSyncError::GroupMissing {
                    group: group_name.to_owned(),
                    waited_ms,
                });
            }
            info!(
                group = group_name,
                retry_in_ms = u64::try_from(self.group_wait.interval.as_millis()).unwrap_or(u64::MAX),
                "group not provisioned yet"
            );
            self.sleeper.sleep(self.group_wait.interval).await;
        }
    }
}
