//! Domain primitives and services.
//!
//! Purpose: reconcile SCIM resources into the remote identity graph without
//! knowing how requests arrive or how the graph is reached.
//!
//! Public surface:
//! - `Error` / `ErrorCode` - transport-agnostic failure payload.
//! - `IncomingUserResource` / `IncomingGroupResource` - validated inputs.
//! - `UserReconciler` / `GroupProvisioner` - write paths.
//! - `RetryingExecutor` - bounded retry around a `GraphTransport`.
//! - `RoleSynchroniser` - management role bootstrap for `sync-roles`.

pub mod error;
pub mod group_patch;
pub mod group_provisioner;
pub mod group_resource;
pub mod identity_resolver;
pub mod ports;
pub mod remote_executor;
pub mod remote_id;
pub mod remote_operation;
pub mod role_sync;
pub mod trace_id;
pub mod user_reconciler;
pub mod user_resource;

pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::group_patch::{GroupMutation, PatchOp, PatchOperation, PatchPlanError};
pub use self::group_provisioner::{GroupPatchError, GroupProvisioner, PatchOutcome, ProvisionedGroup};
pub use self::group_resource::{GroupValidationError, IncomingGroupResource};
pub use self::identity_resolver::{IdentityResolver, RemoteAccount};
pub use self::remote_executor::{RetryPolicy, RetrySleeper, RetryingExecutor, TokioSleeper};
pub use self::remote_id::{RemoteId, RemoteIdValidationError};
pub use self::remote_operation::RemoteOperation;
pub use self::role_sync::{RoleGrant, RoleScope, RoleSyncError, RoleSynchroniser, SyncedRole};
pub use self::trace_id::TraceId;
pub use self::user_reconciler::{ReconcileEffect, ReconciledUser, UserReconciler};
pub use self::user_resource::{
    EmailAddress, IncomingUserResource, PersonName, UserValidationError,
};
