//! Closed catalogue of operations issued against the remote identity graph:
//! the provisioning calls plus the role bootstrap run by `sync-roles`.
//!
//! Each variant owns its GraphQL document. Variables are always bound
//! separately, never interpolated into the document text.

/// Named operation understood by the remote identity graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteOperation {
    /// Free-text user search.
    SearchUsers,
    /// Create a user account.
    AddUser,
    /// Overwrite the profile of an existing user.
    UpdateUserById,
    /// Delete a user account.
    RemoveUserById,
    /// Create a group.
    AddGroup,
    /// Rename a group or change its lookup name.
    UpdateGroup,
    /// Delete a group.
    RemoveGroup,
    /// Add a batch of users to a group.
    AddUsersToGroup,
    /// Remove a batch of users from a group.
    RemoveUsersFromGroup,
    /// Find a group by its exact display name.
    GroupByDisplayName,
    /// List every role with its id.
    Roles,
    /// Create a role with its permission sets.
    CreateRole,
    /// Overwrite the permission sets of an existing role.
    UpdateRole,
    /// Grant an organization-scoped role to a group.
    AssignOrganizationRoleToGroup,
    /// Grant a cluster-wide (system) role to a group.
    AssignSystemRoleToGroup,
}

impl RemoteOperation {
    /// GraphQL operation name sent alongside the document.
    pub const fn name(self) -> &'static str {
        match self {
            Self::SearchUsers => "Users",
            Self::AddUser => "AddUserV2",
            Self::UpdateUserById => "UpdateUserById",
            Self::RemoveUserById => "RemoveUserById",
            Self::AddGroup => "AddGroup",
            Self::UpdateGroup => "UpdateGroup",
            Self::RemoveGroup => "RemoveGroup",
            Self::AddUsersToGroup => "AddUsersToGroup",
            Self::RemoveUsersFromGroup => "RemoveUsersFromGroup",
            Self::GroupByDisplayName => "GroupByDisplayName",
            Self::Roles => "Roles",
            Self::CreateRole => "CreateRole",
            Self::UpdateRole => "UpdateRole",
            Self::AssignOrganizationRoleToGroup => "AssignOrganizationRoleToGroup",
            Self::AssignSystemRoleToGroup => "AssignSystemRoleToGroup",
        }
    }

    /// GraphQL document for this operation.
    pub const fn document(self) -> &'static str {
        match self {
            Self::SearchUsers => {
                "query Users($search: String) { \
                 users(search: $search) { id username email displayName } }"
            }
            Self::AddUser => {
                "mutation AddUserV2($input: AddUserInputV2!) { \
                 addUserV2(input: $input) { ... on User { id } } }"
            }
            Self::UpdateUserById => {
                "mutation UpdateUserById($input: UpdateUserByIdInput!) { \
                 updateUserById(input: $input) { user { id } } }"
            }
            Self::RemoveUserById => {
                "mutation RemoveUserById($input: RemoveUserByIdInput!) { \
                 removeUserById(input: $input) { user { id } } }"
            }
            Self::AddGroup => {
                "mutation AddGroup($displayName: String!, $lookupName: String) { \
                 addGroup(displayName: $displayName, lookupName: $lookupName) { group { id } } }"
            }
            Self::UpdateGroup => {
                "mutation UpdateGroup($input: UpdateGroupInput!) { \
                 updateGroup(input: $input) { group { id lookupName } } }"
            }
            Self::RemoveGroup => {
                "mutation RemoveGroup($groupId: String!) { \
                 removeGroup(groupId: $groupId) { group { id } } }"
            }
            Self::AddUsersToGroup => {
                "mutation AddUsersToGroup($input: AddUsersToGroupInput!) { \
                 addUsersToGroup(input: $input) { group { id } } }"
            }
            Self::RemoveUsersFromGroup => {
                "mutation RemoveUsersFromGroup($input: RemoveUsersFromGroupInput!) { \
                 removeUsersFromGroup(input: $input) { group { id } } }"
            }
            Self::GroupByDisplayName => {
                "query GroupByDisplayName($displayName: String!) { \
                 groupByDisplayName(displayName: $displayName) { id } }"
            }
            Self::Roles => "query Roles { roles { id displayName } }",
            Self::CreateRole => {
                "mutation CreateRole($input: AddRoleInput!) { \
                 createRole(input: $input) { role { id displayName } } }"
            }
            Self::UpdateRole => {
                "mutation UpdateRole($input: UpdateRoleInput!) { \
                 updateRole(input: $input) { role { id } } }"
            }
            Self::AssignOrganizationRoleToGroup => {
                "mutation AssignOrganizationRoleToGroup($input: AssignOrganizationRoleToGroupInput!) { \
                 assignOrganizationRoleToGroup(input: $input) { group { role { id } } } }"
            }
            Self::AssignSystemRoleToGroup => {
                "mutation AssignSystemRoleToGroup($input: AssignSystemRoleToGroupInput!) { \
                 assignSystemRoleToGroup(input: $input) { group { role { id } } } }"
            }
        }
    }

    /// Whether the operation changes remote state.
    pub const fn is_mutation(self) -> bool {
        !matches!(
            self,
            Self::SearchUsers | Self::GroupByDisplayName | Self::Roles
        )
    }
}

impl std::fmt::Display for RemoteOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(RemoteOperation::SearchUsers)]
    #[case(RemoteOperation::AddUser)]
    #[case(RemoteOperation::UpdateUserById)]
    #[case(RemoteOperation::RemoveUserById)]
    #[case(RemoteOperation::AddGroup)]
    #[case(RemoteOperation::UpdateGroup)]
    #[case(RemoteOperation::RemoveGroup)]
    #[case(RemoteOperation::AddUsersToGroup)]
    #[case(RemoteOperation::RemoveUsersFromGroup)]
    #[case(RemoteOperation::GroupByDisplayName)]
    #[case(RemoteOperation::Roles)]
    #[case(RemoteOperation::CreateRole)]
    #[case(RemoteOperation::UpdateRole)]
    #[case(RemoteOperation::AssignOrganizationRoleToGroup)]
    #[case(RemoteOperation::AssignSystemRoleToGroup)]
    fn document_declares_its_operation_name(#[case] operation: RemoteOperation) {
        let document = operation.document();
        let keyword = if operation.is_mutation() {
            "mutation"
        } else {
            "query"
        };
        let head = format!("{keyword} {}", operation.name());
        assert!(
            document.starts_with(&format!("{head}(")) || document.starts_with(&format!("{head} {{")),
            "unexpected document head: {document}"
        );
    }

    #[test]
    fn documents_bind_variables_instead_of_literals() {
        assert!(!RemoteOperation::SearchUsers.document().contains('"'));
        assert!(RemoteOperation::SearchUsers.document().contains("$search"));
    }
}
