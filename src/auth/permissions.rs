//! Permission checking and access control logic.
//!
//! Permissions are derived from a user's roles. Each check combines a
//! [`Resource`] with an [`Operation`]; `*All` operations ignore scope while
//! `*Own` operations are additionally gated on ownership (the target user
//! for user-owned resources, the target organization for org-scoped ones).
//!
//! Admin users bypass every check.

use crate::api::models::users::{CurrentUser, Role};
use crate::types::{Operation, OrganizationId, Resource, UserId};

/// Whether a role grants an operation on a resource, ignoring scope.
fn role_grants(role: Role, resource: Resource, operation: Operation) -> bool {
    use Operation::*;
    use Resource::*;

    match role {
        // Full control over the platform surface.
        Role::PlatformManager => true,
        // Runs campaigns: manages ads and deals in their own organization,
        // reads the analytics those produce.
        Role::AdOperations => match resource {
            Ads | Deals => matches!(operation, CreateOwn | ReadOwn | UpdateOwn | DeleteOwn),
            Analytics => matches!(operation, ReadOwn),
            ApiKeys | Users => matches!(operation, CreateOwn | ReadOwn | UpdateOwn | DeleteOwn),
            Organizations => matches!(operation, ReadOwn),
        },
        // Read-only across their own organization.
        Role::Analyst => match resource {
            Ads | Deals | Analytics | Organizations => matches!(operation, ReadOwn),
            ApiKeys | Users => matches!(operation, CreateOwn | ReadOwn | UpdateOwn | DeleteOwn),
        },
        // Own account and keys only.
        Role::StandardUser => match resource {
            ApiKeys | Users => matches!(operation, CreateOwn | ReadOwn | UpdateOwn | DeleteOwn),
            _ => false,
        },
    }
}

fn has_permission(user: &CurrentUser, resource: Resource, operation: Operation) -> bool {
    user.is_admin || user.roles.iter().any(|&role| role_grants(role, resource, operation))
}

pub fn can_create_all_resources(user: &CurrentUser, resource: Resource) -> bool {
    has_permission(user, resource, Operation::CreateAll)
}

pub fn can_read_all_resources(user: &CurrentUser, resource: Resource) -> bool {
    has_permission(user, resource, Operation::ReadAll)
}

pub fn can_update_all_resources(user: &CurrentUser, resource: Resource) -> bool {
    has_permission(user, resource, Operation::UpdateAll)
}

pub fn can_delete_all_resources(user: &CurrentUser, resource: Resource) -> bool {
    has_permission(user, resource, Operation::DeleteAll)
}

/// User-owned resources (accounts, API keys): "own" means the target user
/// is the caller.
pub fn can_create_own_resource(user: &CurrentUser, resource: Resource, owner: UserId) -> bool {
    owner == user.id && has_permission(user, resource, Operation::CreateOwn)
}

pub fn can_read_own_resource(user: &CurrentUser, resource: Resource, owner: UserId) -> bool {
    owner == user.id && has_permission(user, resource, Operation::ReadOwn)
}

pub fn can_update_own_resource(user: &CurrentUser, resource: Resource, owner: UserId) -> bool {
    owner == user.id && has_permission(user, resource, Operation::UpdateOwn)
}

pub fn can_delete_own_resource(user: &CurrentUser, resource: Resource, owner: UserId) -> bool {
    owner == user.id && has_permission(user, resource, Operation::DeleteOwn)
}

/// Org-scoped resources (ads, deals, analytics): "own" means the target
/// organization is the caller's.
pub fn can_create_org_resource(user: &CurrentUser, resource: Resource, organization: OrganizationId) -> bool {
    organization == user.organization_id && has_permission(user, resource, Operation::CreateOwn)
}

pub fn can_read_org_resource(user: &CurrentUser, resource: Resource, organization: OrganizationId) -> bool {
    organization == user.organization_id && has_permission(user, resource, Operation::ReadOwn)
}

pub fn can_update_org_resource(user: &CurrentUser, resource: Resource, organization: OrganizationId) -> bool {
    organization == user.organization_id && has_permission(user, resource, Operation::UpdateOwn)
}

pub fn can_delete_org_resource(user: &CurrentUser, resource: Resource, organization: OrganizationId) -> bool {
    organization == user.organization_id && has_permission(user, resource, Operation::DeleteOwn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn user(is_admin: bool, roles: Vec<Role>) -> CurrentUser {
        CurrentUser {
            id: Uuid::new_v4(),
            organization_id: Uuid::new_v4(),
            email: "user@example.com".to_string(),
            is_admin,
            roles,
            display_name: None,
        }
    }

    #[test]
    fn admin_bypasses_every_check() {
        let admin = user(true, vec![]);
        assert!(can_create_all_resources(&admin, Resource::Organizations));
        assert!(can_delete_all_resources(&admin, Resource::Deals));
        assert!(can_read_org_resource(&admin, Resource::Analytics, Uuid::new_v4()));
    }

    #[test]
    fn platform_manager_has_global_access() {
        let pm = user(false, vec![Role::PlatformManager]);
        assert!(can_create_all_resources(&pm, Resource::Users));
        assert!(can_read_all_resources(&pm, Resource::Deals));
        assert!(can_update_all_resources(&pm, Resource::Ads));
    }

    #[test]
    fn ad_operations_is_scoped_to_their_organization() {
        let ops = user(false, vec![Role::AdOperations]);
        assert!(can_create_org_resource(&ops, Resource::Deals, ops.organization_id));
        assert!(can_update_org_resource(&ops, Resource::Ads, ops.organization_id));
        assert!(can_read_org_resource(&ops, Resource::Analytics, ops.organization_id));

        // Not across organizations.
        assert!(!can_create_org_resource(&ops, Resource::Deals, Uuid::new_v4()));
        assert!(!can_create_all_resources(&ops, Resource::Deals));
        assert!(!can_create_all_resources(&ops, Resource::Users));
    }

    #[test]
    fn analyst_reads_but_never_writes() {
        let analyst = user(false, vec![Role::Analyst]);
        assert!(can_read_org_resource(&analyst, Resource::Deals, analyst.organization_id));
        assert!(can_read_org_resource(&analyst, Resource::Analytics, analyst.organization_id));
        assert!(!can_create_org_resource(&analyst, Resource::Deals, analyst.organization_id));
        assert!(!can_update_org_resource(&analyst, Resource::Ads, analyst.organization_id));
    }

    #[test]
    fn standard_user_manages_only_their_own_keys() {
        let standard = user(false, vec![Role::StandardUser]);
        assert!(can_create_own_resource(&standard, Resource::ApiKeys, standard.id));
        assert!(can_read_own_resource(&standard, Resource::Users, standard.id));
        assert!(!can_create_own_resource(&standard, Resource::ApiKeys, Uuid::new_v4()));
        assert!(!can_read_org_resource(&standard, Resource::Deals, standard.organization_id));
    }
}
