//! Common type definitions and permission system types.
//!
//! All entity IDs are UUIDs wrapped in type aliases:
//!
//! - [`OrganizationId`]: Tenant identifier
//! - [`UserId`]: User account identifier
//! - [`ApiKeyId`]: API key identifier
//! - [`AdId`]: Advertiser ad identifier
//! - [`DealId`]: Programmatic deal identifier
//!
//! The permission system combines a [`Resource`] (what is being accessed)
//! with an [`Operation`] (what is being done to it). Operations come in two
//! flavors: `*All` for unrestricted access and `*Own` for access scoped to
//! the caller's own organization or account.

use serde::Deserialize;
use std::fmt;
use uuid::Uuid;

// Type aliases for IDs
pub type OrganizationId = Uuid;
pub type UserId = Uuid;
pub type ApiKeyId = Uuid;
pub type AdId = Uuid;
pub type DealId = Uuid;

/// Abbreviate a UUID to its first 8 characters for more readable logs and traces
/// Example: "550e8400-e29b-41d4-a716-446655440000" -> "550e8400"
pub fn abbrev_uuid(uuid: &Uuid) -> String {
    uuid.to_string().chars().take(8).collect()
}

// Common types for path parameters
#[derive(Debug, Clone, Deserialize)]
pub enum CurrentKeyword {
    #[serde(rename = "current")]
    Current,
}

/// Allows routes like /users/current/api-keys and /users/{user_id}/api-keys
/// to hit the same handler.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum UserIdOrCurrent {
    Current(CurrentKeyword),
    Id(UserId),
}

// Operations that can be performed on resources
// *-All means unrestricted access, *-Own means restricted to own resources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    CreateAll,
    CreateOwn,
    ReadAll,
    ReadOwn,
    UpdateAll,
    UpdateOwn,
    DeleteAll,
    DeleteOwn,
}

// Resources that can be operated on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Organizations,
    Users,
    ApiKeys,
    Ads,
    Deals,
    Analytics,
}

// Permission types for authorization
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Permission {
    /// Simple permission: (Resource, Operation)
    Allow(Resource, Operation),
    /// Logical combinator: any of the listed permissions suffices
    Any(Vec<Permission>),
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::CreateAll | Operation::CreateOwn => write!(f, "Create"),
            Operation::ReadAll | Operation::ReadOwn => write!(f, "Read"),
            Operation::UpdateAll | Operation::UpdateOwn => write!(f, "Update"),
            Operation::DeleteAll | Operation::DeleteOwn => write!(f, "Delete"),
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Organizations => write!(f, "organizations"),
            Resource::Users => write!(f, "users"),
            Resource::ApiKeys => write!(f, "API keys"),
            Resource::Ads => write!(f, "ads"),
            Resource::Deals => write!(f, "deals"),
            Resource::Analytics => write!(f, "analytics"),
        }
    }
}
