//! Authentication and authorization system.
//!
//! # Authentication Methods
//!
//! The system supports two authentication methods:
//!
//! ## 1. API Key Authentication
//!
//! Token-based authentication for programmatic access:
//! - API keys created per-user via `/users/{id}/api-keys`
//! - Passed in `Authorization: Bearer <key>` header
//! - No expiration (manually revoked when needed)
//! - Scoped to individual users
//!
//! ## 2. Proxy Header Authentication
//!
//! For deployments behind an authenticating reverse proxy: the proxy
//! asserts the caller's email in a configurable header (default
//! `X-Adctl-User`) and the user is looked up by email.
//!
//! # Authorization
//!
//! Access control is managed through:
//! - **Roles**: Platform-wide permissions (PlatformManager, AdOperations,
//!   Analyst, StandardUser)
//! - **Organization scope**: org-scoped resources (ads, deals, analytics)
//!   are accessible to members of the owning organization
//! - **Ownership**: users can manage their own account and API keys
//!
//! See [`permissions`] for details on the permission system.
//!
//! # Usage in Handlers
//!
//! ```ignore
//! use adctl::api::models::users::CurrentUser;
//!
//! async fn protected_handler(current_user: CurrentUser) -> String {
//!     format!("Hello, {}!", current_user.email)
//! }
//! ```

pub mod current_user;
pub mod permissions;
