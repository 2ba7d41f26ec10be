//! HTTP request handlers for all API endpoints.
//!
//! This module contains Axum route handlers organized by resource type.
//! Each handler is responsible for:
//! - Request validation and deserialization
//! - Authentication and authorization checks
//! - Business logic execution via database repositories
//! - Response serialization
//!
//! # Handler Modules
//!
//! - [`ads`]: Creative CRUD within an organization
//! - [`analytics`]: Organization-wide performance rollups
//! - [`api_keys`]: API key creation, listing, and deletion for users
//! - [`deals`]: Deal CRUD, status transitions, execution, inventory and performance
//! - [`organizations`]: Organization CRUD
//! - [`users`]: User CRUD operations and profile management
//!
//! # Authentication
//!
//! Handlers require authentication via API keys or the trusted proxy header.
//! The [`crate::auth::current_user`] extractor resolves the caller before
//! the handler body runs.
//!
//! # Error Handling
//!
//! Handlers return [`crate::errors::Error`] which automatically converts to
//! appropriate HTTP status codes and plain-text error responses.

pub mod ads;
pub mod analytics;
pub mod api_keys;
pub mod deals;
pub mod organizations;
pub mod users;
