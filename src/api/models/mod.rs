//! API request and response data models.
//!
//! Data structures used for HTTP request deserialization and response
//! serialization. These define the public API contract.
//!
//! API models are distinct from database models, allowing independent
//! evolution of API and storage representations. All models are annotated
//! with `utoipa` for automatic API docs.

pub mod ads;
pub mod analytics;
pub mod api_keys;
pub mod deals;
pub mod organizations;
pub mod pagination;
pub mod users;
