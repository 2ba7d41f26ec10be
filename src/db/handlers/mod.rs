//! Repository implementations for database access.
//!
//! This module provides repository structs for each major entity in the system.
//! Repositories follow a consistent pattern and implement the [`Repository`] trait.
//!
//! # Design Pattern
//!
//! Each repository:
//! - Wraps a SQLx connection or transaction
//! - Provides strongly-typed CRUD operations
//! - Handles query construction and parameter binding
//! - Returns domain models from [`crate::db::models`]
//! - Uses the connection's transaction for ACID guarantees
//!
//! # Available Repositories
//!
//! - [`Organizations`]: Tenant management
//! - [`Users`]: User account management
//! - [`ApiKeys`]: API key management
//! - [`Ads`]: Advertiser ad records and their performance counters
//! - [`Deals`]: Programmatic deals, inventory snapshots, status transitions,
//!   and the locked execution path
//! - [`Performance`]: Per-day deal performance accumulation and rollups
//!
//! # Common Pattern
//!
//! All repositories follow this usage pattern:
//!
//! ```ignore
//! use adctl::db::handlers::{Deals, Repository};
//!
//! async fn example(pool: &sqlx::PgPool) -> Result<(), Box<dyn std::error::Error>> {
//!     // Start a transaction
//!     let mut tx = pool.begin().await?;
//!
//!     // Create repository from transaction
//!     let mut repo = Deals::new(&mut tx);
//!
//!     // Perform operations
//!     let deals = repo.list(&Default::default()).await?;
//!
//!     // Commit or rollback
//!     tx.commit().await?;
//!     Ok(())
//! }
//! ```

pub mod ads;
pub mod api_keys;
pub mod deals;
pub mod organizations;
pub mod performance;
pub mod repository;
pub mod users;

pub use ads::Ads;
pub use api_keys::ApiKeys;
pub use deals::Deals;
pub use organizations::Organizations;
pub use performance::Performance;
pub use repository::Repository;
pub use users::Users;
