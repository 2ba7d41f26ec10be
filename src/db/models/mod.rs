//! Database record models matching table schemas.
//!
//! Struct definitions that directly correspond to database table rows,
//! used by repositories to return query results and accept insertion or
//! update data. Database models are distinct from API models so storage
//! and API representations can evolve independently.

pub mod ads;
pub mod api_keys;
pub mod deals;
pub mod organizations;
pub mod performance;
pub mod users;
