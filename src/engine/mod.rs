//! Deal decisioning engine.
//!
//! Pure functions implementing the programmatic-deal pipeline, free of any
//! database or HTTP concern so they can be exercised directly:
//!
//! - [`targeting`]: boolean predicate matching an ad request against a
//!   deal's targeting filter
//! - [`selection`]: scoring and picking the best candidate ad
//! - [`pricing`]: floor-price adjustment and clamping
//! - [`execution`]: status/date/budget gates and the status state machine
//! - [`inventory`]: impression-availability estimation at deal creation
//! - [`metrics`]: performance aggregation (CTR/CPC/CPM/ROAS)
//!
//! The repositories in [`crate::db::handlers`] orchestrate these against
//! persistent state.

pub mod execution;
pub mod inventory;
pub mod metrics;
pub mod pricing;
pub mod selection;
pub mod targeting;
