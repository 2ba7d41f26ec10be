//! Execution gates and the deal status state machine.
//!
//! A deal only executes while it is ACTIVE, the request falls inside the
//! flight window, and cumulative spend has not reached the budget. A failed
//! gate is a domain outcome, not an error: the caller turns the reason into
//! a `{executed: false, reason}` response.

use crate::api::models::deals::DealStatus;
use chrono::{DateTime, Utc};

/// Gate inputs read from the deal row.
#[derive(Debug, Clone, Copy)]
pub struct ExecutionGates {
    pub status: DealStatus,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub budget: f64,
    pub spend: f64,
}

/// Check every gate in order. `Err` carries the human-readable reason for
/// the first gate that failed.
pub fn check_gates(gates: &ExecutionGates, now: DateTime<Utc>) -> Result<(), String> {
    if gates.status != DealStatus::Active {
        return Err(format!("Deal status is {}", gates.status));
    }
    if now < gates.start_date || now > gates.end_date {
        return Err("Deal is outside its flight window".to_string());
    }
    if gates.spend >= gates.budget {
        return Err("Deal budget is exhausted".to_string());
    }
    Ok(())
}

/// Whether a status transition is permitted.
///
/// DRAFT activates, ACTIVE pauses or completes, PAUSED resumes or
/// completes. COMPLETED is terminal and self-transitions are rejected.
pub fn transition_allowed(from: DealStatus, to: DealStatus) -> bool {
    use DealStatus::*;
    matches!(
        (from, to),
        (Draft, Active) | (Active, Paused) | (Active, Completed) | (Paused, Active) | (Paused, Completed)
    )
}
