//! Targeting predicate.
//!
//! A deal's [`TargetingSpec`] is matched against an [`AdRequest`] dimension
//! by dimension. A dimension participates in the comparison only when both
//! the deal and the request specify it; an absent dimension on either side
//! is a wildcard. Scalar dimensions require exact equality, categories
//! require a non-empty intersection.

use crate::api::models::deals::{AdRequest, TargetingSpec};

/// Returns true when `request` satisfies every dimension of `targeting`.
pub fn matches(request: &AdRequest, targeting: &TargetingSpec) -> bool {
    if !dimension_matches(targeting.geo_country.as_deref(), request.geo.country.as_deref()) {
        return false;
    }
    if !dimension_matches(targeting.geo_region.as_deref(), request.geo.region.as_deref()) {
        return false;
    }
    if !dimension_matches(targeting.device_os.as_deref(), request.device.os.as_deref()) {
        return false;
    }
    if !dimension_matches(
        targeting.device_type.as_deref(),
        request.device.device_type.as_deref(),
    ) {
        return false;
    }
    categories_match(targeting.categories.as_deref(), request.categories.as_deref())
}

fn dimension_matches(wanted: Option<&str>, offered: Option<&str>) -> bool {
    match (wanted, offered) {
        (Some(w), Some(o)) => w == o,
        _ => true,
    }
}

fn categories_match(wanted: Option<&[String]>, offered: Option<&[String]>) -> bool {
    match (wanted, offered) {
        // An empty category list on the deal carries no constraint.
        (Some(w), Some(o)) if !w.is_empty() => w.iter().any(|c| o.contains(c)),
        _ => true,
    }
}
