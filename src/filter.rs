//! Temporal and commodity filters over buyer requests.
//!
//! Filters only select. Dropped requests are not errors and nothing here
//! deletes them from storage.

use serde::{Deserialize, Serialize};

use crate::model::BuyerRequest;

/// Why a request is absent from a computed route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExclusionReason {
    /// The reference time is at or past the request's expiration.
    Expired,
    /// The request names no commodity.
    NoCommodities,
    /// The hawker cannot arrive before the request's window closes.
    OutsideWindow,
}

/// Why `request` is ineligible at `reference_time`, if it is.
pub fn ineligibility(request: &BuyerRequest, reference_time: i64) -> Option<ExclusionReason> {
    if reference_time >= request.expiration() {
        Some(ExclusionReason::Expired)
    } else if request.commodities().is_empty() {
        Some(ExclusionReason::NoCommodities)
    } else {
        None
    }
}

pub fn is_eligible(request: &BuyerRequest, reference_time: i64) -> bool {
    ineligibility(request, reference_time).is_none()
}

/// Requests that are unexpired at `reference_time` and name at least one
/// commodity. Input order is preserved.
pub fn eligible<'a, I>(requests: I, reference_time: i64) -> Vec<&'a BuyerRequest>
where
    I: IntoIterator<Item = &'a BuyerRequest>,
{
    requests
        .into_iter()
        .filter(|request| is_eligible(request, reference_time))
        .collect()
}

/// True when the hawker sells at least one commodity the buyer asked for.
///
/// Comparison ignores case and surrounding whitespace.
pub fn matches_commodities(request: &BuyerRequest, hawker_commodities: &[String]) -> bool {
    request.commodities().iter().any(|wanted| {
        let wanted = normalize(wanted);
        hawker_commodities.iter().any(|sold| normalize(sold) == wanted)
    })
}

fn normalize(commodity: &str) -> String {
    commodity.trim().to_lowercase()
}
