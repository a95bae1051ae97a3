use crate::kube::apis::networking::gloo::v2::{DestinationReference, RouteTable};

use super::matcher::RouteMatch;

/// Weights written to the matched pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeightSplit {
    pub stable: u32,
    pub canary: u32,
}

impl WeightSplit {
    /// `desired_weight` must be within `0..=100`; range checks happen before reconciliation.
    pub fn new(desired_weight: u32) -> Self {
        Self {
            stable: 100 - desired_weight,
            canary: desired_weight,
        }
    }
}

/// Apply `desired_weight` to the matched route of `route_table`.
///
/// A missing canary destination is synthesized from the stable one and appended to the end of
/// the destination list. Other routes and other destinations are left as is.
pub fn apply_weight(
    route_table: &mut RouteTable,
    found: RouteMatch,
    desired_weight: u32,
    canary_service: &str,
) -> WeightSplit {
    let split = WeightSplit::new(desired_weight);

    let Some(destinations) = route_table.spec.http[found.route].destinations_mut() else {
        return split;
    };

    destinations[found.stable].weight = Some(split.stable);

    let canary = match found.canary {
        Some(index) => index,
        None => {
            let dest = DestinationReference::canary_of(&destinations[found.stable], canary_service);
            destinations.push(dest);
            destinations.len() - 1
        }
    };

    destinations[canary].weight = Some(split.canary);

    split
}
