//! Directional proximity filter.
//!
//! A puller counts as forward facing when its trip converges on the target
//! destination (`dest_to_dest <= origin_to_dest`) or on the target origin
//! (`origin_to_origin <= dest_to_origin`). Distances are rounded to whole
//! units before comparing, so anything within half a unit ties, and ties
//! are forward facing.

use crate::geometry::distance;
use crate::types::{DistanceUnit, Puller, Targets};
use serde::Serialize;

/// The four rounded distances the verdict is based on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DirectionalDistances {
    pub dest_to_dest: f64,
    pub origin_to_dest: f64,
    pub origin_to_origin: f64,
    pub dest_to_origin: f64,
}

impl DirectionalDistances {
    pub fn measure(puller: &Puller, targets: &Targets, unit: DistanceUnit) -> Self {
        let d = |a, b| round_half_up(distance(a, b, unit));
        Self {
            dest_to_dest: d(puller.destination, targets.destination),
            origin_to_dest: d(puller.origin, targets.destination),
            origin_to_origin: d(puller.origin, targets.origin),
            dest_to_origin: d(puller.destination, targets.origin),
        }
    }

    pub fn converges_on_destination(&self) -> bool {
        self.dest_to_dest <= self.origin_to_dest
    }

    pub fn converges_on_origin(&self) -> bool {
        self.origin_to_origin <= self.dest_to_origin
    }

    pub fn is_forward(&self) -> bool {
        self.converges_on_destination() || self.converges_on_origin()
    }
}

/// Nearest whole unit, .5 rounding up. Distances are never negative, so
/// rounding half away from zero is the same thing.
fn round_half_up(x: f64) -> f64 {
    x.round()
}

pub fn is_forward_facing(puller: &Puller, targets: &Targets, unit: DistanceUnit) -> bool {
    DirectionalDistances::measure(puller, targets, unit).is_forward()
}

/// Keep the pullers that are forward facing, in input order.
pub fn filter_forward<'a>(
    pullers: &'a [Puller],
    targets: &Targets,
    unit: DistanceUnit,
) -> Vec<&'a Puller> {
    pullers
        .iter()
        .filter(|p| is_forward_facing(p, targets, unit))
        .collect()
}
