//! Geometry adapters over `geo`.
//!
//! Points enter as [`LatLng`] and leave as [`LatLng`]; everything in between
//! is a `geo` type with x = longitude, y = latitude. Corridors are buffered
//! in a local equirectangular frame (metres) anchored at the first waypoint,
//! which is accurate at the scale of a city route.

use crate::error::{PullmapError, Result};
use crate::types::{DistanceUnit, LatLng, Route};
use geo::{
    BooleanOps, Contains, ConvexHull, Coord, Distance, Haversine, LineString, MapCoords,
    MultiPoint, MultiPolygon, Point, Polygon,
};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Mean earth radius in metres, matching the haversine implementation.
pub(crate) const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Vertices used to approximate each end cap of a corridor segment.
const CIRCLE_STEPS: usize = 32;

// ---------------------------------------------------------------------------
// Distance
// ---------------------------------------------------------------------------

/// Great-circle distance between two points.
pub fn distance(a: LatLng, b: LatLng, unit: DistanceUnit) -> f64 {
    unit.from_meters(Haversine::distance(a.to_point(), b.to_point()))
}

// ---------------------------------------------------------------------------
// Waypoints
// ---------------------------------------------------------------------------

/// Corridor waypoints for a route: the start of every step, in order across
/// all legs, followed by the end of the last step.
///
/// `index` is only used to label the error for a route without steps.
pub fn route_waypoints(index: usize, route: &Route) -> Result<Vec<LatLng>> {
    let steps: Vec<_> = route.legs.iter().flat_map(|leg| leg.steps.iter()).collect();
    let Some(last) = steps.last() else {
        return Err(PullmapError::EmptyRoute(index));
    };
    let mut points: Vec<LatLng> = steps.iter().map(|s| s.start_location).collect();
    points.push(last.end_location);
    Ok(points)
}

// ---------------------------------------------------------------------------
// Area
// ---------------------------------------------------------------------------

/// A (multi)polygon in lng/lat.
#[derive(Debug, Clone, PartialEq)]
pub struct Area(MultiPolygon<f64>);

impl Area {
    pub fn new(polygons: MultiPolygon<f64>) -> Self {
        Self(polygons)
    }

    pub fn as_multi_polygon(&self) -> &MultiPolygon<f64> {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0 .0.is_empty()
    }

    /// Exterior ring of every polygon, as lat/lng points.
    pub fn outlines(&self) -> Vec<Vec<LatLng>> {
        self.0
             .0
            .iter()
            .map(|p| ring_points(p.exterior()))
            .collect()
    }

    pub fn contains(&self, p: LatLng) -> bool {
        self.0.contains(&p.to_point())
    }

    /// Standard GeoJSON (lng/lat) feature with a `kind` property.
    pub fn to_feature(&self, kind: &str) -> geojson::Feature {
        let geometry = match self.0 .0.as_slice() {
            [single] => geojson::Geometry::from(single),
            _ => geojson::Geometry::from(&self.0),
        };
        let mut feature = geojson::Feature::from(geometry);
        feature.set_property("kind", kind);
        feature
    }

    /// The polygon shape the puller endpoint filters by (latitude first).
    pub fn to_wire(&self) -> WireRegion {
        let polygons: Vec<Vec<Vec<[f64; 2]>>> = self
            .0
             .0
            .iter()
            .map(|p| {
                std::iter::once(p.exterior())
                    .chain(p.interiors())
                    .map(|ring| ring.coords().map(|c| [c.y, c.x]).collect())
                    .collect()
            })
            .collect();
        match <[_; 1]>::try_from(polygons) {
            Ok([coordinates]) => WireRegion::Polygon { coordinates },
            Err(coordinates) => WireRegion::MultiPolygon { coordinates },
        }
    }
}

fn ring_points(ring: &LineString<f64>) -> Vec<LatLng> {
    ring.coords().map(|c| LatLng::from_coord(*c)).collect()
}

/// Region filter sent in the puller request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WireRegion {
    Polygon {
        coordinates: Vec<Vec<[f64; 2]>>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Vec<[f64; 2]>>>,
    },
}

// ---------------------------------------------------------------------------
// Corridor
// ---------------------------------------------------------------------------

/// Local metric frame anchored at `anchor`.
#[derive(Debug, Clone, Copy)]
struct LocalFrame {
    anchor: LatLng,
    metres_per_deg_lat: f64,
    metres_per_deg_lng: f64,
}

impl LocalFrame {
    fn at(anchor: LatLng) -> Self {
        let metres_per_deg_lat = EARTH_RADIUS_M * PI / 180.0;
        Self {
            anchor,
            metres_per_deg_lat,
            metres_per_deg_lng: metres_per_deg_lat * anchor.lat.to_radians().cos(),
        }
    }

    fn project(&self, p: LatLng) -> Coord<f64> {
        Coord {
            x: (p.lng - self.anchor.lng) * self.metres_per_deg_lng,
            y: (p.lat - self.anchor.lat) * self.metres_per_deg_lat,
        }
    }

    fn unproject(&self, c: Coord<f64>) -> Coord<f64> {
        Coord {
            x: self.anchor.lng + c.x / self.metres_per_deg_lng,
            y: self.anchor.lat + c.y / self.metres_per_deg_lat,
        }
    }
}

fn circle(center: Coord<f64>, radius: f64) -> impl Iterator<Item = Point<f64>> {
    (0..CIRCLE_STEPS).map(move |i| {
        let theta = 2.0 * PI * i as f64 / CIRCLE_STEPS as f64;
        Point::new(center.x + radius * theta.cos(), center.y + radius * theta.sin())
    })
}

fn capsule(a: Coord<f64>, b: Coord<f64>, radius: f64) -> Polygon<f64> {
    let points: Vec<Point<f64>> = circle(a, radius).chain(circle(b, radius)).collect();
    MultiPoint::new(points).convex_hull()
}

/// Buffer the polyline through `waypoints` by `radius_km`.
pub fn corridor(waypoints: &[LatLng], radius_km: f64) -> Result<Area> {
    if !(radius_km.is_finite() && radius_km > 0.0) {
        return Err(PullmapError::InvalidConfig(format!(
            "corridor radius must be positive, got {radius_km}"
        )));
    }
    let Some(first) = waypoints.first() else {
        return Err(PullmapError::InvalidCoordinate(
            "corridor needs at least one waypoint".into(),
        ));
    };
    let frame = LocalFrame::at(*first);
    let radius = radius_km * 1000.0;
    let projected: Vec<Coord<f64>> = waypoints.iter().map(|p| frame.project(*p)).collect();

    let mut segments: Vec<(Coord<f64>, Coord<f64>)> =
        projected.windows(2).map(|w| (w[0], w[1])).collect();
    if segments.is_empty() {
        segments.push((projected[0], projected[0]));
    }

    let mut merged: Option<MultiPolygon<f64>> = None;
    for (a, b) in segments {
        let piece = MultiPolygon::new(vec![capsule(a, b, radius)]);
        merged = Some(match merged {
            None => piece,
            Some(acc) => acc.union(&piece),
        });
    }
    let merged = merged.unwrap_or_else(|| MultiPolygon::new(Vec::new()));
    Ok(Area(merged.map_coords(|c| frame.unproject(c))))
}

// ---------------------------------------------------------------------------
// Hull
// ---------------------------------------------------------------------------

/// Convex hull over every polygon of every area.
pub fn convex_hull(areas: &[Area]) -> Result<Area> {
    let polygons: Vec<Polygon<f64>> = areas
        .iter()
        .flat_map(|a| a.0 .0.iter().cloned())
        .collect();
    if polygons.is_empty() {
        return Err(PullmapError::EmptyHull);
    }
    let hull = MultiPolygon::new(polygons).convex_hull();
    Ok(Area(MultiPolygon::new(vec![hull])))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Leg, Step};

    fn step(a: (f64, f64), b: (f64, f64)) -> Step {
        Step {
            start_location: LatLng::new(a.0, a.1),
            end_location: LatLng::new(b.0, b.1),
        }
    }

    #[test]
    fn waypoints_take_step_starts_plus_last_end() {
        let route = Route {
            summary: None,
            legs: vec![Leg {
                steps: vec![step((1.0, 1.0), (2.0, 2.0)), step((2.0, 2.0), (3.0, 3.0))],
            }],
        };
        let pts = route_waypoints(0, &route).unwrap();
        assert_eq!(
            pts,
            vec![
                LatLng::new(1.0, 1.0),
                LatLng::new(2.0, 2.0),
                LatLng::new(3.0, 3.0)
            ]
        );
    }

    #[test]
    fn waypoints_span_every_leg() {
        let route = Route {
            summary: None,
            legs: vec![
                Leg {
                    steps: vec![step((1.0, 1.0), (2.0, 2.0))],
                },
                Leg {
                    steps: vec![step((2.0, 2.0), (5.0, 5.0))],
                },
            ],
        };
        let pts = route_waypoints(0, &route).unwrap();
        assert_eq!(pts.len(), 3);
        assert_eq!(pts[2], LatLng::new(5.0, 5.0));
    }

    #[test]
    fn route_without_steps_is_an_error() {
        let route = Route {
            summary: None,
            legs: vec![Leg { steps: vec![] }],
        };
        assert!(matches!(
            route_waypoints(3, &route),
            Err(PullmapError::EmptyRoute(3))
        ));
    }

    #[test]
    fn one_degree_of_latitude_is_about_111_km() {
        let d = distance(
            LatLng::new(0.0, 0.0),
            LatLng::new(1.0, 0.0),
            DistanceUnit::Kilometers,
        );
        assert!((d - 111.19).abs() < 0.1, "{d}");
        let m = distance(LatLng::new(0.0, 0.0), LatLng::new(1.0, 0.0), DistanceUnit::Meters);
        assert!((m / 1000.0 - d).abs() < 1e-9);
    }

    #[test]
    fn corridor_covers_the_route_and_its_margin() {
        let route = [LatLng::new(41.7095, 44.8006), LatLng::new(41.7272, 44.7356)];
        let area = corridor(&route, 0.5).unwrap();
        assert!(area.contains(route[0]));
        assert!(area.contains(route[1]));
        // ~330 m north of the start is inside a 500 m buffer, ~1.1 km is not
        assert!(area.contains(LatLng::new(41.7125, 44.8006)));
        assert!(!area.contains(LatLng::new(41.7195, 44.8006)));
    }

    #[test]
    fn corridor_of_a_single_point_is_a_disc() {
        let p = LatLng::new(10.0, 10.0);
        let area = corridor(&[p], 1.0).unwrap();
        assert_eq!(area.outlines().len(), 1);
        assert!(area.contains(p));
    }

    #[test]
    fn corridor_rejects_non_positive_radius() {
        assert!(corridor(&[LatLng::new(0.0, 0.0)], 0.0).is_err());
    }

    #[test]
    fn hull_spans_every_corridor() {
        let a = corridor(&[LatLng::new(0.0, 0.0), LatLng::new(0.0, 0.1)], 0.5).unwrap();
        let b = corridor(&[LatLng::new(0.1, 0.0), LatLng::new(0.1, 0.1)], 0.5).unwrap();
        let hull = convex_hull(&[a, b]).unwrap();
        // midway between two parallel corridors belongs to the hull only
        assert!(hull.contains(LatLng::new(0.05, 0.05)));
        assert_eq!(hull.outlines().len(), 1);
    }

    #[test]
    fn hull_of_nothing_is_an_error() {
        assert!(matches!(convex_hull(&[]), Err(PullmapError::EmptyHull)));
    }

    #[test]
    fn wire_region_is_latitude_first() {
        let hull = convex_hull(&[corridor(&[LatLng::new(41.0, 44.0)], 0.2).unwrap()]).unwrap();
        let wire = serde_json::to_value(hull.to_wire()).unwrap();
        assert_eq!(wire["type"], "Polygon");
        let first = &wire["coordinates"][0][0];
        assert!((first[0].as_f64().unwrap() - 41.0).abs() < 0.01);
        assert!((first[1].as_f64().unwrap() - 44.0).abs() < 0.01);
    }

    #[test]
    fn feature_carries_kind_and_lng_first_coordinates() {
        let hull = convex_hull(&[corridor(&[LatLng::new(41.0, 44.0)], 0.2).unwrap()]).unwrap();
        let v = serde_json::to_value(hull.to_feature("hull")).unwrap();
        assert_eq!(v["properties"]["kind"], "hull");
        assert_eq!(v["geometry"]["type"], "Polygon");
        let first = &v["geometry"]["coordinates"][0][0];
        assert!((first[0].as_f64().unwrap() - 44.0).abs() < 0.01);
    }
}
