use crate::error::{PullmapError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// LatLng
// ---------------------------------------------------------------------------

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Construct a point, rejecting non-finite or out-of-range values.
    pub fn checked(lat: f64, lng: f64) -> Result<Self> {
        let p = Self { lat, lng };
        p.validate()?;
        Ok(p)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.lat.is_finite() || !(-90.0..=90.0).contains(&self.lat) {
            return Err(PullmapError::InvalidCoordinate(format!(
                "latitude {} is outside [-90, 90]",
                self.lat
            )));
        }
        if !self.lng.is_finite() || !(-180.0..=180.0).contains(&self.lng) {
            return Err(PullmapError::InvalidCoordinate(format!(
                "longitude {} is outside [-180, 180]",
                self.lng
            )));
        }
        Ok(())
    }

    /// `geo` works in x = longitude, y = latitude.
    pub fn to_point(self) -> geo::Point<f64> {
        geo::Point::new(self.lng, self.lat)
    }

    pub fn from_coord(c: geo::Coord<f64>) -> Self {
        Self { lat: c.y, lng: c.x }
    }
}

impl fmt::Display for LatLng {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lat, self.lng)
    }
}

impl FromStr for LatLng {
    type Err = PullmapError;

    /// Parses `"lat,lng"`.
    fn from_str(s: &str) -> Result<Self> {
        let (lat, lng) = s
            .split_once(',')
            .ok_or_else(|| PullmapError::InvalidCoordinate(format!("expected LAT,LNG: '{s}'")))?;
        let parse = |part: &str| {
            part.trim()
                .parse::<f64>()
                .map_err(|_| PullmapError::InvalidCoordinate(format!("not a number: '{part}'")))
        };
        Self::checked(parse(lat)?, parse(lng)?)
    }
}

// ---------------------------------------------------------------------------
// Wire points
// ---------------------------------------------------------------------------

/// Serde adapter for the agent endpoint's point shape:
/// `{"type": "Point", "coordinates": [lat, lng]}`.
pub mod wire_point {
    use super::LatLng;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    struct WirePoint {
        #[serde(rename = "type", default = "point_kind")]
        kind: String,
        coordinates: [f64; 2],
    }

    fn point_kind() -> String {
        "Point".to_string()
    }

    pub fn serialize<S: Serializer>(p: &LatLng, s: S) -> Result<S::Ok, S::Error> {
        WirePoint {
            kind: point_kind(),
            coordinates: [p.lat, p.lng],
        }
        .serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<LatLng, D::Error> {
        let w = WirePoint::deserialize(d)?;
        if w.kind != "Point" {
            return Err(serde::de::Error::custom(format!(
                "expected geometry type 'Point', got '{}'",
                w.kind
            )));
        }
        Ok(LatLng::new(w.coordinates[0], w.coordinates[1]))
    }
}

// ---------------------------------------------------------------------------
// Puller
// ---------------------------------------------------------------------------

/// Agent identifier. The endpoint emits either strings or integers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PullerId(pub String);

impl fmt::Display for PullerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for PullerId {
    fn serialize<S: Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for PullerId {
    fn deserialize<D: Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Int(i64),
        }
        Ok(match Raw::deserialize(d)? {
            Raw::Text(s) => PullerId(s),
            Raw::Int(n) => PullerId(n.to_string()),
        })
    }
}

/// A mobile agent with a trip from `origin` to `destination`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Puller {
    #[serde(rename = "_id")]
    pub id: PullerId,
    #[serde(with = "wire_point")]
    pub origin: LatLng,
    #[serde(with = "wire_point")]
    pub destination: LatLng,
}

impl Puller {
    pub fn new(id: impl Into<String>, origin: LatLng, destination: LatLng) -> Self {
        Self {
            id: PullerId(id.into()),
            origin,
            destination,
        }
    }

    /// The same trip driven the other way.
    pub fn reversed(&self) -> Self {
        Self {
            id: self.id.clone(),
            origin: self.destination,
            destination: self.origin,
        }
    }
}

// ---------------------------------------------------------------------------
// Targets
// ---------------------------------------------------------------------------

/// The fixed route the pullers are matched against.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Targets {
    pub origin: LatLng,
    pub destination: LatLng,
}

impl Targets {
    pub fn reversed(&self) -> Self {
        Self {
            origin: self.destination,
            destination: self.origin,
        }
    }
}

// ---------------------------------------------------------------------------
// DistanceUnit
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceUnit {
    #[default]
    Kilometers,
    Meters,
    Miles,
    /// Arc length in degrees of a great circle.
    Degrees,
}

impl DistanceUnit {
    pub fn from_meters(self, meters: f64) -> f64 {
        match self {
            Self::Kilometers => meters / 1000.0,
            Self::Meters => meters,
            Self::Miles => meters / 1609.344,
            Self::Degrees => (meters / crate::geometry::EARTH_RADIUS_M).to_degrees(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Kilometers => "km",
            Self::Meters => "m",
            Self::Miles => "mi",
            Self::Degrees => "deg",
        }
    }
}

// ---------------------------------------------------------------------------
// Route document
// ---------------------------------------------------------------------------

/// Directions-service response; only the fields the reveal uses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DirectionsDocument {
    #[serde(default)]
    pub routes: Vec<Route>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Route {
    #[serde(default)]
    pub summary: Option<String>,
    pub legs: Vec<Leg>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Leg {
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    pub start_location: LatLng,
    pub end_location: LatLng,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degrees_convert_from_arc_length() {
        let one_degree = crate::geometry::EARTH_RADIUS_M * std::f64::consts::PI / 180.0;
        assert!((DistanceUnit::Degrees.from_meters(one_degree) - 1.0).abs() < 1e-12);
        assert_eq!(DistanceUnit::Degrees.as_str(), "deg");
        let unit: DistanceUnit = serde_json::from_str("\"degrees\"").unwrap();
        assert_eq!(unit, DistanceUnit::Degrees);
    }

    #[test]
    fn parses_lat_lng_pair() {
        let p: LatLng = "41.70, 44.80".parse().unwrap();
        assert_eq!(p, LatLng::new(41.70, 44.80));
    }

    #[test]
    fn rejects_out_of_range_latitude() {
        let err = "91,10".parse::<LatLng>().unwrap_err();
        assert!(matches!(err, PullmapError::InvalidCoordinate(_)));
    }

    #[test]
    fn rejects_missing_comma() {
        assert!("41.7".parse::<LatLng>().is_err());
    }

    #[test]
    fn puller_reads_lat_first_points_and_numeric_ids() {
        let json = r#"{
            "_id": 17,
            "origin": {"type": "Point", "coordinates": [41.70, 44.80]},
            "destination": {"type": "Point", "coordinates": [41.72, 44.73]}
        }"#;
        let p: Puller = serde_json::from_str(json).unwrap();
        assert_eq!(p.id, PullerId("17".into()));
        assert_eq!(p.origin, LatLng::new(41.70, 44.80));
        assert_eq!(p.destination.lng, 44.73);
    }

    #[test]
    fn puller_rejects_non_point_geometry() {
        let json = r#"{
            "_id": "a",
            "origin": {"type": "LineString", "coordinates": [1.0, 2.0]},
            "destination": {"type": "Point", "coordinates": [1.0, 2.0]}
        }"#;
        assert!(serde_json::from_str::<Puller>(json).is_err());
    }

    #[test]
    fn puller_serializes_back_to_wire_shape() {
        let p = Puller::new("x", LatLng::new(1.0, 2.0), LatLng::new(3.0, 4.0));
        let v = serde_json::to_value(&p).unwrap();
        assert_eq!(v["_id"], "x");
        assert_eq!(v["origin"]["type"], "Point");
        assert_eq!(v["origin"]["coordinates"][0], 1.0);
        assert_eq!(v["destination"]["coordinates"][1], 4.0);
    }

    #[test]
    fn geo_point_uses_lng_as_x() {
        let p = LatLng::new(41.0, 44.0).to_point();
        assert_eq!(p.x(), 44.0);
        assert_eq!(p.y(), 41.0);
    }
}
