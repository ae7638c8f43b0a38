//! Route and puller data sources.
//!
//! Both are traits so the reveal can be staged against in-memory data in
//! tests; the HTTP implementations use `reqwest` and never retry.

use crate::error::{PullmapError, Result};
use crate::geometry::Area;
use crate::types::{DirectionsDocument, Puller};
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use std::future::Future;
use std::path::PathBuf;

pub trait RouteSource {
    fn directions(&self) -> impl Future<Output = Result<DirectionsDocument>> + Send;
}

pub trait PullerSource {
    /// All pullers, or only those inside `region` when one is given.
    fn pullers(&self, region: Option<&Area>) -> impl Future<Output = Result<Vec<Puller>>> + Send;
}

// ---------------------------------------------------------------------------
// Routes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum RouteLocation {
    File(PathBuf),
    Url(String),
}

impl RouteLocation {
    /// `http://` and `https://` locations are fetched, anything else is a path.
    pub fn parse(s: &str) -> Self {
        if s.starts_with("http://") || s.starts_with("https://") {
            Self::Url(s.to_string())
        } else {
            Self::File(PathBuf::from(s))
        }
    }
}

impl std::fmt::Display for RouteLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File(p) => write!(f, "{}", p.display()),
            Self::Url(u) => f.write_str(u),
        }
    }
}

/// Loads the directions document from a file or URL.
#[derive(Debug, Clone)]
pub struct RouteLoader {
    location: RouteLocation,
    http: reqwest::Client,
}

impl RouteLoader {
    pub fn new(location: RouteLocation) -> Self {
        Self {
            location,
            http: reqwest::Client::new(),
        }
    }

    pub fn location(&self) -> &RouteLocation {
        &self.location
    }
}

impl RouteSource for RouteLoader {
    async fn directions(&self) -> Result<DirectionsDocument> {
        match &self.location {
            RouteLocation::File(path) => {
                let data = tokio::fs::read(path).await?;
                Ok(serde_json::from_slice(&data)?)
            }
            RouteLocation::Url(url) => {
                let resp = self
                    .http
                    .get(url)
                    .send()
                    .await
                    .map_err(|source| http_error(url, source))?;
                let body = checked_body(url, resp).await?;
                Ok(serde_json::from_slice(&body)?)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Pullers
// ---------------------------------------------------------------------------

/// Client for the puller endpoint. Every request is a JSON `POST`; the body
/// is `{"polygon": ...}` when a region is given and empty otherwise.
#[derive(Debug, Clone)]
pub struct PullerClient {
    url: String,
    http: reqwest::Client,
}

impl PullerClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            http: reqwest::Client::new(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PullerPayload {
    Bare(Vec<Puller>),
    Wrapped { data: Vec<Puller> },
}

/// Accepts either a bare array or `{"data": [...]}`.
pub fn parse_pullers(body: &[u8]) -> Result<Vec<Puller>> {
    Ok(match serde_json::from_slice::<PullerPayload>(body)? {
        PullerPayload::Bare(v) | PullerPayload::Wrapped { data: v } => v,
    })
}

impl PullerSource for PullerClient {
    async fn pullers(&self, region: Option<&Area>) -> Result<Vec<Puller>> {
        let mut req = self
            .http
            .post(&self.url)
            .header(CONTENT_TYPE, "application/json");
        if let Some(area) = region {
            let body = serde_json::json!({ "polygon": area.to_wire() });
            req = req.body(serde_json::to_vec(&body)?);
        }
        let resp = req
            .send()
            .await
            .map_err(|source| http_error(&self.url, source))?;
        let body = checked_body(&self.url, resp).await?;
        let pullers = parse_pullers(&body)?;
        tracing::debug!(count = pullers.len(), filtered = region.is_some(), "fetched pullers");
        Ok(pullers)
    }
}

impl RouteSource for DirectionsDocument {
    async fn directions(&self) -> Result<DirectionsDocument> {
        Ok(self.clone())
    }
}

/// In-memory pullers, e.g. a dump of the endpoint's data file. Region
/// queries keep pullers whose origin or destination lies inside the region.
#[derive(Debug, Clone, Default)]
pub struct StaticPullers {
    pullers: Vec<Puller>,
}

impl StaticPullers {
    pub fn new(pullers: Vec<Puller>) -> Self {
        Self { pullers }
    }

    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let data = std::fs::read(path)?;
        Ok(Self::new(parse_pullers(&data)?))
    }
}

impl PullerSource for StaticPullers {
    async fn pullers(&self, region: Option<&Area>) -> Result<Vec<Puller>> {
        Ok(match region {
            None => self.pullers.clone(),
            Some(area) => self
                .pullers
                .iter()
                .filter(|p| area.contains(p.origin) || area.contains(p.destination))
                .cloned()
                .collect(),
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn http_error(url: &str, source: reqwest::Error) -> PullmapError {
    PullmapError::Http {
        url: url.to_string(),
        source,
    }
}

async fn checked_body(url: &str, resp: reqwest::Response) -> Result<Vec<u8>> {
    let status = resp.status();
    if !status.is_success() {
        return Err(PullmapError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    let bytes = resp.bytes().await.map_err(|source| http_error(url, source))?;
    Ok(bytes.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{convex_hull, corridor};
    use crate::types::LatLng;
    use mockito::Matcher;

    const PULLERS: &str = r#"[
        {"_id": "a", "origin": {"type": "Point", "coordinates": [41.71, 44.79]},
                     "destination": {"type": "Point", "coordinates": [41.72, 44.74]}}
    ]"#;

    #[test]
    fn location_parse_distinguishes_urls() {
        assert_eq!(
            RouteLocation::parse("https://x.test/r.json"),
            RouteLocation::Url("https://x.test/r.json".into())
        );
        assert_eq!(
            RouteLocation::parse("routes.json"),
            RouteLocation::File(PathBuf::from("routes.json"))
        );
    }

    #[test]
    fn wrapped_payload_is_accepted() {
        let body = format!(r#"{{"data": {PULLERS}}}"#);
        let pullers = parse_pullers(body.as_bytes()).unwrap();
        assert_eq!(pullers.len(), 1);
        assert_eq!(pullers[0].id.0, "a");
    }

    #[test]
    fn malformed_payload_is_an_error() {
        assert!(matches!(
            parse_pullers(br#"{"pullers": []}"#),
            Err(PullmapError::Json(_))
        ));
    }

    #[tokio::test]
    async fn unfiltered_request_posts_json_without_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/public/test/geo")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Exact(String::new()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(PULLERS)
            .create_async()
            .await;

        let client = PullerClient::new(format!("{}/public/test/geo", server.url()));
        let pullers = client.pullers(None).await.unwrap();
        assert_eq!(pullers.len(), 1);
        assert_eq!(pullers[0].origin, LatLng::new(41.71, 44.79));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn region_request_sends_the_polygon() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/geo")
            .match_body(Matcher::PartialJson(
                serde_json::json!({"polygon": {"type": "Polygon"}}),
            ))
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let hull = convex_hull(&[corridor(&[LatLng::new(41.7, 44.8)], 0.5).unwrap()]).unwrap();
        let client = PullerClient::new(format!("{}/geo", server.url()));
        assert!(client.pullers(Some(&hull)).await.unwrap().is_empty());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn error_status_is_reported() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/geo")
            .with_status(503)
            .create_async()
            .await;
        let client = PullerClient::new(format!("{}/geo", server.url()));
        let err = client.pullers(None).await.unwrap_err();
        assert!(matches!(err, PullmapError::Status { status: 503, .. }));
    }

    #[tokio::test]
    async fn routes_load_from_url() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/routes.json")
            .with_status(200)
            .with_body(r#"{"routes": [{"legs": [{"steps": [
                {"start_location": {"lat": 1.0, "lng": 2.0}, "end_location": {"lat": 3.0, "lng": 4.0}}
            ]}]}]}"#)
            .create_async()
            .await;
        let loader = RouteLoader::new(RouteLocation::parse(&format!(
            "{}/routes.json",
            server.url()
        )));
        let doc = loader.directions().await.unwrap();
        assert_eq!(doc.routes.len(), 1);
        assert_eq!(doc.routes[0].legs[0].steps[0].end_location.lat, 3.0);
    }

    #[tokio::test]
    async fn routes_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("routes.json");
        std::fs::write(&path, r#"{"routes": []}"#).unwrap();
        let doc = RouteLoader::new(RouteLocation::File(path))
            .directions()
            .await
            .unwrap();
        assert!(doc.routes.is_empty());
    }

    #[tokio::test]
    async fn static_pullers_filter_by_region() {
        let near = Puller::new("near", LatLng::new(41.7, 44.8), LatLng::new(45.0, 45.0));
        let far = Puller::new("far", LatLng::new(0.0, 0.0), LatLng::new(1.0, 1.0));
        let source = StaticPullers::new(vec![near, far]);
        let area = corridor(&[LatLng::new(41.7, 44.8)], 0.5).unwrap();

        assert_eq!(source.pullers(None).await.unwrap().len(), 2);
        let inside = source.pullers(Some(&area)).await.unwrap();
        assert_eq!(inside.len(), 1);
        assert_eq!(inside[0].id.0, "near");
    }

    #[tokio::test]
    async fn missing_route_file_is_io_error() {
        let loader = RouteLoader::new(RouteLocation::File(PathBuf::from("/nonexistent/r.json")));
        assert!(matches!(
            loader.directions().await,
            Err(PullmapError::Io(_))
        ));
    }
}
