use crate::error::{PullmapError, Result};
use crate::types::{DistanceUnit, LatLng, Targets};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// MapView
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapView {
    #[serde(default = "default_center")]
    pub center: LatLng,
    #[serde(default = "default_zoom")]
    pub zoom: u8,
}

fn default_center() -> LatLng {
    LatLng::new(41.71776, 44.773521)
}

fn default_zoom() -> u8 {
    14
}

impl Default for MapView {
    fn default() -> Self {
        Self {
            center: default_center(),
            zoom: default_zoom(),
        }
    }
}

// ---------------------------------------------------------------------------
// Targets
// ---------------------------------------------------------------------------

fn default_targets() -> Targets {
    Targets {
        origin: LatLng::new(41.7094968, 44.8006397),
        destination: LatLng::new(41.72723209999999, 44.73565),
    }
}

// ---------------------------------------------------------------------------
// Style
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Style {
    /// Route and corridor colors, by route index (wraps around).
    #[serde(default = "default_palette")]
    pub palette: Vec<String>,
    #[serde(default = "default_gray")]
    pub hull_color: String,
    #[serde(default = "default_gray")]
    pub puller_color: String,
    #[serde(default = "default_route_weight")]
    pub route_weight: f64,
}

fn default_palette() -> Vec<String> {
    ["green", "red", "blue", "black"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_gray() -> String {
    "gray".to_string()
}

fn default_route_weight() -> f64 {
    3.0
}

impl Default for Style {
    fn default() -> Self {
        Self {
            palette: default_palette(),
            hull_color: default_gray(),
            puller_color: default_gray(),
            route_weight: default_route_weight(),
        }
    }
}

impl Style {
    pub fn route_color(&self, index: usize) -> &str {
        if self.palette.is_empty() {
            return &self.hull_color;
        }
        &self.palette[index % self.palette.len()]
    }
}

// ---------------------------------------------------------------------------
// Icons
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Icons {
    #[serde(default = "default_origin_icon")]
    pub origin: String,
    #[serde(default = "default_destination_icon")]
    pub destination: String,
    #[serde(default = "default_puller_start_icon")]
    pub puller_start: String,
    #[serde(default = "default_puller_finish_icon")]
    pub puller_finish: String,
}

const ICON_BASE: &str = "http://maps.google.com/mapfiles/ms/micons";

fn default_origin_icon() -> String {
    format!("{ICON_BASE}/cabs.png")
}

fn default_destination_icon() -> String {
    format!("{ICON_BASE}/homegardenbusiness.png")
}

fn default_puller_start_icon() -> String {
    format!("{ICON_BASE}/man.png")
}

fn default_puller_finish_icon() -> String {
    format!("{ICON_BASE}/flag.png")
}

impl Default for Icons {
    fn default() -> Self {
        Self {
            origin: default_origin_icon(),
            destination: default_destination_icon(),
            puller_start: default_puller_start_icon(),
            puller_finish: default_puller_finish_icon(),
        }
    }
}

// ---------------------------------------------------------------------------
// Playback
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Playback {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Pause between the end of setup and the first reveal step.
    #[serde(default = "default_start_delay_ms")]
    pub start_delay_ms: u64,
}

fn default_interval_ms() -> u64 {
    1000
}

fn default_start_delay_ms() -> u64 {
    2000
}

impl Default for Playback {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            start_delay_ms: default_start_delay_ms(),
        }
    }
}

impl Playback {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn start_delay(&self) -> Duration {
        Duration::from_millis(self.start_delay_ms)
    }
}

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sources {
    /// File path or http(s) URL of the directions document.
    #[serde(default = "default_routes")]
    pub routes: String,
    #[serde(default = "default_pullers_url")]
    pub pullers_url: String,
}

fn default_routes() -> String {
    "gmaps-fabrica-to-nutsubidze.json".to_string()
}

fn default_pullers_url() -> String {
    "http://localhost/public/test/geo".to_string()
}

impl Default for Sources {
    fn default() -> Self {
        Self {
            routes: default_routes(),
            pullers_url: default_pullers_url(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub map: MapView,
    #[serde(default = "default_targets")]
    pub targets: Targets,
    #[serde(default)]
    pub style: Style,
    #[serde(default)]
    pub icons: Icons,
    #[serde(default = "default_corridor_radius_km")]
    pub corridor_radius_km: f64,
    #[serde(default)]
    pub distance_unit: DistanceUnit,
    #[serde(default)]
    pub playback: Playback,
    #[serde(default)]
    pub sources: Sources,
}

fn default_corridor_radius_km() -> f64 {
    0.5
}

impl Default for Config {
    fn default() -> Self {
        Self {
            map: MapView::default(),
            targets: default_targets(),
            style: Style::default(),
            icons: Icons::default(),
            corridor_radius_km: default_corridor_radius_km(),
            distance_unit: DistanceUnit::default(),
            playback: Playback::default(),
            sources: Sources::default(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    /// Load `path` when given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let data = serde_yaml::to_string(self)?;
        std::fs::write(path, data)?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        let mut error = |message: String| {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message,
            })
        };

        if self.playback.interval_ms == 0 {
            error("playback.interval_ms must be greater than 0".into());
        }
        if self.style.palette.is_empty() {
            error("style.palette must name at least one color".into());
        }
        if !(self.corridor_radius_km.is_finite() && self.corridor_radius_km > 0.0) {
            error(format!(
                "corridor_radius_km must be positive, got {}",
                self.corridor_radius_km
            ));
        }
        for (name, p) in [
            ("targets.origin", self.targets.origin),
            ("targets.destination", self.targets.destination),
            ("map.center", self.map.center),
        ] {
            if let Err(e) = p.validate() {
                error(format!("{name}: {e}"));
            }
        }

        if self.targets.origin == self.targets.destination {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "targets.origin equals targets.destination; every puller will pass"
                    .into(),
            });
        }
        if self.map.zoom > 22 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!("map.zoom {} is beyond what tile servers provide", self.map.zoom),
            });
        }
        warnings
    }

    /// Fail on the first error-level warning.
    pub fn ensure_valid(&self) -> Result<()> {
        match self
            .validate()
            .into_iter()
            .find(|w| w.level == WarnLevel::Error)
        {
            Some(w) => Err(PullmapError::InvalidConfig(w.message)),
            None => Ok(()),
        }
    }
}
