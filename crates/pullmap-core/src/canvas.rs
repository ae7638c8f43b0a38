//! Render surface seam.
//!
//! The map widget itself lives outside this crate. What the reveal needs
//! from it is the `setMap(map | null)` contract: a layer is created once and
//! then shown or hidden. [`LayerHandle`] is that contract; a [`Canvas`]
//! receives the resulting [`LayerEvent`]s.

use crate::error::{PullmapError, Result};
use crate::types::LatLng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerId(pub u64);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Shape {
    Marker {
        position: LatLng,
        icon: String,
        /// Animate the marker dropping in when it is shown.
        #[serde(default)]
        drop: bool,
    },
    Polyline {
        path: Vec<LatLng>,
        stroke_color: String,
        stroke_weight: f64,
    },
    /// One or more filled outlines drawn as a single layer.
    Polygon {
        outlines: Vec<Vec<LatLng>>,
        stroke_color: String,
        stroke_opacity: f64,
        stroke_weight: f64,
        fill_color: String,
        fill_opacity: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub id: LayerId,
    pub shape: Shape,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LayerEvent {
    Show { layer: Layer },
    Hide { id: LayerId },
}

/// Whatever draws the layers.
pub trait Canvas: Send + Sync {
    fn apply(&self, event: LayerEvent) -> Result<()>;
}

// ---------------------------------------------------------------------------
// Scene
// ---------------------------------------------------------------------------

/// The set of layers currently shown, in creation order.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    layers: BTreeMap<LayerId, Layer>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Showing a visible layer or hiding a hidden one is a no-op.
    pub fn apply(&mut self, event: &LayerEvent) {
        match event {
            LayerEvent::Show { layer } => {
                self.layers.insert(layer.id, layer.clone());
            }
            LayerEvent::Hide { id } => {
                self.layers.remove(id);
            }
        }
    }

    pub fn is_visible(&self, id: LayerId) -> bool {
        self.layers.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn layers(&self) -> impl Iterator<Item = &Layer> {
        self.layers.values()
    }
}

// ---------------------------------------------------------------------------
// RecordingCanvas
// ---------------------------------------------------------------------------

/// Keeps every event it receives plus the resulting scene.
#[derive(Debug, Default)]
pub struct RecordingCanvas {
    inner: Mutex<Recording>,
}

#[derive(Debug, Default)]
struct Recording {
    events: Vec<LayerEvent>,
    scene: Scene,
}

impl RecordingCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<LayerEvent> {
        self.lock().map(|r| r.events.clone()).unwrap_or_default()
    }

    pub fn event_count(&self) -> usize {
        self.lock().map(|r| r.events.len()).unwrap_or(0)
    }

    pub fn scene(&self) -> Scene {
        self.lock().map(|r| r.scene.clone()).unwrap_or_default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Recording>> {
        self.inner
            .lock()
            .map_err(|_| PullmapError::Canvas("recording lock poisoned".into()))
    }
}

impl Canvas for RecordingCanvas {
    fn apply(&self, event: LayerEvent) -> Result<()> {
        let mut rec = self.lock()?;
        rec.scene.apply(&event);
        rec.events.push(event);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Layer handles
// ---------------------------------------------------------------------------

/// A layer bound to the canvas that draws it.
#[derive(Clone)]
pub struct LayerHandle {
    layer: Layer,
    canvas: Arc<dyn Canvas>,
}

impl LayerHandle {
    pub fn id(&self) -> LayerId {
        self.layer.id
    }

    pub fn layer(&self) -> &Layer {
        &self.layer
    }

    pub fn show(&self) -> Result<()> {
        self.canvas.apply(LayerEvent::Show {
            layer: self.layer.clone(),
        })
    }

    pub fn hide(&self) -> Result<()> {
        self.canvas.apply(LayerEvent::Hide { id: self.layer.id })
    }
}

impl std::fmt::Debug for LayerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayerHandle")
            .field("layer", &self.layer)
            .finish_non_exhaustive()
    }
}

/// Polygon stroke/fill style.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolygonStyle {
    pub stroke_opacity: f64,
    pub stroke_weight: f64,
    pub fill_opacity: f64,
}

impl Default for PolygonStyle {
    fn default() -> Self {
        Self {
            stroke_opacity: 0.8,
            stroke_weight: 2.0,
            fill_opacity: 0.35,
        }
    }
}

/// Hands out layer ids and builds handles on one canvas. Nothing is drawn
/// until a handle is shown.
pub struct LayerFactory {
    next_id: AtomicU64,
    canvas: Arc<dyn Canvas>,
}

impl LayerFactory {
    pub fn new(canvas: Arc<dyn Canvas>) -> Self {
        Self {
            next_id: AtomicU64::new(1),
            canvas,
        }
    }

    fn handle(&self, shape: Shape) -> LayerHandle {
        let id = LayerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        LayerHandle {
            layer: Layer { id, shape },
            canvas: Arc::clone(&self.canvas),
        }
    }

    pub fn marker(&self, position: LatLng, icon: &str, drop: bool) -> LayerHandle {
        self.handle(Shape::Marker {
            position,
            icon: icon.to_string(),
            drop,
        })
    }

    pub fn polyline(&self, path: Vec<LatLng>, color: &str, weight: f64) -> LayerHandle {
        self.handle(Shape::Polyline {
            path,
            stroke_color: color.to_string(),
            stroke_weight: weight,
        })
    }

    pub fn polygon(
        &self,
        outlines: Vec<Vec<LatLng>>,
        color: &str,
        style: PolygonStyle,
    ) -> LayerHandle {
        self.handle(Shape::Polygon {
            outlines,
            stroke_color: color.to_string(),
            stroke_opacity: style.stroke_opacity,
            stroke_weight: style.stroke_weight,
            fill_color: color.to_string(),
            fill_opacity: style.fill_opacity,
        })
    }
}
