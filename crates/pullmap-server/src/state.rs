use pullmap_core::canvas::{Canvas, Layer, LayerEvent, Scene};
use pullmap_core::config::Config;
use pullmap_core::error::{PullmapError, Result};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

/// Canvas backed by the browser: keeps the current scene for late joiners
/// and fans every event out to `/api/events` subscribers.
pub struct SceneCanvas {
    scene: Mutex<Scene>,
    event_tx: broadcast::Sender<LayerEvent>,
}

impl SceneCanvas {
    pub fn new() -> Self {
        let (event_tx, _) = broadcast::channel(256);
        Self {
            scene: Mutex::new(Scene::new()),
            event_tx,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LayerEvent> {
        self.event_tx.subscribe()
    }

    /// Visible layers in creation order.
    pub fn snapshot(&self) -> Result<Vec<Layer>> {
        let scene = self
            .scene
            .lock()
            .map_err(|_| PullmapError::Canvas("scene lock poisoned".into()))?;
        Ok(scene.layers().cloned().collect())
    }
}

impl Default for SceneCanvas {
    fn default() -> Self {
        Self::new()
    }
}

impl Canvas for SceneCanvas {
    fn apply(&self, event: LayerEvent) -> Result<()> {
        self.scene
            .lock()
            .map_err(|_| PullmapError::Canvas("scene lock poisoned".into()))?
            .apply(&event);
        // No subscribers is fine; the scene still records the change.
        let _ = self.event_tx.send(event);
        Ok(())
    }
}

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub canvas: Arc<SceneCanvas>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
            canvas: Arc::new(SceneCanvas::new()),
        }
    }
}
