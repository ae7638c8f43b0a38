use crate::canvas::{LayerFactory, LayerHandle};
use crate::config::Icons;
use crate::error::Result;
use crate::types::{Puller, PullerId};

const TRIP_STROKE_WEIGHT: f64 = 1.0;

/// A puller's trip on the map: the path plus a marker at each end.
#[derive(Debug, Clone)]
pub struct PullerOverlay {
    puller: Puller,
    path: LayerHandle,
    start: LayerHandle,
    finish: LayerHandle,
}

impl PullerOverlay {
    pub fn new(factory: &LayerFactory, puller: Puller, color: &str, icons: &Icons) -> Self {
        let path = factory.polyline(
            vec![puller.origin, puller.destination],
            color,
            TRIP_STROKE_WEIGHT,
        );
        let start = factory.marker(puller.origin, &icons.puller_start, true);
        let finish = factory.marker(puller.destination, &icons.puller_finish, true);
        Self {
            puller,
            path,
            start,
            finish,
        }
    }

    pub fn puller(&self) -> &Puller {
        &self.puller
    }

    pub fn id(&self) -> &PullerId {
        &self.puller.id
    }

    fn handles(&self) -> [&LayerHandle; 3] {
        [&self.path, &self.start, &self.finish]
    }

    pub fn draw(&self) -> Result<()> {
        self.handles().into_iter().try_for_each(LayerHandle::show)
    }

    pub fn hide(&self) -> Result<()> {
        self.handles().into_iter().try_for_each(LayerHandle::hide)
    }
}
