//! `pullmap-core`: staging and playback of the route/puller reveal.
//!
//! ```text
//! RouteSource ─┐
//!              ├─ stage::prepare ──► Sequence ──play──► Scheduler ──► Canvas
//! PullerSource ┘        │
//!                       └─ geometry (corridors, hull) + proximity filter
//! ```

pub mod canvas;
pub mod config;
pub mod error;
pub mod geometry;
pub mod overlay;
pub mod proximity;
pub mod sequence;
pub mod source;
pub mod stage;
pub mod types;

pub use error::{PullmapError, Result};
