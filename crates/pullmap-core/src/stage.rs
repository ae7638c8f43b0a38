//! Staging of the reveal.
//!
//! Fetches routes and pullers, builds every layer up front, and queues the
//! steps that show or hide them:
//!
//! 1. draw pullers
//! 2. draw route `i` (one step per route)
//! 3. draw corridor `i` (one step per route)
//! 4. draw hull
//! 5. hide pullers outside hull
//! 6. hide wrong-way pullers
//!
//! The two target markers are shown immediately, before anything is queued.

use crate::canvas::{Canvas, LayerFactory, PolygonStyle};
use crate::config::Config;
use crate::error::Result;
use crate::geometry::{convex_hull, corridor, route_waypoints, Area};
use crate::overlay::PullerOverlay;
use crate::proximity::filter_forward;
use crate::sequence::{Sequence, TokioScheduler};
use crate::source::{PullerSource, RouteSource};
use crate::types::{DirectionsDocument, LatLng, PullerId};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;

/// Counts describing a staged reveal.
#[derive(Debug, Clone, Serialize)]
pub struct RevealSummary {
    pub prepared_at: DateTime<Utc>,
    pub routes: usize,
    pub pullers: usize,
    pub pullers_in_hull: usize,
    pub pullers_forward: usize,
    pub hidden_outside_hull: usize,
    pub hidden_wrong_way: usize,
    pub steps: Vec<String>,
}

/// What happened when a reveal was played on the Tokio clock.
#[derive(Debug, Clone, Serialize)]
pub struct PlaybackReport {
    pub summary: RevealSummary,
    pub scheduled: usize,
    pub completed: usize,
}

/// A staged reveal, ready to play.
pub struct Reveal {
    pub sequence: Sequence,
    pub summary: RevealSummary,
    pub corridors: Vec<Area>,
    pub hull: Area,
}

/// Corridors and hull for every route in `doc`, without touching a canvas.
pub fn corridors_for(
    doc: &DirectionsDocument,
    radius_km: f64,
) -> Result<(Vec<Vec<LatLng>>, Vec<Area>, Area)> {
    let waypoints: Vec<Vec<LatLng>> = doc
        .routes
        .iter()
        .enumerate()
        .map(|(i, r)| route_waypoints(i, r))
        .collect::<Result<_>>()?;
    let corridors: Vec<Area> = waypoints
        .iter()
        .map(|w| corridor(w, radius_km))
        .collect::<Result<_>>()?;
    let hull = convex_hull(&corridors)?;
    Ok((waypoints, corridors, hull))
}

pub async fn prepare<R, P>(
    config: &Config,
    canvas: Arc<dyn Canvas>,
    routes: &R,
    pullers: &P,
) -> Result<Reveal>
where
    R: RouteSource + Sync,
    P: PullerSource + Sync,
{
    let factory = LayerFactory::new(canvas);
    factory
        .marker(config.targets.origin, &config.icons.origin, false)
        .show()?;
    factory
        .marker(config.targets.destination, &config.icons.destination, false)
        .show()?;

    let directions = routes.directions().await?;
    let initial = pullers.pullers(None).await?;
    tracing::info!(
        routes = directions.routes.len(),
        pullers = initial.len(),
        "fetched route and puller data"
    );

    let mut sequence = Sequence::new();

    let overlays: Arc<Vec<PullerOverlay>> = Arc::new(
        initial
            .into_iter()
            .map(|p| PullerOverlay::new(&factory, p, &config.style.puller_color, &config.icons))
            .collect(),
    );
    {
        let overlays = Arc::clone(&overlays);
        sequence.append_named("draw pullers", move || {
            overlays.iter().try_for_each(PullerOverlay::draw)
        });
    }

    let (waypoints, corridors, hull) = corridors_for(&directions, config.corridor_radius_km)?;

    for (i, points) in waypoints.into_iter().enumerate() {
        let line = factory.polyline(points, config.style.route_color(i), config.style.route_weight);
        sequence.append_named(format!("draw route {i}"), move || line.show());
    }

    for (i, area) in corridors.iter().enumerate() {
        let poly = factory.polygon(
            area.outlines(),
            config.style.route_color(i),
            PolygonStyle::default(),
        );
        sequence.append_named(format!("draw corridor {i}"), move || poly.show());
    }

    let hull_layer = factory.polygon(
        hull.outlines(),
        &config.style.hull_color,
        PolygonStyle::default(),
    );
    sequence.append_named("draw hull", move || hull_layer.show());
    tracing::info!(corridors = corridors.len(), "computed corridors and hull");

    let in_hull = pullers.pullers(Some(&hull)).await?;
    let in_hull_ids: HashSet<&PullerId> = in_hull.iter().map(|p| &p.id).collect();
    let outside: Vec<PullerOverlay> = overlays
        .iter()
        .filter(|o| !in_hull_ids.contains(o.id()))
        .cloned()
        .collect();
    let hidden_outside_hull = outside.len();
    sequence.append_named("hide pullers outside hull", move || {
        outside.iter().try_for_each(PullerOverlay::hide)
    });

    let forward = filter_forward(&in_hull, &config.targets, config.distance_unit);
    let forward_ids: HashSet<&PullerId> = forward.iter().map(|p| &p.id).collect();
    let wrong_way: Vec<PullerOverlay> = overlays
        .iter()
        .filter(|o| !forward_ids.contains(o.id()))
        .cloned()
        .collect();
    let hidden_wrong_way = wrong_way.len();
    sequence.append_named("hide wrong-way pullers", move || {
        wrong_way.iter().try_for_each(PullerOverlay::hide)
    });

    let summary = RevealSummary {
        prepared_at: Utc::now(),
        routes: directions.routes.len(),
        pullers: overlays.len(),
        pullers_in_hull: in_hull.len(),
        pullers_forward: forward.len(),
        hidden_outside_hull,
        hidden_wrong_way,
        steps: sequence.labels().map(str::to_string).collect(),
    };
    tracing::info!(
        steps = summary.steps.len(),
        in_hull = summary.pullers_in_hull,
        forward = summary.pullers_forward,
        "reveal staged"
    );

    Ok(Reveal {
        sequence,
        summary,
        corridors,
        hull,
    })
}

/// Stage the reveal, wait out the configured start delay, then play every
/// step on a [`TokioScheduler`] and wait for the last one.
pub async fn stage_and_play<R, P>(
    config: &Config,
    canvas: Arc<dyn Canvas>,
    routes: &R,
    pullers: &P,
) -> Result<PlaybackReport>
where
    R: RouteSource + Sync,
    P: PullerSource + Sync,
{
    let reveal = prepare(config, canvas, routes, pullers).await?;

    tokio::time::sleep(config.playback.start_delay()).await;

    let mut scheduler = TokioScheduler::new();
    let scheduled = reveal
        .sequence
        .play(config.playback.interval(), &mut scheduler);
    let completed = scheduler.finish().await;
    if completed < scheduled {
        tracing::warn!(completed, scheduled, "reveal finished with failed steps");
    } else {
        tracing::info!(steps = scheduled, "reveal finished");
    }

    Ok(PlaybackReport {
        summary: reveal.summary,
        scheduled,
        completed,
    })
}
