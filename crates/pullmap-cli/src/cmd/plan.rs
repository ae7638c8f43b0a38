use super::{current_thread_runtime, load_config, SourceArgs};
use crate::output::{print_json, Align, Table};
use anyhow::Context;
use pullmap_core::canvas::RecordingCanvas;
use pullmap_core::sequence::ManualScheduler;
use pullmap_core::stage::{prepare, RevealSummary};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

#[derive(Serialize)]
struct TimelineEntry {
    at_ms: u64,
    index: usize,
    label: String,
    ok: bool,
    /// Canvas events emitted so far, including the target markers.
    events: usize,
    visible: usize,
}

#[derive(Serialize)]
struct Plan {
    summary: RevealSummary,
    timeline: Vec<TimelineEntry>,
}

pub fn run(config_path: Option<&Path>, sources: &SourceArgs, json: bool) -> anyhow::Result<()> {
    let mut config = load_config(config_path)?;
    sources.apply(&mut config);
    config.ensure_valid()?;

    let canvas = Arc::new(RecordingCanvas::new());
    let (routes, pullers) = sources.open(&config)?;
    let reveal = current_thread_runtime()?
        .block_on(prepare(&config, canvas.clone(), &routes, &pullers))
        .with_context(|| format!("failed to stage the reveal from {}", routes.location()))?;

    let mut scheduler = ManualScheduler::new();
    reveal
        .sequence
        .play(config.playback.interval(), &mut scheduler);

    let mut timeline = Vec::new();
    while let Some(due) = scheduler.next_due() {
        let fired = scheduler.advance(due.saturating_sub(scheduler.now()));
        let events = canvas.event_count();
        let visible = canvas.scene().len();
        timeline.extend(fired.into_iter().map(|f| TimelineEntry {
            at_ms: f.at.as_millis() as u64,
            index: f.index,
            label: f.label,
            ok: f.ok,
            events,
            visible,
        }));
    }

    if json {
        return print_json(&Plan {
            summary: reveal.summary,
            timeline,
        });
    }

    let s = &reveal.summary;
    println!(
        "{} routes, {} pullers ({} in hull, {} forward)",
        s.routes, s.pullers, s.pullers_in_hull, s.pullers_forward
    );
    println!();
    let mut table = Table::new(&[
        ("OFFSET", Align::Right),
        ("STEP", Align::Left),
        ("STATUS", Align::Left),
        ("EVENTS", Align::Right),
        ("VISIBLE", Align::Right),
    ]);
    for t in &timeline {
        table.row(vec![
            format!("+{}ms", t.at_ms),
            t.label.clone(),
            if t.ok { "ok" } else { "failed" }.to_string(),
            t.events.to_string(),
            t.visible.to_string(),
        ]);
    }
    table.print();
    Ok(())
}
