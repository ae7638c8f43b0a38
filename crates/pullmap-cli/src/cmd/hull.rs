use super::{current_thread_runtime, load_config};
use anyhow::Context;
use geojson::FeatureCollection;
use pullmap_core::source::{RouteLoader, RouteLocation, RouteSource};
use pullmap_core::stage::corridors_for;
use std::path::Path;

pub fn run(
    config_path: Option<&Path>,
    routes: Option<&str>,
    radius: Option<f64>,
) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let location = RouteLocation::parse(routes.unwrap_or(&config.sources.routes));
    let radius_km = radius.unwrap_or(config.corridor_radius_km);

    let loader = RouteLoader::new(location);
    let doc = current_thread_runtime()?
        .block_on(loader.directions())
        .with_context(|| format!("failed to load routes from {}", loader.location()))?;
    let (_, corridors, hull) = corridors_for(&doc, radius_km)?;

    let mut features: Vec<geojson::Feature> = corridors
        .iter()
        .enumerate()
        .map(|(i, area)| {
            let mut f = area.to_feature("corridor");
            f.set_property("route", i);
            f
        })
        .collect();
    features.push(hull.to_feature("hull"));

    let collection: FeatureCollection = features.into_iter().collect();
    println!("{}", serde_json::to_string_pretty(&collection)?);
    Ok(())
}
