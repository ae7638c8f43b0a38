use super::load_config;
use crate::output::{print_json, Align, Table};
use pullmap_core::proximity::DirectionalDistances;
use pullmap_core::types::{DistanceUnit, LatLng, Puller};
use serde::Serialize;
use std::path::Path;

pub struct Trip {
    pub origin: LatLng,
    pub destination: LatLng,
    pub target_origin: Option<LatLng>,
    pub target_destination: Option<LatLng>,
    pub unit: Option<DistanceUnit>,
}

pub fn parse_unit(s: &str) -> Result<DistanceUnit, String> {
    match s {
        "km" | "kilometers" => Ok(DistanceUnit::Kilometers),
        "m" | "meters" => Ok(DistanceUnit::Meters),
        "mi" | "miles" => Ok(DistanceUnit::Miles),
        "deg" | "degrees" => Ok(DistanceUnit::Degrees),
        other => Err(format!("unknown unit '{other}' (expected km, m, mi or deg)")),
    }
}

#[derive(Serialize)]
struct Verdict {
    forward: bool,
    unit: &'static str,
    distances: DirectionalDistances,
}

pub fn run(config_path: Option<&Path>, trip: Trip, json: bool) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let mut targets = config.targets;
    if let Some(o) = trip.target_origin {
        targets.origin = o;
    }
    if let Some(d) = trip.target_destination {
        targets.destination = d;
    }
    let unit = trip.unit.unwrap_or(config.distance_unit);

    let puller = Puller::new("cli", trip.origin, trip.destination);
    let distances = DirectionalDistances::measure(&puller, &targets, unit);
    let verdict = Verdict {
        forward: distances.is_forward(),
        unit: unit.as_str(),
        distances,
    };

    if json {
        return print_json(&verdict);
    }

    let u = verdict.unit;
    let mut table = Table::new(&[("LEG", Align::Left), ("DISTANCE", Align::Right)]);
    for (leg, d) in [
        ("destination → target destination", distances.dest_to_dest),
        ("origin → target destination", distances.origin_to_dest),
        ("origin → target origin", distances.origin_to_origin),
        ("destination → target origin", distances.dest_to_origin),
    ] {
        table.row(vec![leg.to_string(), format!("{d} {u}")]);
    }
    table.print();
    println!();
    if verdict.forward {
        println!("forward facing");
    } else {
        println!("wrong way");
    }
    Ok(())
}
