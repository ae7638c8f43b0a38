mod cmd;
mod output;

use clap::{Parser, Subcommand};
use cmd::{config::ConfigSubcommand, SourceArgs};
use pullmap_core::types::{DistanceUnit, LatLng};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "pullmap",
    about = "Stage and play the puller map reveal: routes, corridors, hull, forward-facing pullers",
    version,
    propagate_version = true
)]
struct Cli {
    /// Config file (default: built-in demo settings)
    #[arg(long, global = true, env = "PULLMAP_CONFIG")]
    config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the map and play the reveal in the browser
    Serve {
        /// Port to listen on (0 = OS-assigned)
        #[arg(long, default_value = "0")]
        port: u16,

        /// Open the browser once the server is listening
        #[arg(long)]
        open: bool,

        #[command(flatten)]
        sources: SourceArgs,
    },

    /// Stage the reveal offline and print its timeline
    Plan {
        #[command(flatten)]
        sources: SourceArgs,
    },

    /// Check whether a single trip faces the configured targets
    Classify {
        /// Trip origin as LAT,LNG
        #[arg(long, allow_hyphen_values = true)]
        origin: LatLng,

        /// Trip destination as LAT,LNG
        #[arg(long, allow_hyphen_values = true)]
        destination: LatLng,

        /// Override the target origin
        #[arg(long, allow_hyphen_values = true)]
        target_origin: Option<LatLng>,

        /// Override the target destination
        #[arg(long, allow_hyphen_values = true)]
        target_destination: Option<LatLng>,

        /// Distance unit: km, m, mi or deg
        #[arg(long, value_parser = cmd::classify::parse_unit)]
        unit: Option<DistanceUnit>,
    },

    /// Print route corridors and their hull as GeoJSON
    Hull {
        /// Directions document (file path or http(s) URL)
        #[arg(long, env = "PULLMAP_ROUTES")]
        routes: Option<String>,

        /// Corridor radius in kilometers
        #[arg(long)]
        radius: Option<f64>,
    },

    /// Inspect, validate, or create the config file
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Serve { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.as_deref();

    let result = match cli.command {
        Commands::Serve {
            port,
            open,
            sources,
        } => cmd::serve::run(config_path, &sources, port, open),
        Commands::Plan { sources } => cmd::plan::run(config_path, &sources, cli.json),
        Commands::Classify {
            origin,
            destination,
            target_origin,
            target_destination,
            unit,
        } => cmd::classify::run(
            config_path,
            cmd::classify::Trip {
                origin,
                destination,
                target_origin,
                target_destination,
                unit,
            },
            cli.json,
        ),
        Commands::Hull { routes, radius } => {
            cmd::hull::run(config_path, routes.as_deref(), radius)
        }
        Commands::Config { subcommand } => cmd::config::run(config_path, subcommand, cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
