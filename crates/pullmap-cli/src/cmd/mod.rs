pub mod classify;
pub mod config;
pub mod hull;
pub mod plan;
pub mod serve;

use anyhow::Context;
use clap::Args;
use pullmap_core::config::Config;
use pullmap_core::geometry::Area;
use pullmap_core::source::{PullerClient, PullerSource, RouteLoader, RouteLocation, StaticPullers};
use pullmap_core::types::Puller;
use std::path::{Path, PathBuf};

/// Where routes and pullers come from; overrides the config's `sources`.
#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// Directions document (file path or http(s) URL)
    #[arg(long, env = "PULLMAP_ROUTES")]
    pub routes: Option<String>,

    /// Puller endpoint
    #[arg(long, env = "PULLMAP_PULLERS_URL", conflicts_with = "pullers_file")]
    pub pullers_url: Option<String>,

    /// Read pullers from a JSON dump instead of the endpoint
    #[arg(long)]
    pub pullers_file: Option<PathBuf>,
}

impl SourceArgs {
    pub fn apply(&self, config: &mut Config) {
        if let Some(routes) = &self.routes {
            config.sources.routes = routes.clone();
        }
        if let Some(url) = &self.pullers_url {
            config.sources.pullers_url = url.clone();
        }
    }

    pub fn open(&self, config: &Config) -> anyhow::Result<(RouteLoader, Pullers)> {
        let routes = RouteLoader::new(RouteLocation::parse(&config.sources.routes));
        let pullers = match &self.pullers_file {
            Some(path) => Pullers::File(
                StaticPullers::from_file(path)
                    .with_context(|| format!("failed to read pullers from {}", path.display()))?,
            ),
            None => Pullers::Remote(PullerClient::new(config.sources.pullers_url.clone())),
        };
        Ok((routes, pullers))
    }
}

/// The puller source picked on the command line.
pub enum Pullers {
    Remote(PullerClient),
    File(StaticPullers),
}

impl PullerSource for Pullers {
    async fn pullers(&self, region: Option<&Area>) -> pullmap_core::Result<Vec<Puller>> {
        match self {
            Self::Remote(client) => client.pullers(region).await,
            Self::File(pullers) => pullers.pullers(region).await,
        }
    }
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let config = Config::load_or_default(path).with_context(|| match path {
        Some(p) => format!("failed to load config from {}", p.display()),
        None => "failed to load default config".to_string(),
    })?;
    Ok(config)
}

pub fn current_thread_runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}
