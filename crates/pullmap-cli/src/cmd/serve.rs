use super::{current_thread_runtime, load_config, SourceArgs};
use anyhow::Context;
use pullmap_core::canvas::Canvas;
use pullmap_core::config::Config;
use pullmap_core::stage::stage_and_play;
use pullmap_server::AppState;
use std::path::Path;
use std::sync::Arc;

pub fn run(
    config_path: Option<&Path>,
    sources: &SourceArgs,
    port: u16,
    open: bool,
) -> anyhow::Result<()> {
    let mut config = load_config(config_path)?;
    sources.apply(&mut config);
    config.ensure_valid()?;

    let rt = current_thread_runtime()?;
    rt.block_on(async move {
        let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await?;
        let actual_port = listener.local_addr()?.port();
        println!("pullmap map at http://localhost:{actual_port}");

        let state = AppState::new(config.clone());
        let canvas: Arc<dyn Canvas> = state.canvas.clone();
        let server = tokio::spawn(pullmap_server::serve_on(state, listener, open));

        let run = async move {
            play(&config, canvas, sources).await?;
            server.await??;
            Ok::<_, anyhow::Error>(())
        };

        tokio::select! {
            res = run => res,
            _ = tokio::signal::ctrl_c() => Ok(()),
        }
    })
}

async fn play(
    config: &Config,
    canvas: Arc<dyn Canvas>,
    sources: &SourceArgs,
) -> anyhow::Result<()> {
    let (routes, pullers) = sources.open(config)?;
    stage_and_play(config, canvas, &routes, &pullers)
        .await
        .with_context(|| format!("failed to stage the reveal from {}", routes.location()))?;
    Ok(())
}
