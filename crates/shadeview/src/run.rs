use anyhow::{Context, Result};
use tracing::Dispatch;
use tracing_subscriber::EnvFilter;
use viewer::{Game, LogSink, ViewerConfig};

use crate::cli::Cli;

pub fn run(cli: Cli) -> Result<()> {
    let explicit = cli.config.clone();
    let files = viewconfig::load_layered(explicit.as_deref()).context("failed to load configuration")?;
    let config = files.layer(cli.into_layer()).into_viewer_config();

    let dispatch = initialise_tracing(config.debug);
    tracing::dispatcher::with_default(&dispatch, || preview(&config, LogSink::new(dispatch.clone())))
}

fn preview(config: &ViewerConfig, log: LogSink) -> Result<()> {
    tracing::debug!(
        shader = %config.shader.display(),
        images = config.images.len(),
        background = config.background.is_some(),
        geometry = %config.geometry,
        position = %config.position,
        tps = config.ticks_per_second,
        poll_interval = ?config.poll_interval,
        "resolved configuration"
    );

    let codecs = renderer::codecs(&config.uniforms);
    let game = Game::init(config, codecs, log).context("failed to start the previewer")?;
    tracing::info!(
        shader = %config.shader.display(),
        width = game.geometry().width,
        height = game.geometry().height,
        "watching assets"
    );

    renderer::run(
        game,
        renderer::WindowOptions {
            title: format!("shadeview: {}", config.shader.display()),
            ticks_per_second: config.ticks_per_second,
        },
    )
}

/// Builds the log dispatcher: `info` normally, `RUST_LOG` or `debug` with
/// source locations when `debug` is set.
pub fn initialise_tracing(debug: bool) -> Dispatch {
    let filter = if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::new("info")
    };
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_file(debug)
        .with_line_number(debug)
        .finish();
    Dispatch::new(subscriber)
}
