use std::io::{self, Write};

use anyhow::{Context, Result};
use renderer::{plan_frame, write_snapshot, Antialiasing, FrameRequest, Renderer, RendererConfig};
use sceneconfig::{AntialiasSetting, SceneConfig};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, FrameArgs, RunArgs};
use crate::paths::{AppPaths, ConfigSource};

const DEFAULT_SIZE: (u32, u32) = (1280, 720);

pub fn run(cli: Cli) -> Result<()> {
    initialise_tracing();

    let paths = AppPaths::discover()?;
    tracing::debug!(config = %paths.config_dir().display(), "resolved backdrop paths");
    let source = ConfigSource::resolve(cli.config.as_deref(), &paths);
    let config = load_config(&source)?;

    match cli.command {
        None => run_window(&cli.run, config),
        Some(Command::Snapshot(args)) => {
            let (settings, request) = frame_inputs(&args.frame, config)?;
            write_snapshot(&args.output, &settings, &request)
        }
        Some(Command::Frame(args)) => {
            let (settings, request) = frame_inputs(&args, config)?;
            let (_, frame) = plan_frame(&settings, &request)?;
            let json =
                serde_json::to_string_pretty(&frame).context("failed to serialise frame plan")?;
            println!("{json}");
            Ok(())
        }
        Some(Command::Config) => print_config(&source, &config),
    }
}

fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // stdout carries frame plans and config dumps.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn load_config(source: &ConfigSource) -> Result<SceneConfig> {
    match source.path() {
        Some(path) => {
            let config = SceneConfig::load(path)
                .with_context(|| format!("failed to load configuration {}", path.display()))?;
            tracing::info!(path = %path.display(), "loaded configuration");
            Ok(config)
        }
        None => {
            tracing::debug!("no configuration file found; using defaults");
            Ok(SceneConfig::default())
        }
    }
}

fn run_window(args: &RunArgs, config: SceneConfig) -> Result<()> {
    let renderer_config = renderer_config(args, config)?;
    tracing::info!(
        width = renderer_config.surface_size.0,
        height = renderer_config.surface_size.1,
        fps = ?renderer_config.target_fps,
        antialias = ?renderer_config.antialiasing,
        "starting backdrop"
    );
    let mut renderer = Renderer::new(renderer_config);
    renderer.run()
}

/// CLI flags win over the `[window]` section, which wins over built-in defaults.
fn renderer_config(args: &RunArgs, config: SceneConfig) -> Result<RendererConfig> {
    let window = config.window.clone();
    let run_for = args.run_for.or(config.run_for);
    let settings = config
        .into_settings()
        .context("configuration rejected")?;

    let surface_size = args
        .size
        .or(window.size.map(|[width, height]| (width, height)))
        .unwrap_or(DEFAULT_SIZE);
    let target_fps = args
        .fps
        .or(window.fps)
        .filter(|fps| fps.is_finite() && *fps > 0.0);
    let antialiasing = args
        .antialias
        .or(window.antialias.map(map_antialias))
        .unwrap_or_default();

    Ok(RendererConfig {
        surface_size,
        settings,
        target_fps,
        antialiasing,
        run_for,
        show_window: !args.hidden,
        ..RendererConfig::default()
    })
}

fn frame_inputs(
    args: &FrameArgs,
    config: SceneConfig,
) -> Result<(scene::SceneSettings, FrameRequest)> {
    let window_size = config.window.size.map(|[width, height]| (width, height));
    let settings = config
        .into_settings()
        .context("configuration rejected")?;
    let request = FrameRequest {
        time: args.time,
        pointer: args.pointer,
        size: args.size.or(window_size).unwrap_or(DEFAULT_SIZE),
    };
    Ok((settings, request))
}

fn print_config(source: &ConfigSource, config: &SceneConfig) -> Result<()> {
    config.validate().context("configuration rejected")?;
    let body = config
        .to_toml_string()
        .context("failed to render configuration")?;
    let origin = match source.path() {
        Some(path) => path.display().to_string(),
        None => "built-in defaults".to_string(),
    };

    let mut stdout = io::stdout().lock();
    writeln!(stdout, "# source: {origin}")?;
    write!(stdout, "{body}")?;
    Ok(())
}

fn map_antialias(setting: AntialiasSetting) -> Antialiasing {
    match setting {
        AntialiasSetting::Auto => Antialiasing::Auto,
        AntialiasSetting::Off => Antialiasing::Off,
        AntialiasSetting::Samples2 => Antialiasing::Samples(2),
        AntialiasSetting::Samples4 => Antialiasing::Samples(4),
        AntialiasSetting::Samples8 => Antialiasing::Samples(8),
        AntialiasSetting::Samples16 => Antialiasing::Samples(16),
    }
}
