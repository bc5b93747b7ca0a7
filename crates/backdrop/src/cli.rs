use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use renderer::Antialiasing;

#[derive(Parser, Debug)]
#[command(
    name = "backdrop",
    author,
    version,
    about = "Animated dark-liquid background with a floating metallic solid"
)]
pub struct Cli {
    /// Configuration file; defaults to `backdrop.toml` in the config directory.
    #[arg(long, value_name = "PATH", global = true, env = "BACKDROP_CONFIG")]
    pub config: Option<PathBuf>,
    #[command(flatten)]
    pub run: RunArgs,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Window size in pixels (e.g. `1280x720`).
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_size)]
    pub size: Option<(u32, u32)>,

    /// Optional FPS cap (0 = every vsync).
    #[arg(long, value_name = "FPS")]
    pub fps: Option<f32>,

    /// Anti-aliasing policy: `auto`, `off`, or an explicit MSAA sample count (e.g. `4`).
    #[arg(long, value_name = "MODE", value_parser = parse_antialias)]
    pub antialias: Option<Antialiasing>,

    /// Unmount and exit after this long (e.g. `30s`, `2m`).
    #[arg(long, value_name = "DURATION", value_parser = parse_duration)]
    pub run_for: Option<Duration>,

    /// Create the window without showing it.
    #[arg(long)]
    pub hidden: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Render the field layer of one frame to a PNG without a GPU.
    Snapshot(SnapshotArgs),
    /// Print one frame's draw plan as JSON.
    Frame(FrameArgs),
    /// Print the resolved configuration and where it came from.
    Config,
}

#[derive(Args, Debug)]
pub struct SnapshotArgs {
    /// Destination PNG file.
    #[arg(value_name = "OUT")]
    pub output: PathBuf,
    #[command(flatten)]
    pub frame: FrameArgs,
}

#[derive(Args, Debug, Default)]
pub struct FrameArgs {
    /// Elapsed seconds to evaluate the scene at.
    #[arg(long, value_name = "SECONDS", default_value_t = 0.0)]
    pub time: f64,

    /// Resting pointer position in normalized device coordinates (e.g. `0.5,-0.25`).
    #[arg(long, value_name = "X,Y", value_parser = parse_pointer, allow_hyphen_values = true)]
    pub pointer: Option<(f64, f64)>,

    /// Surface size in pixels (e.g. `1920x1080`).
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_size)]
    pub size: Option<(u32, u32)>,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_size(value: &str) -> Result<(u32, u32), String> {
    let trimmed = value.trim();
    let (width, height) = trimmed
        .split_once(['x', 'X', '×'])
        .ok_or_else(|| "expected WxH format, e.g. 1920x1080".to_string())?;

    let width: u32 = width
        .trim()
        .parse()
        .map_err(|_| format!("invalid width '{width}' in size specification"))?;
    let height: u32 = height
        .trim()
        .parse()
        .map_err(|_| format!("invalid height '{height}' in size specification"))?;

    if width == 0 || height == 0 {
        return Err("surface dimensions must be greater than zero".to_string());
    }

    Ok((width, height))
}

pub fn parse_pointer(value: &str) -> Result<(f64, f64), String> {
    let (x, y) = value
        .trim()
        .split_once(',')
        .ok_or_else(|| "expected X,Y, e.g. 0.5,-0.25".to_string())?;
    let parse = |raw: &str| -> Result<f64, String> {
        let parsed: f64 = raw
            .trim()
            .parse()
            .map_err(|_| format!("invalid pointer coordinate '{}'", raw.trim()))?;
        if !parsed.is_finite() {
            return Err(format!("pointer coordinate '{}' must be finite", raw.trim()));
        }
        Ok(parsed)
    };
    Ok((parse(x)?, parse(y)?))
}

pub fn parse_duration(value: &str) -> Result<Duration, String> {
    let trimmed = value.trim();
    if let Ok(seconds) = trimmed.parse::<f64>() {
        if seconds.is_finite() && seconds > 0.0 {
            return Ok(Duration::from_secs_f64(seconds));
        }
        return Err("duration must be greater than zero".to_string());
    }
    match humantime::parse_duration(trimmed) {
        Ok(duration) if !duration.is_zero() => Ok(duration),
        Ok(_) => Err("duration must be greater than zero".to_string()),
        Err(err) => Err(format!("invalid duration '{trimmed}': {err}")),
    }
}

pub fn parse_antialias(value: &str) -> Result<Antialiasing, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("anti-alias mode must not be empty".to_string());
    }

    let normalized = trimmed.to_ascii_lowercase();
    match normalized.as_str() {
        "auto" | "max" | "default" => Ok(Antialiasing::Auto),
        "off" | "none" | "disable" | "disabled" | "0" => Ok(Antialiasing::Off),
        _ => {
            let samples: u32 = normalized.parse().map_err(|_| {
                format!("invalid anti-alias sample count '{trimmed}'; use auto/off or 2/4/8/16")
            })?;

            if samples == 1 {
                return Ok(Antialiasing::Off);
            }

            if !matches!(samples, 2 | 4 | 8 | 16) {
                return Err(format!(
                    "unsupported sample count {samples}; supported values are 2, 4, 8, or 16"
                ));
            }

            Ok(Antialiasing::Samples(samples))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sizes() {
        assert_eq!(parse_size("1920x1080"), Ok((1920, 1080)));
        assert_eq!(parse_size(" 800 X 600 "), Ok((800, 600)));
        assert!(parse_size("0x600").is_err());
        assert!(parse_size("800").is_err());
        assert!(parse_size("axb").is_err());
    }

    #[test]
    fn parses_pointer_pairs() {
        assert_eq!(parse_pointer("0.5,-0.25"), Ok((0.5, -0.25)));
        assert_eq!(parse_pointer(" 1 , 1 "), Ok((1.0, 1.0)));
        assert!(parse_pointer("0.5").is_err());
        assert!(parse_pointer("NaN,0").is_err());
    }

    #[test]
    fn parses_durations() {
        assert_eq!(parse_duration("30s"), Ok(Duration::from_secs(30)));
        assert_eq!(parse_duration("1.5"), Ok(Duration::from_millis(1500)));
        assert!(parse_duration("0").is_err());
        assert!(parse_duration("later").is_err());
    }

    #[test]
    fn parses_antialias_modes() {
        assert_eq!(parse_antialias("auto"), Ok(Antialiasing::Auto));
        assert_eq!(parse_antialias("OFF"), Ok(Antialiasing::Off));
        assert_eq!(parse_antialias("4"), Ok(Antialiasing::Samples(4)));
        assert!(parse_antialias("3").is_err());
    }

    #[test]
    fn subcommands_parse() {
        let cli = Cli::try_parse_from([
            "backdrop", "frame", "--time", "2", "--pointer", "-0.5,0.5", "--size", "640x480",
        ])
        .unwrap();
        match cli.command {
            Some(Command::Frame(args)) => {
                assert_eq!(args.time, 2.0);
                assert_eq!(args.pointer, Some((-0.5, 0.5)));
                assert_eq!(args.size, Some((640, 480)));
            }
            other => panic!("unexpected command {other:?}"),
        }

        let cli = Cli::try_parse_from(["backdrop", "--fps", "30", "--run-for", "10s", "--hidden"])
            .unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.run.fps, Some(30.0));
        assert_eq!(cli.run.run_for, Some(Duration::from_secs(10)));
        assert!(cli.run.hidden);
    }
}
