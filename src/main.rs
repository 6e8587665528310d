use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::Parser;
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};

use odometry_trail::accumulator::{OdometryAccumulator, SharedAccumulator, StatusReport};
use odometry_trail::backend::{RecordingBackend, RenderBackend, RerunBackend};
use odometry_trail::config::{DisplayConfig, ShapeKind};
use odometry_trail::stream::{self, DriveSummary, CHANNEL_CAPACITY};

#[derive(Parser, Debug)]
#[command(name = "odometry_trail")]
#[command(about = "Replay an odometry log as a decimated pose trail", long_about = None)]
struct Args {
    /// JSON-lines odometry log (.gz accepted)
    #[arg(long)]
    log: PathBuf,

    /// Display configuration JSON; missing fields take defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Rerun recording path
    #[arg(long)]
    output: Option<String>,

    /// Keep the scene in memory instead of writing a recording
    #[arg(long)]
    headless: bool,

    /// Glyph shape (arrow, axes)
    #[arg(long)]
    shape: Option<String>,

    /// Number of retained poses (0 = unbounded)
    #[arg(long)]
    keep: Option<usize>,

    /// Position tolerance in meters
    #[arg(long)]
    position_tolerance: Option<f64>,

    /// Angle tolerance in radians
    #[arg(long)]
    angle_tolerance: Option<f64>,

    /// Hide the covariance overlay
    #[arg(long)]
    no_covariance: bool,

    /// Write the final status report here
    #[arg(long)]
    status: Option<String>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = load_config(&args)?;

    println!("[{}] Odometry Trail Starting", ts_now());
    println!("  Log: {}", args.log.display());
    println!("  Shape: {:?}", config.shape);
    println!("  Keep: {} (0=unbounded)", config.keep);
    println!(
        "  Tolerances: {} m / {} rad",
        config.position_tolerance, config.angle_tolerance
    );
    println!("  Covariance: {}", config.covariance.enabled);

    let (summary, status) = if args.headless {
        run(RecordingBackend::new(), config, &args.log)?
    } else {
        let output = args
            .output
            .clone()
            .unwrap_or_else(|| format!("odometry_sessions/trail_{}.rrd", ts_now_clean()));
        if let Some(dir) = Path::new(&output).parent() {
            fs::create_dir_all(dir)?;
        }
        println!("  Output: {}", output);
        run(RerunBackend::new(&output)?, config, &args.log)?
    };

    println!("[{}] Replay complete", ts_now());
    let report = json!({
        "records": summary,
        "status": status,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);

    if let Some(path) = &args.status {
        status.save(path)?;
        println!("[{}] Status saved to {}", ts_now(), path);
    }
    Ok(())
}

fn load_config(args: &Args) -> Result<DisplayConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str::<DisplayConfig>(&text)?.sanitized()
        }
        None => DisplayConfig::default(),
    };

    if let Some(shape) = &args.shape {
        let shape = match shape.to_ascii_lowercase().as_str() {
            "arrow" => ShapeKind::Arrow,
            "axes" => ShapeKind::Axes,
            other => bail!("unknown shape '{}' (expected arrow or axes)", other),
        };
        config.set_shape(shape);
    }
    if let Some(keep) = args.keep {
        config.set_keep(keep);
    }
    if let Some(meters) = args.position_tolerance {
        config.set_position_tolerance(meters);
    }
    if let Some(radians) = args.angle_tolerance {
        config.set_angle_tolerance(radians);
    }
    if args.no_covariance {
        config.set_covariance_enabled(false);
    }
    Ok(config)
}

fn run<B>(backend: B, config: DisplayConfig, log: &Path) -> Result<(DriveSummary, StatusReport)>
where
    B: RenderBackend + Send + 'static,
{
    let accumulator = SharedAccumulator::new(OdometryAccumulator::new(backend, config));
    let reader = stream::open_log(log)?;
    let (records, handle) = stream::spawn_reader(reader, CHANNEL_CAPACITY);

    let summary = stream::drive(&records, &accumulator)?;
    if handle.join().is_err() {
        bail!("log reader thread panicked");
    }

    let status = accumulator.status()?;
    let retained = accumulator.with(|acc| acc.history().len())?;
    println!(
        "[{}] {} records, {} retained in trail",
        ts_now(),
        summary.records,
        retained
    );
    Ok((summary, status))
}

fn ts_now() -> String {
    Utc::now().format("%H:%M:%S").to_string()
}

fn ts_now_clean() -> String {
    Utc::now().format("%Y%m%d_%H%M%S").to_string()
}
