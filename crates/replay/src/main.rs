//! Drowsiness Trace Replay - Main Entry Point
//!
//! Feeds a recorded landmark trace through a single monitoring session and
//! prints one JSON analysis per frame followed by the session summary.

mod trace;

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use dms::{DmsConfig, DrowsinessMonitor, LandmarkScheme};
use storage::Repository;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::trace::{FrameInput, TraceFrame};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Scheme {
    Dlib68,
    Mediapipe468,
}

impl From<Scheme> for LandmarkScheme {
    fn from(s: Scheme) -> Self {
        match s {
            Scheme::Dlib68 => LandmarkScheme::Dlib68,
            Scheme::Mediapipe468 => LandmarkScheme::MediaPipe468,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "dms-replay", version, about = "Replay a landmark trace through the drowsiness monitor")]
struct Args {
    /// Trace file (JSON lines); stdin when omitted
    input: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the eye openness threshold
    #[arg(long)]
    threshold: Option<f32>,

    /// Session owner
    #[arg(long, default_value = "driver")]
    owner: String,

    /// Index layout of `mesh` landmark sets
    #[arg(long, value_enum, default_value_t = Scheme::Dlib68)]
    scheme: Scheme,

    /// Stop at the first malformed line instead of skipping it
    #[arg(long)]
    strict: bool,
}

/// Initialize logging on stderr so stdout stays machine readable
fn init_logging() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .with_writer(io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging()?;

    info!("=== DMS Replay v{} ===", env!("CARGO_PKG_VERSION"));

    let mut config = DmsConfig::load(args.config.as_deref())?;
    if let Some(threshold) = args.threshold {
        config.ear_threshold = threshold;
    }

    let repository = Arc::new(Repository::new());
    let monitor = DrowsinessMonitor::new(config, repository)?;
    let session = monitor.start_session(&args.owner)?;

    let reader: Box<dyn BufRead> = match &args.input {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Failed to open {}", path.display()))?,
        )),
        None => Box::new(io::stdin().lock()),
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let scheme = LandmarkScheme::from(args.scheme);

    for (number, line) in reader.lines().enumerate() {
        let line = line.context("Failed to read trace")?;
        if line.trim().is_empty() {
            continue;
        }

        let frame = match TraceFrame::parse(&line) {
            Ok(frame) => frame,
            Err(e) if !args.strict => {
                warn!("Skipping line {}: {:#}", number + 1, e);
                continue;
            }
            Err(e) => return Err(e.context(format!("line {}", number + 1))),
        };

        let now = frame.timestamp();
        let analysis = match frame.input(scheme) {
            FrameInput::Landmarks(face) => monitor.analyze_landmarks(session, face.as_ref(), now)?,
            FrameInput::Ratio(ratio) => monitor.analyze_ratio(session, Some(ratio), now)?,
        };

        serde_json::to_writer(&mut out, &analysis)?;
        writeln!(out)?;
    }

    let summary = monitor.end_session(session)?;
    serde_json::to_writer(&mut out, &summary)?;
    writeln!(out)?;
    out.flush()?;

    Ok(())
}
