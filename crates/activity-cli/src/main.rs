//! `activity` CLI — compute on/off and active-label timelines from JSON spans.
//!
//! ## Usage
//!
//! ```sh
//! # On/off timeline (stdin → stdout)
//! echo '{"start":"2000-01-02T03:04:00Z","end":"2000-01-02T03:08:00Z",
//!        "spans":[{"start":"2000-01-02T03:05:00Z","end":"2000-01-02T03:07:00Z"}]}' \
//!   | activity flag
//!
//! # Who is on call, from file to file
//! activity labels -i shifts.json -o oncall.json
//!
//! # Only the ticks where something changed (plus the first and last)
//! activity labels -i shifts.json --changes-only
//!
//! # Override the request's step
//! activity labels -i shifts.json --step-seconds 900
//! ```
//!
//! Logging goes to stderr and is controlled by `RUST_LOG` (default `warn`).

use activity_engine::{
    flag_timeline, label_timeline, LabeledSpan, Span, SpanPool, TickRange, WalkConfig,
};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::io::{self, Read};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "activity",
    version,
    about = "Merge time spans into on/off and active-label timelines"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge spans into a single on/off timeline
    Flag(WalkArgs),
    /// Merge labeled spans into an active-label timeline
    Labels(WalkArgs),
}

#[derive(Args)]
struct WalkArgs {
    /// Input request file (reads from stdin if omitted)
    #[arg(short, long)]
    input: Option<String>,
    /// Output file (writes to stdout if omitted)
    #[arg(short, long)]
    output: Option<String>,
    /// Keep only samples whose state changed, plus the first and last
    #[arg(long)]
    changes_only: bool,
    /// Override the request's step_seconds
    #[arg(long)]
    step_seconds: Option<i64>,
}

/// A walk request: the range fields of [`WalkConfig`] plus the spans to merge.
#[derive(Deserialize)]
#[serde(bound(deserialize = "S: Deserialize<'de>"))]
struct Request<S> {
    #[serde(flatten)]
    config: WalkConfig,
    #[serde(default)]
    spans: Vec<S>,
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let pool = SpanPool::new();

    match cli.command {
        Commands::Flag(args) => {
            let (range, spans) = load_request::<Span>(&args)?;
            let samples = flag_timeline(range, &spans, &pool)
                .context("Failed to compute flag timeline")?;
            let samples = filter_changes(samples, args.changes_only, |s| s.changed);
            write_json(args.output.as_deref(), &samples)?;
        }
        Commands::Labels(args) => {
            let (range, spans) = load_request::<LabeledSpan>(&args)?;
            let samples = label_timeline(range, &spans, &pool)
                .context("Failed to compute label timeline")?;
            let samples = filter_changes(samples, args.changes_only, |s| s.changed);
            write_json(args.output.as_deref(), &samples)?;
        }
    }

    Ok(())
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn load_request<S: DeserializeOwned>(args: &WalkArgs) -> Result<(TickRange, Vec<S>)> {
    let raw = read_input(args.input.as_deref())?;
    let mut request: Request<S> =
        serde_json::from_str(&raw).context("Failed to parse walk request")?;

    if let Some(step) = args.step_seconds {
        request.config.step_seconds = step;
    }
    let range = request
        .config
        .range()
        .context("Invalid walk configuration")?;

    info!(
        start = %range.start(),
        end = %range.end(),
        step_seconds = range.step_seconds(),
        spans = request.spans.len(),
        "walking"
    );
    Ok((range, request.spans))
}

/// Drop unchanged samples when `changes_only` is set. The first and last samples
/// are always kept so the output still covers the whole range.
fn filter_changes<T>(samples: Vec<T>, changes_only: bool, changed: impl Fn(&T) -> bool) -> Vec<T> {
    if !changes_only {
        return samples;
    }

    let last = samples.len().saturating_sub(1);
    let kept: Vec<T> = samples
        .into_iter()
        .enumerate()
        .filter(|(i, s)| *i == 0 || *i == last || changed(s))
        .map(|(_, s)| s)
        .collect();
    debug!(kept = kept.len(), "filtered unchanged samples");
    kept
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

fn write_json<T: Serialize>(path: Option<&str>, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    match path {
        Some(path) => {
            std::fs::write(path, json).with_context(|| format!("Failed to write file: {}", path))?;
        }
        None => {
            println!("{}", json);
        }
    }
    Ok(())
}
