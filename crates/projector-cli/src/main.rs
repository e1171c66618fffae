mod input;

use std::fs;
use std::io::Read;
use std::path::PathBuf;

use clap::Parser;
use projector_core::{Projector, ProjectorConfig};
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use input::{parse_vectors, InputError};

#[derive(Parser, Debug)]
#[command(name = "projector")]
#[command(about = "Project a stream of high-dimensional vectors onto the plane")]
#[command(version)]
struct Args {
    /// Vector file, one vector per line (stdin when absent)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Projection method (coordinate, pca, sammon, nn_subspace, triangulate)
    #[arg(short, long)]
    method: Option<String>,

    /// Duplicate tolerance (negative disables the check)
    #[arg(long, allow_hyphen_values = true)]
    tolerance: Option<f64>,

    /// Optimization steps after each added vector
    #[arg(long, default_value = "0")]
    iterations: usize,

    /// Optimization steps after the last vector
    #[arg(long, default_value = "0")]
    final_iterations: usize,

    /// Log filter when RUST_LOG is unset (a level such as `debug`, or
    /// directives like `projector_core=trace`)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[derive(Debug, Serialize)]
struct Report {
    method: String,
    dimensions: usize,
    n_points: usize,
    rejected: usize,
    error: f64,
    projections: Vec<[f64; 2]>,
}

fn load_config(args: &Args) -> Result<ProjectorConfig, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => ProjectorConfig::from_json(&fs::read_to_string(path)?)?,
        None => ProjectorConfig::default(),
    };
    if let Some(method) = &args.method {
        config.method = method.parse()?;
    }
    if let Some(tolerance) = args.tolerance {
        config.tolerance = tolerance;
    }
    config.validate()?;
    Ok(config)
}

/// `RUST_LOG` wins over `--log-level`; an unparsable level falls back to warn.
fn log_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("warn"))
}

fn read_input(args: &Args) -> std::io::Result<String> {
    match &args.input {
        Some(path) => fs::read_to_string(path),
        None => {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            Ok(text)
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    FmtSubscriber::builder()
        .with_env_filter(log_filter(&args.log_level))
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    let config = load_config(&args)?;
    let vectors = parse_vectors(&read_input(&args)?)?;
    let dimensions = vectors.first().map(Vec::len).ok_or(InputError::Empty)?;
    info!(dimensions, vectors = vectors.len(), method = %config.method, "projecting");

    let mut projector = Projector::new(dimensions, config)?;
    let mut rejected = 0;
    for vector in vectors {
        if !projector.add_datapoint(vector)? {
            rejected += 1;
        }
        if args.iterations > 0 {
            projector.iterate(args.iterations)?;
        }
    }
    let error = projector.iterate(args.final_iterations)?;
    debug!(rejected, error, "done");

    let report = Report {
        method: projector.method().to_string(),
        dimensions,
        n_points: projector.len(),
        rejected,
        error,
        projections: projector.coordinates(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
