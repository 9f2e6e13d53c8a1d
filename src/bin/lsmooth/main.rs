//! lsmooth CLI - least-squares Laplacian smoothing of a mesh file.
//!
//! Usage: lsmooth [OPTIONS] <INPUT>
//!
//! The smoothed mesh is written to standard output in the input's format and
//! encoding, or to `--output` with the format taken from its extension. Logging goes
//! to standard error and is controlled with `RUST_LOG`.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use clap::{CommandFactory, Parser};

use lsmooth::algo::smooth::{self, Axis, ConstraintSet, PinnedSample, SmoothOptions};
use lsmooth::algo::Progress;
use lsmooth::io::{self, Format};
use lsmooth::mesh::HalfEdgeMesh;
use lsmooth::MeshError;

#[derive(Parser)]
#[command(name = "lsmooth")]
#[command(author, version, about = "Least-squares Laplacian mesh smoothing", long_about = None)]
struct Cli {
    /// Input mesh file (OBJ, STL or PLY)
    input: Option<PathBuf>,

    /// Write to this file instead of standard output
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Anchor row coefficient
    #[arg(long, default_value = "100.0")]
    scale: f64,

    /// Smoothness row weight
    #[arg(long, default_value = "1.0")]
    weight: f64,

    /// Axes to smooth, e.g. "xz"
    #[arg(long, default_value = "xyz")]
    axes: String,

    /// Pin a vertex to a target value on every smoothed axis (repeatable).
    /// Any pin replaces boundary anchoring.
    #[arg(long = "pin", value_name = "INDEX=VALUE", value_parser = parse_pin)]
    pins: Vec<PinnedSample>,

    /// Solve axes one after another instead of in parallel
    #[arg(long)]
    sequential: bool,

    /// Iteration limit of the sparse solver
    #[arg(long)]
    max_iterations: Option<usize>,

    /// Relative residual tolerance of the sparse solver
    #[arg(long)]
    tolerance: Option<f64>,

    /// Show a progress bar on standard error
    #[arg(long)]
    progress: bool,
}

fn main() {
    init_logger();

    let cli = Cli::parse();
    let stdout = std::io::stdout();
    let mut out = std::io::BufWriter::new(stdout.lock());
    let code = execute(&cli, &mut out, &mut std::io::stderr());
    std::process::exit(code);
}

/// Run the CLI and return the process exit code.
///
/// Without `--output` the mesh goes to `out`. Errors are reported on `stderr`.
fn execute<O: Write, E: Write>(cli: &Cli, out: &mut O, stderr: &mut E) -> i32 {
    let Some(input) = cli.input.as_deref() else {
        let _ = writeln!(stderr, "Error: {}", MeshError::MissingInput);
        let _ = writeln!(stderr, "{}", Cli::command().render_usage());
        return 1;
    };

    match run(cli, input, out) {
        Ok(()) => 0,
        Err(e) => {
            let _ = writeln!(stderr, "Error: {}", e);
            1
        }
    }
}

fn init_logger() {
    let mut builder = env_logger::Builder::new();
    builder.target(env_logger::Target::Stderr);
    builder.filter_level(log::LevelFilter::Warn);
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }

    if let Err(err) = builder.try_init() {
        eprintln!("Failed to initialize logger: {}", err);
    }
}

fn parse_pin(s: &str) -> Result<PinnedSample, String> {
    let (index, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected INDEX=VALUE, got '{}'", s))?;
    let vertex = index
        .trim()
        .parse::<usize>()
        .map_err(|e| format!("invalid vertex index '{}': {}", index, e))?;
    let target = value
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid target '{}': {}", value, e))?;
    Ok(PinnedSample::new(vertex, target))
}

fn options_from(cli: &Cli) -> Result<SmoothOptions, Box<dyn std::error::Error>> {
    let axes = Axis::parse_list(&cli.axes)?;
    let mut options = SmoothOptions::default()
        .with_anchor_scale(cli.scale)
        .with_smoothness_weight(cli.weight)
        .with_axes(&axes)
        .with_parallel(!cli.sequential);

    if let Some(n) = cli.max_iterations {
        options = options.with_max_iterations(n);
    }
    if let Some(tol) = cli.tolerance {
        options = options.with_tolerance(tol);
    }

    options.validate()?;
    Ok(options)
}

fn run<O: Write>(cli: &Cli, input: &Path, out: &mut O) -> Result<(), Box<dyn std::error::Error>> {
    let options = options_from(cli)?;
    let input_format = Format::detect(input)?;

    let (mut mesh, input_encoding): (HalfEdgeMesh, _) = io::load_encoded(input)?;
    log::info!(
        "loaded {} ({:?}): {} vertices, {} faces",
        input.display(),
        input_encoding,
        mesh.num_vertices(),
        mesh.num_faces()
    );

    let constraints = if cli.pins.is_empty() {
        smooth::classify_boundary(&mesh)?
    } else {
        ConstraintSet::pinned(mesh.num_vertices(), cli.pins.iter().copied())?
    };

    let progress = if cli.progress { create_progress() } else { Progress::none() };

    let start = Instant::now();
    smooth::smooth_mesh(&mut mesh, &constraints, &options, &progress)?;
    log::info!("smoothed in {:.2?}", start.elapsed());

    match &cli.output {
        Some(path) => {
            io::save(&mesh, path)?;
            log::info!("saved {}", path.display());
        }
        None => {
            io::write_encoded(&mesh, input_format, input_encoding, out)?;
            out.flush()?;
        }
    }

    Ok(())
}

/// Create a progress reporter that draws a bar on standard error.
fn create_progress() -> Progress {
    // Axes finish out of order when solved in parallel; only ever advance
    let max_percent = Arc::new(AtomicUsize::new(0));

    Progress::new(move |current, total, message| {
        if total == 0 {
            return;
        }

        let raw_percent = if current >= total {
            100
        } else {
            ((current * 100) + (total / 2)) / total
        };

        let previous = max_percent.fetch_max(raw_percent, Ordering::Relaxed);
        if raw_percent <= previous && raw_percent != 100 {
            return;
        }
        let percent = previous.max(raw_percent);

        let bar_width = 30;
        let filled = (percent * bar_width) / 100;
        let bar = "=".repeat(filled);
        let space = " ".repeat(bar_width - filled);

        eprint!("\r[{}{}] {:3}% {}", bar, space, percent, message);
        let _ = std::io::stderr().flush();

        if current >= total {
            eprintln!();
        }
    })
}
