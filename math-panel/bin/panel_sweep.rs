//! Angle-of-attack sweep on a reference wing
//!
//! Factorises the influence matrix once and evaluates every angle from the
//! unit-mode solution.
//!
//! Usage:
//!   cargo run --release --bin panel-sweep -- --alpha-min -4 --alpha-max 10 --step 2
//!   cargo run --release --bin panel-sweep -- --config analysis.json --output sweep.json

use anyhow::Context;
use clap::{Parser, ValueEnum};
use math_audio_panel::core::mesh::generators::{flat_plate, rectangular_wing};
use math_audio_panel::core::parallel::is_parallel_available;
use math_audio_panel::core::{AnalysisConfig, BoundaryCondition, PanelAnalysis};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "panel-sweep")]
#[command(about = "Angle-of-attack sweep of a rectangular wing with the panel method", long_about = None)]
struct Args {
    /// Path to a JSON analysis configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the sweep as JSON to this file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Reference geometry
    #[arg(long, value_enum, default_value_t = Geometry::Wing)]
    geometry: Geometry,

    /// Chord
    #[arg(long, default_value_t = 1.0)]
    chord: f64,

    /// Span
    #[arg(long, default_value_t = 6.0)]
    span: f64,

    /// Thickness ratio of the thick wing
    #[arg(long, default_value_t = 0.12)]
    thickness: f64,

    /// Chordwise panels
    #[arg(long, default_value_t = 10)]
    nx: usize,

    /// Spanwise panels
    #[arg(long, default_value_t = 12)]
    ny: usize,

    /// First angle of attack (degrees)
    #[arg(long, default_value_t = -4.0, allow_hyphen_values = true)]
    alpha_min: f64,

    /// Last angle of attack (degrees)
    #[arg(long, default_value_t = 10.0, allow_hyphen_values = true)]
    alpha_max: f64,

    /// Angle step (degrees)
    #[arg(long, default_value_t = 2.0)]
    step: f64,

    /// Sideslip (degrees)
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    beta: f64,

    /// Freestream speed
    #[arg(long, default_value_t = 10.0)]
    speed: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Geometry {
    /// Thin flat plate (mid panels)
    Plate,
    /// Thick rectangular wing with closed tips
    Wing,
}

#[derive(Debug, Serialize)]
struct SweepPoint {
    alpha: f64,
    cl: f64,
    cd: f64,
    /// Pitching moment about the reference point over area × chord
    cm: f64,
    cp_min: f64,
}

#[derive(Debug, Serialize)]
struct SweepOutput {
    version: &'static str,
    git_hash: &'static str,
    config: AnalysisConfig,
    reference_area: f64,
    n_panels: usize,
    points: Vec<SweepPoint>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => AnalysisConfig::from_file(path)
            .map_err(anyhow::Error::msg)
            .with_context(|| format!("loading {}", path.display()))?,
        None => AnalysisConfig::default(),
    };

    let wake_length = 50.0 * args.chord;
    let mesh = match args.geometry {
        Geometry::Plate => {
            // thin surfaces always use the Neumann condition
            config.boundary_condition = BoundaryCondition::Neumann;
            flat_plate(args.chord, args.span, args.nx, args.ny, wake_length, 1)
        }
        Geometry::Wing => rectangular_wing(
            args.chord,
            args.span,
            args.thickness,
            args.nx,
            args.ny,
            wake_length,
            1,
        ),
    };
    let reference_area = args.chord * args.span;

    println!(
        "{:?}: {} panels, {} wake panels, aspect ratio {:.2}, {} assembly",
        args.geometry,
        mesh.n_panels(),
        mesh.n_wake_panels(),
        args.span / args.chord,
        if is_parallel_available() { "parallel" } else { "sequential" }
    );

    let analysis = PanelAnalysis::new(config.clone());
    let unit = analysis.solve_unit(&mesh)?;

    let n_steps = ((args.alpha_max - args.alpha_min) / args.step).floor().max(0.0) as usize;
    let mut points = Vec::with_capacity(n_steps + 1);
    println!(
        "{:>8} {:>10} {:>10} {:>10} {:>10}",
        "alpha", "CL", "CD", "Cm", "Cp min"
    );
    for i in 0..=n_steps {
        let alpha = args.alpha_min + i as f64 * args.step;
        let result = unit.operating_point(alpha, args.beta, args.speed)?;
        let (cl, cd) = result.coefficients(reference_area);
        let cm = result.forces.moment.y / (reference_area * args.chord);
        let cp_min = result.cp.iter().copied().fold(f64::INFINITY, f64::min);
        println!(
            "{:>8.2} {:>10.5} {:>10.5} {:>10.5} {:>10.4}",
            alpha, cl, cd, cm, cp_min
        );
        points.push(SweepPoint {
            alpha,
            cl,
            cd,
            cm,
            cp_min,
        });
    }

    if let Some(path) = &args.output {
        let output = SweepOutput {
            version: math_audio_panel::VERSION,
            git_hash: math_audio_panel::GIT_HASH,
            config,
            reference_area,
            n_panels: mesh.n_panels(),
            points,
        };
        std::fs::write(path, serde_json::to_string_pretty(&output)?)
            .with_context(|| format!("writing {}", path.display()))?;
        println!("Saved sweep to {}", path.display());
    }
    Ok(())
}
