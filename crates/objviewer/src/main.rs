//! Command line front end.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use glam::DVec3;
use objviewer::{
    init_logging, render_to_file, GeneratorOptions, Scene, SequenceGenerator, SoftwareRenderer,
};
use objviewer_core::{
    axis_angle_to_rotation, load_camera_intrinsics, FailurePolicy, IsolationMode, PoseParseMode,
    PoseSample, ResolutionCheck,
};

/// Render synthetic image sequences of OBJ models.
#[derive(Debug, Parser)]
#[command(name = "objviewer", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Runs a batch script, writing one numbered PNG per pose.
    ///
    /// Each script line holds seven tokens:
    /// `<model.obj> <background> <camera.json> <poses.txt> <blur-sigma> <noise-variance> <output-dir>`.
    /// Output directories are relative to the script.
    Generate(GenerateArgs),

    /// Renders a single frame of a model and saves it.
    Snapshot(SnapshotArgs),
}

#[derive(Debug, Args)]
struct GenerateArgs {
    /// Batch script, one job per line.
    script: PathBuf,

    /// JSON file with generator options; flags below override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Reset the scene before every line instead of carrying state over.
    #[arg(long)]
    strict_isolation: bool,

    /// Continue with the next line when a line fails.
    #[arg(long)]
    skip_failed_lines: bool,

    /// Reject pose files whose rows have different lengths.
    #[arg(long)]
    strict_poses: bool,

    /// Treat a calibration/background size mismatch as a line failure instead of a crash.
    #[arg(long)]
    report_resolution_mismatch: bool,

    /// Seed for the noise generator.
    #[arg(long)]
    seed: Option<u64>,
}

impl GenerateArgs {
    fn options(&self) -> objviewer::Result<GeneratorOptions> {
        let mut options = match &self.config {
            Some(path) => GeneratorOptions::from_json_file(path)?,
            None => GeneratorOptions::default(),
        };
        if self.strict_isolation {
            options.isolation = IsolationMode::StrictIsolation;
        }
        if self.skip_failed_lines {
            options.failure_policy = FailurePolicy::SkipLine;
        }
        if self.strict_poses {
            options.pose_parsing = PoseParseMode::Strict;
        }
        if self.report_resolution_mismatch {
            options.resolution_check = ResolutionCheck::Report;
        }
        if self.seed.is_some() {
            options.noise_seed = self.seed;
        }
        Ok(options)
    }
}

#[derive(Debug, Args)]
struct SnapshotArgs {
    /// OBJ model, unitized on load.
    #[arg(long)]
    model: PathBuf,

    /// Background image; also sets the frame size.
    #[arg(long)]
    background: Option<PathBuf>,

    /// Camera calibration JSON; without it intrinsics come from the frame size.
    #[arg(long)]
    camera: Option<PathBuf>,

    /// Axis-angle rotation vector in radians.
    #[arg(
        long,
        num_args = 3,
        value_names = ["RX", "RY", "RZ"],
        allow_negative_numbers = true,
        action = clap::ArgAction::Set
    )]
    rotation: Option<Vec<f64>>,

    /// Translation applied after the rotation.
    #[arg(
        long,
        num_args = 3,
        value_names = ["TX", "TY", "TZ"],
        allow_negative_numbers = true,
        action = clap::ArgAction::Set
    )]
    translation: Option<Vec<f64>>,

    /// Output image, `.png`, `.jpg` or `.jpeg`.
    #[arg(long, short)]
    output: PathBuf,
}

fn vec3(values: Option<&[f64]>) -> DVec3 {
    match values {
        Some(&[x, y, z]) => DVec3::new(x, y, z),
        _ => DVec3::ZERO,
    }
}

fn generate(args: &GenerateArgs) -> objviewer::Result<ExitCode> {
    let options = args.options()?;
    let mut scene = Scene::default();
    let mut generator = SequenceGenerator::new(SoftwareRenderer::new(), options);
    let report = generator.run(&args.script, &mut scene)?;

    for outcome in &report.outcomes {
        if let Some(e) = outcome.status.error() {
            eprintln!("line {}: {e}", outcome.line);
        }
    }
    Ok(if report.aborted() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn snapshot(args: &SnapshotArgs) -> objviewer::Result<ExitCode> {
    let mut scene = Scene::default();
    scene.load_model(&args.model, true)?;
    if let Some(background) = &args.background {
        scene.load_background(background)?;
    }
    match &args.camera {
        Some(camera) => scene.set_intrinsics(load_camera_intrinsics(camera)?),
        None => scene.reset_projection(),
    }
    if scene.intrinsics().size() != scene.frame_size() {
        log::warn!(
            "camera calibration size {:?} differs from frame size {:?}",
            scene.intrinsics().size(),
            scene.frame_size()
        );
    }

    let pose = PoseSample::new(
        axis_angle_to_rotation(vec3(args.rotation.as_deref())),
        vec3(args.translation.as_deref()),
    );
    render_to_file(&mut SoftwareRenderer::new(), &scene, &pose, &args.output)?;
    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();
    let result = match &cli.command {
        Command::Generate(args) => generate(args),
        Command::Snapshot(args) => snapshot(args),
    };
    match result {
        Ok(code) => code,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
