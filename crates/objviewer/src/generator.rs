//! The sequence generator: runs a batch script through a [`Renderer`].
//!
//! Each script line moves through
//! `Idle -> ParsingLine -> LoadingScene -> RenderingFrames -> LineComplete`.
//!
//! **A failed line aborts the whole batch by default.** Any load failure
//! (model, background, calibration, poses) or output failure stops the loop;
//! later lines are never read. Frames already written stay on disk.
//! [`FailurePolicy::SkipLine`] continues with the next line instead.
//!
//! The [`Scene`] is shared by all lines. By default whatever one line loads
//! stays visible to the next (a line that fails half way leaves its partial
//! state behind); [`IsolationMode::StrictIsolation`] clears the scene before
//! every line.
//!
//! After the last line, once, the generator reloads the last named model with
//! unitization, restores the scene's offset pose and clip planes and renders
//! one frame at the identity pose, which hands the scene back ready for
//! interactive use.

use std::path::{Path, PathBuf};

use objviewer_core::fs::{create_directories, zero_pad_number};
use objviewer_core::rotation::is_rotation;
use objviewer_core::{
    load_camera_intrinsics, load_pose_matrix, ClipPlanes, FailurePolicy, GeneratorOptions,
    IsolationMode, OffsetPose, PoseSample, ResolutionCheck,
};
use objviewer_render::{save_image, Degrader, Renderer, Scene};

use crate::batch::BatchJobLine;
use crate::error::{GeneratorError, Result};
use crate::progress::{LogProgress, ProgressReport, ProgressSink};

/// Rotations further than this from orthonormal are reported.
const ROTATION_TOLERANCE: f64 = 1e-6;

/// Where the generator is in the current line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GeneratorState {
    #[default]
    Idle,
    ParsingLine,
    LoadingScene,
    RenderingFrames {
        frame: usize,
        total: usize,
    },
    LineComplete,
    /// Terminal state of a batch stopped by a failed line.
    Aborted,
}

/// How one script line ended.
#[derive(Debug)]
pub enum LineStatus {
    Succeeded,
    /// The line failed and no further lines were processed.
    FailedBatchAborted(GeneratorError),
    /// The line failed and the batch moved on.
    FailedLineSkipped(GeneratorError),
}

impl LineStatus {
    /// The failure, if the line failed.
    pub fn error(&self) -> Option<&GeneratorError> {
        match self {
            Self::Succeeded => None,
            Self::FailedBatchAborted(e) | Self::FailedLineSkipped(e) => Some(e),
        }
    }
}

/// Result of one script line.
#[derive(Debug)]
pub struct LineOutcome {
    /// 1-based line number in the script.
    pub line: usize,
    pub status: LineStatus,
    /// Frames written before the line finished or failed.
    pub frames_written: usize,
}

/// Outcomes of every processed, non-blank line, in script order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<LineOutcome>,
}

impl BatchReport {
    /// Whether a failed line stopped the batch.
    pub fn aborted(&self) -> bool {
        self.outcomes
            .iter()
            .any(|o| matches!(o.status, LineStatus::FailedBatchAborted(_)))
    }

    /// Total frames written over all lines.
    pub fn frames_written(&self) -> usize {
        self.outcomes.iter().map(|o| o.frames_written).sum()
    }

    /// Number of lines that completed.
    pub fn succeeded(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, LineStatus::Succeeded))
            .count()
    }

    /// Number of lines that failed.
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }
}

/// Scene state the batch replaces while it runs.
struct SavedView {
    offset: OffsetPose,
    clip_planes: ClipPlanes,
}

/// Runs batch scripts, writing one numbered image per pose.
pub struct SequenceGenerator<R, P = LogProgress> {
    renderer: R,
    progress: P,
    options: GeneratorOptions,
    state: GeneratorState,
}

impl<R: Renderer> SequenceGenerator<R, LogProgress> {
    /// Creates a generator that logs its progress.
    pub fn new(renderer: R, options: GeneratorOptions) -> Self {
        Self::with_progress(renderer, LogProgress, options)
    }
}

impl<R: Renderer, P: ProgressSink> SequenceGenerator<R, P> {
    /// Creates a generator reporting progress to `progress`.
    pub fn with_progress(renderer: R, progress: P, options: GeneratorOptions) -> Self {
        Self {
            renderer,
            progress,
            options,
            state: GeneratorState::Idle,
        }
    }

    /// Current state.
    pub fn state(&self) -> GeneratorState {
        self.state
    }

    /// Options in use.
    pub fn options(&self) -> &GeneratorOptions {
        &self.options
    }

    /// The renderer.
    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    /// Returns the renderer and the progress sink.
    pub fn into_parts(self) -> (R, P) {
        (self.renderer, self.progress)
    }

    /// Reads and runs the batch script at `script`.
    ///
    /// Only invalid options or an unreadable script are errors; line failures
    /// are reported in the returned [`BatchReport`].
    ///
    /// # Panics
    ///
    /// With [`ResolutionCheck::Fatal`], panics when a calibration file's
    /// image size differs from the line's background image.
    pub fn run(&mut self, script: &Path, scene: &mut Scene) -> Result<BatchReport> {
        self.options.validate()?;
        let text =
            std::fs::read_to_string(script).map_err(|source| GeneratorError::BatchScript {
                path: script.to_path_buf(),
                source,
            })?;
        let script_dir = script.parent().unwrap_or_else(|| Path::new(""));
        log::info!("running batch script {}", script.display());
        Ok(self.run_script(&text, script_dir, scene))
    }

    /// Runs the lines of a batch script; output directories resolve against
    /// `script_dir`.
    ///
    /// # Panics
    ///
    /// See [`SequenceGenerator::run`].
    pub fn run_script(&mut self, text: &str, script_dir: &Path, scene: &mut Scene) -> BatchReport {
        let saved = SavedView {
            offset: scene.offset,
            clip_planes: scene.clip_planes(),
        };
        self.prepare_scene(scene);

        let mut report = BatchReport::default();
        let mut last_model: Option<PathBuf> = None;

        for (index, raw) in text.lines().enumerate() {
            let line = index + 1;
            self.state = GeneratorState::ParsingLine;
            let mut frames_written = 0;

            let result = match BatchJobLine::parse(line, raw, script_dir) {
                Ok(None) => continue,
                Ok(Some(job)) => {
                    last_model = Some(job.model.clone());
                    if self.options.isolation == IsolationMode::StrictIsolation {
                        scene.clear();
                        self.prepare_scene(scene);
                    }
                    self.process_line(&job, scene, &mut frames_written)
                }
                Err(e) => Err(e),
            };

            let status = match result {
                Ok(()) => {
                    log::info!("batch line {line} done, {frames_written} frames");
                    LineStatus::Succeeded
                }
                Err(e) => match self.options.failure_policy {
                    FailurePolicy::AbortBatch => {
                        log::error!("batch line {line} failed, aborting batch: {e}");
                        LineStatus::FailedBatchAborted(e)
                    }
                    FailurePolicy::SkipLine => {
                        log::warn!("batch line {line} failed, skipping: {e}");
                        LineStatus::FailedLineSkipped(e)
                    }
                },
            };
            let abort = matches!(status, LineStatus::FailedBatchAborted(_));
            report.outcomes.push(LineOutcome {
                line,
                status,
                frames_written,
            });
            if abort {
                break;
            }
        }

        self.finish(scene, last_model.as_deref(), &saved);
        self.state = if report.aborted() {
            GeneratorState::Aborted
        } else {
            GeneratorState::Idle
        };
        log::info!(
            "batch finished: {} lines succeeded, {} failed, {} frames written",
            report.succeeded(),
            report.failed(),
            report.frames_written()
        );
        report
    }

    /// Poses act in the model's own units while generating.
    fn prepare_scene(&self, scene: &mut Scene) {
        scene.offset = OffsetPose::NEUTRAL;
        scene.set_clip_planes(self.options.batch_clip_planes);
    }

    fn process_line(
        &mut self,
        job: &BatchJobLine,
        scene: &mut Scene,
        frames_written: &mut usize,
    ) -> Result<()> {
        self.state = GeneratorState::LoadingScene;
        log::info!(
            "batch line {}: model {}, poses {}",
            job.line,
            job.model.display(),
            job.poses.display()
        );

        scene.load_model(&job.model, false)?;
        let background = scene.load_background(&job.background)?;
        let intrinsics = load_camera_intrinsics(&job.camera)?;
        self.check_resolution(intrinsics.size(), background)?;
        scene.set_intrinsics(intrinsics);

        let poses = load_pose_matrix(&job.poses, self.options.pose_parsing)?.to_sequence()?;
        let skewed = poses
            .iter()
            .filter(|p| !is_rotation(&p.rotation, ROTATION_TOLERANCE))
            .count();
        if skewed > 0 {
            log::warn!(
                "{}: {skewed} of {} rotations are not orthonormal",
                job.poses.display(),
                poses.len()
            );
        }
        create_directories(&job.output_dir)?;

        let seed = self
            .options
            .noise_seed
            .map(|seed| seed.wrapping_add(job.line as u64));
        let mut degrader = Degrader::new(job.degradation, seed);
        let poses_file = job.poses_file_name();
        let total = poses.len();

        for (i, pose) in poses.iter().enumerate() {
            self.state = GeneratorState::RenderingFrames { frame: i, total };
            let frame = degrader.apply(&self.renderer.render(scene, pose)?);
            let name = format!("{}.png", zero_pad_number(i, self.options.frame_digits));
            save_image(&job.output_dir.join(name), &frame)?;
            *frames_written += 1;

            self.progress.report(&ProgressReport {
                poses_file: poses_file.clone(),
                blur_sigma: job.degradation.blur_sigma,
                noise_variance: job.degradation.noise_variance,
                frame: i + 1,
                total,
            });
        }

        self.state = GeneratorState::LineComplete;
        Ok(())
    }

    fn check_resolution(&self, calibration: (u32, u32), background: (u32, u32)) -> Result<()> {
        if calibration == background {
            return Ok(());
        }
        match self.options.resolution_check {
            ResolutionCheck::Report => Err(GeneratorError::ResolutionMismatch {
                calibration,
                background,
            }),
            ResolutionCheck::Fatal => panic!(
                "camera calibration size {calibration:?} does not match background size {background:?}"
            ),
        }
    }

    fn finish(&mut self, scene: &mut Scene, last_model: Option<&Path>, saved: &SavedView) {
        if let Some(model) = last_model {
            if let Err(e) = scene.load_model(model, true) {
                log::warn!("could not reload {} after batch: {e}", model.display());
            }
        }
        scene.offset = saved.offset;
        scene.set_clip_planes(saved.clip_planes);
        if let Err(e) = self.renderer.render(scene, &PoseSample::IDENTITY) {
            log::warn!("final render after batch failed: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use objviewer_render::{RenderResult, RgbImage};

    /// Counts calls and returns frames of the scene's size.
    #[derive(Default)]
    struct CountingRenderer {
        calls: Vec<PoseSample>,
    }

    impl Renderer for CountingRenderer {
        fn render(&mut self, scene: &Scene, pose: &PoseSample) -> RenderResult<RgbImage> {
            self.calls.push(*pose);
            let (w, h) = scene.frame_size();
            Ok(RgbImage::new(w, h))
        }
    }

    #[test]
    fn test_empty_script_still_cleans_up() {
        let mut scene = Scene::default();
        let mut generator =
            SequenceGenerator::new(CountingRenderer::default(), GeneratorOptions::default());
        let report = generator.run_script("\n  \n", Path::new("."), &mut scene);
        assert!(report.outcomes.is_empty());
        assert!(!report.aborted());
        assert_eq!(generator.state(), GeneratorState::Idle);
        assert_eq!(scene.offset, OffsetPose::VIEWER);
        assert_eq!(scene.clip_planes(), ClipPlanes::VIEWER);
        // Only the neutral render after the batch.
        assert_eq!(generator.renderer_mut().calls, vec![PoseSample::IDENTITY]);
    }

    #[test]
    fn test_malformed_line_aborts() {
        let mut scene = Scene::default();
        let mut generator =
            SequenceGenerator::new(CountingRenderer::default(), GeneratorOptions::default());
        let script = "a.obj b.png\nnever.obj x y z 0 0 out\n";
        let report = generator.run_script(script, Path::new("."), &mut scene);
        assert_eq!(report.outcomes.len(), 1);
        assert!(report.aborted());
        assert!(matches!(
            report.outcomes[0].status.error(),
            Some(GeneratorError::MalformedLine { line: 1, .. })
        ));
        assert_eq!(generator.state(), GeneratorState::Aborted);
    }

    #[test]
    fn test_skip_policy_visits_every_line() {
        let mut scene = Scene::default();
        let options = GeneratorOptions {
            failure_policy: FailurePolicy::SkipLine,
            ..GeneratorOptions::default()
        };
        let mut generator = SequenceGenerator::new(CountingRenderer::default(), options);
        let report = generator.run_script(
            "/nonexistent/a.obj b.png c.json d.txt 0 0 out\n\nbad line\n",
            Path::new("."),
            &mut scene,
        );
        assert_eq!(report.outcomes.len(), 2);
        assert_eq!(report.outcomes[1].line, 3);
        assert!(!report.aborted());
        assert_eq!(report.failed(), 2);
        assert!(report
            .outcomes
            .iter()
            .all(|o| matches!(o.status, LineStatus::FailedLineSkipped(_))));
    }

    #[test]
    fn test_resolution_check_report() {
        let options = GeneratorOptions {
            resolution_check: ResolutionCheck::Report,
            ..GeneratorOptions::default()
        };
        let generator = SequenceGenerator::new(CountingRenderer::default(), options);
        assert!(generator.check_resolution((64, 48), (64, 48)).is_ok());
        assert!(matches!(
            generator.check_resolution((64, 48), (32, 24)),
            Err(GeneratorError::ResolutionMismatch { .. })
        ));
    }

    #[test]
    #[should_panic(expected = "does not match background size")]
    fn test_resolution_check_fatal() {
        let generator =
            SequenceGenerator::new(CountingRenderer::default(), GeneratorOptions::default());
        let _ = generator.check_resolution((64, 48), (32, 24));
    }

    #[test]
    fn test_run_rejects_degenerate_clip_planes() {
        let options = GeneratorOptions {
            batch_clip_planes: ClipPlanes { near: 10.0, far: 10.0 },
            ..GeneratorOptions::default()
        };
        let mut generator = SequenceGenerator::new(CountingRenderer::default(), options);
        let result = generator.run(Path::new("batch.txt"), &mut Scene::default());
        assert!(matches!(
            result,
            Err(GeneratorError::Core(objviewer_core::CoreError::InvalidClipPlanes { .. }))
        ));
        assert!(generator.renderer_mut().calls.is_empty());
    }

    #[test]
    fn test_batch_report_counts() {
        let report = BatchReport {
            outcomes: vec![
                LineOutcome {
                    line: 1,
                    status: LineStatus::Succeeded,
                    frames_written: 3,
                },
                LineOutcome {
                    line: 2,
                    status: LineStatus::FailedLineSkipped(GeneratorError::MalformedLine {
                        line: 2,
                        reason: "short".into(),
                    }),
                    frames_written: 1,
                },
            ],
        };
        assert_eq!(report.frames_written(), 4);
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.failed(), 1);
        assert!(!report.aborted());
    }
}
