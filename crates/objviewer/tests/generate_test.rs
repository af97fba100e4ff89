//! End-to-end batch generation tests.
//!
//! Each test builds a small job directory (cube model, flat background,
//! calibration, pose list) and drives the generator with the software
//! renderer.

use std::path::{Path, PathBuf};

use image::{Rgb, RgbImage};
use objviewer::{
    GeneratorError, GeneratorOptions, LineStatus, ProgressReport, Scene, SequenceGenerator,
    SoftwareRenderer,
};
use objviewer_core::{
    ClipPlanes, CoreError, FailurePolicy, IsolationMode, OffsetPose, PoseParseMode,
    ResolutionCheck,
};

const BACKGROUND: Rgb<u8> = Rgb([10, 200, 30]);

const CUBE_OBJ: &str = "\
v -0.5 -0.5 -0.5
v 0.5 -0.5 -0.5
v 0.5 0.5 -0.5
v -0.5 0.5 -0.5
v -0.5 -0.5 0.5
v 0.5 -0.5 0.5
v 0.5 0.5 0.5
v -0.5 0.5 0.5
f 1 4 3 2
f 5 6 7 8
f 1 2 6 5
f 4 8 7 3
f 1 5 8 4
f 2 3 7 6
";

/// Identity rotation, the cube five units ahead and shifted along x.
const POSES: &str = "\
1 0 0 0 1 0 0 0 1 -1 0 5
1 0 0 0 1 0 0 0 1 0 0 5
1 0 0 0 1 0 0 0 1 1 0 5
";

fn camera_json(width: u32, height: u32) -> String {
    format!(
        r#"{{
  "camera_matrix": {{
    "type_id": "opencv-matrix",
    "rows": 3,
    "cols": 3,
    "dt": "d",
    "data": [64.0, 0.0, 31.5, 0.0, 64.0, 23.5, 0.0, 0.0, 1.0]
  }},
  "image_width": {width},
  "image_height": {height}
}}"#
    )
}

struct Fixture {
    dir: tempfile::TempDir,
}

impl Fixture {
    fn new() -> Self {
        let fixture = Self {
            dir: tempfile::tempdir().unwrap(),
        };
        fixture.write("cube.obj", CUBE_OBJ);
        fixture.write("poses.txt", POSES);
        fixture.write("cam.json", &camera_json(64, 48));
        RgbImage::from_pixel(64, 48, BACKGROUND)
            .save(fixture.path("bg.png"))
            .unwrap();
        fixture
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn write(&self, name: &str, contents: &str) {
        std::fs::write(self.path(name), contents).unwrap();
    }

    /// A script line; file names are resolved to absolute paths.
    fn line(
        &self,
        model: &str,
        background: &str,
        camera: &str,
        poses: &str,
        degrade: &str,
        out: &str,
    ) -> String {
        format!(
            "{} {} {} {} {degrade} {out}\n",
            self.path(model).display(),
            self.path(background).display(),
            self.path(camera).display(),
            self.path(poses).display(),
        )
    }

    fn default_line(&self, out: &str) -> String {
        self.line("cube.obj", "bg.png", "cam.json", "poses.txt", "0 0", out)
    }

    fn script(&self, lines: &[String]) -> PathBuf {
        let path = self.path("batch.txt");
        std::fs::write(&path, lines.concat()).unwrap();
        path
    }

    fn frame(&self, out: &str, index: usize) -> RgbImage {
        image::open(self.path(out).join(format!("{index:06}.png")))
            .unwrap()
            .to_rgb8()
    }
}

fn run(options: GeneratorOptions, script: &Path, scene: &mut Scene) -> objviewer::BatchReport {
    SequenceGenerator::new(SoftwareRenderer::new(), options)
        .run(script, scene)
        .unwrap()
}

#[test]
fn test_generates_numbered_frames() {
    let fixture = Fixture::new();
    let script = fixture.script(&[fixture.default_line("out/seq")]);
    let mut scene = Scene::default();
    let mut reports: Vec<ProgressReport> = Vec::new();

    let report = {
        let mut generator = SequenceGenerator::with_progress(
            SoftwareRenderer::new(),
            |r: &ProgressReport| reports.push(r.clone()),
            GeneratorOptions::default(),
        );
        generator.run(&script, &mut scene).unwrap()
    };

    assert_eq!(report.outcomes.len(), 1);
    assert!(matches!(report.outcomes[0].status, LineStatus::Succeeded));
    assert_eq!(report.frames_written(), 3);

    let out = fixture.path("out/seq");
    let mut names: Vec<String> = std::fs::read_dir(&out)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(names, ["000000.png", "000001.png", "000002.png"]);

    // The cube follows the translation of each pose row.
    for (index, column) in [19, 32, 44].into_iter().enumerate() {
        let frame = fixture.frame("out/seq", index);
        assert_eq!(frame.dimensions(), (64, 48));
        assert_ne!(*frame.get_pixel(column, 24), BACKGROUND, "frame {index}");
        assert_eq!(*frame.get_pixel(0, 0), BACKGROUND);
    }
    assert_eq!(*fixture.frame("out/seq", 0).get_pixel(44, 24), BACKGROUND);
    assert_eq!(*fixture.frame("out/seq", 2).get_pixel(19, 24), BACKGROUND);

    assert_eq!(reports.len(), 3);
    assert_eq!(reports[2].poses_file, "poses.txt");
    assert_eq!(
        reports.iter().map(|r| (r.frame, r.total)).collect::<Vec<_>>(),
        [(1, 3), (2, 3), (3, 3)]
    );
}

#[test]
fn test_scene_is_restored_after_batch() {
    let fixture = Fixture::new();
    let script = fixture.script(&[fixture.default_line("out")]);
    let mut scene = Scene::default();
    run(GeneratorOptions::default(), &script, &mut scene);

    assert_eq!(scene.offset, OffsetPose::VIEWER);
    assert_eq!(scene.clip_planes(), ClipPlanes::VIEWER);
    // The last model is reloaded unitized.
    let (min, max) = scene.model().unwrap().bounding_box().unwrap();
    assert!((max.x - 1.0).abs() < 1e-6);
    assert!((min.x + 1.0).abs() < 1e-6);
}

#[test]
fn test_load_failure_aborts_batch() {
    let fixture = Fixture::new();
    let script = fixture.script(&[
        fixture.line("missing.obj", "bg.png", "cam.json", "poses.txt", "0 0", "first"),
        fixture.default_line("second"),
    ]);
    let report = run(GeneratorOptions::default(), &script, &mut Scene::default());

    assert_eq!(report.outcomes.len(), 1);
    assert!(report.aborted());
    assert!(matches!(
        report.outcomes[0].status,
        LineStatus::FailedBatchAborted(GeneratorError::Render(_))
    ));
    assert!(!fixture.path("second").exists());
}

#[test]
fn test_skip_policy_runs_remaining_lines() {
    let fixture = Fixture::new();
    let script = fixture.script(&[
        fixture.line("cube.obj", "missing.png", "cam.json", "poses.txt", "0 0", "first"),
        "\n".to_string(),
        fixture.default_line("second"),
    ]);
    let options = GeneratorOptions {
        failure_policy: FailurePolicy::SkipLine,
        ..GeneratorOptions::default()
    };
    let report = run(options, &script, &mut Scene::default());

    assert!(!report.aborted());
    assert_eq!(report.outcomes.len(), 2);
    assert!(matches!(report.outcomes[0].status, LineStatus::FailedLineSkipped(_)));
    assert_eq!(report.outcomes[1].line, 3);
    assert_eq!(report.outcomes[1].frames_written, 3);
    assert!(fixture.path("second/000002.png").exists());
}

#[test]
fn test_resolution_mismatch_reported() {
    let fixture = Fixture::new();
    fixture.write("small.json", &camera_json(32, 24));
    let script = fixture.script(&[fixture.line(
        "cube.obj",
        "bg.png",
        "small.json",
        "poses.txt",
        "0 0",
        "out",
    )]);
    let options = GeneratorOptions {
        resolution_check: ResolutionCheck::Report,
        ..GeneratorOptions::default()
    };
    let report = run(options, &script, &mut Scene::default());
    assert!(matches!(
        report.outcomes[0].status.error(),
        Some(GeneratorError::ResolutionMismatch {
            calibration: (32, 24),
            background: (64, 48),
        })
    ));
}

#[test]
#[should_panic(expected = "does not match background size")]
fn test_resolution_mismatch_is_fatal_by_default() {
    let fixture = Fixture::new();
    fixture.write("small.json", &camera_json(32, 24));
    let script = fixture.script(&[fixture.line(
        "cube.obj",
        "bg.png",
        "small.json",
        "poses.txt",
        "0 0",
        "out",
    )]);
    run(GeneratorOptions::default(), &script, &mut Scene::default());
}

#[test]
fn test_short_pose_rows() {
    let fixture = Fixture::new();
    fixture.write(
        "short.txt",
        "1 0 0 0 1 0 0 0 1 0 0 5\n1 0 0 0 1 0 0 0 1 0 0\n",
    );
    let lines = [fixture.line("cube.obj", "bg.png", "cam.json", "short.txt", "0 0", "out")];

    // Legacy parsing reuses the previous row's trailing values.
    let report = run(
        GeneratorOptions::default(),
        &fixture.script(&lines),
        &mut Scene::default(),
    );
    assert_eq!(report.frames_written(), 2);
    assert_eq!(fixture.frame("out", 0), fixture.frame("out", 1));

    let options = GeneratorOptions {
        pose_parsing: PoseParseMode::Strict,
        ..GeneratorOptions::default()
    };
    let report = run(options, &fixture.script(&lines), &mut Scene::default());
    assert!(matches!(
        report.outcomes[0].status.error(),
        Some(GeneratorError::Core(CoreError::InconsistentPoseRow { .. }))
    ));
}

#[test]
fn test_seeded_degradation_is_reproducible() {
    let fixture = Fixture::new();
    let options = GeneratorOptions {
        noise_seed: Some(5),
        ..GeneratorOptions::default()
    };
    for out in ["a", "b"] {
        let script = fixture.script(&[fixture.line(
            "cube.obj",
            "bg.png",
            "cam.json",
            "poses.txt",
            "1.0 4.0",
            out,
        )]);
        run(options.clone(), &script, &mut Scene::default());
    }
    for index in 0..3 {
        let a = fixture.frame("a", index);
        assert_eq!(a, fixture.frame("b", index));
        assert_ne!(*a.get_pixel(0, 0), BACKGROUND);
    }
}

#[test]
fn test_isolation_modes() {
    let fixture = Fixture::new();
    let script = fixture.script(&[
        fixture.default_line("first"),
        fixture.line("cube.obj", "missing.png", "cam.json", "poses.txt", "0 0", "second"),
    ]);

    // Legacy: the failed line leaves the previous background in place.
    let mut scene = Scene::default();
    run(GeneratorOptions::default(), &script, &mut scene);
    assert!(scene.background().is_some());

    let options = GeneratorOptions {
        isolation: IsolationMode::StrictIsolation,
        ..GeneratorOptions::default()
    };
    let mut scene = Scene::default();
    run(options, &script, &mut scene);
    assert!(scene.background().is_none());
}

#[test]
fn test_unreadable_script() {
    let result = SequenceGenerator::new(SoftwareRenderer::new(), GeneratorOptions::default())
        .run(Path::new("/nonexistent/batch.txt"), &mut Scene::default());
    assert!(matches!(result, Err(GeneratorError::BatchScript { .. })));
}
