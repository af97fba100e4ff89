//! Configuration options for the viewer and the sequence generator.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::pose::{OffsetPose, PoseParseMode};
use crate::projection::ClipPlanes;
use crate::rotation::TRACKBALL_RADIUS;

/// Whether scene state from one batch line is visible to the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum IsolationMode {
    /// The model, background and calibration of one line stay loaded until a
    /// later line replaces them.
    #[default]
    LegacyLeakCompatible,
    /// The scene is cleared before every line.
    StrictIsolation,
}

/// What a failing batch line does to the rest of the batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum FailurePolicy {
    /// Stop at the first failing line; later lines are never read.
    #[default]
    AbortBatch,
    /// Record the failure and continue with the next line.
    SkipLine,
}

/// Reaction to a calibration file whose image size differs from the background.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ResolutionCheck {
    /// Precondition violation: panic.
    #[default]
    Fatal,
    /// Fail the line like any other load failure.
    Report,
}

/// Surface drawing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum RenderMode {
    /// Filled triangles.
    #[default]
    Solid,
    /// Triangle edges only.
    Wireframe,
}

/// Options of the batch sequence generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorOptions {
    /// Scene isolation between batch lines.
    pub isolation: IsolationMode,

    /// Failure handling between batch lines.
    pub failure_policy: FailurePolicy,

    /// Pose file parsing strictness.
    pub pose_parsing: PoseParseMode,

    /// Calibration/background size mismatch handling.
    pub resolution_check: ResolutionCheck,

    /// Clip planes used while the batch runs.
    pub batch_clip_planes: ClipPlanes,

    /// Seed of the noise generator; entropy-seeded when absent.
    pub noise_seed: Option<u64>,

    /// Zero-padded width of output frame names.
    pub frame_digits: usize,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            isolation: IsolationMode::default(),
            failure_policy: FailurePolicy::default(),
            pose_parsing: PoseParseMode::default(),
            resolution_check: ResolutionCheck::default(),
            batch_clip_planes: ClipPlanes::BATCH,
            noise_seed: None,
            frame_digits: 6,
        }
    }
}

impl GeneratorOptions {
    /// Reads options from a JSON file; missing keys keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let options: Self = serde_json::from_str(&text)?;
        options.validate()?;
        Ok(options)
    }

    /// Rejects values the generator cannot render with.
    pub fn validate(&self) -> Result<()> {
        self.batch_clip_planes.validate()
    }
}

/// Options of the interactive view and its scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerOptions {
    /// Frame width before a background image is loaded.
    pub frame_width: u32,

    /// Frame height before a background image is loaded.
    pub frame_height: u32,

    /// Clip planes of the interactive view.
    pub clip_planes: ClipPlanes,

    /// Radius of the virtual trackball.
    pub trackball_radius: f64,

    /// Offset placed in front of the interactive pose.
    pub offset_pose: OffsetPose,

    /// Translation per viewport width/height of a pan drag.
    pub pan_ratio: f64,

    /// Translation along the view axis per wheel unit.
    pub wheel_ratio: f64,

    /// Surface drawing mode.
    pub render_mode: RenderMode,

    /// Whether lighting is enabled.
    pub lighting: bool,
}

impl Default for ViewerOptions {
    fn default() -> Self {
        Self {
            frame_width: 800,
            frame_height: 600,
            clip_planes: ClipPlanes::VIEWER,
            trackball_radius: TRACKBALL_RADIUS,
            offset_pose: OffsetPose::VIEWER,
            pan_ratio: 4.0,
            wheel_ratio: 0.005,
            render_mode: RenderMode::Solid,
            lighting: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;

    #[test]
    fn test_generator_defaults_match_reference_behaviour() {
        let options = GeneratorOptions::default();
        assert_eq!(options.isolation, IsolationMode::LegacyLeakCompatible);
        assert_eq!(options.failure_policy, FailurePolicy::AbortBatch);
        assert_eq!(options.pose_parsing, PoseParseMode::Legacy);
        assert_eq!(options.resolution_check, ResolutionCheck::Fatal);
        assert_eq!(options.batch_clip_planes, ClipPlanes::BATCH);
        assert_eq!(options.frame_digits, 6);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let options: GeneratorOptions =
            serde_json::from_str(r#"{"failure_policy": "SkipLine", "noise_seed": 7}"#).unwrap();
        assert_eq!(options.failure_policy, FailurePolicy::SkipLine);
        assert_eq!(options.noise_seed, Some(7));
        assert_eq!(options.isolation, IsolationMode::LegacyLeakCompatible);
    }

    #[test]
    fn test_json_file_rejects_degenerate_clip_planes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("options.json");
        std::fs::write(&path, r#"{"batch_clip_planes": {"near": 5.0, "far": 5.0}}"#).unwrap();
        assert!(matches!(
            GeneratorOptions::from_json_file(&path),
            Err(CoreError::InvalidClipPlanes { .. })
        ));

        std::fs::write(&path, r#"{"batch_clip_planes": {"near": 0.5, "far": 50.0}}"#).unwrap();
        let options = GeneratorOptions::from_json_file(&path).unwrap();
        assert_eq!(options.batch_clip_planes, ClipPlanes { near: 0.5, far: 50.0 });
    }

    #[test]
    fn test_viewer_defaults() {
        let options = ViewerOptions::default();
        assert_eq!((options.frame_width, options.frame_height), (800, 600));
        assert_eq!(options.clip_planes, ClipPlanes::VIEWER);
        assert_eq!(options.offset_pose, OffsetPose::VIEWER);
        assert!(options.lighting);
    }
}
