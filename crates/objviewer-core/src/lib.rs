//! Core numerics for objviewer-rs.
//!
//! This crate holds everything in the sequence pipeline that does not touch
//! pixels:
//! - [`rotation`]: trackball rotation and Rodrigues conversions
//! - [`projection`]: pinhole intrinsics, calibration files and the projection matrix
//! - [`pose`]: pose files, pose samples and the viewer's offset pose
//! - [`fs`]: path decomposition, directory creation and frame numbering
//! - [`options`]: configuration of the viewer and the generator

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Builder patterns return Self which doesn't need must_use
#![allow(clippy::must_use_candidate)]
// Single-letter math names (fx, cx, ...) mirror the usual notation
#![allow(clippy::many_single_char_names)]
#![allow(clippy::similar_names)]

pub mod degradation;
pub mod error;
pub mod fs;
pub mod options;
pub mod pose;
pub mod projection;
pub mod rotation;

pub use degradation::DegradationParams;
pub use error::{CoreError, Result};
pub use options::{
    FailurePolicy, GeneratorOptions, IsolationMode, RenderMode, ResolutionCheck, ViewerOptions,
};
pub use pose::{
    load_pose_matrix, parse_pose_matrix, OffsetPose, PoseMatrix, PoseParseMode, PoseSample,
    PoseSequence,
};
pub use projection::{
    build_projection_matrix, load_camera_intrinsics, CameraIntrinsics, ClipPlanes,
    ProjectionMatrix,
};
pub use rotation::{axis_angle_to_rotation, rotation_to_axis_angle, trackball, AxisAngle};

// Re-export glam types for convenience
pub use glam::{DMat3, DMat4, DVec2, DVec3};
