//! Pinhole intrinsics and the renderer's projection matrix.

use std::path::Path;

use glam::{DMat4, DVec2};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Near and far clip distances along the viewing axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClipPlanes {
    /// Near clipping plane.
    pub near: f64,
    /// Far clipping plane.
    pub far: f64,
}

impl ClipPlanes {
    /// Clip planes of the interactive viewer.
    pub const VIEWER: Self = Self {
        near: 0.01,
        far: 100.0,
    };

    /// Clip planes used while generating sequences, wide enough for poses in
    /// the model's native units.
    pub const BATCH: Self = Self {
        near: 1.0,
        far: 10000.0,
    };

    /// Creates clip planes, requiring finite `0 < near < far`.
    pub fn new(near: f64, far: f64) -> Result<Self> {
        let planes = Self { near, far };
        planes.validate()?;
        Ok(planes)
    }

    /// Checks `0 < near < far` with both distances finite.
    pub fn validate(&self) -> Result<()> {
        if self.near > 0.0 && self.near < self.far && self.far.is_finite() {
            Ok(())
        } else {
            Err(CoreError::InvalidClipPlanes {
                near: self.near,
                far: self.far,
            })
        }
    }
}

impl Default for ClipPlanes {
    fn default() -> Self {
        Self::VIEWER
    }
}

/// Pinhole camera intrinsics in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraIntrinsics {
    pub fx: f64,
    pub fy: f64,
    pub cx: f64,
    pub cy: f64,
    pub width: u32,
    pub height: u32,
}

impl CameraIntrinsics {
    /// Fallback intrinsics synthesized from the frame size alone.
    ///
    /// Uses `fx = fy = |(w, h)|` and the pixel-grid centre as principal point.
    /// This is a crude viewing default, not a calibration.
    #[must_use]
    pub fn from_frame_size(width: u32, height: u32) -> Self {
        let w = f64::from(width);
        let h = f64::from(height);
        let f = DVec2::new(w, h).length();
        Self {
            fx: f,
            fy: f,
            cx: (w - 1.0) / 2.0,
            cy: (h - 1.0) / 2.0,
            width,
            height,
        }
    }

    /// Frame size as `(width, height)`.
    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Projection matrix for these intrinsics and clip planes.
    #[must_use]
    pub fn projection_matrix(&self, clip: ClipPlanes) -> ProjectionMatrix {
        build_projection_matrix(self, clip)
    }
}

/// A 4x4 projection matrix stored column-major, as the renderer consumes it.
///
/// The camera looks down +Z (clip `w` equals eye-space `z`) and image rows grow
/// downwards, so the Y scale is negative.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionMatrix(pub [f64; 16]);

impl ProjectionMatrix {
    /// Column-major elements.
    #[must_use]
    pub fn as_array(&self) -> &[f64; 16] {
        &self.0
    }

    /// The matrix as a glam value.
    #[must_use]
    pub fn to_mat4(&self) -> DMat4 {
        DMat4::from_cols_array(&self.0)
    }
}

/// Builds the projection matrix from intrinsics and clip planes.
#[must_use]
pub fn build_projection_matrix(
    intrinsics: &CameraIntrinsics,
    clip: ClipPlanes,
) -> ProjectionMatrix {
    let w = f64::from(intrinsics.width);
    let h = f64::from(intrinsics.height);
    let ClipPlanes { near, far } = clip;

    let mut m = [0.0; 16];
    m[0] = 2.0 * intrinsics.fx / w;
    m[5] = -2.0 * intrinsics.fy / h;
    m[8] = 2.0 * (intrinsics.cx / w) - 1.0;
    m[9] = 1.0 - 2.0 * (intrinsics.cy / h);
    m[10] = (far + near) / (far - near);
    m[11] = 1.0;
    m[14] = 2.0 * far * near / (near - far);
    ProjectionMatrix(m)
}

/// Camera matrix entry of a calibration file.
///
/// Accepts the `opencv-matrix` object written by OpenCV's JSON `FileStorage`
/// (extra keys such as `type_id` and `dt` are ignored) or a nested 3x3 array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CameraMatrixEntry {
    OpenCv {
        rows: usize,
        cols: usize,
        data: Vec<f64>,
    },
    Nested([[f64; 3]; 3]),
}

#[derive(Debug, Deserialize)]
struct CalibrationFile {
    camera_matrix: CameraMatrixEntry,
    image_width: f64,
    image_height: f64,
}

/// Reads `camera_matrix`, `image_width` and `image_height` from a calibration file.
pub fn load_camera_intrinsics(path: impl AsRef<Path>) -> Result<CameraIntrinsics> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    parse_camera_intrinsics(&text).map_err(|e| match e {
        CoreError::CameraParams { reason, .. } => CoreError::CameraParams {
            path: path.to_path_buf(),
            reason,
        },
        other => other,
    })
}

/// Parses the JSON body of a calibration file.
pub fn parse_camera_intrinsics(text: &str) -> Result<CameraIntrinsics> {
    let invalid = |reason: String| CoreError::CameraParams {
        path: Default::default(),
        reason,
    };

    let file: CalibrationFile = serde_json::from_str(text)?;
    let k: [[f64; 3]; 3] = match file.camera_matrix {
        CameraMatrixEntry::OpenCv { rows, cols, data } => {
            if rows != 3 || cols != 3 || data.len() != 9 {
                return Err(invalid(format!(
                    "camera_matrix must be 3x3, got {rows}x{cols} with {} values",
                    data.len()
                )));
            }
            [
                [data[0], data[1], data[2]],
                [data[3], data[4], data[5]],
                [data[6], data[7], data[8]],
            ]
        }
        CameraMatrixEntry::Nested(rows) => rows,
    };

    let to_pixels = |value: f64, name: &str| -> Result<u32> {
        if value.is_finite() && value >= 1.0 && value.fract() == 0.0 && value <= f64::from(u32::MAX)
        {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let pixels = value as u32;
            Ok(pixels)
        } else {
            Err(invalid(format!("{name} must be a positive integer, got {value}")))
        }
    };

    Ok(CameraIntrinsics {
        fx: k[0][0],
        fy: k[1][1],
        cx: k[0][2],
        cy: k[1][2],
        width: to_pixels(file.image_width, "image_width")?,
        height: to_pixels(file.image_height, "image_height")?,
    })
}
