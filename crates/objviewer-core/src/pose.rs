//! Pose files: whitespace-separated matrices with one rendering pose per row.
//!
//! Row layout: columns `{0,1,2}`, `{3,4,5}` and `{6,7,8}` are the three columns
//! of the rotation, columns `{9,10,11}` the translation.

use std::path::Path;

use glam::{DMat3, DMat4, DVec3};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Number of values a pose row needs.
pub const POSE_COLUMNS: usize = 12;

/// How rows that disagree with the first row are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PoseParseMode {
    /// Short rows keep the previous row's values in their missing columns,
    /// parsing stops at the first non-numeric token, and an unreadable file
    /// yields an empty matrix.
    #[default]
    Legacy,
    /// Any row whose length differs from the first row, any non-numeric token
    /// and an unreadable file are errors.
    Strict,
}

/// A dense row-major matrix read from a pose file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PoseMatrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl PoseMatrix {
    /// Builds a matrix from rows of equal length.
    #[must_use]
    pub fn from_rows(rows: &[Vec<f64>]) -> Self {
        let cols = rows.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(rows.len() * cols);
        for row in rows {
            data.extend(row.iter().copied().chain(std::iter::repeat(0.0)).take(cols));
        }
        Self {
            rows: rows.len(),
            cols,
            data,
        }
    }

    /// Number of rows (frames).
    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns inferred from the first row.
    #[must_use]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Whether the matrix has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// The values of row `i`.
    #[must_use]
    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    /// Converts every row into a [`PoseSample`].
    pub fn to_sequence(&self) -> Result<PoseSequence> {
        if self.is_empty() {
            return Ok(PoseSequence::default());
        }
        if self.cols < POSE_COLUMNS {
            return Err(CoreError::PoseColumnCount(self.cols));
        }
        Ok((0..self.rows)
            .map(|i| PoseSample::from_row(self.row(i)))
            .collect())
    }
}

/// One rendering instruction: model rotation and translation in camera space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseSample {
    pub rotation: DMat3,
    pub translation: DVec3,
}

impl PoseSample {
    /// Identity rotation, zero translation.
    pub const IDENTITY: Self = Self {
        rotation: DMat3::IDENTITY,
        translation: DVec3::ZERO,
    };

    /// Creates a pose.
    #[must_use]
    pub fn new(rotation: DMat3, translation: DVec3) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    /// Reads a pose from the first twelve values of a row.
    ///
    /// # Panics
    ///
    /// Panics if `row` has fewer than [`POSE_COLUMNS`] values.
    #[must_use]
    pub fn from_row(row: &[f64]) -> Self {
        Self {
            rotation: DMat3::from_cols_slice(&row[..9]),
            translation: DVec3::new(row[9], row[10], row[11]),
        }
    }

    /// The twelve values of this pose in file layout.
    #[must_use]
    pub fn to_row(&self) -> [f64; POSE_COLUMNS] {
        let mut row = [0.0; POSE_COLUMNS];
        self.rotation.write_cols_to_slice(&mut row[..9]);
        row[9..].copy_from_slice(&self.translation.to_array());
        row
    }

    /// The rigid transform `[R | t]` as a 4x4 matrix.
    #[must_use]
    pub fn to_mat4(&self) -> DMat4 {
        DMat4::from_cols(
            self.rotation.x_axis.extend(0.0),
            self.rotation.y_axis.extend(0.0),
            self.rotation.z_axis.extend(0.0),
            self.translation.extend(1.0),
        )
    }
}

impl Default for PoseSample {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Fixed transform applied in front of every pose.
///
/// The viewer uses it to place a unitized model in front of the camera; the
/// sequence generator neutralizes it so poses act in the model's own units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OffsetPose {
    /// Euler angles in degrees, applied X first, then Y, then Z.
    pub rotation_degrees: DVec3,
    pub translation: DVec3,
    pub scale: f64,
}

impl OffsetPose {
    /// No rotation, no translation, unit scale.
    pub const NEUTRAL: Self = Self {
        rotation_degrees: DVec3::ZERO,
        translation: DVec3::ZERO,
        scale: 1.0,
    };

    /// Offset of the interactive viewer: flipped about X, seven units ahead.
    pub const VIEWER: Self = Self {
        rotation_degrees: DVec3::new(180.0, 0.0, 0.0),
        translation: DVec3::new(0.0, 0.0, 7.0),
        scale: 1.0,
    };

    /// `T * Rz * Ry * Rx * S`.
    #[must_use]
    pub fn to_mat4(&self) -> DMat4 {
        let r = self.rotation_degrees;
        DMat4::from_translation(self.translation)
            * DMat4::from_rotation_z(r.z.to_radians())
            * DMat4::from_rotation_y(r.y.to_radians())
            * DMat4::from_rotation_x(r.x.to_radians())
            * DMat4::from_scale(DVec3::splat(self.scale))
    }
}

impl Default for OffsetPose {
    fn default() -> Self {
        Self::VIEWER
    }
}

/// Ordered poses, one per output frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PoseSequence(Vec<PoseSample>);

impl PoseSequence {
    /// Number of frames.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no frames.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Pose of frame `i`.
    #[must_use]
    pub fn get(&self, i: usize) -> Option<&PoseSample> {
        self.0.get(i)
    }

    /// Iterates in frame order.
    pub fn iter(&self) -> std::slice::Iter<'_, PoseSample> {
        self.0.iter()
    }
}

impl FromIterator<PoseSample> for PoseSequence {
    fn from_iter<I: IntoIterator<Item = PoseSample>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a PoseSequence {
    type Item = &'a PoseSample;
    type IntoIter = std::slice::Iter<'a, PoseSample>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Loads a pose matrix from a file.
///
/// In [`PoseParseMode::Legacy`] an unreadable file gives an empty matrix.
pub fn load_pose_matrix(path: impl AsRef<Path>, mode: PoseParseMode) -> Result<PoseMatrix> {
    let path = path.as_ref();
    match std::fs::read_to_string(path) {
        Ok(text) => parse_pose_matrix(&text, mode),
        Err(e) if mode == PoseParseMode::Legacy => {
            log::warn!("cannot open pose file {}: {e}", path.display());
            Ok(PoseMatrix::default())
        }
        Err(source) => Err(CoreError::PoseFileOpen {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Parses the text of a pose file.
///
/// The column count is taken from the first row. Only newline-terminated
/// lines count as rows in legacy mode, and blank lines are skipped in both
/// modes.
pub fn parse_pose_matrix(text: &str, mode: PoseParseMode) -> Result<PoseMatrix> {
    let lines: Vec<&str> = match mode {
        // A trailing line without a newline was never read as a row.
        PoseParseMode::Legacy => {
            let mut lines: Vec<&str> = text.split('\n').collect();
            lines.pop();
            lines
        }
        PoseParseMode::Strict => text.lines().collect(),
    };

    let mut cols = None;
    let mut buffer: Vec<f64> = Vec::new();
    let mut data = Vec::new();
    let mut rows = 0;

    for line in lines {
        if line.trim().is_empty() {
            continue;
        }

        let values = match mode {
            PoseParseMode::Legacy => leading_numbers(line),
            PoseParseMode::Strict => strict_numbers(line, rows)?,
        };

        let cols = *cols.get_or_insert(values.len());
        if buffer.len() != cols {
            buffer.resize(cols, 0.0);
        }

        match mode {
            PoseParseMode::Legacy => {
                if values.len() != cols {
                    log::debug!(
                        "pose row {rows} has {} values, reusing {} from the previous row",
                        values.len(),
                        cols.saturating_sub(values.len())
                    );
                }
            }
            PoseParseMode::Strict => {
                if values.len() != cols {
                    return Err(CoreError::InconsistentPoseRow {
                        row: rows,
                        expected: cols,
                        actual: values.len(),
                    });
                }
            }
        }

        for (slot, value) in buffer.iter_mut().zip(values) {
            *slot = value;
        }
        data.extend_from_slice(&buffer);
        rows += 1;
    }

    Ok(PoseMatrix {
        rows,
        cols: cols.unwrap_or(0),
        data,
    })
}

/// Numbers at the start of `line`, stopping at the first token that is not one.
fn leading_numbers(line: &str) -> Vec<f64> {
    line.split_whitespace()
        .map_while(|token| token.parse::<f64>().ok())
        .collect()
}

fn strict_numbers(line: &str, row: usize) -> Result<Vec<f64>> {
    line.split_whitespace()
        .map(|token| {
            token.parse::<f64>().map_err(|_| CoreError::InvalidPoseValue {
                row,
                token: token.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rotation::axis_angle_to_rotation;
    use std::io::Write;

    const ROW_A: &str = "1 0 0 0 1 0 0 0 1 0.5 -0.5 10\n";

    #[test]
    fn test_row_layout() {
        let row = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0, 12.0];
        let pose = PoseSample::from_row(&row);
        assert_eq!(pose.rotation.x_axis, DVec3::new(1.0, 2.0, 3.0));
        assert_eq!(pose.rotation.y_axis, DVec3::new(4.0, 5.0, 6.0));
        assert_eq!(pose.rotation.z_axis, DVec3::new(7.0, 8.0, 9.0));
        assert_eq!(pose.translation, DVec3::new(10.0, 11.0, 12.0));
        assert_eq!(pose.to_row(), row);
    }

    #[test]
    fn test_parse_consistent_rows() {
        let r = axis_angle_to_rotation(DVec3::new(0.1, 0.2, 0.3));
        let pose = PoseSample::new(r, DVec3::new(1.0, 2.0, 30.0));
        let line: Vec<String> = pose.to_row().iter().map(f64::to_string).collect();
        let text = format!("{ROW_A}{}\n", line.join(" "));

        for mode in [PoseParseMode::Legacy, PoseParseMode::Strict] {
            let m = parse_pose_matrix(&text, mode).unwrap();
            assert_eq!(m.rows(), 2);
            assert_eq!(m.cols(), 12);
            let seq = m.to_sequence().unwrap();
            assert_eq!(seq.len(), 2);
            assert_eq!(seq.get(1), Some(&pose));
            assert_eq!(seq.get(0).unwrap().translation, DVec3::new(0.5, -0.5, 10.0));
        }
    }

    #[test]
    fn test_legacy_short_row_reuses_previous_values() {
        let text = format!("{ROW_A}0 1 0 -1 0 0 0 0 1 7\n");
        let m = parse_pose_matrix(&text, PoseParseMode::Legacy).unwrap();
        assert_eq!(m.rows(), 2);
        assert_eq!(m.row(1)[9], 7.0);
        assert_eq!(m.row(1)[10], -0.5);
        assert_eq!(m.row(1)[11], 10.0);
    }

    #[test]
    fn test_legacy_stops_at_garbage_token() {
        let text = format!("{ROW_A}0 0 0 x 5 5 5 5 5 5 5 5\n");
        let m = parse_pose_matrix(&text, PoseParseMode::Legacy).unwrap();
        assert_eq!(&m.row(1)[..3], &[0.0, 0.0, 0.0]);
        assert_eq!(&m.row(1)[3..], &m.row(0)[3..]);
    }

    #[test]
    fn test_legacy_ignores_unterminated_last_line() {
        let text = format!("{ROW_A}{}", ROW_A.trim_end());
        let legacy = parse_pose_matrix(&text, PoseParseMode::Legacy).unwrap();
        assert_eq!(legacy.rows(), 1);
        let strict = parse_pose_matrix(&text, PoseParseMode::Strict).unwrap();
        assert_eq!(strict.rows(), 2);
    }

    #[test]
    fn test_strict_rejects_short_row() {
        let text = format!("{ROW_A}1 2 3\n");
        let err = parse_pose_matrix(&text, PoseParseMode::Strict).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InconsistentPoseRow {
                row: 1,
                expected: 12,
                actual: 3
            }
        ));
    }

    #[test]
    fn test_strict_rejects_garbage() {
        let err = parse_pose_matrix("1 2 nan? 4\n", PoseParseMode::Strict).unwrap_err();
        assert!(matches!(err, CoreError::InvalidPoseValue { row: 0, .. }));
    }

    #[test]
    fn test_too_few_columns_cannot_become_poses() {
        let m = parse_pose_matrix("1 2 3\n4 5 6\n", PoseParseMode::Strict).unwrap();
        assert!(matches!(m.to_sequence(), Err(CoreError::PoseColumnCount(3))));
    }

    #[test]
    fn test_missing_file() {
        let path = "/nonexistent/poses.txt";
        let legacy = load_pose_matrix(path, PoseParseMode::Legacy).unwrap();
        assert!(legacy.is_empty());
        assert!(legacy.to_sequence().unwrap().is_empty());
        assert!(matches!(
            load_pose_matrix(path, PoseParseMode::Strict),
            Err(CoreError::PoseFileOpen { .. })
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{ROW_A}{ROW_A}{ROW_A}").unwrap();
        let m = load_pose_matrix(file.path(), PoseParseMode::Legacy).unwrap();
        assert_eq!(m.rows(), 3);
    }

    #[test]
    fn test_offset_pose() {
        assert_eq!(OffsetPose::NEUTRAL.to_mat4(), DMat4::IDENTITY);

        let p = OffsetPose::VIEWER
            .to_mat4()
            .transform_point3(DVec3::new(0.0, 1.0, 1.0));
        assert!(p.abs_diff_eq(DVec3::new(0.0, -1.0, 6.0), 1e-12));
    }

    #[test]
    fn test_pose_matrix4() {
        let pose = PoseSample::new(DMat3::IDENTITY, DVec3::new(1.0, 2.0, 3.0));
        let p = pose.to_mat4().transform_point3(DVec3::ZERO);
        assert_eq!(p, DVec3::new(1.0, 2.0, 3.0));
    }
}
