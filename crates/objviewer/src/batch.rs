//! Batch script lines.
//!
//! A batch script holds one job per line, seven whitespace-separated tokens:
//!
//! ```text
//! <model.obj> <background-image> <camera-params> <poses-file> <blur-sigma> <noise-variance> <output-dir>
//! ```
//!
//! The output directory is relative to the script; the other paths are used
//! as written.

use std::path::{Path, PathBuf};

use objviewer_core::DegradationParams;

use crate::error::{GeneratorError, Result};

/// Number of tokens on a batch line.
pub const BATCH_LINE_TOKENS: usize = 7;

/// One job of a batch script.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchJobLine {
    /// 1-based line number in the script.
    pub line: usize,
    pub model: PathBuf,
    pub background: PathBuf,
    pub camera: PathBuf,
    pub poses: PathBuf,
    pub degradation: DegradationParams,
    /// Output directory, already resolved against the script directory.
    pub output_dir: PathBuf,
}

impl BatchJobLine {
    /// Parses line `line` of a script located in `script_dir`.
    ///
    /// Returns `Ok(None)` for blank lines.
    pub fn parse(line: usize, text: &str, script_dir: &Path) -> Result<Option<Self>> {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        if tokens.is_empty() {
            return Ok(None);
        }
        if tokens.len() < BATCH_LINE_TOKENS {
            return Err(GeneratorError::MalformedLine {
                line,
                reason: format!(
                    "expected {BATCH_LINE_TOKENS} tokens, found {}",
                    tokens.len()
                ),
            });
        }
        if tokens.len() > BATCH_LINE_TOKENS {
            log::warn!(
                "batch line {line}: ignoring {} extra tokens",
                tokens.len() - BATCH_LINE_TOKENS
            );
        }

        let number = |name: &str, token: &str| -> Result<f64> {
            token.parse().map_err(|_| GeneratorError::MalformedLine {
                line,
                reason: format!("{name} '{token}' is not a number"),
            })
        };
        let blur_sigma = number("blur sigma", tokens[4])?;
        let noise_variance = number("noise variance", tokens[5])?;
        let degradation = DegradationParams::new(blur_sigma, noise_variance).map_err(|e| {
            GeneratorError::MalformedLine {
                line,
                reason: e.to_string(),
            }
        })?;

        Ok(Some(Self {
            line,
            model: PathBuf::from(tokens[0]),
            background: PathBuf::from(tokens[1]),
            camera: PathBuf::from(tokens[2]),
            poses: PathBuf::from(tokens[3]),
            degradation,
            output_dir: script_dir.join(tokens[6]),
        }))
    }

    /// File name of the pose file, as shown in progress reports.
    pub fn poses_file_name(&self) -> String {
        objviewer_core::fs::file_name(&self.poses.to_string_lossy()).to_string()
    }
}
