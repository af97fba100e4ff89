//! Per-frame progress reporting.

use std::fmt;

/// Progress after one frame of a batch line has been written.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressReport {
    /// File name of the line's pose file.
    pub poses_file: String,
    pub blur_sigma: f64,
    pub noise_variance: f64,
    /// 1-based index of the frame just written.
    pub frame: usize,
    /// Frames on this line.
    pub total: usize,
}

impl fmt::Display for ProgressReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Now processing: {}, Sigma of Gaussian blur kernel: {}, Variance of Gaussian noise: {}, Frame index: {}/{}",
            self.poses_file, self.blur_sigma, self.noise_variance, self.frame, self.total
        )
    }
}

/// Receives progress reports from the generator.
pub trait ProgressSink {
    fn report(&mut self, report: &ProgressReport);
}

/// Sends progress reports to the log at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn report(&mut self, report: &ProgressReport) {
        log::info!("{report}");
    }
}

impl<F: FnMut(&ProgressReport)> ProgressSink for F {
    fn report(&mut self, report: &ProgressReport) {
        self(report);
    }
}
