//! Parameters of the post-capture image degradation.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Blur and noise strengths; zero disables a stage.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DegradationParams {
    /// Standard deviation of the Gaussian blur, in pixels.
    pub blur_sigma: f64,
    /// Variance of the additive Gaussian noise, in 8-bit intensity units.
    pub noise_variance: f64,
}

impl DegradationParams {
    /// Both stages disabled.
    pub const NONE: Self = Self {
        blur_sigma: 0.0,
        noise_variance: 0.0,
    };

    /// Creates validated parameters.
    pub fn new(blur_sigma: f64, noise_variance: f64) -> Result<Self> {
        for (name, value) in [("blur_sigma", blur_sigma), ("noise_variance", noise_variance)] {
            if !value.is_finite() || value < 0.0 {
                return Err(CoreError::InvalidDegradation { name, value });
            }
        }
        Ok(Self {
            blur_sigma,
            noise_variance,
        })
    }

    /// Whether the blur stage runs.
    #[must_use]
    pub fn blur_enabled(&self) -> bool {
        self.blur_sigma != 0.0
    }

    /// Whether the noise stage runs.
    #[must_use]
    pub fn noise_enabled(&self) -> bool {
        self.noise_variance != 0.0
    }

    /// Whether the image passes through unchanged.
    #[must_use]
    pub fn is_identity(&self) -> bool {
        !self.blur_enabled() && !self.noise_enabled()
    }
}
