//! Gaussian blur and additive Gaussian noise applied to rendered frames.

use image::imageops::{blur_advanced, GaussianBlurParameters};
use image::{ImageBuffer, Rgb, RgbImage};
use objviewer_core::DegradationParams;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

type FloatImage = ImageBuffer<Rgb<f32>, Vec<f32>>;

/// Smallest sigma whose kernel can move an 8-bit value.
///
/// Below it the side taps weigh less than `exp(-8)`, so even a full 0..255
/// step changes a neighbour by under half a level. Smaller sigmas also round
/// the side taps to zero, and the blur filter mishandles a one-tap kernel.
pub const MIN_VISIBLE_BLUR_SIGMA: f32 = 0.25;

/// Blurs `image` with a Gaussian kernel of standard deviation `sigma`.
///
/// Sigmas below [`MIN_VISIBLE_BLUR_SIGMA`], zero included, return the image
/// unchanged. The kernel size follows from sigma, which is capped at the
/// longer image side.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn apply_blur(image: &RgbImage, sigma: f64) -> RgbImage {
    let longest = image.width().max(image.height()) as f32;
    let sigma = sigma as f32;
    if sigma.is_nan() || sigma.min(longest) < MIN_VISIBLE_BLUR_SIGMA {
        return image.clone();
    }
    let sigma = sigma.min(longest);
    blur_advanced(image, GaussianBlurParameters::new_from_sigma(sigma))
}

/// Adds zero-mean Gaussian noise of the given variance, then stretches the
/// result back onto the full `0..=255` range.
///
/// Noise is drawn independently per channel. A variance of zero returns the
/// image unchanged.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn apply_noise<R: Rng + ?Sized>(image: &RgbImage, variance: f64, rng: &mut R) -> RgbImage {
    if variance <= 0.0 {
        return image.clone();
    }
    let Ok(normal) = Normal::new(0.0_f32, variance.sqrt() as f32) else {
        log::warn!("noise variance {variance} is not usable; frame left untouched");
        return image.clone();
    };

    let (width, height) = image.dimensions();
    let mut noisy = FloatImage::new(width, height);
    for (dst, src) in noisy.pixels_mut().zip(image.pixels()) {
        for (d, s) in dst.0.iter_mut().zip(src.0) {
            *d = f32::from(s) + normal.sample(rng);
        }
    }

    let (min, max) = noisy
        .as_raw()
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let range = max - min;

    let mut out = RgbImage::new(width, height);
    for (dst, src) in out.pixels_mut().zip(noisy.pixels()) {
        for (d, &s) in dst.0.iter_mut().zip(&src.0) {
            let v = if range > f32::EPSILON {
                (s - min) / range * 255.0
            } else {
                s
            };
            *d = v.round().clamp(0.0, 255.0) as u8;
        }
    }
    out
}

/// Applies a line's degradation to every frame: blur first, then noise.
#[derive(Debug, Clone)]
pub struct Degrader {
    params: DegradationParams,
    rng: StdRng,
}

impl Degrader {
    /// Creates a degrader; with a seed the noise is reproducible.
    #[must_use]
    pub fn new(params: DegradationParams, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { params, rng }
    }

    /// Parameters in use.
    #[must_use]
    pub fn params(&self) -> DegradationParams {
        self.params
    }

    /// Degrades one frame.
    pub fn apply(&mut self, frame: &RgbImage) -> RgbImage {
        let blurred = apply_blur(frame, self.params.blur_sigma);
        apply_noise(&blurred, self.params.noise_variance, &mut self.rng)
    }
}
