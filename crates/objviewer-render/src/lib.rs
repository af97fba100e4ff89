//! Render/capture boundary for objviewer-rs.
//!
//! This crate turns a [`Scene`] and a pose into pixels:
//! - [`model`] and [`texture`]: OBJ geometry, materials and diffuse textures
//! - [`scene`]: the explicit scene context handed to every render call
//! - [`camera`]: the interactive trackball view
//! - [`renderer`]: the [`Renderer`] trait, and [`software`] its CPU implementation
//! - [`degradation`]: blur and noise applied to captured frames
//! - [`screenshot`]: PNG/JPEG output

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
// Single-letter math names (x, y, w, h, ...) mirror the usual notation
#![allow(clippy::many_single_char_names)]
#![allow(clippy::similar_names)]

pub mod camera;
pub mod degradation;
pub mod error;
pub mod model;
pub mod renderer;
pub mod scene;
pub mod screenshot;
pub mod software;
pub mod texture;

pub use camera::InteractiveView;
pub use degradation::{apply_blur, apply_noise, Degrader};
pub use error::{RenderError, RenderResult};
pub use model::{Material, Mesh, Model};
pub use renderer::Renderer;
pub use scene::{RenderSettings, Scene};
pub use screenshot::save_image;
pub use software::SoftwareRenderer;
pub use texture::Texture;

// Re-export the image type frames are produced in
pub use image::RgbImage;
