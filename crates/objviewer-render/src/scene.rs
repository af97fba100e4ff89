//! The scene context handed to a renderer.
//!
//! A [`Scene`] is an explicit value: whoever drives rendering owns it and
//! passes it to every step, so what survives between steps is visible at the
//! call site rather than hidden in globals.

use std::path::Path;

use glam::DMat4;
use image::RgbImage;
use objviewer_core::{
    CameraIntrinsics, ClipPlanes, OffsetPose, PoseSample, ProjectionMatrix, RenderMode,
    ViewerOptions,
};

use crate::error::{RenderError, RenderResult};
use crate::model::Model;

/// Drawing switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderSettings {
    pub mode: RenderMode,
    pub lighting: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            mode: RenderMode::Solid,
            lighting: true,
        }
    }
}

/// Everything needed to draw one frame apart from the pose.
#[derive(Debug, Clone)]
pub struct Scene {
    model: Option<Model>,
    background: Option<RgbImage>,
    frame_width: u32,
    frame_height: u32,
    intrinsics: CameraIntrinsics,
    clip_planes: ClipPlanes,
    projection: ProjectionMatrix,
    /// Transform placed in front of every pose.
    pub offset: OffsetPose,
    /// Drawing switches.
    pub settings: RenderSettings,
    defaults: ViewerOptions,
}

impl Scene {
    /// Creates an empty scene with the fallback projection for the default frame.
    pub fn new(options: &ViewerOptions) -> Self {
        let intrinsics =
            CameraIntrinsics::from_frame_size(options.frame_width, options.frame_height);
        Self {
            model: None,
            background: None,
            frame_width: options.frame_width,
            frame_height: options.frame_height,
            intrinsics,
            clip_planes: options.clip_planes,
            projection: intrinsics.projection_matrix(options.clip_planes),
            offset: options.offset_pose,
            settings: RenderSettings {
                mode: options.render_mode,
                lighting: options.lighting,
            },
            defaults: options.clone(),
        }
    }

    /// The loaded model, if any.
    pub fn model(&self) -> Option<&Model> {
        self.model.as_ref()
    }

    /// The background image, if any.
    pub fn background(&self) -> Option<&RgbImage> {
        self.background.as_ref()
    }

    /// Output frame size as `(width, height)`.
    pub fn frame_size(&self) -> (u32, u32) {
        (self.frame_width, self.frame_height)
    }

    /// Intrinsics behind the current projection.
    pub fn intrinsics(&self) -> &CameraIntrinsics {
        &self.intrinsics
    }

    /// Current clip planes.
    pub fn clip_planes(&self) -> ClipPlanes {
        self.clip_planes
    }

    /// Current projection matrix.
    pub fn projection(&self) -> &ProjectionMatrix {
        &self.projection
    }

    /// Replaces the model.
    pub fn set_model(&mut self, model: Model) {
        self.model = Some(model);
    }

    /// Loads the foreground model; on failure the previous model stays.
    pub fn load_model(&mut self, path: &Path, unitize: bool) -> RenderResult<()> {
        self.model = Some(Model::load(path, unitize)?);
        Ok(())
    }

    /// Loads the background image, which also fixes the output frame size.
    ///
    /// The projection is not rebuilt; call [`Scene::set_intrinsics`] or
    /// [`Scene::reset_projection`] afterwards.
    pub fn load_background(&mut self, path: &Path) -> RenderResult<(u32, u32)> {
        let image = image::open(path)
            .map_err(|source| RenderError::BackgroundLoad {
                path: path.to_path_buf(),
                source,
            })?
            .to_rgb8();
        log::debug!(
            "loaded background {} ({}x{})",
            path.display(),
            image.width(),
            image.height()
        );
        self.set_background(image)
    }

    /// Uses `image` as the background and frame size.
    pub fn set_background(&mut self, image: RgbImage) -> RenderResult<(u32, u32)> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidFrame { width, height });
        }
        self.frame_width = width;
        self.frame_height = height;
        self.background = Some(image);
        Ok((width, height))
    }

    /// Uses calibrated intrinsics and rebuilds the projection.
    pub fn set_intrinsics(&mut self, intrinsics: CameraIntrinsics) {
        self.intrinsics = intrinsics;
        self.rebuild_projection();
    }

    /// Rebuilds the projection from fallback intrinsics for the frame size.
    pub fn reset_projection(&mut self) {
        self.set_intrinsics(CameraIntrinsics::from_frame_size(
            self.frame_width,
            self.frame_height,
        ));
    }

    /// Changes the clip planes and rebuilds the projection.
    pub fn set_clip_planes(&mut self, clip_planes: ClipPlanes) {
        self.clip_planes = clip_planes;
        self.rebuild_projection();
    }

    fn rebuild_projection(&mut self) {
        self.projection = self.intrinsics.projection_matrix(self.clip_planes);
    }

    /// Model-view matrix for `pose`: offset first, then `[R | t]`.
    pub fn model_view(&self, pose: &PoseSample) -> DMat4 {
        self.offset.to_mat4() * pose.to_mat4()
    }

    /// Returns to the state of a freshly created scene.
    pub fn clear(&mut self) {
        let defaults = std::mem::take(&mut self.defaults);
        *self = Self::new(&defaults);
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new(&ViewerOptions::default())
    }
}
