//! Interactive view: trackball rotation, panning and zoom of the model pose.

use glam::{DMat3, DMat4, DVec2, DVec3};
use objviewer_core::rotation::trackball_with_radius;
use objviewer_core::{OffsetPose, PoseSample, ViewerOptions};

/// Pose of the model under mouse control.
///
/// Mouse positions are in window pixels with the origin at the top left.
#[derive(Debug, Clone)]
pub struct InteractiveView {
    rotation: DMat3,
    translation: DVec3,
    offset: OffsetPose,
    width: u32,
    height: u32,
    /// Radius of the virtual trackball in normalized device coordinates.
    pub trackball_radius: f64,
    /// Translation per full viewport drag.
    pub pan_ratio: f64,
    /// Translation along the view axis per wheel unit.
    pub wheel_ratio: f64,
}

impl InteractiveView {
    /// Creates a view with identity pose and the configured offset.
    #[must_use]
    pub fn new(options: &ViewerOptions) -> Self {
        Self {
            rotation: DMat3::IDENTITY,
            translation: DVec3::ZERO,
            offset: options.offset_pose,
            width: options.frame_width.max(1),
            height: options.frame_height.max(1),
            trackball_radius: options.trackball_radius,
            pan_ratio: options.pan_ratio,
            wheel_ratio: options.wheel_ratio,
        }
    }

    /// Sets the viewport size in pixels.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.width = width.max(1);
        self.height = height.max(1);
    }

    /// Viewport size as `(width, height)`.
    #[must_use]
    pub fn viewport(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Converts a pixel position to normalized device coordinates, y up.
    #[must_use]
    pub fn to_ndc(&self, px: DVec2) -> DVec2 {
        let w = f64::from(self.width);
        let h = f64::from(self.height);
        DVec2::new((2.0 * px.x - w) / w, (h - 2.0 * px.y) / h)
    }

    /// Rotates the model by a trackball drag from `prev` to `curr`.
    pub fn drag_rotate(&mut self, prev: DVec2, curr: DVec2) {
        let drag = trackball_with_radius(
            self.trackball_radius,
            self.to_ndc(prev),
            self.to_ndc(curr),
        );
        self.rotation = drag * self.rotation;
    }

    /// Moves the model in the view plane by a drag from `prev` to `curr`.
    pub fn drag_pan(&mut self, prev: DVec2, curr: DVec2) {
        let d = curr - prev;
        self.translation += DVec3::new(
            d.x / f64::from(self.width),
            -d.y / f64::from(self.height),
            0.0,
        ) * self.pan_ratio;
    }

    /// Moves the model along the view axis.
    pub fn wheel(&mut self, delta: f64) {
        self.translation.z -= delta * self.wheel_ratio;
    }

    /// Back to identity rotation and zero translation.
    pub fn reset(&mut self) {
        self.rotation = DMat3::IDENTITY;
        self.translation = DVec3::ZERO;
    }

    /// Current pose.
    #[must_use]
    pub fn pose(&self) -> PoseSample {
        PoseSample::new(self.rotation, self.translation)
    }

    /// Replaces the current pose.
    pub fn set_pose(&mut self, pose: PoseSample) {
        self.rotation = pose.rotation;
        self.translation = pose.translation;
    }

    /// Offset placed in front of the pose.
    #[must_use]
    pub fn offset_pose(&self) -> OffsetPose {
        self.offset
    }

    /// Replaces the offset pose.
    pub fn set_offset_pose(&mut self, offset: OffsetPose) {
        self.offset = offset;
    }

    /// Model-view matrix: offset, then the current pose.
    #[must_use]
    pub fn model_view(&self) -> DMat4 {
        self.offset.to_mat4() * self.pose().to_mat4()
    }
}

impl Default for InteractiveView {
    fn default() -> Self {
        Self::new(&ViewerOptions::default())
    }
}
