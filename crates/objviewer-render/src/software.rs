//! CPU rasterizer implementing [`Renderer`].
//!
//! Triangles go through the scene's model-view and projection matrices into
//! OpenGL clip space, then onto a top-down pixel grid. Depth uses the usual
//! `[0, 1]` window range with a less-than test. Shading is flat and two-sided,
//! lit by four point lights fixed in eye space.

use glam::{DVec2, DVec3, DVec4, Vec2, Vec3};
use image::{Rgb, RgbImage};
use objviewer_core::{PoseSample, RenderMode};

use crate::error::{RenderError, RenderResult};
use crate::model::{Material, Mesh, Model};
use crate::renderer::Renderer;
use crate::scene::Scene;
use crate::texture::Texture;

/// Eye-space light positions.
pub const LIGHT_POSITIONS: [Vec3; 4] = [
    Vec3::new(7.0, 0.0, 0.0),
    Vec3::new(-7.0, 0.0, 0.0),
    Vec3::new(0.0, 7.0, 0.0),
    Vec3::new(0.0, -7.0, 0.0),
];

/// Ambient intensity of each light.
pub const LIGHT_AMBIENT: f32 = 0.1;

/// Diffuse intensity of each light.
pub const LIGHT_DIFFUSE: f32 = 0.5;

/// Triangles with a vertex at `w` below this are behind the eye and skipped.
const MIN_CLIP_W: f64 = 1e-9;

/// Distance in pixels from an edge that wireframe mode still draws.
const WIRE_WIDTH: f64 = 1.0;

/// A triangle ready for scan conversion.
struct ScreenTriangle {
    /// Pixel x, pixel row and window depth per vertex.
    points: [DVec3; 3],
    /// Reciprocal clip `w` per vertex, for perspective-correct attributes.
    inv_w: [f64; 3],
    uv: Option<[Vec2; 3]>,
}

/// Per-triangle surface description.
struct Surface<'a> {
    colour: Vec3,
    alpha: f32,
    texture: Option<&'a Texture>,
}

/// Reference renderer that draws on the CPU.
#[derive(Debug, Default)]
pub struct SoftwareRenderer {
    depth: Vec<f32>,
}

impl SoftwareRenderer {
    /// Creates a renderer with an empty depth buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn draw_mesh(
        &mut self,
        frame: &mut RgbImage,
        scene: &Scene,
        model: &Model,
        mesh: &Mesh,
        pose: &PoseSample,
    ) {
        let default_material = Material::default();
        let material = model.material(mesh).unwrap_or(&default_material);
        let texture = material
            .diffuse_texture
            .as_deref()
            .and_then(|name| model.texture(name));
        let has_uv = mesh.texcoords.len() == mesh.positions.len();

        let model_view = scene.model_view(pose);
        let projection = scene.projection().to_mat4();
        let eye: Vec<DVec3> = mesh
            .positions
            .iter()
            .map(|p| model_view.transform_point3(p.as_dvec3()))
            .collect();
        let clip: Vec<DVec4> = eye.iter().map(|e| projection * e.extend(1.0)).collect();

        let (width, height) = frame.dimensions();
        let size = DVec2::new(f64::from(width), f64::from(height));

        for f in 0..mesh.triangle_count() {
            let idx = mesh.triangle(f);
            let c = idx.map(|i| clip[i]);
            if c.iter().any(|v| v.w <= MIN_CLIP_W) {
                continue;
            }
            let points = c.map(|v| {
                let ndc = v.truncate() / v.w;
                DVec3::new(
                    (ndc.x + 1.0) * 0.5 * size.x,
                    (1.0 - ndc.y) * 0.5 * size.y,
                    (ndc.z + 1.0) * 0.5,
                )
            });
            let triangle = ScreenTriangle {
                points,
                inv_w: c.map(|v| 1.0 / v.w),
                uv: (has_uv && texture.is_some()).then(|| idx.map(|i| mesh.texcoords[i])),
            };

            let colour = if scene.settings.lighting {
                shade_flat(material, idx.map(|i| eye[i]))
            } else {
                Vec3::ONE
            };
            let surface = Surface {
                colour,
                alpha: material.dissolve.clamp(0.0, 1.0),
                texture: texture.filter(|_| triangle.uv.is_some()),
            };
            self.rasterize(frame, &triangle, &surface, scene.settings.mode);
        }
    }

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    fn rasterize(
        &mut self,
        frame: &mut RgbImage,
        triangle: &ScreenTriangle,
        surface: &Surface<'_>,
        mode: RenderMode,
    ) {
        let [s0, s1, s2] = triangle.points;
        let area = edge(s0, s1, s2);
        if area.abs() < f64::EPSILON {
            return;
        }

        let (width, height) = frame.dimensions();
        let w = f64::from(width);
        let h = f64::from(height);
        let min_x = s0.x.min(s1.x).min(s2.x).clamp(0.0, w).floor() as u32;
        let max_x = s0.x.max(s1.x).max(s2.x).clamp(0.0, w).ceil() as u32;
        let min_y = s0.y.min(s1.y).min(s2.y).clamp(0.0, h).floor() as u32;
        let max_y = s0.y.max(s1.y).max(s2.y).clamp(0.0, h).ceil() as u32;

        let edge_lengths = [
            (s2 - s1).truncate().length(),
            (s0 - s2).truncate().length(),
            (s1 - s0).truncate().length(),
        ];

        for y in min_y..max_y.min(height) {
            for x in min_x..max_x.min(width) {
                let p = DVec3::new(f64::from(x) + 0.5, f64::from(y) + 0.5, 0.0);
                let b = [
                    edge(s1, s2, p) / area,
                    edge(s2, s0, p) / area,
                    edge(s0, s1, p) / area,
                ];
                if b.iter().any(|&bi| bi < 0.0) {
                    continue;
                }
                if mode == RenderMode::Wireframe {
                    let near_edge = b
                        .iter()
                        .zip(edge_lengths)
                        .any(|(&bi, len)| len > 0.0 && bi * area.abs() / len <= WIRE_WIDTH);
                    if !near_edge {
                        continue;
                    }
                }

                let z = b[0] * s0.z + b[1] * s1.z + b[2] * s2.z;
                if !(0.0..=1.0).contains(&z) {
                    continue;
                }
                let slot = (y * width + x) as usize;
                let z = z as f32;
                if z >= self.depth[slot] {
                    continue;
                }
                self.depth[slot] = z;

                let mut colour = surface.colour;
                let mut alpha = surface.alpha;
                if let (Some(texture), Some(uv)) = (surface.texture, triangle.uv) {
                    let weights = [
                        b[0] * triangle.inv_w[0],
                        b[1] * triangle.inv_w[1],
                        b[2] * triangle.inv_w[2],
                    ];
                    let sum = weights[0] + weights[1] + weights[2];
                    let texel_uv = (uv[0] * weights[0] as f32
                        + uv[1] * weights[1] as f32
                        + uv[2] * weights[2] as f32)
                        / sum as f32;
                    let texel = texture.sample(texel_uv);
                    colour *= texel.truncate();
                    alpha *= texel.w;
                }
                blend(frame.get_pixel_mut(x, y), colour, alpha);
            }
        }
    }
}

impl Renderer for SoftwareRenderer {
    fn render(&mut self, scene: &Scene, pose: &PoseSample) -> RenderResult<RgbImage> {
        let (width, height) = scene.frame_size();
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidFrame { width, height });
        }

        // The background always defines the frame size.
        let mut frame = scene
            .background()
            .cloned()
            .unwrap_or_else(|| RgbImage::new(width, height));
        self.depth.clear();
        self.depth.resize(width as usize * height as usize, 1.0);

        if let Some(model) = scene.model() {
            for mesh in &model.meshes {
                self.draw_mesh(&mut frame, scene, model, mesh, pose);
            }
        }
        Ok(frame)
    }
}

/// Twice the signed area of `(a, b, p)` in the pixel plane.
fn edge(a: DVec3, b: DVec3, p: DVec3) -> f64 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

/// Flat two-sided lighting of a triangle given in eye space.
#[allow(clippy::cast_possible_truncation)]
fn shade_flat(material: &Material, eye: [DVec3; 3]) -> Vec3 {
    let centroid = ((eye[0] + eye[1] + eye[2]) / 3.0).as_vec3();
    let mut normal = (eye[1] - eye[0])
        .cross(eye[2] - eye[0])
        .normalize_or_zero()
        .as_vec3();
    // Two-sided: light the face that looks at the eye.
    if normal.dot(-centroid) < 0.0 {
        normal = -normal;
    }

    let mut colour = Vec3::ZERO;
    for light in LIGHT_POSITIONS {
        let to_light = (light - centroid).normalize_or_zero();
        colour += LIGHT_AMBIENT * material.ambient
            + LIGHT_DIFFUSE * material.diffuse * normal.dot(to_light).max(0.0);
    }
    colour.clamp(Vec3::ZERO, Vec3::ONE)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn blend(pixel: &mut Rgb<u8>, colour: Vec3, alpha: f32) {
    let src = colour.clamp(Vec3::ZERO, Vec3::ONE) * 255.0;
    let alpha = alpha.clamp(0.0, 1.0);
    for (channel, value) in pixel.0.iter_mut().zip(src.to_array()) {
        let dst = f32::from(*channel);
        *channel = (alpha * value + (1.0 - alpha) * dst).round() as u8;
    }
}
