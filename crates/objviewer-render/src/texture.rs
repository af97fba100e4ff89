//! Diffuse textures referenced by model materials.

use std::path::Path;

use glam::{Vec2, Vec4};
use image::RgbaImage;

use crate::error::{RenderError, RenderResult};

/// An RGBA texture sampled with nearest filtering and repeat wrapping.
#[derive(Debug, Clone)]
pub struct Texture {
    image: RgbaImage,
}

impl Texture {
    /// Loads a texture from any format the `image` crate decodes (TGA included).
    pub fn load(path: &Path) -> RenderResult<Self> {
        let image = image::open(path)
            .map_err(|source| RenderError::TextureLoad {
                path: path.to_path_buf(),
                source,
            })?
            .to_rgba8();
        log::debug!(
            "loaded texture {} ({}x{})",
            path.display(),
            image.width(),
            image.height()
        );
        Ok(Self { image })
    }

    /// Wraps an already decoded image.
    pub fn from_image(image: RgbaImage) -> Self {
        Self { image }
    }

    /// Texture size in pixels.
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Samples at texture coordinate `uv`; `v = 0` is the bottom row.
    ///
    /// Returns normalized RGBA.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    pub fn sample(&self, uv: Vec2) -> Vec4 {
        let (w, h) = self.image.dimensions();
        if w == 0 || h == 0 {
            return Vec4::ONE;
        }
        let u = uv.x - uv.x.floor();
        let v = uv.y - uv.y.floor();
        let x = ((u * w as f32) as u32).min(w - 1);
        let y = (((1.0 - v) * h as f32) as u32).min(h - 1);
        let p = self.image.get_pixel(x, y).0;
        Vec4::new(
            f32::from(p[0]),
            f32::from(p[1]),
            f32::from(p[2]),
            f32::from(p[3]),
        ) / 255.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn two_rows() -> Texture {
        // Top row red, bottom row blue.
        let mut image = RgbaImage::new(2, 2);
        for x in 0..2 {
            image.put_pixel(x, 0, Rgba([255, 0, 0, 255]));
            image.put_pixel(x, 1, Rgba([0, 0, 255, 255]));
        }
        Texture::from_image(image)
    }

    #[test]
    fn test_sample_orientation() {
        let texture = two_rows();
        assert_eq!(texture.sample(Vec2::new(0.25, 0.9)), Vec4::new(1.0, 0.0, 0.0, 1.0));
        assert_eq!(texture.sample(Vec2::new(0.25, 0.1)), Vec4::new(0.0, 0.0, 1.0, 1.0));
    }

    #[test]
    fn test_sample_wraps() {
        let texture = two_rows();
        assert_eq!(
            texture.sample(Vec2::new(1.25, 1.9)),
            texture.sample(Vec2::new(0.25, 0.9))
        );
        assert_eq!(
            texture.sample(Vec2::new(-0.75, -0.1)),
            texture.sample(Vec2::new(0.25, 0.9))
        );
    }

    #[test]
    fn test_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tex.tga");
        let image = RgbaImage::from_pixel(4, 3, Rgba([10, 20, 30, 255]));
        image.save(&path).unwrap();
        let texture = Texture::load(&path).unwrap();
        assert_eq!(texture.dimensions(), (4, 3));
    }

    #[test]
    fn test_load_missing() {
        assert!(matches!(
            Texture::load(Path::new("/nonexistent/tex.png")),
            Err(RenderError::TextureLoad { .. })
        ));
    }
}
