//! Wavefront OBJ models with their materials and diffuse textures.

use std::collections::HashMap;
use std::path::Path;

use glam::{Vec2, Vec3};

use crate::error::{RenderError, RenderResult};
use crate::texture::Texture;

/// Surface material of a mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: String,
    pub ambient: Vec3,
    pub diffuse: Vec3,
    /// Opacity, 1 is opaque.
    pub dissolve: f32,
    /// Texture name as written in the material file, whitespace trimmed.
    pub diffuse_texture: Option<String>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: String::new(),
            ambient: Vec3::splat(0.2),
            diffuse: Vec3::splat(0.8),
            dissolve: 1.0,
            diffuse_texture: None,
        }
    }
}

impl From<tobj::Material> for Material {
    fn from(m: tobj::Material) -> Self {
        let defaults = Material::default();
        let diffuse_texture = m
            .diffuse_texture
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty());
        Self {
            name: m.name,
            ambient: m.ambient.map_or(defaults.ambient, Vec3::from),
            diffuse: m.diffuse.map_or(defaults.diffuse, Vec3::from),
            dissolve: m.dissolve.unwrap_or(defaults.dissolve),
            diffuse_texture,
        }
    }
}

/// A triangle mesh with one index shared by positions and texcoords.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub name: String,
    pub positions: Vec<Vec3>,
    pub texcoords: Vec<Vec2>,
    pub indices: Vec<u32>,
    pub material_id: Option<usize>,
}

impl Mesh {
    /// Creates an untextured mesh.
    pub fn new(name: impl Into<String>, positions: Vec<Vec3>, indices: Vec<u32>) -> Self {
        Self {
            name: name.into(),
            positions,
            indices,
            ..Self::default()
        }
    }

    /// Number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Vertex indices of triangle `f`.
    pub fn triangle(&self, f: usize) -> [usize; 3] {
        [
            self.indices[3 * f] as usize,
            self.indices[3 * f + 1] as usize,
            self.indices[3 * f + 2] as usize,
        ]
    }

    fn from_tobj(model: tobj::Model) -> Self {
        let name = model.name;
        let mesh = model.mesh;
        let positions = mesh
            .positions
            .chunks_exact(3)
            .map(|p| Vec3::new(p[0], p[1], p[2]))
            .collect();
        let texcoords = mesh
            .texcoords
            .chunks_exact(2)
            .map(|t| Vec2::new(t[0], t[1]))
            .collect();

        Self {
            name,
            positions,
            texcoords,
            indices: mesh.indices,
            material_id: mesh.material_id,
        }
    }
}

/// A loaded model: meshes, materials and the textures they reference.
#[derive(Debug, Clone, Default)]
pub struct Model {
    pub meshes: Vec<Mesh>,
    pub materials: Vec<Material>,
    textures: HashMap<String, Texture>,
}

impl Model {
    /// Builds a model from in-memory meshes and materials, without textures.
    pub fn from_parts(meshes: Vec<Mesh>, materials: Vec<Material>) -> Self {
        Self {
            meshes,
            materials,
            textures: HashMap::new(),
        }
    }

    /// Loads an OBJ file, its material library and diffuse textures.
    ///
    /// Textures are resolved relative to the model's directory; a texture that
    /// cannot be read fails the whole load. With `unitize`, the model is
    /// centred and scaled to fit a cube of side 2.
    pub fn load(path: &Path, unitize: bool) -> RenderResult<Self> {
        let model_error = |reason: String| RenderError::ModelLoad {
            path: path.to_path_buf(),
            reason,
        };

        let (models, materials) = tobj::load_obj(
            path,
            &tobj::LoadOptions {
                triangulate: true,
                single_index: true,
                ..Default::default()
            },
        )
        .map_err(|e| model_error(e.to_string()))?;

        let materials: Vec<Material> = match materials {
            Ok(materials) => materials.into_iter().map(Material::from).collect(),
            Err(e) => {
                log::warn!("no materials for {}: {e}", path.display());
                Vec::new()
            }
        };

        let dir = path.parent().unwrap_or_else(|| Path::new(""));
        let mut textures = HashMap::new();
        for name in materials.iter().filter_map(|m| m.diffuse_texture.as_ref()) {
            if !textures.contains_key(name) {
                textures.insert(name.clone(), Texture::load(&dir.join(name))?);
            }
        }

        let meshes: Vec<Mesh> = models.into_iter().map(Mesh::from_tobj).collect();
        if meshes.iter().all(|m| m.positions.is_empty()) {
            return Err(model_error("no geometry".to_string()));
        }

        let mut model = Self {
            meshes,
            materials,
            textures,
        };
        if unitize {
            model.unitize();
        }

        log::info!(
            "loaded model {} ({} meshes, {} triangles)",
            path.display(),
            model.meshes.len(),
            model.triangle_count()
        );
        Ok(model)
    }

    /// Total number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.meshes.iter().map(Mesh::triangle_count).sum()
    }

    /// Material of a mesh, if it references a valid one.
    pub fn material(&self, mesh: &Mesh) -> Option<&Material> {
        mesh.material_id.and_then(|id| self.materials.get(id))
    }

    /// Diffuse texture by material texture name.
    pub fn texture(&self, name: &str) -> Option<&Texture> {
        self.textures.get(name)
    }

    /// Registers a texture under the name materials use for it.
    pub fn insert_texture(&mut self, name: impl Into<String>, texture: Texture) {
        self.textures.insert(name.into(), texture);
    }

    /// Axis-aligned bounding box over all meshes.
    pub fn bounding_box(&self) -> Option<(Vec3, Vec3)> {
        self.meshes
            .iter()
            .flat_map(|m| m.positions.iter().copied())
            .fold(None, |acc, p| match acc {
                None => Some((p, p)),
                Some((min, max)) => Some((min.min(p), max.max(p))),
            })
    }

    /// Centres the model on its bounding box and scales it to span 2 units.
    ///
    /// The extent on each axis is taken as `|max| + |min|`.
    pub fn unitize(&mut self) {
        let Some((min, max)) = self.bounding_box() else {
            return;
        };
        let extent = max.abs() + min.abs();
        let largest = extent.max_element();
        if largest <= 0.0 {
            return;
        }
        let center = (min + max) * 0.5;
        let scale = 2.0 / largest;

        for mesh in &mut self.meshes {
            for p in &mut mesh.positions {
                *p = (*p - center) * scale;
            }
        }
    }
}
