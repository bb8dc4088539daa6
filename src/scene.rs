use std::sync::Arc;

use nalgebra::{Vector2, Vector3};

use crate::texture::Texture;

/// Input vertex: position, normal and texture coordinates.
#[derive(Clone, Copy, Debug)]
pub struct Vertex {
    pub position: Vector3<f32>,
    pub normal: Vector3<f32>,
    pub uv: Vector2<f32>,
}

/// A mesh is a dense vertex array plus a flat index array whose length is a
/// multiple of three. The asset loader upholds that invariant; hand-built
/// meshes that break it have their offending triples dropped at draw time.
#[derive(Clone, Debug, Default)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Transform {
    pub position: Vector3<f32>,
    /// Euler angles in radians, applied as Z then X then Y.
    pub rotation: Vector3<f32>,
    pub scale: Vector3<f32>,
}

impl Default for Transform {
    fn default() -> Self {
        Transform {
            position: Vector3::zeros(),
            rotation: Vector3::zeros(),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }
}

/// A drawable: mesh, world transform and an optional texture shared with the
/// rasterizer workers.
#[derive(Clone)]
pub struct GameObject {
    pub mesh: Mesh,
    pub transform: Transform,
    pub texture: Option<Arc<Texture>>,
}

impl GameObject {
    pub fn new(mesh: Mesh) -> GameObject {
        GameObject {
            mesh,
            transform: Transform::default(),
            texture: None,
        }
    }
}
