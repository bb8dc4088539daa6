//! Mesh and texture loading for hosts. The core pipeline never touches the
//! filesystem; everything here feeds it ready-to-render data.

use std::fs::File;
use std::io::{Cursor, Read};
use std::path::Path;

use log::info;
use nalgebra::{Vector2, Vector3};
use obj::{load_obj, Obj, TexturedVertex};
use thiserror::Error;

use crate::framebuffer::Color;
use crate::scene::{Mesh, Vertex};
use crate::texture::Texture;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse OBJ: {0}")]
    Obj(#[from] obj::ObjError),
    #[error("failed to decode image: {0}")]
    Image(#[from] image::ImageError),
    #[error("malformed mesh: {0}")]
    Malformed(&'static str),
}

/// Load a triangulated OBJ mesh with positions, normals and UVs.
///
/// Files without texture coordinates fall back to a plain position+normal
/// parse with zeroed UVs. The returned mesh always satisfies the renderer's
/// input invariant: the index count is a multiple of three and every index is
/// in range.
pub fn load_mesh<P: AsRef<Path>>(path: P) -> Result<Mesh, AssetError> {
    let path = path.as_ref();
    let mut raw = Vec::new();
    File::open(path)
        .and_then(|mut file| file.read_to_end(&mut raw))
        .map_err(|source| AssetError::Io {
            path: path.display().to_string(),
            source,
        })?;

    let textured: Result<Obj<TexturedVertex, u32>, _> = load_obj(Cursor::new(&raw));
    let mesh = match textured {
        Ok(model) => Mesh {
            vertices: model
                .vertices
                .iter()
                .map(|v| Vertex {
                    position: Vector3::new(v.position[0], v.position[1], v.position[2]),
                    normal: Vector3::new(v.normal[0], v.normal[1], v.normal[2]),
                    uv: Vector2::new(v.texture[0], v.texture[1]),
                })
                .collect(),
            indices: model.indices,
        },
        Err(_) => {
            let model: Obj<obj::Vertex, u32> = load_obj(Cursor::new(&raw))?;
            Mesh {
                vertices: model
                    .vertices
                    .iter()
                    .map(|v| Vertex {
                        position: Vector3::new(v.position[0], v.position[1], v.position[2]),
                        normal: Vector3::new(v.normal[0], v.normal[1], v.normal[2]),
                        uv: Vector2::zeros(),
                    })
                    .collect(),
                indices: model.indices,
            }
        }
    };

    validate_mesh(&mesh)?;
    info!(
        "loaded mesh {}: {} vertices, {} triangles",
        path.display(),
        mesh.vertices.len(),
        mesh.triangle_count()
    );
    Ok(mesh)
}

fn validate_mesh(mesh: &Mesh) -> Result<(), AssetError> {
    if mesh.indices.is_empty() {
        return Err(AssetError::Malformed("no triangles"));
    }
    if mesh.indices.len() % 3 != 0 {
        return Err(AssetError::Malformed("index count not a multiple of three"));
    }
    let vertex_count = mesh.vertices.len() as u32;
    if mesh.indices.iter().any(|&i| i >= vertex_count) {
        return Err(AssetError::Malformed("index out of range"));
    }
    Ok(())
}

/// Decode an image file into an RGBA8 texture.
pub fn load_texture<P: AsRef<Path>>(path: P) -> Result<Texture, AssetError> {
    let path = path.as_ref();
    let img = image::open(path)?.to_rgba8();
    let (width, height) = img.dimensions();
    let pixels = img
        .pixels()
        .map(|p| Color::new(p[0], p[1], p[2], p[3]))
        .collect();

    info!("loaded texture {}: {}x{}", path.display(), width, height);
    Ok(Texture::new(width as usize, height as usize, pixels))
}
