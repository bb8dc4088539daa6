//! Triangle setup data and the per-tile scan-line rasterizer.

use std::sync::Arc;

use nalgebra::{Vector2, Vector3};

use crate::camera::Camera;
use crate::clip::VSOutput;
use crate::framebuffer::Framebuffer;
use crate::shading::{self, ShadingMode};
use crate::texture::Texture;

/// Post-divide vertex. Position is in pixels (z keeps the [0,1] clip depth);
/// every other attribute is stored pre-multiplied by `inv_w` so the scan loop
/// can interpolate hyperbolically and divide back once per pixel.
#[derive(Clone, Copy, Debug)]
pub struct ScreenVertex {
    pub position: Vector3<f32>,
    pub inv_w: f32,
    pub world_pos: Vector3<f32>,
    pub normal: Vector3<f32>,
    pub uv: Vector2<f32>,
    pub light_intensity: f32,
}

/// One binned triangle: screen vertices, twice its signed area, the clamped
/// pixel bounding box and the per-face shading inputs.
#[derive(Clone)]
pub struct TriangleData {
    pub v0: ScreenVertex,
    pub v1: ScreenVertex,
    pub v2: ScreenVertex,
    pub area2: f32,
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
    pub texture: Option<Arc<Texture>>,
    pub face_normal: Vector3<f32>,
    pub flat_intensity: f32,
}

/// Rectangular span of the framebuffer owned by one worker. `end_x`/`end_y`
/// are exclusive; spans never overlap and together cover the image exactly.
#[derive(Clone, Debug, Default)]
pub struct Tile {
    pub start_x: usize,
    pub start_y: usize,
    pub end_x: usize,
    pub end_y: usize,
    pub triangle_indices: Vec<usize>,
}

/// Map a clipped vertex to screen space. No Y flip: clip-space +y lands in
/// increasing row order.
pub fn perspective_divide(input: &VSOutput, width: usize, height: usize) -> ScreenVertex {
    let inv_w = 1.0 / input.position.w;
    ScreenVertex {
        position: Vector3::new(
            (input.position.x * inv_w + 1.0) * 0.5 * width as f32,
            (input.position.y * inv_w + 1.0) * 0.5 * height as f32,
            input.position.z * inv_w,
        ),
        inv_w,
        world_pos: input.world_pos * inv_w,
        normal: input.normal * inv_w,
        uv: input.uv * inv_w,
        // filled in at triangle setup once the clipped vertex is lit
        light_intensity: 0.0,
    }
}

/// Signed parallelogram area of edge (a, b) against probe point p.
pub fn edge_function(a: &Vector3<f32>, b: &Vector3<f32>, px: f32, py: f32) -> f32 {
    (px - a.x) * (b.y - a.y) - (py - a.y) * (b.x - a.x)
}

/// Rasterize every triangle binned to this tile, in binning order.
pub fn rasterize_tile(
    tile: &Tile,
    triangles: &[TriangleData],
    camera: &Camera,
    mode: ShadingMode,
    framebuffer: &Framebuffer,
) {
    for &triangle_index in &tile.triangle_indices {
        rasterize_triangle_in_tile(&triangles[triangle_index], tile, camera, mode, framebuffer);
    }
}

fn rasterize_triangle_in_tile(
    tri: &TriangleData,
    tile: &Tile,
    camera: &Camera,
    mode: ShadingMode,
    framebuffer: &Framebuffer,
) {
    let min_x = tri.min_x.max(tile.start_x as i32);
    let min_y = tri.min_y.max(tile.start_y as i32);
    let max_x = tri.max_x.min(tile.end_x as i32 - 1);
    let max_y = tri.max_y.min(tile.end_y as i32 - 1);

    let area2 = tri.area2;
    if area2 == 0.0 {
        return;
    }

    let (v0, v1, v2) = (&tri.v0, &tri.v1, &tri.v2);
    let texture = tri.texture.as_deref();
    let width = framebuffer.width();

    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let px = x as f32;
            let py = y as f32;

            let w0 = edge_function(&v1.position, &v2.position, px, py);
            let w1 = edge_function(&v2.position, &v0.position, px, py);
            let w2 = edge_function(&v0.position, &v1.position, px, py);

            // accept both windings; orientation was settled by the
            // world-space cull. Edge-touching pixels are included.
            let all_non_negative = w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0;
            let all_non_positive = w0 <= 0.0 && w1 <= 0.0 && w2 <= 0.0;
            if !(all_non_negative || all_non_positive) {
                continue;
            }

            let l0 = w0 / area2;
            let l1 = w1 / area2;
            let l2 = w2 / area2;

            // depth is linear in NDC z
            let z = l0 * v0.position.z + l1 * v1.position.z + l2 * v2.position.z;
            let index = y as usize * width + x as usize;
            if z >= framebuffer.depth_at_index(index) {
                continue;
            }
            framebuffer.store_depth_at_index(index, z);

            let pixel_inv_w = l0 * v0.inv_w + l1 * v1.inv_w + l2 * v2.inv_w;
            let pixel_w = 1.0 / pixel_inv_w;

            let normal = ((v0.normal * l0 + v1.normal * l1 + v2.normal * l2) * pixel_w)
                .try_normalize(f32::EPSILON)
                .unwrap_or_else(Vector3::zeros);
            let world_pos = (v0.world_pos * l0 + v1.world_pos * l1 + v2.world_pos * l2) * pixel_w;
            let uv = (v0.uv * l0 + v1.uv * l1 + v2.uv * l2) * pixel_w;
            let light_intensity =
                (l0 * v0.light_intensity + l1 * v1.light_intensity + l2 * v2.light_intensity)
                    * pixel_w;

            let fragment = ScreenVertex {
                position: Vector3::new(px, py, z),
                inv_w: pixel_inv_w,
                world_pos,
                normal,
                uv,
                light_intensity,
            };

            let color = shading::fragment_shader(&fragment, camera, texture, tri, mode);
            framebuffer.put_pixel(x, y, color);
        }
    }
}
