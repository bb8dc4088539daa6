// Software rendering pipeline, one draw call at a time:
//
// 1) Transform assembly: world = scale · rotZ · rotX · rotY · translate,
//    normal matrix, view, projection, MVP
// 2) Vertex stage: clip-space position, world position, world normal, uv
// 3) Back-face cull against the first vertex's world-space normal
// 4) Sutherland-Hodgman clip in homogeneous clip space, fan-triangulate
// 5) Perspective divide into screen space, attributes premultiplied by 1/w
// 6) Triangle setup and binning into the tile grid
// 7) Per-tile parallel scan with depth test and fragment shading
//
// Phases are separated by full barriers on the worker pool, so binning is
// finished before any tile is scanned and every tile is finished before
// draw_mesh returns.

use std::mem;
use std::sync::Arc;

use log::{debug, info};
use nalgebra::{Matrix4, Vector3};

use crate::camera::Camera;
use crate::clip::{self, VSOutput};
use crate::framebuffer::{Color, Framebuffer};
use crate::math;
use crate::pool::ThreadPool;
use crate::raster::{self, ScreenVertex, Tile, TriangleData};
use crate::scene::{GameObject, Vertex};
use crate::shading::{self, ShadingMode};
use crate::texture::Texture;

pub const DEFAULT_TILE_SIZE: usize = 64;

const NEAR_PLANE: f32 = 0.1;
const FAR_PLANE: f32 = 1000.0;
const MIN_TRIANGLE_AREA2: f32 = 0.001;

/// Everything the tile workers read during one draw call. Moved behind an
/// `Arc` for the dispatch and reclaimed afterwards so the allocations carry
/// over to the next frame.
struct FrameContext {
    triangles: Vec<TriangleData>,
    tiles: Vec<Tile>,
    camera: Camera,
    mode: ShadingMode,
}

pub struct Renderer {
    width: usize,
    height: usize,
    framebuffer: Arc<Framebuffer>,
    pool: ThreadPool,
    tile_size: usize,
    tiles_x: usize,
    tiles_y: usize,
    tiles: Vec<Tile>,
    triangle_buffer: Vec<TriangleData>,
    shading_mode: ShadingMode,
    present_scratch: Vec<u32>,
}

impl Renderer {
    pub fn new(width: usize, height: usize) -> Renderer {
        let thread_count = num_cpus::get().max(4);
        let mut renderer = Renderer {
            width,
            height,
            framebuffer: Arc::new(Framebuffer::new(width, height)),
            pool: ThreadPool::new(thread_count),
            tile_size: DEFAULT_TILE_SIZE,
            tiles_x: 0,
            tiles_y: 0,
            tiles: Vec::new(),
            triangle_buffer: Vec::new(),
            shading_mode: ShadingMode::default(),
            present_scratch: Vec::with_capacity(width * height),
        };
        renderer.init_tiles();
        info!(
            "renderer: {}x{} target, {} workers, {}x{} tiles of {}px",
            width, height, thread_count, renderer.tiles_x, renderer.tiles_y, renderer.tile_size
        );
        renderer
    }

    fn init_tiles(&mut self) {
        self.tiles_x = self.width.div_ceil(self.tile_size);
        self.tiles_y = self.height.div_ceil(self.tile_size);
        self.tiles.clear();
        self.tiles.reserve(self.tiles_x * self.tiles_y);
        for ty in 0..self.tiles_y {
            for tx in 0..self.tiles_x {
                let start_x = tx * self.tile_size;
                let start_y = ty * self.tile_size;
                self.tiles.push(Tile {
                    start_x,
                    start_y,
                    end_x: (start_x + self.tile_size).min(self.width),
                    end_y: (start_y + self.tile_size).min(self.height),
                    triangle_indices: Vec::new(),
                });
            }
        }
    }

    /// Reset every pixel to `color` and every depth to +∞, split across the
    /// pool as roughly equal ranges.
    pub fn clear(&self, color: Color) {
        let total = self.width * self.height;
        let workers = self.pool.thread_count();
        let chunk = total.div_ceil(workers.max(1));

        for t in 0..workers {
            let start = t * chunk;
            if start >= total {
                break;
            }
            let end = (start + chunk).min(total);
            let framebuffer = Arc::clone(&self.framebuffer);
            self.pool
                .execute(move || framebuffer.clear_range(start, end, color));
        }
        self.pool.wait_all();
    }

    /// Run the full pipeline for one object.
    ///
    /// Culling happens in world space against the first vertex's normal; the
    /// raster stage then accepts either winding. A mesh whose normals
    /// disagree with its vertex order therefore still draws.
    pub fn draw_mesh(&mut self, object: &GameObject, camera: &Camera) {
        let t = &object.transform;
        let world = math::scale(t.scale.x, t.scale.y, t.scale.z)
            * math::rotation_z(t.rotation.z)
            * math::rotation_x(t.rotation.x)
            * math::rotation_y(t.rotation.y)
            * math::translation(t.position.x, t.position.y, t.position.z);
        let normal_mat = math::normal_matrix(&world);
        let view = math::translation(-camera.position.x, -camera.position.y, -camera.position.z)
            * camera.rotation_matrix.transpose();
        let projection = math::projection(
            camera.fov,
            self.height as f32 / self.width as f32,
            NEAR_PLANE,
            FAR_PLANE,
        );
        let mvp = world * view * projection;

        for tile in &mut self.tiles {
            tile.triangle_indices.clear();
        }
        self.triangle_buffer.clear();

        let processed: Vec<VSOutput> = object
            .mesh
            .vertices
            .iter()
            .map(|v| vertex_shader(v, &mvp, &world, &normal_mat))
            .collect();

        for triple in object.mesh.indices.chunks_exact(3) {
            // out-of-range indices are dropped; the asset loader normally
            // guarantees they cannot occur
            let (Some(vs0), Some(vs1), Some(vs2)) = (
                processed.get(triple[0] as usize),
                processed.get(triple[1] as usize),
                processed.get(triple[2] as usize),
            ) else {
                continue;
            };

            let to_camera = camera.position - vs0.world_pos;
            if vs0.normal.dot(&to_camera) <= 0.0 {
                continue;
            }

            let polygon = clip::clip_triangle(vs0, vs1, vs2);
            if polygon.len() < 3 {
                continue;
            }

            // per-face shading inputs from the first three clipped vertices
            let edge1 = polygon[1].world_pos - polygon[0].world_pos;
            let edge2 = polygon[2].world_pos - polygon[0].world_pos;
            let face_normal = edge1
                .cross(&edge2)
                .try_normalize(f32::EPSILON)
                .unwrap_or_else(Vector3::zeros);
            let centroid =
                (polygon[0].world_pos + polygon[1].world_pos + polygon[2].world_pos) / 3.0;
            let flat_intensity = shading::light_intensity(&face_normal, &centroid, camera);

            let sv0 = self.setup_screen_vertex(&polygon[0], camera);
            for j in 1..polygon.len() - 1 {
                let sv1 = self.setup_screen_vertex(&polygon[j], camera);
                let sv2 = self.setup_screen_vertex(&polygon[j + 1], camera);
                self.push_triangle(
                    sv0,
                    sv1,
                    sv2,
                    object.texture.clone(),
                    face_normal,
                    flat_intensity,
                );
            }
        }

        self.dispatch_tiles(camera);
    }

    fn setup_screen_vertex(&self, clipped: &VSOutput, camera: &Camera) -> ScreenVertex {
        let mut sv = raster::perspective_divide(clipped, self.width, self.height);
        // vertex lighting for Gouraud, premultiplied like every attribute
        sv.light_intensity =
            shading::light_intensity(&clipped.normal, &clipped.world_pos, camera) * sv.inv_w;
        sv
    }

    fn push_triangle(
        &mut self,
        v0: ScreenVertex,
        v1: ScreenVertex,
        v2: ScreenVertex,
        texture: Option<Arc<Texture>>,
        face_normal: Vector3<f32>,
        flat_intensity: f32,
    ) {
        let area2 = raster::edge_function(&v0.position, &v1.position, v2.position.x, v2.position.y);
        if area2.abs() < MIN_TRIANGLE_AREA2 {
            return;
        }

        let min_x = (v0.position.x.min(v1.position.x).min(v2.position.x).floor() as i32).max(0);
        let min_y = (v0.position.y.min(v1.position.y).min(v2.position.y).floor() as i32).max(0);
        let max_x = (v0.position.x.max(v1.position.x).max(v2.position.x).ceil() as i32)
            .min(self.width as i32 - 1);
        let max_y = (v0.position.y.max(v1.position.y).max(v2.position.y).ceil() as i32)
            .min(self.height as i32 - 1);
        if min_x > max_x || min_y > max_y {
            return;
        }

        let triangle_index = self.triangle_buffer.len();
        self.triangle_buffer.push(TriangleData {
            v0,
            v1,
            v2,
            area2,
            min_x,
            min_y,
            max_x,
            max_y,
            texture,
            face_normal,
            flat_intensity,
        });
        self.bin_triangle(triangle_index);
    }

    /// Append the triangle index to every tile its bounding box overlaps.
    fn bin_triangle(&mut self, triangle_index: usize) {
        let tri = &self.triangle_buffer[triangle_index];
        let tile_size = self.tile_size as i32;
        let start_tx = (tri.min_x / tile_size) as usize;
        let start_ty = (tri.min_y / tile_size) as usize;
        let end_tx = ((tri.max_x / tile_size) as usize).min(self.tiles_x - 1);
        let end_ty = ((tri.max_y / tile_size) as usize).min(self.tiles_y - 1);

        for ty in start_ty..=end_ty {
            for tx in start_tx..=end_tx {
                self.tiles[ty * self.tiles_x + tx]
                    .triangle_indices
                    .push(triangle_index);
            }
        }
    }

    fn dispatch_tiles(&mut self, camera: &Camera) {
        if self.triangle_buffer.is_empty() {
            return;
        }

        let ctx = Arc::new(FrameContext {
            triangles: mem::take(&mut self.triangle_buffer),
            tiles: mem::take(&mut self.tiles),
            camera: *camera,
            mode: self.shading_mode,
        });

        for tile_index in 0..ctx.tiles.len() {
            if ctx.tiles[tile_index].triangle_indices.is_empty() {
                continue;
            }
            let ctx = Arc::clone(&ctx);
            let framebuffer = Arc::clone(&self.framebuffer);
            self.pool.execute(move || {
                let tile = &ctx.tiles[tile_index];
                raster::rasterize_tile(tile, &ctx.triangles, &ctx.camera, ctx.mode, &framebuffer);
            });
        }
        self.pool.wait_all();

        // after the barrier the workers have dropped their clones
        match Arc::try_unwrap(ctx) {
            Ok(ctx) => {
                self.triangle_buffer = ctx.triangles;
                self.tiles = ctx.tiles;
            }
            Err(_) => self.init_tiles(),
        }
    }

    /// Hand the finished frame to the host for blitting.
    pub fn present<F>(&mut self, blit: F)
    where
        F: FnOnce(&[u32], usize, usize),
    {
        self.framebuffer.copy_color_into(&mut self.present_scratch);
        blit(&self.present_scratch, self.width, self.height);
    }

    pub fn set_tile_size(&mut self, size: usize) {
        self.tile_size = size.max(1);
        self.init_tiles();
        debug!(
            "tile grid rebuilt: {}x{} tiles of {}px",
            self.tiles_x, self.tiles_y, self.tile_size
        );
    }

    pub fn set_shading_mode(&mut self, mode: ShadingMode) {
        self.shading_mode = mode;
    }

    pub fn shading_mode(&self) -> ShadingMode {
        self.shading_mode
    }

    pub fn shading_mode_name(&self) -> &'static str {
        self.shading_mode.name()
    }

    pub fn thread_count(&self) -> usize {
        self.pool.thread_count()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Read access to the finished color and depth buffers.
    pub fn framebuffer(&self) -> &Framebuffer {
        &self.framebuffer
    }
}

fn vertex_shader(
    vertex: &Vertex,
    mvp: &Matrix4<f32>,
    world: &Matrix4<f32>,
    normal_mat: &Matrix4<f32>,
) -> VSOutput {
    VSOutput {
        position: math::transform_point4(&vertex.position, mvp),
        world_pos: math::transform_point(&vertex.position, world),
        normal: math::transform_direction(&vertex.normal, normal_mat)
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(Vector3::zeros),
        uv: vertex.uv,
    }
}
