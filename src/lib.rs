//! CPU software rasterizer.
//!
//! Indexed triangle meshes with per-vertex position, normal and texture
//! coordinates go in; a shaded RGBA framebuffer comes out. The pipeline runs
//! the classic chain: world/view/projection transforms, homogeneous frustum
//! clipping, perspective divide, back-face culling, triangle binning into
//! screen tiles, depth-tested parallel scan conversion with
//! perspective-correct interpolation, and a choice of five shading modes with
//! bilinear texture sampling.
//!
//! Window creation, input and the final blit belong to the host: build a
//! [`renderer::Renderer`], draw into it, and pass the finished pixels on via
//! [`renderer::Renderer::present`].

pub mod assets;
pub mod camera;
pub mod clip;
pub mod framebuffer;
pub mod math;
pub mod pool;
pub mod raster;
pub mod renderer;
pub mod scene;
pub mod shading;
pub mod texture;

pub use camera::Camera;
pub use framebuffer::{Color, Framebuffer};
pub use renderer::Renderer;
pub use scene::{GameObject, Mesh, Transform, Vertex};
pub use shading::ShadingMode;
pub use texture::Texture;
