use std::env;
use std::process;
use std::sync::Arc;
use std::time::Instant;

use log::{error, info};
use minifb::{Key, KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};
use nalgebra::{Vector2, Vector3};

use softrast::assets;
use softrast::camera::Camera;
use softrast::framebuffer::Color;
use softrast::renderer::Renderer;
use softrast::scene::{GameObject, Mesh, Vertex};
use softrast::shading::ShadingMode;

const WIN_WIDTH: usize = 800;
const WIN_HEIGHT: usize = 600;
const MOVE_SPEED: f32 = 4.0;
const MOUSE_SENSITIVITY: f32 = 0.005;

/// Single triangle facing the default camera, used when no OBJ is given.
fn default_model() -> Mesh {
    let normal = Vector3::new(0.0, 0.0, -1.0);
    Mesh {
        vertices: vec![
            Vertex {
                position: Vector3::new(0.0, 1.0, 0.0),
                normal,
                uv: Vector2::new(0.5, 1.0),
            },
            Vertex {
                position: Vector3::new(-1.0, -1.0, 0.0),
                normal,
                uv: Vector2::new(0.0, 0.0),
            },
            Vertex {
                position: Vector3::new(1.0, -1.0, 0.0),
                normal,
                uv: Vector2::new(1.0, 0.0),
            },
        ],
        indices: vec![0, 1, 2],
    }
}

fn handle_shading_keys(window: &Window, renderer: &mut Renderer) {
    let bindings = [
        (Key::Key1, ShadingMode::Phong),
        (Key::Key2, ShadingMode::Gouraud),
        (Key::Key3, ShadingMode::Flat),
        (Key::Key4, ShadingMode::Cel),
        (Key::Key5, ShadingMode::Unlit),
    ];
    for (key, mode) in bindings {
        if window.is_key_pressed(key, KeyRepeat::No) {
            renderer.set_shading_mode(mode);
            info!("shading mode: {}", renderer.shading_mode_name());
        }
    }
}

fn handle_camera(
    window: &Window,
    camera: &mut Camera,
    last_mouse: &mut Option<(f32, f32)>,
    dt: f32,
) {
    let mut delta = Vector3::zeros();
    if window.is_key_down(Key::W) {
        delta.z += 1.0;
    }
    if window.is_key_down(Key::S) {
        delta.z -= 1.0;
    }
    if window.is_key_down(Key::A) {
        delta.x -= 1.0;
    }
    if window.is_key_down(Key::D) {
        delta.x += 1.0;
    }
    if window.is_key_down(Key::Space) {
        delta.y += 1.0;
    }
    if window.is_key_down(Key::LeftShift) {
        delta.y -= 1.0;
    }
    if delta != Vector3::zeros() {
        camera.translate_local(&(delta.normalize() * MOVE_SPEED * dt));
    }

    if window.get_mouse_down(MouseButton::Right) {
        if let Some((x, y)) = window.get_mouse_pos(MouseMode::Pass) {
            if let Some((last_x, last_y)) = *last_mouse {
                camera.rotate_by(
                    (x - last_x) * MOUSE_SENSITIVITY,
                    (y - last_y) * MOUSE_SENSITIVITY,
                );
            }
            *last_mouse = Some((x, y));
        }
    } else {
        *last_mouse = None;
    }
}

fn main() {
    env_logger::init();
    let args: Vec<String> = env::args().collect();

    let mesh = if args.len() >= 2 {
        match assets::load_mesh(&args[1]) {
            Ok(mesh) => mesh,
            Err(e) => {
                error!("{e}");
                process::exit(1);
            }
        }
    } else {
        info!("usage: raster_demo [MESH.obj] [TEXTURE]; rendering the built-in model");
        default_model()
    };

    let mut object = GameObject::new(mesh);
    if args.len() >= 3 {
        match assets::load_texture(&args[2]) {
            Ok(texture) => object.texture = Some(Arc::new(texture)),
            // keep rendering untextured
            Err(e) => error!("{e}"),
        }
    }

    let mut camera = Camera::new();
    let mut renderer = Renderer::new(WIN_WIDTH, WIN_HEIGHT);
    info!("rendering on {} threads", renderer.thread_count());

    let mut window = Window::new(
        "Software Rasterizer - ESC to exit",
        WIN_WIDTH,
        WIN_HEIGHT,
        WindowOptions::default(),
    )
    .unwrap_or_else(|e| {
        panic!("{}", e);
    });
    window.set_target_fps(60);

    let mut last_frame = Instant::now();
    let mut last_mouse: Option<(f32, f32)> = None;
    let mut frames = 0u32;
    let mut fps_timer = Instant::now();

    while window.is_open() && !window.is_key_down(Key::Escape) {
        let dt = last_frame.elapsed().as_secs_f32();
        last_frame = Instant::now();

        handle_shading_keys(&window, &mut renderer);
        handle_camera(&window, &mut camera, &mut last_mouse, dt);

        renderer.clear(Color::BLACK);
        renderer.draw_mesh(&object, &camera);
        renderer.present(|pixels, width, height| {
            if let Err(e) = window.update_with_buffer(pixels, width, height) {
                error!("present failed: {e}");
            }
        });

        frames += 1;
        if fps_timer.elapsed().as_secs_f32() >= 1.0 {
            window.set_title(&format!(
                "Software Rasterizer - {} - {} FPS - ESC to exit",
                renderer.shading_mode_name(),
                frames
            ));
            frames = 0;
            fps_timer = Instant::now();
        }
    }
}
