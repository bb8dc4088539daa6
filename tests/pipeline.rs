//! End-to-end pipeline scenarios rendered into small offscreen targets.

use std::sync::Arc;

use nalgebra::{Vector2, Vector3};

use softrast::{Camera, Color, GameObject, Mesh, Renderer, ShadingMode, Texture, Vertex};

const WIDTH: usize = 200;
const HEIGHT: usize = 150;

fn triangle_mesh(positions: [[f32; 3]; 3], normals: [[f32; 3]; 3]) -> Mesh {
    let vertices = positions
        .iter()
        .zip(normals.iter())
        .map(|(p, n)| Vertex {
            position: Vector3::new(p[0], p[1], p[2]),
            normal: Vector3::new(n[0], n[1], n[2]),
            uv: Vector2::new(0.0, 0.0),
        })
        .collect();
    Mesh {
        vertices,
        indices: vec![0, 1, 2],
    }
}

fn flat_triangle(positions: [[f32; 3]; 3], normal: [f32; 3]) -> Mesh {
    triangle_mesh(positions, [normal; 3])
}

fn solid_texture(color: Color) -> Arc<Texture> {
    Arc::new(Texture::new(1, 1, vec![color]))
}

fn fresh_renderer(mode: ShadingMode) -> Renderer {
    let mut renderer = Renderer::new(WIDTH, HEIGHT);
    renderer.set_shading_mode(mode);
    renderer.clear(Color::BLACK);
    renderer
}

fn drawn_pixels(renderer: &Renderer) -> Vec<(usize, usize)> {
    let fb = renderer.framebuffer();
    let mut drawn = Vec::new();
    for y in 0..HEIGHT {
        for x in 0..WIDTH {
            if fb.depth_at(x, y).is_finite() {
                drawn.push((x, y));
            }
        }
    }
    drawn
}

// With the default camera at (0,0,-5), fov 90 and a 200x150 target, the
// canonical triangle (-1,-1,0) (1,-1,0) (0,1,0) lands on screen at roughly
// (85,60) (115,60) (100,90).

#[test]
fn front_facing_triangle_renders_white_near_the_center() {
    let mut renderer = fresh_renderer(ShadingMode::Unlit);
    let object = GameObject::new(flat_triangle(
        [[-1.0, -1.0, 0.0], [1.0, -1.0, 0.0], [0.0, 1.0, 0.0]],
        [0.0, 0.0, -1.0],
    ));
    renderer.draw_mesh(&object, &Camera::new());

    let fb = renderer.framebuffer();
    assert_eq!(fb.color_at(100, 70), Color::WHITE);
    assert!(fb.depth_at(100, 70).is_finite());

    // pixels outside the projected triangle are untouched
    assert_eq!(fb.color_at(5, 5), Color::BLACK);
    assert!(fb.depth_at(5, 5).is_infinite());
    assert_eq!(fb.color_at(195, 140), Color::BLACK);
    assert!(fb.depth_at(195, 140).is_infinite());
}

#[test]
fn back_facing_triangle_leaves_the_frame_untouched() {
    let mut renderer = fresh_renderer(ShadingMode::Unlit);
    let object = GameObject::new(flat_triangle(
        [[-1.0, -1.0, 0.0], [1.0, -1.0, 0.0], [0.0, 1.0, 0.0]],
        [0.0, 0.0, 1.0],
    ));
    renderer.draw_mesh(&object, &Camera::new());

    assert!(drawn_pixels(&renderer).is_empty());
    let fb = renderer.framebuffer();
    for y in 0..HEIGHT {
        for x in 0..WIDTH {
            assert_eq!(fb.color_at(x, y), Color::BLACK);
        }
    }
}

#[test]
fn nearer_triangle_wins_the_depth_test_in_either_draw_order() {
    let positions = [[-1.0, -1.0, 0.0], [1.0, -1.0, 0.0], [0.0, 1.0, 0.0]];
    let normal = [0.0, 0.0, -1.0];

    let mut red = GameObject::new(flat_triangle(positions, normal));
    red.texture = Some(solid_texture(Color::new(255, 0, 0, 255)));

    let nearer = [[-1.0, -1.0, -1.0], [1.0, -1.0, -1.0], [0.0, 1.0, -1.0]];
    let mut green = GameObject::new(flat_triangle(nearer, normal));
    green.texture = Some(solid_texture(Color::new(0, 255, 0, 255)));

    let camera = Camera::new();

    for objects in [[&red, &green], [&green, &red]] {
        let mut renderer = fresh_renderer(ShadingMode::Unlit);
        for object in objects {
            renderer.draw_mesh(object, &camera);
        }
        // the overlap around the shared interior shows only green
        assert_eq!(
            renderer.framebuffer().color_at(100, 70),
            Color::new(0, 255, 0, 255)
        );
    }
}

#[test]
fn flat_is_constant_while_gouraud_grades_across_the_face() {
    // vertex normals tilted toward the camera so the world-space cull passes
    let positions = [[-1.0, -1.0, 0.0], [1.0, -1.0, 0.0], [0.0, 1.0, 0.0]];
    let normals = [[-1.0, 0.0, -1.0], [1.0, 0.0, -1.0], [0.0, 1.0, -1.0]];
    let object = GameObject::new(triangle_mesh(positions, normals));
    let camera = Camera::new();

    let mut renderer = fresh_renderer(ShadingMode::Flat);
    renderer.draw_mesh(&object, &camera);
    let drawn = drawn_pixels(&renderer);
    assert!(!drawn.is_empty());
    let flat_reference = renderer.framebuffer().color_at(drawn[0].0, drawn[0].1);
    for &(x, y) in &drawn {
        assert_eq!(renderer.framebuffer().color_at(x, y), flat_reference);
    }

    let mut renderer = fresh_renderer(ShadingMode::Gouraud);
    renderer.draw_mesh(&object, &camera);
    let fb = renderer.framebuffer();

    // interior pixels close to the v0 and v1 corners
    let near_v0 = fb.color_at(88, 62);
    let near_v1 = fb.color_at(112, 62);
    assert!(fb.depth_at(88, 62).is_finite());
    assert!(fb.depth_at(112, 62).is_finite());

    // the gradient is visible across the face
    assert!((near_v0.r as i32 - near_v1.r as i32).abs() >= 10);

    // and Gouraud differs from Flat at the corners by at least 10/255
    assert!((near_v1.r as i32 - flat_reference.r as i32).abs() >= 10);
    assert!((near_v1.g as i32 - flat_reference.g as i32).abs() >= 10);
    assert!((near_v1.b as i32 - flat_reference.b as i32).abs() >= 10);
}

#[test]
fn cel_shading_is_uniform_inside_one_band() {
    // constant normal facing the camera: raw Phong intensity stays inside
    // (0.5, 0.9] across the face, so every lit pixel quantizes to 0.7
    let mut renderer = fresh_renderer(ShadingMode::Cel);
    let object = GameObject::new(flat_triangle(
        [[-1.0, -1.0, 0.0], [1.0, -1.0, 0.0], [0.0, 1.0, 0.0]],
        [0.0, 0.0, -1.0],
    ));
    renderer.draw_mesh(&object, &Camera::new());

    let drawn = drawn_pixels(&renderer);
    assert!(!drawn.is_empty());
    let banded = Color::new(178, 178, 178, 255); // 0.7 * 255
    for &(x, y) in &drawn {
        assert_eq!(renderer.framebuffer().color_at(x, y), banded);
    }
}

#[test]
fn near_plane_crossing_rasterizes_inside_the_frustum() {
    // one vertex in front of the camera, two behind it
    let mut renderer = fresh_renderer(ShadingMode::Unlit);
    let object = GameObject::new(flat_triangle(
        [[0.0, 0.5, -4.0], [-1.0, -1.0, -6.0], [1.0, -1.0, -6.0]],
        [0.0, 0.0, -1.0],
    ));
    renderer.draw_mesh(&object, &Camera::new());

    let drawn = drawn_pixels(&renderer);
    assert!(!drawn.is_empty());
    let fb = renderer.framebuffer();
    for &(x, y) in &drawn {
        let z = fb.depth_at(x, y);
        assert!(z >= 0.0, "negative depth {z} at ({x},{y})");
        assert!(z <= 1.001, "depth {z} beyond the far plane at ({x},{y})");
    }
}

#[test]
fn constant_uv_reconstructs_to_the_constant() {
    // all three vertices share one UV; perspective-correct interpolation
    // must reproduce that exact sample everywhere on the face
    let texture = Arc::new(Texture::new(
        2,
        2,
        vec![
            Color::new(190, 60, 60, 255),
            Color::new(60, 190, 60, 255),
            Color::new(60, 60, 190, 255),
            Color::new(190, 190, 60, 255),
        ],
    ));
    let expected = texture.sample_bilinear(0.25, 0.25);

    let mut mesh = flat_triangle(
        [[-1.0, -1.0, 1.0], [1.0, -1.0, 0.0], [0.0, 1.0, -1.0]],
        [0.0, 0.0, -1.0],
    );
    for vertex in &mut mesh.vertices {
        vertex.uv = Vector2::new(0.25, 0.25);
    }
    let mut object = GameObject::new(mesh);
    object.texture = Some(texture);

    let mut renderer = fresh_renderer(ShadingMode::Unlit);
    renderer.draw_mesh(&object, &Camera::new());

    let drawn = drawn_pixels(&renderer);
    assert!(!drawn.is_empty());
    for &(x, y) in &drawn {
        assert_eq!(renderer.framebuffer().color_at(x, y), expected);
    }
}

#[test]
fn triangle_coplanar_with_the_camera_is_culled() {
    // the camera sits in the plane y = 0, the triangle's plane
    let mut renderer = fresh_renderer(ShadingMode::Phong);
    let object = GameObject::new(flat_triangle(
        [[-1.0, 0.0, -1.0], [1.0, 0.0, -1.0], [0.0, 0.0, 1.0]],
        [0.0, 1.0, 0.0],
    ));
    renderer.draw_mesh(&object, &Camera::new());

    assert!(drawn_pixels(&renderer).is_empty());
}

#[test]
fn identical_draws_are_bit_exact() {
    let positions = [[-1.0, -1.0, 0.0], [1.0, -1.0, 0.0], [0.0, 1.0, 0.0]];
    let normals = [[-1.0, 0.0, -1.0], [1.0, 0.0, -1.0], [0.0, 1.0, -1.0]];
    let mut object = GameObject::new(triangle_mesh(positions, normals));
    object.texture = Some(solid_texture(Color::new(180, 140, 90, 255)));
    let camera = Camera::new();

    let render = || {
        let mut renderer = fresh_renderer(ShadingMode::Phong);
        renderer.draw_mesh(&object, &camera);
        let fb = renderer.framebuffer();
        let mut snapshot = Vec::with_capacity(WIDTH * HEIGHT);
        for y in 0..HEIGHT {
            for x in 0..WIDTH {
                snapshot.push((fb.color_at(x, y), fb.depth_at(x, y).to_bits()));
            }
        }
        snapshot
    };

    assert_eq!(render(), render());
}

#[test]
fn depth_buffer_holds_the_minimum_fragment_depth() {
    let mut renderer = fresh_renderer(ShadingMode::Unlit);
    let camera = Camera::new();

    let far = GameObject::new(flat_triangle(
        [[-1.0, -1.0, 0.0], [1.0, -1.0, 0.0], [0.0, 1.0, 0.0]],
        [0.0, 0.0, -1.0],
    ));
    let near = GameObject::new(flat_triangle(
        [[-1.0, -1.0, -2.0], [1.0, -1.0, -2.0], [0.0, 1.0, -2.0]],
        [0.0, 0.0, -1.0],
    ));
    renderer.draw_mesh(&far, &camera);
    let far_depth = renderer.framebuffer().depth_at(100, 70);
    assert!(far_depth.is_finite());

    renderer.draw_mesh(&near, &camera);
    let near_depth = renderer.framebuffer().depth_at(100, 70);
    assert!(near_depth < far_depth);

    // drawing the far one again must not raise the stored depth
    renderer.draw_mesh(&far, &camera);
    assert_eq!(renderer.framebuffer().depth_at(100, 70), near_depth);
}
