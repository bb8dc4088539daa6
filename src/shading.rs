use nalgebra::Vector3;

use crate::camera::Camera;
use crate::framebuffer::Color;
use crate::raster::{ScreenVertex, TriangleData};
use crate::texture::Texture;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ShadingMode {
    #[default]
    Phong,
    Gouraud,
    Flat,
    Cel,
    Unlit,
}

impl ShadingMode {
    pub fn name(self) -> &'static str {
        match self {
            ShadingMode::Phong => "Phong",
            ShadingMode::Gouraud => "Gouraud",
            ShadingMode::Flat => "Flat",
            ShadingMode::Cel => "Cel/Toon",
            ShadingMode::Unlit => "Unlit",
        }
    }
}

/// Single hard-coded directional light, pointing into the scene.
fn light_direction() -> Vector3<f32> {
    Vector3::new(0.5, 0.4, 1.0).normalize()
}

fn view_direction(camera: &Camera, world_pos: &Vector3<f32>) -> Vector3<f32> {
    (camera.position - world_pos)
        .try_normalize(f32::EPSILON)
        .unwrap_or_else(Vector3::zeros)
}

/// Ambient + diffuse + specular intensity shared by Phong, Gouraud and Cel.
pub fn light_intensity(normal: &Vector3<f32>, world_pos: &Vector3<f32>, camera: &Camera) -> f32 {
    let light = light_direction();
    let view = view_direction(camera, world_pos);

    let ambient = 0.1;
    let diffuse = normal.dot(&-light).max(0.0);

    let reflection = light - normal * (2.0 * normal.dot(&light));
    let specular = view.dot(&reflection).max(0.0).powi(16);

    (ambient + diffuse * 0.5 + specular * 0.5).clamp(0.0, 1.0)
}

/// Quantize a raw intensity into the four toon bands.
pub fn quantize_cel(raw: f32) -> f32 {
    if raw > 0.9 {
        1.0
    } else if raw > 0.5 {
        0.7
    } else if raw > 0.25 {
        0.4
    } else {
        0.2
    }
}

/// Per-fragment shading dispatch. `input` carries the perspective-corrected
/// attributes for the pixel; `triangle` supplies the per-face values Flat
/// shading needs.
pub fn fragment_shader(
    input: &ScreenVertex,
    camera: &Camera,
    texture: Option<&Texture>,
    triangle: &TriangleData,
    mode: ShadingMode,
) -> Color {
    let object_color = match texture {
        Some(t) => t.sample_bilinear(input.uv.x, input.uv.y),
        None => Color::WHITE,
    };

    let intensity = match mode {
        ShadingMode::Unlit => return object_color,
        ShadingMode::Flat => triangle.flat_intensity,
        ShadingMode::Gouraud => input.light_intensity,
        ShadingMode::Phong => light_intensity(&input.normal, &input.world_pos, camera),
        ShadingMode::Cel => {
            let raw = light_intensity(&input.normal, &input.world_pos, camera);
            let mut banded = quantize_cel(raw);

            let view = view_direction(camera, &input.world_pos);
            let rim = 1.0 - input.normal.dot(&view).max(0.0);
            if rim > 0.7 {
                banded *= 0.3;
            }
            banded
        }
    };

    let intensity = intensity.clamp(0.0, 1.0);
    Color {
        r: (object_color.r as f32 * intensity) as u8,
        g: (object_color.g as f32 * intensity) as u8,
        b: (object_color.b as f32 * intensity) as u8,
        a: 255,
    }
}
