//! Homogeneous-space Sutherland–Hodgman clipping against the view frustum.

use nalgebra::{Vector2, Vector3, Vector4};

/// Vertex-stage output: clip-space position plus the attributes the fragment
/// stage will need, all still linear (perspective correction happens after
/// clipping, at the perspective divide).
#[derive(Clone, Copy, Debug)]
pub struct VSOutput {
    pub position: Vector4<f32>,
    pub world_pos: Vector3<f32>,
    pub normal: Vector3<f32>,
    pub uv: Vector2<f32>,
}

const PLANE_COUNT: usize = 6;

/// Signed distance to one of the six frustum planes; non-negative is inside.
///
/// Planes 0..4 are left/right/bottom/top (`±x ≤ w`, `±y ≤ w`), plane 4 is the
/// near plane (`z ≥ 0`; this projection maps the near plane to z = 0) and
/// plane 5 the far plane (`z ≤ w`).
fn plane_distance(v: &Vector4<f32>, plane: usize) -> f32 {
    match plane {
        0 => v.x + v.w,
        1 => v.w - v.x,
        2 => v.y + v.w,
        3 => v.w - v.y,
        4 => v.z,
        _ => v.w - v.z,
    }
}

/// Every attribute interpolates with the same parameter as the position.
fn lerp_vertex(a: &VSOutput, b: &VSOutput, t: f32) -> VSOutput {
    VSOutput {
        position: a.position.lerp(&b.position, t),
        world_pos: a.world_pos.lerp(&b.world_pos, t),
        normal: a.normal.lerp(&b.normal, t),
        uv: a.uv.lerp(&b.uv, t),
    }
}

fn clip_against_plane(polygon: &[VSOutput], plane: usize) -> Vec<VSOutput> {
    let mut output = Vec::with_capacity(polygon.len() + 1);

    for i in 0..polygon.len() {
        let current = &polygon[i];
        let next = &polygon[(i + 1) % polygon.len()];

        let current_dist = plane_distance(&current.position, plane);
        let next_dist = plane_distance(&next.position, plane);

        let current_inside = current_dist >= 0.0;
        let next_inside = next_dist >= 0.0;

        if current_inside {
            output.push(*current);
            if !next_inside {
                let t = current_dist / (current_dist - next_dist);
                output.push(lerp_vertex(current, next, t));
            }
        } else if next_inside {
            let t = current_dist / (current_dist - next_dist);
            output.push(lerp_vertex(current, next, t));
        }
    }

    output
}

/// Clip a triangle against all six planes in order, yielding a convex polygon
/// of 0–9 vertices. The caller fan-triangulates survivors.
pub fn clip_triangle(v0: &VSOutput, v1: &VSOutput, v2: &VSOutput) -> Vec<VSOutput> {
    let mut polygon = vec![*v0, *v1, *v2];
    for plane in 0..PLANE_COUNT {
        polygon = clip_against_plane(&polygon, plane);
        if polygon.is_empty() {
            break;
        }
    }
    polygon
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn vertex(x: f32, y: f32, z: f32, w: f32) -> VSOutput {
        VSOutput {
            position: Vector4::new(x, y, z, w),
            world_pos: Vector3::new(x, y, z),
            normal: Vector3::new(0.0, 0.0, -1.0),
            uv: Vector2::new(0.0, 0.0),
        }
    }

    #[test]
    fn test_fully_inside_triangle_is_unchanged() {
        let v0 = vertex(0.2, 0.1, 0.5, 1.0);
        let v1 = vertex(-0.3, -0.2, 0.4, 1.0);
        let v2 = vertex(0.1, 0.4, 0.6, 1.0);

        let polygon = clip_triangle(&v0, &v1, &v2);

        assert_eq!(polygon.len(), 3);
        assert_relative_eq!(polygon[0].position, v0.position);
        assert_relative_eq!(polygon[1].position, v1.position);
        assert_relative_eq!(polygon[2].position, v2.position);
    }

    #[test]
    fn test_near_plane_crossing_two_inside_yields_quad() {
        let v0 = vertex(0.0, 0.5, 0.5, 1.0);
        let v1 = vertex(-0.5, 0.0, 0.5, 1.0);
        let v2 = vertex(0.0, -0.5, -0.5, 1.0);

        let polygon = clip_triangle(&v0, &v1, &v2);

        assert_eq!(polygon.len(), 4);
        for v in &polygon {
            assert!(v.position.z >= -1e-6);
        }
    }

    #[test]
    fn test_intersection_attributes_lerp_with_position() {
        // edge from z = 0.5 to z = -0.5 crosses the near plane at t = 0.5
        let v0 = vertex(0.0, 0.5, 0.5, 1.0);
        let v0b = vertex(0.3, 0.5, 0.5, 1.0);
        let mut v1 = vertex(0.0, -0.5, -0.5, 1.0);
        v1.uv = Vector2::new(1.0, 0.0);

        let polygon = clip_triangle(&v0, &v0b, &v1);
        let crossing = polygon
            .iter()
            .find(|v| v.position.z.abs() < 1e-6)
            .expect("an intersection vertex on the near plane");
        assert_relative_eq!(crossing.uv.x, 0.5, epsilon = 1e-6);
        assert_relative_eq!(crossing.position.y, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_fully_outside_triangle_clips_to_nothing() {
        let v0 = vertex(0.0, 0.0, -0.5, 1.0);
        let v1 = vertex(0.5, 0.0, -0.1, 1.0);
        let v2 = vertex(0.0, 0.5, -0.9, 1.0);

        assert!(clip_triangle(&v0, &v1, &v2).is_empty());
    }
}
