//! Matrix builders and the vector-by-matrix multiply variants used by the
//! pipeline.
//!
//! Everything here is row-major and row-vector: a vector multiplies on the
//! LEFT of a matrix (`v' = v · M`), so transforms compose left-to-right and
//! translation lives in row 3. The rest of the crate assumes this convention.

use nalgebra::{Matrix3, Matrix4, RowVector4, Vector3, Vector4};

pub fn translation(x: f32, y: f32, z: f32) -> Matrix4<f32> {
    Matrix4::from_rows(&[
        RowVector4::new(1.0, 0.0, 0.0, 0.0),
        RowVector4::new(0.0, 1.0, 0.0, 0.0),
        RowVector4::new(0.0, 0.0, 1.0, 0.0),
        RowVector4::new(x, y, z, 1.0),
    ])
}

pub fn scale(sx: f32, sy: f32, sz: f32) -> Matrix4<f32> {
    Matrix4::from_rows(&[
        RowVector4::new(sx, 0.0, 0.0, 0.0),
        RowVector4::new(0.0, sy, 0.0, 0.0),
        RowVector4::new(0.0, 0.0, sz, 0.0),
        RowVector4::new(0.0, 0.0, 0.0, 1.0),
    ])
}

/// Rotation about the X axis, counter-clockwise when looking down +X.
pub fn rotation_x(angle: f32) -> Matrix4<f32> {
    let (s, c) = angle.sin_cos();
    Matrix4::from_rows(&[
        RowVector4::new(1.0, 0.0, 0.0, 0.0),
        RowVector4::new(0.0, c, s, 0.0),
        RowVector4::new(0.0, -s, c, 0.0),
        RowVector4::new(0.0, 0.0, 0.0, 1.0),
    ])
}

/// Rotation about the Y axis, counter-clockwise when looking down +Y.
pub fn rotation_y(angle: f32) -> Matrix4<f32> {
    let (s, c) = angle.sin_cos();
    Matrix4::from_rows(&[
        RowVector4::new(c, 0.0, s, 0.0),
        RowVector4::new(0.0, 1.0, 0.0, 0.0),
        RowVector4::new(-s, 0.0, c, 0.0),
        RowVector4::new(0.0, 0.0, 0.0, 1.0),
    ])
}

/// Rotation about the Z axis, counter-clockwise when looking down +Z.
pub fn rotation_z(angle: f32) -> Matrix4<f32> {
    let (s, c) = angle.sin_cos();
    Matrix4::from_rows(&[
        RowVector4::new(c, s, 0.0, 0.0),
        RowVector4::new(-s, c, 0.0, 0.0),
        RowVector4::new(0.0, 0.0, 1.0, 0.0),
        RowVector4::new(0.0, 0.0, 0.0, 1.0),
    ])
}

/// Perspective projection with `aspect = height / width`.
///
/// The resulting clip space carries the view-space depth in `w` and maps the
/// visible depth range onto `[0, far/(far-near)]`, not OpenGL's `[-1, 1]`.
pub fn projection(fov_deg: f32, aspect: f32, near: f32, far: f32) -> Matrix4<f32> {
    let f = 1.0 / (fov_deg.to_radians() * 0.5).tan();
    Matrix4::from_rows(&[
        RowVector4::new(aspect * f, 0.0, 0.0, 0.0),
        RowVector4::new(0.0, f, 0.0, 0.0),
        RowVector4::new(0.0, 0.0, far / (far - near), 1.0),
        RowVector4::new(0.0, 0.0, (-far * near) / (far - near), 0.0),
    ])
}

/// Inverse-transpose of the upper-left 3×3, embedded back into a 4×4.
///
/// Transforming normals with this keeps them perpendicular under non-uniform
/// scale. A singular upper 3×3 (|det| < 1e-8) falls back to identity; the
/// pipeline never fails on a degenerate transform.
pub fn normal_matrix(world: &Matrix4<f32>) -> Matrix4<f32> {
    let upper: Matrix3<f32> = world.fixed_view::<3, 3>(0, 0).into_owned();
    if upper.determinant().abs() < 1e-8 {
        return Matrix4::identity();
    }
    match upper.try_inverse() {
        Some(inverse) => {
            let mut out = Matrix4::identity();
            out.fixed_view_mut::<3, 3>(0, 0).copy_from(&inverse.transpose());
            out
        }
        None => Matrix4::identity(),
    }
}

/// Full homogeneous transform: `(p, 1) · m`, no divide.
pub fn transform_point4(p: &Vector3<f32>, m: &Matrix4<f32>) -> Vector4<f32> {
    let r = RowVector4::new(p.x, p.y, p.z, 1.0) * m;
    Vector4::new(r[0], r[1], r[2], r[3])
}

/// Affine point transform with perspective divide when `w != 0`.
pub fn transform_point(p: &Vector3<f32>, m: &Matrix4<f32>) -> Vector3<f32> {
    let r = RowVector4::new(p.x, p.y, p.z, 1.0) * m;
    let w = r[3];
    if w != 0.0 {
        Vector3::new(r[0] / w, r[1] / w, r[2] / w)
    } else {
        Vector3::new(r[0], r[1], r[2])
    }
}

/// Direction transform: the translation row is ignored. Used on normals.
pub fn transform_direction(d: &Vector3<f32>, m: &Matrix4<f32>) -> Vector3<f32> {
    let r = RowVector4::new(d.x, d.y, d.z, 0.0) * m;
    Vector3::new(r[0], r[1], r[2])
}
