//! Math type aliases and helper functions.
//!
//! Matrices are column-major (nalgebra storage order), which is also the
//! layout GLSL expects for `mat4` members of a std140 uniform block.

pub use nalgebra;

/// 3D vector (f32).
pub type Vec3 = nalgebra::Vector3<f32>;

/// 4D vector (f32).
pub type Vec4 = nalgebra::Vector4<f32>;

/// 4x4 matrix (f32).
pub type Mat4 = nalgebra::Matrix4<f32>;

/// Convert a single sRGB-encoded channel to linear light.
///
/// Negative inputs map to zero. Values above one follow the same curve, so
/// HDR colors (diffuse times intensity) keep their brightness.
pub fn srgb_to_linear(value: f32) -> f32 {
    let value = value.max(0.0);
    if value <= 0.040_45 {
        value / 12.92
    } else {
        ((value + 0.055) / 1.055).powf(2.4)
    }
}

/// Convert an sRGB color to linear light. Alpha is passed through unchanged.
pub fn srgb_to_linear_rgba(color: [f32; 4]) -> [f32; 4] {
    [
        srgb_to_linear(color[0]),
        srgb_to_linear(color[1]),
        srgb_to_linear(color[2]),
        color[3],
    ]
}

/// Convert an sRGB RGB triple to linear light.
pub fn srgb_to_linear_rgb(color: [f32; 3]) -> [f32; 3] {
    [
        srgb_to_linear(color[0]),
        srgb_to_linear(color[1]),
        srgb_to_linear(color[2]),
    ]
}

/// Compute the normal matrix (inverse transpose) for a model matrix.
///
/// Singular matrices fall back to identity.
pub fn normal_matrix(model: &Mat4) -> Mat4 {
    model
        .try_inverse()
        .map(|inverse| inverse.transpose())
        .unwrap_or_else(Mat4::identity)
}

/// Flatten a matrix into 16 column-major floats.
pub fn mat4_to_cols_array(matrix: &Mat4) -> [f32; 16] {
    let mut result = [0.0; 16];
    result.copy_from_slice(matrix.as_slice());
    result
}
