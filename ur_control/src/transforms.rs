//! Pose algebra for UR style poses.
//!
//! Poses carry their orientation as a rotation vector (axis-angle, radians).
//! This module converts between rotation vectors and rotation matrices with
//! Rodrigues' formula, packs poses into 4x4 homogeneous transforms, and
//! composes poses.
//!
//! # Examples
//!
//! ```rust
//! use ur_control::{compose_poses, Pose};
//!
//! // A tool offset of 10 cm along the tool Z axis, expressed in the base frame.
//! let flange = Pose::new(0.3, 0.0, 0.4, std::f64::consts::PI / 2.0, 0.0, 0.0);
//! let offset = Pose::new(0.0, 0.0, 0.1, 0.0, 0.0, 0.0);
//! let tcp = compose_poses(&flange, &offset);
//! assert!((tcp.y - -0.1).abs() < 1e-9);
//! ```
//!
//! # Notes
//!
//! - [`matrix_to_rotation_vector`] is numerically unstable for angles close to
//!   pi because `sin(theta)` goes to zero there. Round trips are only reliable
//!   below that.
//! - [`add_relative`] and [`compose_poses`] are different operations. The first
//!   adds the six components one by one, the second applies the second pose in
//!   the frame of the first.

use nalgebra::{Matrix3, Matrix4, Vector3};

use crate::{JointPositions, Pose};

/// Below this angle (radians) a rotation is treated as no rotation at all.
pub const ROTATION_EPSILON: f64 = 1e-6;

pub type RotationMatrix = Matrix3<f64>;
pub type TransformMatrix = Matrix4<f64>;

/// Converts a rotation vector into a rotation matrix (Rodrigues' formula).
///
/// A vector shorter than [`ROTATION_EPSILON`] has no usable axis and yields the
/// identity matrix exactly.
pub fn rotation_vector_to_matrix(r: &Vector3<f64>) -> RotationMatrix {
    let theta = r.norm();
    if theta < ROTATION_EPSILON {
        return Matrix3::identity();
    }

    let k = r / theta;
    let k_cross = k.cross_matrix();
    Matrix3::identity() + k_cross * theta.sin() + (k_cross * k_cross) * (1.0 - theta.cos())
}

/// Converts a rotation matrix back into a rotation vector.
///
/// The cosine is clamped to `[-1, 1]` so that matrices drifting slightly out of
/// orthonormality do not produce `NaN`. Results near `theta = pi` are not reliable.
pub fn matrix_to_rotation_vector(r: &RotationMatrix) -> Vector3<f64> {
    let cos_theta = ((r.trace() - 1.0) / 2.0).clamp(-1.0, 1.0);
    let theta = cos_theta.acos();
    if theta < ROTATION_EPSILON {
        return Vector3::zeros();
    }

    let scale = theta / (2.0 * theta.sin());
    Vector3::new(
        r[(2, 1)] - r[(1, 2)],
        r[(0, 2)] - r[(2, 0)],
        r[(1, 0)] - r[(0, 1)],
    ) * scale
}

/// Packs a pose into a homogeneous transform.
pub fn pose_to_transform(pose: &Pose) -> TransformMatrix {
    let mut transform = Matrix4::identity();
    transform
        .fixed_view_mut::<3, 3>(0, 0)
        .copy_from(&rotation_vector_to_matrix(&pose.rotation_vector()));
    transform
        .fixed_view_mut::<3, 1>(0, 3)
        .copy_from(&pose.translation());
    transform
}

/// Unpacks a homogeneous transform into a pose. The bottom row is ignored.
pub fn transform_to_pose(transform: &TransformMatrix) -> Pose {
    let rotation: RotationMatrix = transform.fixed_view::<3, 3>(0, 0).into_owned();
    let translation = Vector3::new(transform[(0, 3)], transform[(1, 3)], transform[(2, 3)]);
    Pose::from_parts(translation, matrix_to_rotation_vector(&rotation))
}

/// Applies `b` in the frame of `a` (`T_a * T_b`). Not commutative.
pub fn compose_poses(a: &Pose, b: &Pose) -> Pose {
    transform_to_pose(&(pose_to_transform(a) * pose_to_transform(b)))
}

/// Adds `delta` to `current` component by component, in the current reference frame.
pub fn add_relative(current: &Pose, delta: &Pose) -> Pose {
    Pose::from(add_elementwise(current.to_array(), delta.to_array()))
}

/// Joint space counterpart of [`add_relative`].
pub fn add_relative_joints(current: &JointPositions, delta: &JointPositions) -> JointPositions {
    JointPositions(add_elementwise(current.0, delta.0))
}

fn add_elementwise(a: [f64; 6], b: [f64; 6]) -> [f64; 6] {
    std::array::from_fn(|i| a[i] + b[i])
}
