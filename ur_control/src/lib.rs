use serde::{Deserialize, Serialize};

pub mod errors;
pub use errors::*;

pub mod transforms;
pub use transforms::*;

pub mod drivers;

/// Three-component vector used for rotation vectors and centers of gravity.
pub type Vec3 = nalgebra::Vector3<f64>;

/// A 6-DOF tool pose as reported and commanded by the controller.
///
/// `x`, `y`, `z` are the translation in meters. `rx`, `ry`, `rz` form a rotation
/// vector (axis-angle) in radians: its direction is the rotation axis and its
/// magnitude the rotation angle. Values are taken as-is; nothing in this crate
/// converts units.
///
/// ```rust
/// use ur_control::Pose;
///
/// let pose = Pose::new(0.0, -0.3, 0.2, 3.14, 0.0, 0.0);
/// assert_eq!(pose.to_array(), [0.0, -0.3, 0.2, 3.14, 0.0, 0.0]);
///
/// // Slices coming from untyped sources must have exactly six entries.
/// let short: &[f64] = &[0.0, 0.0, 0.1];
/// assert!(Pose::try_from(short).is_err());
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct Pose {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub rx: f64,
    pub ry: f64,
    pub rz: f64,
}

impl Pose {
    pub fn new(x: f64, y: f64, z: f64, rx: f64, ry: f64, rz: f64) -> Self {
        Self { x, y, z, rx, ry, rz }
    }

    pub fn to_array(&self) -> [f64; 6] {
        [self.x, self.y, self.z, self.rx, self.ry, self.rz]
    }

    pub fn translation(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    pub fn rotation_vector(&self) -> Vec3 {
        Vec3::new(self.rx, self.ry, self.rz)
    }

    /// Builds a pose from a translation and a rotation vector.
    pub fn from_parts(translation: Vec3, rotation: Vec3) -> Self {
        Self {
            x: translation.x,
            y: translation.y,
            z: translation.z,
            rx: rotation.x,
            ry: rotation.y,
            rz: rotation.z,
        }
    }

    /// Returns a copy with the rotation replaced and the translation untouched.
    pub fn with_rotation(&self, rx: f64, ry: f64, rz: f64) -> Self {
        Self { rx, ry, rz, ..*self }
    }
}

impl From<[f64; 6]> for Pose {
    fn from(v: [f64; 6]) -> Self {
        Self::new(v[0], v[1], v[2], v[3], v[4], v[5])
    }
}

impl From<Pose> for [f64; 6] {
    fn from(pose: Pose) -> Self {
        pose.to_array()
    }
}

impl TryFrom<&[f64]> for Pose {
    type Error = RobotError;

    fn try_from(values: &[f64]) -> Result<Self, Self::Error> {
        Ok(Self::from(six_components(values)?))
    }
}

/// Joint positions of a six-axis arm in radians, base joint first.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct JointPositions(pub [f64; 6]);

impl JointPositions {
    pub fn new(joints: [f64; 6]) -> Self {
        Self(joints)
    }

    pub fn to_array(&self) -> [f64; 6] {
        self.0
    }
}

impl From<[f64; 6]> for JointPositions {
    fn from(v: [f64; 6]) -> Self {
        Self(v)
    }
}

impl TryFrom<&[f64]> for JointPositions {
    type Error = RobotError;

    fn try_from(values: &[f64]) -> Result<Self, Self::Error> {
        Ok(Self(six_components(values)?))
    }
}

fn six_components(values: &[f64]) -> Result<[f64; 6], RobotError> {
    <[f64; 6]>::try_from(values).map_err(|_| RobotError::InvalidShape {
        expected: 6,
        actual: values.len(),
    })
}

/// One entry of a blended linear path.
///
/// `blend` is the blend radius in meters; the last waypoint of a path should use
/// `0.0` so the arm stops on it.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct PathWaypoint {
    pub pose: Pose,
    pub speed: f64,
    pub acceleration: f64,
    #[serde(default)]
    pub blend: f64,
}

impl PathWaypoint {
    pub fn new(pose: Pose, speed: f64, acceleration: f64, blend: f64) -> Self {
        Self {
            pose,
            speed,
            acceleration,
            blend,
        }
    }
}
