//! Coordinate transform between the solver's NED convention and the
//! engine's world convention.
//!
//! - NED: X north/forward, Y east/right, Z down (right-handed)
//! - Engine: X right, Y up, Z forward (left-handed), Euler angles in
//!   degrees applied Z, then X, then Y
//!
//! The initial pose read from the ship document is converted once into an
//! [`InitialTransform`]. Each frame is already in ship-local engine axes
//! (the parser did that), so per tick the only work left is composing the
//! initial transform with the frame's local pose. The composition order is
//! `initial ∘ local` and must not be swapped.

use crate::frame::Frame;
use crate::settings::PlayerSettings;
use nalgebra::{Quaternion, UnitQuaternion, Vector3};
use serde::Serialize;

/// Maps an NED position `(x, y, z)` to engine axes `(y, -z, x)`.
pub fn ned_to_engine_position(p: &Vector3<f64>) -> Vector3<f64> {
    Vector3::new(p.y, -p.z, p.x)
}

/// Maps a body-axis point `(x, y, z)` to ship-local engine axes `(x, -z, y)`.
pub fn body_to_local_position(p: &Vector3<f64>) -> Vector3<f64> {
    Vector3::new(p.x, -p.z, p.y)
}

/// Engine Euler rotation: Z by `z`, then X by `x`, then Y by `y` (degrees).
pub fn engine_euler(x: f64, y: f64, z: f64) -> UnitQuaternion<f64> {
    let qx = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), x.to_radians());
    let qy = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), y.to_radians());
    let qz = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), z.to_radians());
    qy * qx * qz
}

/// Inverse of [`engine_euler`], in degrees.
///
/// At the gimbal lock (X = ±90°) the Z angle is folded into Y.
pub fn engine_euler_angles(q: &UnitQuaternion<f64>) -> Vector3<f64> {
    let m = q.to_rotation_matrix();
    let m = m.matrix();

    let sin_x = (-m[(1, 2)]).clamp(-1.0, 1.0);
    let x = sin_x.asin();

    let (y, z) = if sin_x.abs() < 1.0 - 1e-9 {
        (m[(0, 2)].atan2(m[(2, 2)]), m[(1, 0)].atan2(m[(1, 1)]))
    } else {
        ((-m[(2, 0)]).atan2(m[(0, 0)]), 0.0)
    };

    Vector3::new(x.to_degrees(), y.to_degrees(), z.to_degrees())
}

/// Converts an NED attitude `(phi, theta, psi)` in radians to an engine
/// rotation.
///
/// The rotation is built as `engine_euler(phi, psi, theta)` and its vector
/// part is then permuted like positions: `(i, j, k) -> (j, -k, i)`, the
/// scalar part unchanged.
pub fn ned_attitude_to_engine(attitude: &Vector3<f64>) -> UnitQuaternion<f64> {
    let q = engine_euler(
        attitude.x.to_degrees(),
        attitude.z.to_degrees(),
        attitude.y.to_degrees(),
    );

    UnitQuaternion::new_normalize(Quaternion::new(q.w, q.j, -q.k, q.i))
}

/// Local rotation of a frame: roll about X, yaw about Y, pitch about Z.
pub fn frame_rotation(frame: &Frame) -> UnitQuaternion<f64> {
    engine_euler(frame.roll(), frame.yaw(), frame.pitch())
}

/// Fixed world transform of the ship's body frame at t = 0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InitialTransform {
    /// Engine-space origin
    pub position: Vector3<f64>,

    /// Engine-space orientation
    pub rotation: UnitQuaternion<f64>,
}

impl Default for InitialTransform {
    fn default() -> Self {
        Self {
            position: Vector3::zeros(),
            rotation: UnitQuaternion::identity(),
        }
    }
}

impl InitialTransform {
    /// Builds the transform from an NED position and attitude (radians).
    pub fn from_ned(position: &Vector3<f64>, attitude: &Vector3<f64>) -> Self {
        Self {
            position: ned_to_engine_position(position),
            rotation: ned_attitude_to_engine(attitude),
        }
    }
}

/// A world-space pose for the host scene node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WorldPose {
    pub position: Vector3<f64>,
    pub rotation: UnitQuaternion<f64>,
}

impl Default for WorldPose {
    fn default() -> Self {
        Self {
            position: Vector3::zeros(),
            rotation: UnitQuaternion::identity(),
        }
    }
}

impl WorldPose {
    /// Orientation as engine Euler angles in degrees.
    pub fn euler_degrees(&self) -> Vector3<f64> {
        engine_euler_angles(&self.rotation)
    }

    /// Maps a ship-local point into world space.
    pub fn transform_point(&self, local: &Vector3<f64>) -> Vector3<f64> {
        self.position + self.rotation * local
    }

    /// Ship-local axis directions in world space (right, up, forward).
    pub fn axes(&self) -> [Vector3<f64>; 3] {
        [
            self.rotation * Vector3::x(),
            self.rotation * Vector3::y(),
            self.rotation * Vector3::z(),
        ]
    }
}

/// Composes the initial transform with per-frame local poses.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneTransform {
    pub initial: InitialTransform,
    pub scale: f64,
    pub offset: Vector3<f64>,
}

impl Default for SceneTransform {
    fn default() -> Self {
        Self {
            initial: InitialTransform::default(),
            scale: 1.0,
            offset: Vector3::zeros(),
        }
    }
}

impl SceneTransform {
    /// Uses the placement from `settings`.
    pub fn new(initial: InitialTransform, settings: &PlayerSettings) -> Self {
        Self {
            initial,
            scale: settings.position_scale,
            offset: settings.position_offset,
        }
    }

    /// World pose of `frame`:
    /// `offset + scale * (p0 + R0 * p)` and `R0 * R(frame)`.
    pub fn world_pose(&self, frame: &Frame) -> WorldPose {
        let local = self.initial.position + self.initial.rotation * frame.position;

        WorldPose {
            position: self.offset + local * self.scale,
            rotation: self.initial.rotation * frame_rotation(frame),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_translation_only_permutation() {
        let ned = Vector3::new(1.0, 2.0, 3.0);
        assert_eq!(ned_to_engine_position(&ned), Vector3::new(2.0, -3.0, 1.0));

        let initial = InitialTransform::from_ned(&ned, &Vector3::zeros());
        assert_eq!(initial.position, Vector3::new(2.0, -3.0, 1.0));
        assert_relative_eq!(initial.rotation.angle(), 0.0, epsilon = 1e-12);

        let pose = SceneTransform { initial, ..Default::default() }.world_pose(&Frame::default());
        assert_eq!(pose.position, Vector3::new(2.0, -3.0, 1.0));
    }

    #[test]
    fn test_engine_euler_yaw_turns_forward_to_right() {
        let q = engine_euler(0.0, 90.0, 0.0);
        let v = q * Vector3::z();
        assert_relative_eq!(v, Vector3::x(), epsilon = 1e-12);
    }

    #[test]
    fn test_engine_euler_order() {
        // Z is applied first, then X, then Y
        let composed = engine_euler(30.0, 45.0, 60.0);
        let manual = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), 45f64.to_radians())
            * UnitQuaternion::from_axis_angle(&Vector3::x_axis(), 30f64.to_radians())
            * UnitQuaternion::from_axis_angle(&Vector3::z_axis(), 60f64.to_radians());
        assert_relative_eq!(composed, manual, epsilon = 1e-12);
    }

    #[test]
    fn test_euler_angles_roundtrip() {
        for (x, y, z) in [(10.0, 20.0, 30.0), (-45.0, 170.0, -5.0), (0.0, -90.0, 12.0)] {
            let angles = engine_euler_angles(&engine_euler(x, y, z));
            assert_relative_eq!(angles, Vector3::new(x, y, z), epsilon = 1e-9);
        }
    }

    #[test]
    fn test_euler_angles_gimbal_lock() {
        let q = engine_euler(90.0, 20.0, 0.0);
        let angles = engine_euler_angles(&q);
        assert_relative_eq!(engine_euler(angles.x, angles.y, angles.z), q, epsilon = 1e-6);
    }

    #[test]
    fn test_ned_attitude_component_remap() {
        // psi only: engine_euler(0, 90, 0) has its vector part on j,
        // which the remap moves to i
        let q = ned_attitude_to_engine(&Vector3::new(0.0, 0.0, FRAC_PI_2));
        let half = std::f64::consts::FRAC_PI_4;

        assert_relative_eq!(q.i, half.sin(), epsilon = 1e-12);
        assert_relative_eq!(q.j, 0.0, epsilon = 1e-12);
        assert_relative_eq!(q.k, 0.0, epsilon = 1e-12);
        assert_relative_eq!(q.w, half.cos(), epsilon = 1e-12);
    }

    #[test]
    fn test_ned_attitude_roll_maps_to_engine_z() {
        let q = ned_attitude_to_engine(&Vector3::new(FRAC_PI_2, 0.0, 0.0));
        let half = std::f64::consts::FRAC_PI_4;

        assert_relative_eq!(q.k, half.sin(), epsilon = 1e-12);
        assert_relative_eq!(q.i, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_world_pose_composition_order() {
        let initial = InitialTransform {
            position: Vector3::new(0.0, 0.0, 100.0),
            rotation: engine_euler(0.0, 90.0, 0.0),
        };
        let scene = SceneTransform { initial, ..Default::default() };

        let frame = Frame {
            position: Vector3::new(0.0, 0.0, 10.0),
            orientation: Vector3::new(30.0, 0.0, 0.0),
            ..Default::default()
        };
        let pose = scene.world_pose(&frame);

        // Local forward 10 m becomes world +X after the 90° initial yaw
        assert_relative_eq!(pose.position, Vector3::new(10.0, 0.0, 100.0), epsilon = 1e-9);

        let expected = initial.rotation * engine_euler(30.0, 0.0, 0.0);
        assert_relative_eq!(pose.rotation, expected, epsilon = 1e-12);

        let swapped = engine_euler(30.0, 0.0, 0.0) * initial.rotation;
        assert!(pose.rotation.angle_to(&swapped) > 1e-3);
    }

    #[test]
    fn test_scale_and_offset() {
        let scene = SceneTransform {
            initial: InitialTransform {
                position: Vector3::new(1.0, 0.0, 0.0),
                rotation: UnitQuaternion::identity(),
            },
            scale: 2.0,
            offset: Vector3::new(0.0, 5.0, 0.0),
        };
        let frame = Frame {
            position: Vector3::new(1.0, 1.0, 1.0),
            ..Default::default()
        };

        assert_relative_eq!(scene.world_pose(&frame).position, Vector3::new(4.0, 7.0, 2.0));
    }

    #[test]
    fn test_transform_point_and_axes() {
        let pose = WorldPose {
            position: Vector3::new(1.0, 2.0, 3.0),
            rotation: engine_euler(0.0, 90.0, 0.0),
        };

        assert_relative_eq!(
            pose.transform_point(&Vector3::new(0.0, 0.0, 2.0)),
            Vector3::new(3.0, 2.0, 3.0),
            epsilon = 1e-12
        );
        let [right, up, forward] = pose.axes();
        assert_relative_eq!(right, Vector3::new(0.0, 0.0, -1.0), epsilon = 1e-12);
        assert_relative_eq!(up, Vector3::y(), epsilon = 1e-12);
        assert_relative_eq!(forward, Vector3::x(), epsilon = 1e-12);
    }

    #[test]
    fn test_body_to_local_position() {
        assert_eq!(
            body_to_local_position(&Vector3::new(1.0, 2.0, 3.0)),
            Vector3::new(1.0, -3.0, 2.0)
        );
    }
}
