//! Camera-style pose following.
//!
//! [`PoseFollower`] eases a pose towards a target: position with a
//! critically damped spring, rotation with a slerp whose factor grows with
//! `dt`. While the timeline is being dragged it snaps instead, so scrubbing
//! never shows the follower lagging behind.

use crate::playback::{is_dragging, DragState};
use crate::transform::WorldPose;
use nalgebra::{UnitQuaternion, Vector3};

/// Tuning for [`PoseFollower`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FollowConfig {
    /// Approximate time to reach the target position (s)
    pub smooth_time: f64,

    /// Rotation catch-up rate (1/s)
    pub rotation_rate: f64,

    /// Fixed offset from the target in the target's local axes
    pub local_offset: Vector3<f64>,
}

impl Default for FollowConfig {
    fn default() -> Self {
        Self {
            smooth_time: 0.3,
            rotation_rate: 5.0,
            local_offset: Vector3::zeros(),
        }
    }
}

/// Smoothed follower of a [`WorldPose`].
#[derive(Debug, Clone)]
pub struct PoseFollower {
    config: FollowConfig,
    pose: Option<WorldPose>,
    velocity: Vector3<f64>,
}

impl PoseFollower {
    pub fn new(config: FollowConfig) -> Self {
        Self {
            config,
            pose: None,
            velocity: Vector3::zeros(),
        }
    }

    /// Current follower pose, `None` until the first update.
    pub fn pose(&self) -> Option<&WorldPose> {
        self.pose.as_ref()
    }

    /// Moves towards `target` by `dt` seconds; snaps on the first call and
    /// whenever `drag` reports dragging.
    pub fn update(&mut self, target: &WorldPose, dt: f64, drag: Option<&dyn DragState>) -> WorldPose {
        let goal = WorldPose {
            position: target.transform_point(&self.config.local_offset),
            rotation: target.rotation,
        };

        let next = match self.pose {
            Some(current) if !is_dragging(drag) && dt > 0.0 => WorldPose {
                position: smooth_damp(
                    &current.position,
                    &goal.position,
                    &mut self.velocity,
                    self.config.smooth_time,
                    dt,
                ),
                rotation: slerp_towards(&current.rotation, &goal.rotation, self.config.rotation_rate * dt),
            },
            Some(current) if dt <= 0.0 && !is_dragging(drag) => current,
            _ => {
                self.velocity = Vector3::zeros();
                goal
            }
        };

        self.pose = Some(next);
        next
    }

    pub fn reset(&mut self) {
        self.pose = None;
        self.velocity = Vector3::zeros();
    }
}

/// Critically damped approach of `current` to `target`.
///
/// `velocity` carries state between calls. Uses the usual rational
/// approximation of `exp(-x)`, stable for any `dt`, and never overshoots
/// the target.
pub fn smooth_damp(
    current: &Vector3<f64>,
    target: &Vector3<f64>,
    velocity: &mut Vector3<f64>,
    smooth_time: f64,
    dt: f64,
) -> Vector3<f64> {
    let smooth_time = smooth_time.max(1e-4);
    let omega = 2.0 / smooth_time;
    let x = omega * dt;
    let decay = 1.0 / (1.0 + x + 0.48 * x * x + 0.235 * x * x * x);

    let change = current - target;
    let temp = (*velocity + change * omega) * dt;
    *velocity = (*velocity - temp * omega) * decay;
    let mut output = target + (change + temp) * decay;

    // Overshoot check: moving past the target along the original direction
    if (target - current).dot(&(output - target)) > 0.0 {
        output = *target;
        *velocity = Vector3::zeros();
    }

    output
}

/// Slerps by `factor` clamped to `[0, 1]`.
pub fn slerp_towards(
    current: &UnitQuaternion<f64>,
    target: &UnitQuaternion<f64>,
    factor: f64,
) -> UnitQuaternion<f64> {
    let t = factor.clamp(0.0, 1.0);
    // Antipodal pairs have no unique slerp path; jump straight there
    current.try_slerp(target, t, 1e-9).unwrap_or(*target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    struct Held(bool);

    impl DragState for Held {
        fn is_dragging(&self) -> bool {
            self.0
        }
    }

    fn pose_at(x: f64) -> WorldPose {
        WorldPose {
            position: Vector3::new(x, 0.0, 0.0),
            rotation: UnitQuaternion::identity(),
        }
    }

    #[test]
    fn test_first_update_snaps() {
        let mut follower = PoseFollower::new(FollowConfig::default());
        let pose = follower.update(&pose_at(10.0), 0.016, None);
        assert_eq!(pose.position, Vector3::new(10.0, 0.0, 0.0));
    }

    #[test]
    fn test_smooths_towards_target() {
        let mut follower = PoseFollower::new(FollowConfig::default());
        follower.update(&pose_at(0.0), 0.016, None);

        let mut last = 0.0;
        for _ in 0..30 {
            let x = follower.update(&pose_at(10.0), 0.016, None).position.x;
            assert!(x >= last);
            assert!(x <= 10.0);
            last = x;
        }
        assert!(last > 5.0);

        for _ in 0..500 {
            follower.update(&pose_at(10.0), 0.016, None);
        }
        assert_relative_eq!(follower.pose().unwrap().position.x, 10.0, epsilon = 1e-3);
    }

    #[test]
    fn test_snaps_while_dragging() {
        let mut follower = PoseFollower::new(FollowConfig::default());
        follower.update(&pose_at(0.0), 0.016, None);

        let held = Held(true);
        let pose = follower.update(&pose_at(50.0), 0.016, Some(&held as &dyn DragState));
        assert_eq!(pose.position.x, 50.0);

        let released = Held(false);
        let pose = follower.update(&pose_at(60.0), 0.016, Some(&released as &dyn DragState));
        assert!(pose.position.x < 60.0);
    }

    #[test]
    fn test_offset_in_target_axes() {
        let config = FollowConfig {
            local_offset: Vector3::new(0.0, 0.0, -10.0),
            ..Default::default()
        };
        let mut follower = PoseFollower::new(config);
        let target = WorldPose {
            position: Vector3::zeros(),
            rotation: UnitQuaternion::from_axis_angle(&Vector3::y_axis(), std::f64::consts::FRAC_PI_2),
        };

        let pose = follower.update(&target, 0.016, None);
        assert_relative_eq!(pose.position, Vector3::new(-10.0, 0.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_rotation_converges() {
        let mut follower = PoseFollower::new(FollowConfig::default());
        follower.update(&pose_at(0.0), 0.016, None);

        let turned = WorldPose {
            position: Vector3::zeros(),
            rotation: UnitQuaternion::from_euler_angles(0.0, 1.0, 0.0),
        };
        let first = follower.update(&turned, 0.05, None);
        assert!(first.rotation.angle_to(&turned.rotation) > 0.1);

        for _ in 0..200 {
            follower.update(&turned, 0.05, None);
        }
        assert!(follower.pose().unwrap().rotation.angle_to(&turned.rotation) < 1e-6);
    }

    #[test]
    fn test_zero_dt_holds_pose() {
        let mut follower = PoseFollower::new(FollowConfig::default());
        follower.update(&pose_at(1.0), 0.016, None);
        let pose = follower.update(&pose_at(9.0), 0.0, None);
        assert_eq!(pose.position.x, 1.0);
    }
}
