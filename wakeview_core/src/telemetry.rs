//! Derived readouts for overlays: speed, relative heading and force scaling.
//!
//! These are pure functions of the current/previous frame pair, so a host
//! can compute them after every [`ShipPlayer::tick`](crate::ShipPlayer::tick)
//! without extra state (except the heading origin and display smoothing).

use crate::frame::Frame;
use serde::Serialize;

/// m/s to km/h
pub const MPS_TO_KMH: f64 = 3.6;

/// m/s to knots
pub const MPS_TO_KNOTS: f64 = 1.943_844;

/// Below this magnitude a reference force is treated as absent.
pub const FORCE_REFERENCE_EPSILON: f64 = 1e-6;

/// Speed in m/s.
///
/// Uses the logged body velocity when any component is non-zero, otherwise
/// the finite difference of positions over `dt`. Returns 0 when neither is
/// available (no previous frame or `dt <= 0`). Hosts pass `dt = 0` while the
/// clock is stopped.
pub fn ship_speed(current: &Frame, previous: Option<&Frame>, dt: f64) -> f64 {
    if current.has_velocity() {
        return current.linear_velocity.norm();
    }

    match previous {
        Some(prev) if dt > 0.0 => (current.position - prev.position).norm() / dt,
        _ => 0.0,
    }
}

/// A speed in the three units overlays usually show.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct SpeedReadout {
    pub metres_per_second: f64,
    pub kilometres_per_hour: f64,
    pub knots: f64,
}

impl SpeedReadout {
    pub fn from_mps(metres_per_second: f64) -> Self {
        Self {
            metres_per_second,
            kilometres_per_hour: metres_per_second * MPS_TO_KMH,
            knots: metres_per_second * MPS_TO_KNOTS,
        }
    }
}

/// Wraps an angle in degrees into `[0, 360)`.
pub fn wrap_degrees(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Heading relative to the first yaw seen.
///
/// Yaw is stored cumulatively in frames (it may exceed 360 or go negative);
/// this is the only place it gets wrapped.
#[derive(Debug, Clone, Default)]
pub struct HeadingTracker {
    origin: Option<f64>,
}

impl HeadingTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Relative heading in `[0, 360)`. The first call fixes the origin.
    pub fn update(&mut self, yaw_degrees: f64) -> f64 {
        let origin = *self.origin.get_or_insert(yaw_degrees);
        wrap_degrees(yaw_degrees - origin)
    }

    pub fn origin(&self) -> Option<f64> {
        self.origin
    }

    /// Forgets the origin; the next update defines a new one.
    pub fn reset(&mut self) {
        self.origin = None;
    }
}

/// Scales a force for display: `value / reference * scaling`, or `value`
/// unchanged when the reference is (near) zero.
pub fn normalise_force(value: f64, reference: f64, scaling: f64) -> f64 {
    if reference.abs() > FORCE_REFERENCE_EPSILON {
        value / reference * scaling
    } else {
        value
    }
}

/// First-order low-pass for jittery display values.
#[derive(Debug, Clone)]
pub struct ExponentialSmoother {
    /// Weight of the new sample, in `(0, 1]`
    alpha: f64,
    value: Option<f64>,
}

impl ExponentialSmoother {
    /// `alpha` is clamped into `(0, 1]`; 1 disables smoothing.
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha: alpha.clamp(f64::EPSILON, 1.0),
            value: None,
        }
    }

    /// Feeds a sample and returns the smoothed value. The first sample
    /// passes through unchanged.
    pub fn update(&mut self, sample: f64) -> f64 {
        let next = match self.value {
            Some(v) => v + self.alpha * (sample - v),
            None => sample,
        };
        self.value = Some(next);
        next
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }

    pub fn reset(&mut self) {
        self.value = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    fn at(x: f64) -> Frame {
        Frame {
            position: Vector3::new(x, 0.0, 0.0),
            ..Default::default()
        }
    }

    #[test]
    fn test_speed_prefers_logged_velocity() {
        let mut current = at(10.0);
        current.linear_velocity = Vector3::new(3.0, 4.0, 0.0);

        assert_relative_eq!(ship_speed(&current, Some(&at(0.0)), 0.1), 5.0);
    }

    #[test]
    fn test_speed_from_finite_difference() {
        assert_relative_eq!(ship_speed(&at(1.5), Some(&at(1.0)), 0.25), 2.0);
    }

    #[test]
    fn test_speed_without_history_is_zero() {
        assert_eq!(ship_speed(&at(1.0), None, 0.1), 0.0);
        assert_eq!(ship_speed(&at(1.0), Some(&at(0.0)), 0.0), 0.0);
    }

    #[test]
    fn test_speed_readout_units() {
        let readout = SpeedReadout::from_mps(10.0);
        assert_relative_eq!(readout.kilometres_per_hour, 36.0);
        assert_relative_eq!(readout.knots, 19.43844, epsilon = 1e-9);
    }

    #[test]
    fn test_heading_relative_and_wrapped() {
        let mut heading = HeadingTracker::new();

        assert_eq!(heading.update(30.0), 0.0);
        assert_relative_eq!(heading.update(40.0), 10.0);
        assert_relative_eq!(heading.update(20.0), 350.0);
        assert_relative_eq!(heading.update(30.0 + 720.0 + 5.0), 5.0);
        assert_eq!(heading.origin(), Some(30.0));

        heading.reset();
        assert_eq!(heading.update(100.0), 0.0);
    }

    #[test]
    fn test_wrap_degrees_range() {
        assert_eq!(wrap_degrees(360.0), 0.0);
        assert_relative_eq!(wrap_degrees(-90.0), 270.0);
        assert!(wrap_degrees(-1e-20) < 360.0);
    }

    #[test]
    fn test_normalise_force() {
        assert_relative_eq!(normalise_force(500.0, 1000.0, 2.0), 1.0);
        assert_eq!(normalise_force(500.0, 0.0, 2.0), 500.0);
        assert_eq!(normalise_force(500.0, 1e-9, 2.0), 500.0);
    }

    #[test]
    fn test_smoother_converges() {
        let mut smoother = ExponentialSmoother::new(0.5);

        assert_eq!(smoother.update(10.0), 10.0);
        assert_relative_eq!(smoother.update(20.0), 15.0);
        assert_relative_eq!(smoother.update(20.0), 17.5);

        let mut passthrough = ExponentialSmoother::new(1.0);
        passthrough.update(1.0);
        assert_eq!(passthrough.update(7.0), 7.0);
    }
}
