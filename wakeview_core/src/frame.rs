//! Frame records and the linear interpolator.
//!
//! A [`Frame`] is one time-stamped sample of ship kinematics plus the full
//! force/moment decomposition. Stored frames are never mutated; the
//! interpolator always builds a fresh one.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// The seven physical contributions the solver logs separately.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ForceComponents {
    /// Weight of the hull
    pub gravity: Vector3<f64>,

    /// Non-linear hydrostatic (fast) force
    pub hydrostatic: Vector3<f64>,

    /// Non-linear Froude-Krylov force
    pub froude_krylov: Vector3<f64>,

    /// Diffraction force
    pub diffraction: Vector3<f64>,

    /// Radiation damping
    pub radiation: Vector3<f64>,

    /// Resistance model (Holtrop & Mennen)
    pub resistance: Vector3<f64>,

    /// Propeller and rudder
    pub propulsion: Vector3<f64>,
}

impl ForceComponents {
    /// Component-wise interpolation.
    pub fn lerp(&self, other: &Self, t: f64) -> Self {
        Self {
            gravity: self.gravity.lerp(&other.gravity, t),
            hydrostatic: self.hydrostatic.lerp(&other.hydrostatic, t),
            froude_krylov: self.froude_krylov.lerp(&other.froude_krylov, t),
            diffraction: self.diffraction.lerp(&other.diffraction, t),
            radiation: self.radiation.lerp(&other.radiation, t),
            resistance: self.resistance.lerp(&other.resistance, t),
            propulsion: self.propulsion.lerp(&other.propulsion, t),
        }
    }

    /// Iterates over `(name, vector)` pairs in log order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Vector3<f64>)> {
        [
            ("gravity", &self.gravity),
            ("hydrostatic", &self.hydrostatic),
            ("froude_krylov", &self.froude_krylov),
            ("diffraction", &self.diffraction),
            ("radiation", &self.radiation),
            ("resistance", &self.resistance),
            ("propulsion", &self.propulsion),
        ]
        .into_iter()
    }
}

/// One time-sampled record of the simulation log.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Frame {
    /// Simulation clock in seconds
    pub time: f64,

    /// Ship position in ship-local engine axes (X forward, Y up, Z starboard)
    pub position: Vector3<f64>,

    /// (roll, pitch, yaw) in degrees. Yaw is cumulative, never wrapped here.
    pub orientation: Vector3<f64>,

    /// Body-frame velocity (u, v, w) in m/s, zero when the log omits it
    pub linear_velocity: Vector3<f64>,

    /// Resultant force (N)
    pub total_force: Vector3<f64>,

    /// Resultant moment (N·m)
    pub total_moment: Vector3<f64>,

    /// Per-effect force breakdown
    pub components: ForceComponents,
}

impl Frame {
    /// Roll in degrees.
    pub fn roll(&self) -> f64 {
        self.orientation.x
    }

    /// Pitch in degrees.
    pub fn pitch(&self) -> f64 {
        self.orientation.y
    }

    /// Cumulative yaw in degrees.
    pub fn yaw(&self) -> f64 {
        self.orientation.z
    }

    /// True when the log carried any non-zero body velocity.
    pub fn has_velocity(&self) -> bool {
        self.linear_velocity != Vector3::zeros()
    }

    /// Linear interpolation of every channel.
    ///
    /// Uses `a * (1 - t) + b * t`, so `t = 0` yields `self` and `t = 1`
    /// yields `other` bit for bit.
    pub fn lerp(&self, other: &Frame, t: f64) -> Frame {
        Frame {
            time: lerp_scalar(self.time, other.time, t),
            position: self.position.lerp(&other.position, t),
            orientation: self.orientation.lerp(&other.orientation, t),
            linear_velocity: self.linear_velocity.lerp(&other.linear_velocity, t),
            total_force: self.total_force.lerp(&other.total_force, t),
            total_moment: self.total_moment.lerp(&other.total_moment, t),
            components: self.components.lerp(&other.components, t),
        }
    }
}

/// Scalar lerp with exact endpoints.
pub fn lerp_scalar(a: f64, b: f64, t: f64) -> f64 {
    a * (1.0 - t) + b * t
}

/// Fraction of `value` between `a` and `b`, clamped to `[0, 1]`.
///
/// A degenerate interval yields 0.
pub fn inverse_lerp(a: f64, b: f64, value: f64) -> f64 {
    let span = b - a;
    if span.abs() <= f64::EPSILON {
        return 0.0;
    }
    ((value - a) / span).clamp(0.0, 1.0)
}

/// Interpolates between two bracketing frames at `elapsed` seconds.
///
/// No extrapolation: outside `[a.time, b.time]` the result is `a` or `b`.
pub fn interpolate(a: &Frame, b: &Frame, elapsed: f64) -> Frame {
    a.lerp(b, inverse_lerp(a.time, b.time, elapsed))
}
