//! Player configuration.
//!
//! Everything the player needs is passed in explicitly: the two input
//! paths through [`LogSources`] and the tunables through [`PlayerSettings`].

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default section holding the initial pose in the ship document.
pub const INITIAL_POSE_SECTION: &str = "initial position of body frame";

/// Default section holding the propeller attachment point.
pub const PROPELLER_SECTION: &str = "position of propeller frame";

/// Tunables for a [`ShipPlayer`](crate::playback::ShipPlayer).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerSettings {
    /// Playback rate (1.0 = real time)
    pub playback_speed: f64,

    /// Restart automatically at the end of the log
    pub looping: bool,

    /// Start playing as soon as a log is loaded
    pub autoplay: bool,

    /// Scale applied to world positions
    pub position_scale: f64,

    /// World-space offset added after scaling
    pub position_offset: Vector3<f64>,

    /// Convert roll and pitch from radians at parse time (yaw always is)
    pub roll_pitch_in_radians: bool,

    /// Section literal for the initial pose
    pub initial_pose_section: String,

    /// Section literal for the propeller position
    pub propeller_section: String,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            playback_speed: 1.0,
            looping: true,
            autoplay: true,
            position_scale: 1.0,
            position_offset: Vector3::zeros(),
            roll_pitch_in_radians: false,
            initial_pose_section: INITIAL_POSE_SECTION.to_string(),
            propeller_section: PROPELLER_SECTION.to_string(),
        }
    }
}

impl PlayerSettings {
    /// Sets the playback rate.
    pub fn with_speed(mut self, speed: f64) -> Self {
        self.playback_speed = speed;
        self
    }

    /// Enables or disables looping.
    pub fn with_looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    /// Enables or disables playing right after load.
    pub fn with_autoplay(mut self, autoplay: bool) -> Self {
        self.autoplay = autoplay;
        self
    }

    /// Sets scale and offset of world positions.
    pub fn with_placement(mut self, scale: f64, offset: Vector3<f64>) -> Self {
        self.position_scale = scale;
        self.position_offset = offset;
        self
    }

    /// Treats roll and pitch columns as radians.
    pub fn with_roll_pitch_in_radians(mut self, enabled: bool) -> Self {
        self.roll_pitch_in_radians = enabled;
        self
    }

    /// Parses settings from JSON; missing fields keep their defaults.
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

/// The two input files of a replay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogSources {
    /// Simulation log (CSV)
    pub log_path: PathBuf,

    /// Ship document (YAML-like)
    pub ship_path: PathBuf,
}

impl LogSources {
    /// Creates a source pair.
    pub fn new(log_path: impl AsRef<Path>, ship_path: impl AsRef<Path>) -> Self {
        Self {
            log_path: log_path.as_ref().to_path_buf(),
            ship_path: ship_path.as_ref().to_path_buf(),
        }
    }
}
