//! WakeView Core - ship motion log playback engine
//!
//! Replays a seakeeping solver's time series (position, attitude, velocity
//! and the hydrodynamic force breakdown) against a rendering host:
//! 1. **Schema-tolerant parsing**: header-driven column mapping, bad rows skipped
//! 2. **Playback clock**: play/pause/seek/loop/drag with linear interpolation
//! 3. **Coordinate transform**: NED solver axes into a left-handed Y-up scene

pub mod error;
pub mod follow;
pub mod frame;
pub mod log_parser;
pub mod playback;
pub mod schema;
pub mod settings;
pub mod ship_config;
pub mod telemetry;
pub mod transform;

// Re-export key types for convenience
pub use error::{PlayerError, Result};
pub use follow::{FollowConfig, PoseFollower};
pub use frame::{interpolate, ForceComponents, Frame};
pub use log_parser::{parse_log, parse_log_file, parse_log_str, LoadReport, ParseOptions, ParsedLog};
pub use playback::{DragState, PlaybackPhase, PlaybackState, ShipPlayer};
pub use schema::{Channel, ColumnMap};
pub use settings::{LogSources, PlayerSettings};
pub use ship_config::ShipConfig;
pub use telemetry::{normalise_force, ship_speed, ExponentialSmoother, HeadingTracker, SpeedReadout};
pub use transform::{InitialTransform, SceneTransform, WorldPose};
