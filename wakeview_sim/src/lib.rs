//! WakeView headless replay host
//!
//! Drives a [`wakeview_core::ShipPlayer`] the way a render loop would, but
//! without a window: fixed-rate ticks, a scripted control track and a JSON
//! trace of everything an overlay would display.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │                 ReplayRunner                  │
//! │   ControlEvent script ──► ShipPlayer.tick()   │
//! │                              │                │
//! │        HeadingTracker ◄──────┼──► PoseFollower│
//! │                              ▼                │
//! │                         ReplayFrame           │
//! └───────────────────────────────┬───────────────┘
//!                                 ▼
//!                           ReplayExport (JSON)
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use wakeview_core::{LogSources, PlayerSettings, ShipPlayer};
//! use wakeview_sim::ReplayRunner;
//!
//! let mut player = ShipPlayer::new(PlayerSettings::default());
//! player.load(&LogSources::new("ship.csv", "ship.yml"))?;
//!
//! let run = ReplayRunner::new(player)
//!     .with_tick_rate(60)
//!     .with_events(vec!["pause@2.5".parse()?])
//!     .run()?;
//! ```

pub mod control;
pub mod error;
pub mod exporter;
pub mod runner;

pub use control::{ControlAction, ControlEvent};
pub use error::SimError;
pub use exporter::ReplayExport;
pub use runner::{ReplayFrame, ReplayRun, ReplayRunner, ReplaySummary, RunnerConfig};
