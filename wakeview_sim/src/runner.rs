//! Replay runner - drives a [`ShipPlayer`] at a fixed host tick rate.
//!
//! Stands in for the render loop: each tick applies due control events,
//! advances the player, then samples everything an overlay would show.

use crate::control::{schedule, ControlEvent};
use crate::error::{Result, SimError};

use nalgebra::Vector3;
use serde::Serialize;
use tracing::{debug, info};
use wakeview_core::{
    ship_speed, DragState, ExponentialSmoother, FollowConfig, HeadingTracker, LoadReport,
    PoseFollower, ShipPlayer, SpeedReadout,
};

/// Log-time steps shorter than this give no finite-difference speed.
const MIN_LOG_STEP: f64 = 1e-6;

/// Weight of a new sample in the displayed speed.
const SPEED_SMOOTHING: f64 = 0.2;

/// Host loop parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct RunnerConfig {
    /// Host ticks per second
    pub tick_rate_hz: u32,

    /// Host run time in seconds; `None` runs one pass of the log
    pub duration_secs: Option<f64>,

    /// Record every n-th tick
    pub record_interval: u32,

    /// Chase camera tuning
    pub follow: FollowConfig,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: 60,
            duration_secs: None,
            record_interval: 1,
            follow: FollowConfig {
                local_offset: Vector3::new(0.0, 15.0, -60.0),
                ..Default::default()
            },
        }
    }
}

/// One sampled host tick.
#[derive(Debug, Clone, Serialize)]
pub struct ReplayFrame {
    /// Host time in seconds
    pub host_time: f64,

    /// Log time in seconds
    pub elapsed: f64,

    pub playing: bool,
    pub dragging: bool,

    /// World position of the ship node
    pub position: Vector3<f64>,

    /// World orientation as engine Euler angles (deg)
    pub rotation_deg: Vector3<f64>,

    pub speed: SpeedReadout,

    /// Low-passed speed as an overlay would display it (m/s)
    pub display_speed_mps: f64,

    /// Heading relative to the first frame, `[0, 360)`
    pub heading_deg: f64,

    /// Propeller attachment point in world space
    pub propeller: Vector3<f64>,

    /// Chase camera position
    pub camera: Vector3<f64>,

    /// Total force on the ship
    pub total_force: Vector3<f64>,
}

/// Results from a replay run.
#[derive(Debug, Clone, Serialize)]
pub struct ReplaySummary {
    /// Host ticks executed
    pub total_ticks: u64,

    /// Host time at the end of the run
    pub host_time_secs: f64,

    /// Log time at the end of the run
    pub final_elapsed: f64,

    /// Log duration
    pub last_frame_time: f64,

    /// Control events applied
    pub events_applied: usize,

    /// Playback stopped on the last frame
    pub reached_end: bool,

    /// Peak speed seen (m/s)
    pub max_speed_mps: f64,

    /// Load diagnostics
    pub load_report: Option<LoadReport>,
}

/// Summary plus the sampled frames.
#[derive(Debug, Clone)]
pub struct ReplayRun {
    pub summary: ReplaySummary,
    pub frames: Vec<ReplayFrame>,
}

/// Runs a loaded player against a control script.
pub struct ReplayRunner {
    player: ShipPlayer,
    config: RunnerConfig,
    events: Vec<ControlEvent>,
}

impl ReplayRunner {
    /// Creates a runner around a player; load the player first.
    pub fn new(player: ShipPlayer) -> Self {
        Self {
            player,
            config: RunnerConfig::default(),
            events: Vec::new(),
        }
    }

    /// Replaces the whole config.
    pub fn with_config(mut self, config: RunnerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the tick rate.
    pub fn with_tick_rate(mut self, hz: u32) -> Self {
        self.config.tick_rate_hz = hz;
        self
    }

    /// Sets the host run time.
    pub fn with_duration(mut self, secs: f64) -> Self {
        self.config.duration_secs = Some(secs);
        self
    }

    /// Sets the control script.
    pub fn with_events(mut self, events: Vec<ControlEvent>) -> Self {
        self.events = schedule(events);
        self
    }

    pub fn player(&self) -> &ShipPlayer {
        &self.player
    }

    /// Hands the player back, e.g. to inspect its final state.
    pub fn into_player(self) -> ShipPlayer {
        self.player
    }

    /// Host run time: the configured duration, or one pass of the log at
    /// the player's speed.
    pub fn planned_duration(&self) -> f64 {
        if let Some(secs) = self.config.duration_secs {
            return secs;
        }

        let speed = self.player.state().speed.abs();
        if speed > f64::EPSILON {
            self.player.last_frame_time() / speed
        } else {
            0.0
        }
    }

    /// Runs the loop and returns the sampled frames and a summary.
    pub fn run(&mut self) -> Result<ReplayRun> {
        if self.config.tick_rate_hz == 0 {
            return Err(SimError::Config("tick rate must be positive".into()));
        }
        let duration = self.planned_duration();
        if !duration.is_finite() || duration < 0.0 {
            return Err(SimError::Config(format!("invalid duration {}", duration)));
        }

        let dt = 1.0 / self.config.tick_rate_hz as f64;
        let mut target_ticks = (duration * self.config.tick_rate_hz as f64).ceil() as u64;
        if self.config.duration_secs.is_none() {
            // Spare tick so accumulated dt gets past the last frame
            target_ticks += 1;
        }
        let record_interval = self.config.record_interval.max(1) as u64;

        info!(
            "Replaying {:.2}s of log for {:.2}s host time ({} ticks at {} Hz, {} events)",
            self.player.last_frame_time(),
            duration,
            target_ticks,
            self.config.tick_rate_hz,
            self.events.len()
        );

        let mut heading = HeadingTracker::new();
        let mut follower = PoseFollower::new(self.config.follow);
        let mut smoother = ExponentialSmoother::new(SPEED_SMOOTHING);
        let mut frames = Vec::new();
        let mut next_event = 0;
        let mut max_speed: f64 = 0.0;

        for tick in 0..=target_ticks {
            let host_time = tick as f64 * dt;

            // Input first, like a render loop polling before Update
            while next_event < self.events.len() && self.events[next_event].at <= host_time + 1e-9 {
                let event = self.events[next_event];
                debug!("t={:.3}s applying {}", host_time, event);
                event.action.apply(&mut self.player);
                next_event += 1;
            }

            if tick > 0 {
                self.player.tick(dt);
            }

            let Some(sample) = self.sample(host_time, dt, &mut heading, &mut follower, &mut smoother)
            else {
                continue;
            };
            max_speed = max_speed.max(sample.speed.metres_per_second);

            if tick % record_interval == 0 {
                frames.push(sample);
            }

            if tick % (self.config.tick_rate_hz as u64) == 0 {
                debug!(
                    "  t={:.1}s | log={:.2}s | playing={}",
                    host_time,
                    self.player.elapsed_time(),
                    self.player.is_playing()
                );
            }
        }

        let summary = ReplaySummary {
            total_ticks: target_ticks,
            host_time_secs: target_ticks as f64 * dt,
            final_elapsed: self.player.elapsed_time(),
            last_frame_time: self.player.last_frame_time(),
            events_applied: next_event,
            reached_end: self.player.has_valid_frame()
                && !self.player.is_playing()
                && self.player.elapsed_time() >= self.player.last_frame_time(),
            max_speed_mps: max_speed,
            load_report: self.player.load_report().cloned(),
        };

        info!(
            "Replay finished: log t={:.2}s of {:.2}s, {} frames recorded",
            summary.final_elapsed,
            summary.last_frame_time,
            frames.len()
        );

        Ok(ReplayRun { summary, frames })
    }

    fn sample(
        &self,
        host_time: f64,
        dt: f64,
        heading: &mut HeadingTracker,
        follower: &mut PoseFollower,
        smoother: &mut ExponentialSmoother,
    ) -> Option<ReplayFrame> {
        let current = self.player.current_frame()?;
        let pose = self.player.world_pose()?;

        // Finite differences run on log time, not host time. A stopped clock
        // keeps the last travelled pair, so it reads as no motion.
        let log_dt = self
            .player
            .previous_frame()
            .filter(|_| self.player.is_playing())
            .map(|prev| current.time - prev.time)
            .filter(|dt| *dt > MIN_LOG_STEP)
            .unwrap_or(0.0);
        let speed = ship_speed(current, self.player.previous_frame(), log_dt);

        let drag: &dyn DragState = &self.player;
        let camera = follower.update(&pose, dt, Some(drag));

        Some(ReplayFrame {
            host_time,
            elapsed: self.player.elapsed_time(),
            playing: self.player.is_playing(),
            dragging: self.player.is_dragging(),
            position: pose.position,
            rotation_deg: pose.euler_degrees(),
            speed: SpeedReadout::from_mps(speed),
            display_speed_mps: smoother.update(speed),
            heading_deg: heading.update(current.yaw()),
            propeller: pose.transform_point(&self.player.propeller_position_local()),
            camera: camera.position,
            total_force: current.total_force,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::ControlAction;
    use approx::assert_relative_eq;
    use wakeview_core::{Frame, PlayerSettings, ShipConfig};

    fn straight_run(settings: PlayerSettings) -> ShipPlayer {
        let frames = (0..=10)
            .map(|i| Frame {
                time: i as f64,
                position: Vector3::new(0.0, 0.0, 2.0 * i as f64),
                ..Default::default()
            })
            .collect();
        ShipPlayer::from_parts(settings, frames, ShipConfig::default())
    }

    #[test]
    fn test_single_pass_reaches_end() {
        let player = straight_run(PlayerSettings::default().with_looping(false));
        let run = ReplayRunner::new(player).with_tick_rate(10).run().unwrap();

        assert!(run.summary.reached_end);
        assert_eq!(run.summary.total_ticks, 101);
        assert_eq!(run.frames.len(), 102);
        assert_relative_eq!(run.summary.final_elapsed, 10.0);
        assert_relative_eq!(run.summary.max_speed_mps, 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_events_apply_in_time_order() {
        let player = straight_run(PlayerSettings::default());
        let events = vec![
            ControlEvent::new(1.0, ControlAction::Pause),
            ControlEvent::new(0.5, ControlAction::Seek(8.0)),
        ];

        let mut runner = ReplayRunner::new(player)
            .with_tick_rate(10)
            .with_duration(2.0)
            .with_events(events);
        let run = runner.run().unwrap();

        assert_eq!(run.summary.events_applied, 2);
        assert!(!runner.player().is_playing());
        assert_relative_eq!(run.summary.final_elapsed, 8.5, epsilon = 1e-9);
    }

    #[test]
    fn test_drag_holds_clock() {
        let player = straight_run(PlayerSettings::default());
        let events = vec![
            ControlEvent::new(0.0, ControlAction::Drag(3.0)),
            ControlEvent::new(1.0, ControlAction::Release(6.0)),
        ];

        let run = ReplayRunner::new(player)
            .with_tick_rate(10)
            .with_duration(1.5)
            .with_events(events)
            .run()
            .unwrap();

        let held = run.frames.iter().find(|f| f.host_time > 0.5).unwrap();
        assert!(held.dragging);
        assert_relative_eq!(held.elapsed, 3.0);
        assert_relative_eq!(held.camera, held.position + Vector3::new(0.0, 15.0, -60.0));

        assert_relative_eq!(run.summary.final_elapsed, 6.6, epsilon = 1e-9);
    }

    #[test]
    fn test_paused_speed_reads_zero() {
        let player = straight_run(PlayerSettings::default());
        let events = vec![ControlEvent::new(0.5, ControlAction::Pause)];

        let run = ReplayRunner::new(player)
            .with_tick_rate(10)
            .with_duration(1.0)
            .with_events(events)
            .run()
            .unwrap();

        let moving = run.frames.iter().find(|f| f.host_time > 0.2).unwrap();
        assert_relative_eq!(moving.speed.metres_per_second, 2.0, epsilon = 1e-9);

        let paused: Vec<_> = run.frames.iter().filter(|f| f.host_time >= 0.5 - 1e-9).collect();
        assert!(!paused.is_empty());
        for sample in paused {
            assert!(!sample.playing);
            assert_eq!(sample.speed.metres_per_second, 0.0);
        }
        assert!(run.frames.last().unwrap().display_speed_mps < 2.0);
    }

    #[test]
    fn test_speed_reads_zero_after_end() {
        let player = straight_run(PlayerSettings::default().with_looping(false));
        let run = ReplayRunner::new(player)
            .with_tick_rate(10)
            .with_duration(11.0)
            .run()
            .unwrap();

        let last = run.frames.last().unwrap();
        assert!(!last.playing);
        assert_eq!(last.speed.metres_per_second, 0.0);
    }

    #[test]
    fn test_inert_player_records_nothing() {
        let player = ShipPlayer::new(PlayerSettings::default());
        let run = ReplayRunner::new(player).with_duration(1.0).run().unwrap();

        assert!(run.frames.is_empty());
        assert!(!run.summary.reached_end);
    }

    #[test]
    fn test_zero_tick_rate_rejected() {
        let player = straight_run(PlayerSettings::default());
        let err = ReplayRunner::new(player).with_tick_rate(0).run().unwrap_err();
        assert!(matches!(err, SimError::Config(_)));
    }
}
