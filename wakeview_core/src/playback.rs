//! Playback clock, seek state machine and the player facade.
//!
//! [`ShipPlayer`] owns the frame sequence, the initial transform and the
//! [`PlaybackState`]. Hosts call [`ShipPlayer::tick`] once per render tick
//! and read [`ShipPlayer::current_frame`] / [`ShipPlayer::world_pose`];
//! everything else goes through the play/pause/seek/drag API.
//!
//! ```text
//!                 play()                     tick() past end, no loop
//!  StoppedAtStart ──────► Playing ─────────────────────────► Paused
//!        ▲                 │   ▲                                │
//!        │        pause()  │   │ play() / toggle()              │
//!        │                 ▼   │                                │
//!        │                Paused ◄──────────────────────────────┘
//!        │
//!        └── begin_drag() from any state ──► Dragging ── end_drag() ──► previous
//! ```
//!
//! With fewer than two frames every operation is a no-op.

use crate::error::Result;
use crate::frame::{interpolate, Frame};
use crate::log_parser::{parse_log_file, push_in_order, LoadReport, ParseOptions, TimeOrder};
use crate::settings::{LogSources, PlayerSettings};
use crate::ship_config::ShipConfig;
use crate::transform::{SceneTransform, WorldPose};
use nalgebra::Vector3;
use serde::Serialize;
use tracing::{debug, error, info, warn};

/// `play()` restarts from zero when this close to the end (seconds).
pub const END_TOLERANCE: f64 = 0.01;

/// Anything that can report whether the user is scrubbing.
pub trait DragState {
    fn is_dragging(&self) -> bool;
}

/// Absent provider means never dragging.
pub fn is_dragging(source: Option<&dyn DragState>) -> bool {
    source.is_some_and(|s| s.is_dragging())
}

/// Mutable clock state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaybackState {
    /// Playback clock in seconds, within `[0, last_frame_time]`
    pub elapsed: f64,

    /// Index `i` of the segment `[frames[i], frames[i + 1]]`
    pub segment: usize,

    pub is_playing: bool,
    pub is_dragging: bool,

    /// Clock rate multiplier
    pub speed: f64,

    /// Wrap to zero at the end
    pub looping: bool,
}

impl PlaybackState {
    fn new(settings: &PlayerSettings) -> Self {
        Self {
            elapsed: 0.0,
            segment: 0,
            is_playing: false,
            is_dragging: false,
            speed: settings.playback_speed,
            looping: settings.looping,
        }
    }
}

/// Coarse state for hosts that drive UI from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PlaybackPhase {
    /// Nothing playable loaded
    Inert,
    StoppedAtStart,
    Playing,
    Paused,
    Dragging,
}

/// The playback engine.
#[derive(Debug, Clone)]
pub struct ShipPlayer {
    settings: PlayerSettings,
    frames: Vec<Frame>,
    ship: ShipConfig,
    scene: SceneTransform,
    state: PlaybackState,
    current: Option<Frame>,
    previous: Option<Frame>,
    report: Option<LoadReport>,
}

impl ShipPlayer {
    /// Creates an empty, inert player. Queries are safe before any load.
    pub fn new(settings: PlayerSettings) -> Self {
        let state = PlaybackState::new(&settings);
        Self {
            settings,
            frames: Vec::new(),
            ship: ShipConfig::default(),
            scene: SceneTransform::default(),
            state,
            current: None,
            previous: None,
            report: None,
        }
    }

    /// Builds a player from frames already in memory.
    ///
    /// Frames that would break strict time ordering are dropped, the same
    /// policy the log parser applies.
    pub fn from_parts(settings: PlayerSettings, frames: Vec<Frame>, ship: ShipConfig) -> Self {
        let mut report = LoadReport {
            rows_read: frames.len(),
            ..Default::default()
        };

        let mut ordered = Vec::with_capacity(frames.len());
        for frame in frames {
            match push_in_order(&mut ordered, frame) {
                TimeOrder::Kept => {}
                TimeOrder::Duplicate => report.dropped_duplicates += 1,
                TimeOrder::Backward => report.dropped_out_of_order += 1,
                TimeOrder::NonFinite => report.skipped_malformed += 1,
            }
        }
        report.frames = ordered.len();
        report.last_time = ordered.last().map_or(0.0, |f| f.time);

        let mut player = Self::new(settings);
        player.install(ordered, ship, report);
        player
    }

    /// Loads the ship document and the log, replacing any previous data.
    ///
    /// On error the player is left inert and the error is returned; it is
    /// never a panic. A log with fewer than two frames loads but stays
    /// inert.
    pub fn load(&mut self, sources: &LogSources) -> Result<&LoadReport> {
        self.reset();

        match self.read_sources(sources) {
            Ok((frames, ship, report)) => {
                info!(
                    "Loaded {} frames from {}",
                    report.frames,
                    sources.log_path.display()
                );
                self.install(frames, ship, report);
                let report = self.report.get_or_insert_with(LoadReport::default);
                Ok(&*report)
            }
            Err(e) => {
                error!("Playback disabled: {}", e);
                Err(e)
            }
        }
    }

    fn read_sources(&self, sources: &LogSources) -> Result<(Vec<Frame>, ShipConfig, LoadReport)> {
        let ship = ShipConfig::load(&sources.ship_path, &self.settings)?;

        let options = ParseOptions {
            roll_pitch_in_radians: self.settings.roll_pitch_in_radians,
        };
        let parsed = parse_log_file(&sources.log_path, &options)?;

        if !parsed.report.missing_channels.is_empty() {
            info!(
                "Channels absent from log (read as zero): {}",
                parsed.report.missing_channels.join(", ")
            );
        }

        Ok((parsed.frames, ship, parsed.report))
    }

    fn install(&mut self, frames: Vec<Frame>, ship: ShipConfig, report: LoadReport) {
        self.scene = SceneTransform::new(ship.initial_transform(), &self.settings);
        self.ship = ship;
        self.frames = frames;
        let playable = report.is_playable();
        self.report = Some(report);
        self.state = PlaybackState::new(&self.settings);

        if !playable {
            warn!(
                "Playback disabled: {} frame(s) ending at {:.3}s, need at least 2 ending after 0",
                self.frames.len(),
                self.last_frame_time()
            );
            self.current = None;
            self.previous = None;
            return;
        }

        self.current = Some(self.frames[0].clone());
        self.previous = self.current.clone();
        self.state.is_playing = self.settings.autoplay;
    }

    fn reset(&mut self) {
        self.frames.clear();
        self.ship = ShipConfig::default();
        self.scene = SceneTransform::default();
        self.state = PlaybackState::new(&self.settings);
        self.current = None;
        self.previous = None;
        self.report = None;
    }

    // ========== Queries ==========

    /// True once a playable sequence is loaded.
    pub fn is_loaded(&self) -> bool {
        self.report.as_ref().is_some_and(LoadReport::is_playable)
    }

    /// Interpolated frame for the current elapsed time.
    pub fn current_frame(&self) -> Option<&Frame> {
        self.current.as_ref()
    }

    /// Current frame as of the previous tick.
    pub fn previous_frame(&self) -> Option<&Frame> {
        self.previous.as_ref()
    }

    pub fn has_valid_frame(&self) -> bool {
        self.current.is_some()
    }

    pub fn elapsed_time(&self) -> f64 {
        self.state.elapsed
    }

    /// Time of the last stored frame, 0 with no data.
    pub fn last_frame_time(&self) -> f64 {
        self.frames.last().map_or(0.0, |f| f.time)
    }

    pub fn is_playing(&self) -> bool {
        self.state.is_playing
    }

    pub fn is_dragging(&self) -> bool {
        self.state.is_dragging
    }

    pub fn segment_index(&self) -> usize {
        self.state.segment
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn phase(&self) -> PlaybackPhase {
        if !self.is_loaded() {
            PlaybackPhase::Inert
        } else if self.state.is_dragging {
            PlaybackPhase::Dragging
        } else if self.state.is_playing {
            PlaybackPhase::Playing
        } else if self.state.elapsed == 0.0 {
            PlaybackPhase::StoppedAtStart
        } else {
            PlaybackPhase::Paused
        }
    }

    /// Stored frames, read-only.
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn load_report(&self) -> Option<&LoadReport> {
        self.report.as_ref()
    }

    pub fn settings(&self) -> &PlayerSettings {
        &self.settings
    }

    pub fn ship_config(&self) -> &ShipConfig {
        &self.ship
    }

    pub fn scene_transform(&self) -> &SceneTransform {
        &self.scene
    }

    /// World pose of the current frame for the host scene node.
    pub fn world_pose(&self) -> Option<WorldPose> {
        self.current.as_ref().map(|f| self.scene.world_pose(f))
    }

    /// Propeller attachment point in ship-local engine axes.
    pub fn propeller_position_local(&self) -> Vector3<f64> {
        self.ship.propeller_position_local()
    }

    /// Propeller attachment point in world space.
    pub fn propeller_position_world(&self) -> Option<Vector3<f64>> {
        let local = self.propeller_position_local();
        self.world_pose().map(|pose| pose.transform_point(&local))
    }

    // ========== Control API ==========

    /// Starts or resumes playback; restarts when sitting at the end.
    pub fn play(&mut self) {
        if !self.is_loaded() {
            return;
        }

        if self.state.elapsed >= self.last_frame_time() - END_TOLERANCE {
            self.restart();
        } else {
            self.state.is_playing = true;
        }
    }

    pub fn pause(&mut self) {
        if !self.is_loaded() {
            return;
        }
        self.state.is_playing = false;
    }

    pub fn toggle_play_pause(&mut self) {
        if self.state.is_playing {
            self.pause();
        } else {
            self.play();
        }
    }

    /// Jumps back to t = 0 and plays.
    pub fn restart(&mut self) {
        if !self.is_loaded() {
            return;
        }

        self.state.elapsed = 0.0;
        self.state.segment = 0;
        self.current = Some(self.frames[0].clone());
        self.previous = self.current.clone();
        self.state.is_playing = true;
    }

    pub fn set_speed(&mut self, speed: f64) {
        self.state.speed = speed;
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.state.looping = looping;
    }

    /// Seeks to `value` seconds, clamped into `[0, last_frame_time]`.
    ///
    /// The current frame is recomputed immediately and the previous frame
    /// is set to the same value, so finite differences read zero.
    pub fn set_elapsed_time(&mut self, value: f64) {
        if !self.is_loaded() {
            return;
        }

        let value = if value.is_nan() { 0.0 } else { value };
        self.state.elapsed = value.max(0.0).min(self.last_frame_time());
        self.state.segment = self.locate_segment(self.state.elapsed);

        self.current = Some(self.sample());
        self.previous = self.current.clone();
    }

    /// Enters scrubbing: ticks stop advancing the clock.
    pub fn begin_drag(&mut self) {
        if !self.is_loaded() {
            return;
        }
        self.state.is_dragging = true;
        debug!("Drag started at {:.3}s", self.state.elapsed);
    }

    /// Seeks while the drag is held.
    pub fn drag_to(&mut self, value: f64) {
        if self.state.is_dragging {
            self.set_elapsed_time(value);
        }
    }

    /// Applies the final seek value and releases the drag.
    pub fn end_drag(&mut self, value: f64) {
        if !self.state.is_dragging {
            return;
        }
        self.state.is_dragging = false;
        self.set_elapsed_time(value);
        debug!("Drag released at {:.3}s", self.state.elapsed);
    }

    /// Advances the clock by `dt` seconds of host time.
    pub fn tick(&mut self, dt: f64) {
        if !self.is_loaded() || !self.state.is_playing || self.state.is_dragging {
            return;
        }

        let last_time = self.last_frame_time();
        self.previous = self.current.clone();
        self.state.elapsed += dt * self.state.speed;

        if self.state.looping && self.state.elapsed > last_time {
            self.state.elapsed = 0.0;
            self.state.segment = 0;
            self.current = Some(self.frames[0].clone());
            debug!("Looped back to start");
            return;
        }

        if !self.state.looping && self.state.elapsed >= last_time {
            self.state.elapsed = last_time;
            self.state.segment = self.frames.len() - 2;
            self.current = self.frames.last().cloned();
            self.state.is_playing = false;
            info!("Reached end of log at {:.3}s", last_time);
            return;
        }

        if self.state.elapsed < 0.0 {
            self.state.elapsed = 0.0;
        }

        self.advance_segment();
        self.current = Some(self.sample());
    }

    // ========== Private Helper Methods ==========

    /// Smallest `i` with `elapsed <= frames[i + 1].time`, capped at `n - 2`.
    fn locate_segment(&self, elapsed: f64) -> usize {
        let after_first = &self.frames[1..];
        let idx = after_first.partition_point(|f| f.time < elapsed);
        idx.min(self.frames.len() - 2)
    }

    /// Forward scan from the cached segment; rewinds only if the clock
    /// moved backwards (negative speed).
    fn advance_segment(&mut self) {
        let elapsed = self.state.elapsed;
        let last_segment = self.frames.len() - 2;

        if elapsed < self.frames[self.state.segment].time {
            self.state.segment = self.locate_segment(elapsed);
            return;
        }

        while self.state.segment < last_segment
            && elapsed > self.frames[self.state.segment + 1].time
        {
            self.state.segment += 1;
        }
    }

    fn sample(&self) -> Frame {
        let a = &self.frames[self.state.segment];
        let b = &self.frames[self.state.segment + 1];
        interpolate(a, b, self.state.elapsed)
    }
}

impl DragState for ShipPlayer {
    fn is_dragging(&self) -> bool {
        ShipPlayer::is_dragging(self)
    }
}
