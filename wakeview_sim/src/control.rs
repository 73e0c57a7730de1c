//! Scripted control input for headless replays.
//!
//! Each event is `<action>@<host time>` or `<action>@<host time>=<value>`:
//!
//! ```text
//! pause@2.5        pause 2.5 s into the run
//! seek@3=12.0      at 3 s, jump to 12 s of log time
//! drag@4=20        at 4 s, grab the timeline and scrub to 20 s
//! release@5=25     at 5 s, let go at 25 s
//! ```

use crate::error::SimError;
use serde::Serialize;
use wakeview_core::ShipPlayer;

/// What to do to the player.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "action", content = "value", rename_all = "snake_case")]
pub enum ControlAction {
    Play,
    Pause,
    Toggle,
    Restart,

    /// Seek to log time (s)
    Seek(f64),

    /// Begin or continue a drag at log time (s)
    Drag(f64),

    /// End a drag at log time (s)
    Release(f64),
}

impl ControlAction {
    /// Returns the action keyword.
    pub fn name(&self) -> &'static str {
        match self {
            ControlAction::Play => "play",
            ControlAction::Pause => "pause",
            ControlAction::Toggle => "toggle",
            ControlAction::Restart => "restart",
            ControlAction::Seek(_) => "seek",
            ControlAction::Drag(_) => "drag",
            ControlAction::Release(_) => "release",
        }
    }

    /// Log-time argument, if the action takes one.
    pub fn value(&self) -> Option<f64> {
        match self {
            ControlAction::Seek(v) | ControlAction::Drag(v) | ControlAction::Release(v) => Some(*v),
            _ => None,
        }
    }

    /// Applies the action through the public player API.
    pub fn apply(&self, player: &mut ShipPlayer) {
        match *self {
            ControlAction::Play => player.play(),
            ControlAction::Pause => player.pause(),
            ControlAction::Toggle => player.toggle_play_pause(),
            ControlAction::Restart => player.restart(),
            ControlAction::Seek(t) => player.set_elapsed_time(t),
            ControlAction::Drag(t) => {
                if !player.is_dragging() {
                    player.begin_drag();
                }
                player.drag_to(t);
            }
            ControlAction::Release(t) => player.end_drag(t),
        }
    }
}

/// An action scheduled at a host time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ControlEvent {
    /// Host time in seconds since the run started
    pub at: f64,

    pub action: ControlAction,
}

impl ControlEvent {
    pub fn new(at: f64, action: ControlAction) -> Self {
        Self { at, action }
    }
}

impl std::fmt::Display for ControlEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.action.name(), self.at)?;
        if let Some(v) = self.action.value() {
            write!(f, "={}", v)?;
        }
        Ok(())
    }
}

impl std::str::FromStr for ControlEvent {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();

        let (name, schedule) = input
            .split_once('@')
            .ok_or_else(|| SimError::invalid_event(input, "expected <action>@<time>"))?;
        let (at, value) = match schedule.split_once('=') {
            Some((at, value)) => (at, Some(value)),
            None => (schedule, None),
        };

        let at = parse_seconds(input, at)?;
        if at < 0.0 {
            return Err(SimError::invalid_event(input, "time must not be negative"));
        }
        let value = value.map(|v| parse_seconds(input, v)).transpose()?;

        let needs_value = |v: Option<f64>| {
            v.ok_or_else(|| SimError::invalid_event(input, "expected <action>@<time>=<seconds>"))
        };

        let action = match name.trim().to_lowercase().as_str() {
            "play" => ControlAction::Play,
            "pause" => ControlAction::Pause,
            "toggle" => ControlAction::Toggle,
            "restart" => ControlAction::Restart,
            "seek" => ControlAction::Seek(needs_value(value)?),
            "drag" => ControlAction::Drag(needs_value(value)?),
            "release" => ControlAction::Release(needs_value(value)?),
            other => {
                return Err(SimError::invalid_event(
                    input,
                    format!(
                        "unknown action '{}' (play, pause, toggle, restart, seek, drag, release)",
                        other
                    ),
                ))
            }
        };

        if value.is_some() && action.value().is_none() {
            return Err(SimError::invalid_event(
                input,
                format!("'{}' takes no value", action.name()),
            ));
        }

        Ok(Self { at, action })
    }
}

fn parse_seconds(input: &str, raw: &str) -> Result<f64, SimError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| SimError::invalid_event(input, format!("'{}' is not a number", raw.trim())))
}

/// Sorts events by time, keeping command-line order for ties.
pub fn schedule(mut events: Vec<ControlEvent>) -> Vec<ControlEvent> {
    events.sort_by(|a, b| a.at.total_cmp(&b.at));
    events
}
