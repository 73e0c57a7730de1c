//! JSON exporter for replay traces.
//!
//! Writes the sampled frames plus the run summary so plots and external
//! viewers can consume a replay without linking the engine.

use crate::control::ControlEvent;
use crate::error::{Result, SimError};
use crate::runner::{ReplayFrame, ReplayRun, ReplaySummary};

use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Complete replay export.
#[derive(Debug, Clone, Serialize)]
pub struct ReplayExport {
    /// Log file the replay came from
    pub source: String,

    /// Host tick rate in Hz
    pub tick_rate_hz: u32,

    /// Host time covered by the frames
    pub duration_sec: f64,

    /// Control script that was applied
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<ControlEvent>,

    /// All recorded frames
    pub frames: Vec<ReplayFrame>,

    /// Final results
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<ReplaySummary>,
}

impl ReplayExport {
    /// Creates an empty export container.
    pub fn new(source: &str, tick_rate_hz: u32) -> Self {
        Self {
            source: source.to_string(),
            tick_rate_hz,
            duration_sec: 0.0,
            events: Vec::new(),
            frames: Vec::new(),
            summary: None,
        }
    }

    /// Builds an export from a finished run.
    pub fn from_run(source: &str, tick_rate_hz: u32, events: &[ControlEvent], run: ReplayRun) -> Self {
        let mut export = Self::new(source, tick_rate_hz);
        export.events = events.to_vec();
        for frame in run.frames {
            export.add_frame(frame);
        }
        export.finalize(run.summary);
        export
    }

    /// Adds a frame.
    pub fn add_frame(&mut self, frame: ReplayFrame) {
        self.duration_sec = frame.host_time;
        self.frames.push(frame);
    }

    /// Attaches the run summary.
    pub fn finalize(&mut self, summary: ReplaySummary) {
        self.duration_sec = summary.host_time_secs;
        self.summary = Some(summary);
    }

    /// Serializes to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| SimError::export("<memory>", e))
    }

    /// Writes to a JSON file.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|e| SimError::export(path, e))?;
        let mut writer = BufWriter::new(file);

        serde_json::to_writer_pretty(&mut writer, self).map_err(|e| SimError::export(path, e))?;
        writer.flush().map_err(|e| SimError::export(path, e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::ControlAction;
    use crate::runner::ReplayRunner;
    use nalgebra::Vector3;
    use wakeview_core::{Frame, PlayerSettings, ShipConfig, ShipPlayer};

    fn short_run() -> ReplayRun {
        let frames = vec![
            Frame {
                time: 0.0,
                ..Default::default()
            },
            Frame {
                time: 1.0,
                position: Vector3::new(1.0, 0.0, 0.0),
                ..Default::default()
            },
        ];
        let player = ShipPlayer::from_parts(
            PlayerSettings::default().with_looping(false),
            frames,
            ShipConfig::default(),
        );
        ReplayRunner::new(player).with_tick_rate(4).run().unwrap()
    }

    #[test]
    fn test_from_run_keeps_frames_and_summary() {
        let events = [ControlEvent::new(0.5, ControlAction::Pause)];
        let export = ReplayExport::from_run("ship.csv", 4, &events, short_run());

        assert_eq!(export.frames.len(), 6);
        assert_eq!(export.duration_sec, 1.25);
        assert!(export.summary.as_ref().unwrap().reached_end);

        let json: serde_json::Value = serde_json::from_str(&export.to_json().unwrap()).unwrap();
        assert_eq!(json["source"], "ship.csv");
        assert_eq!(json["events"][0]["action"]["action"], "pause");
        assert_eq!(json["frames"][0]["position"], serde_json::json!([0.0, 0.0, 0.0]));
    }

    #[test]
    fn test_empty_fields_skipped() {
        let export = ReplayExport::new("ship.csv", 60);
        let json = export.to_json().unwrap();

        assert!(!json.contains("events"));
        assert!(!json.contains("summary"));
    }

    #[test]
    fn test_write_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("replay.json");

        let export = ReplayExport::from_run("ship.csv", 4, &[], short_run());
        export.write_to_file(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["frames"].as_array().unwrap().len(), 6);
        assert_eq!(json["summary"]["load_report"]["frames"], 2);
    }

    #[test]
    fn test_write_to_missing_dir_fails() {
        let export = ReplayExport::new("ship.csv", 60);
        let err = export.write_to_file(Path::new("/no/such/dir/replay.json")).unwrap_err();
        assert!(matches!(err, SimError::Export { .. }));
    }
}
