//! Frame parser for the comma-delimited simulation log.
//!
//! The first row is the header; it goes through the
//! [`ColumnMap`](crate::schema::ColumnMap). Every following row becomes one
//! [`Frame`], with two conversions applied here rather than at transform
//! time:
//! - the vertical axis is flipped from down-positive to up-positive and the
//!   axes are reordered into ship-local engine axes `(x, -z, y)`;
//! - yaw is converted from radians to degrees.

use crate::error::{PlayerError, Result};
use crate::frame::{ForceComponents, Frame};
use crate::schema::{Channel, ColumnMap};
use csv::{ReaderBuilder, StringRecord, Trim};
use nalgebra::Vector3;
use serde::Serialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

/// Parse-time switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Convert roll and pitch from radians as well
    pub roll_pitch_in_radians: bool,
}

/// Counters collected while loading a log.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoadReport {
    /// Data rows seen (header excluded, blank lines excluded)
    pub rows_read: usize,

    /// Frames kept
    pub frames: usize,

    /// Rows dropped because they could not be decoded or had no time
    pub skipped_malformed: usize,

    /// Rows dropped because their time repeats the previous row
    pub dropped_duplicates: usize,

    /// Rows dropped because their time goes backwards
    pub dropped_out_of_order: usize,

    /// Header cells in the log
    pub header_columns: usize,

    /// Channels mapped to a column
    pub recognized_channels: usize,

    /// Canonical keys of channels absent from the header
    pub missing_channels: Vec<String>,

    /// Time of the last kept frame (s)
    pub last_time: f64,
}

impl LoadReport {
    /// Playback needs at least one segment and a clock range `[0, last]`
    /// that is not empty.
    pub fn is_playable(&self) -> bool {
        self.frames >= 2 && self.last_time > 0.0
    }
}

/// Output of a successful parse.
#[derive(Debug, Clone, Default)]
pub struct ParsedLog {
    /// Frames in strictly increasing time order
    pub frames: Vec<Frame>,

    /// Load diagnostics
    pub report: LoadReport,
}

/// Parses a log from any reader.
pub fn parse_log<R: Read>(reader: R, options: &ParseOptions) -> Result<ParsedLog> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    if headers.is_empty() {
        return Err(PlayerError::EmptyLog);
    }

    let map = ColumnMap::from_headers(headers.iter());
    if !map.contains(Channel::Time) {
        return Err(PlayerError::MissingTimeColumn);
    }

    let mut report = LoadReport {
        header_columns: map.header_count(),
        recognized_channels: map.recognized(),
        missing_channels: map.missing().iter().map(|c| c.key().to_string()).collect(),
        ..Default::default()
    };

    let mut frames: Vec<Frame> = Vec::new();

    for (row, result) in rdr.records().enumerate() {
        report.rows_read += 1;

        let record = match result {
            Ok(record) => record,
            Err(e) => {
                warn!("Skipping row {}: {}", row + 2, e);
                report.skipped_malformed += 1;
                continue;
            }
        };

        let Some(frame) = parse_record(&record, &map, options) else {
            let line = record.position().map(|p| p.line()).unwrap_or(row as u64 + 2);
            warn!("Skipping line {}: missing or invalid time", line);
            report.skipped_malformed += 1;
            continue;
        };

        let time = frame.time;
        match push_in_order(&mut frames, frame) {
            TimeOrder::Kept => {}
            TimeOrder::Duplicate => report.dropped_duplicates += 1,
            TimeOrder::Backward => {
                warn!("Dropping row {}: time {:.6}s goes backwards", row + 2, time);
                report.dropped_out_of_order += 1;
            }
            TimeOrder::NonFinite => report.skipped_malformed += 1,
        }
    }

    if report.rows_read == 0 {
        return Err(PlayerError::EmptyLog);
    }

    report.frames = frames.len();
    report.last_time = frames.last().map_or(0.0, |f| f.time);

    info!(
        "Parsed {} frames from {} rows ({} channels recognized, {} missing)",
        report.frames,
        report.rows_read,
        report.recognized_channels,
        report.missing_channels.len()
    );
    if report.dropped_duplicates > 0 {
        info!("Dropped {} rows with duplicate time", report.dropped_duplicates);
    }

    Ok(ParsedLog { frames, report })
}

/// Parses a log held in memory.
pub fn parse_log_str(text: &str, options: &ParseOptions) -> Result<ParsedLog> {
    parse_log(text.as_bytes(), options)
}

/// Opens and parses a log file.
pub fn parse_log_file(path: &Path, options: &ParseOptions) -> Result<ParsedLog> {
    let file = File::open(path).map_err(|e| PlayerError::io(path, e))?;
    parse_log(file, options)
}

/// Builds one frame from a data record.
///
/// Returns `None` when the time token is missing or not a number; any other
/// absent or invalid field reads as `0.0`.
pub fn parse_record(record: &StringRecord, map: &ColumnMap, options: &ParseOptions) -> Option<Frame> {
    let time = map
        .column(Channel::Time)
        .and_then(|i| record.get(i))
        .and_then(parse_number)?;

    let field = |channel: Channel| -> f64 {
        map.column(channel)
            .and_then(|i| record.get(i))
            .and_then(parse_number)
            .unwrap_or(0.0)
    };
    let vector = |x: Channel, y: Channel, z: Channel| Vector3::new(field(x), field(y), field(z));

    let position = Vector3::new(field(Channel::X), -field(Channel::Z), field(Channel::Y));

    let (mut roll, mut pitch) = (field(Channel::Phi), field(Channel::Theta));
    if options.roll_pitch_in_radians {
        roll = roll.to_degrees();
        pitch = pitch.to_degrees();
    }
    let yaw = field(Channel::Psi).to_degrees();

    Some(Frame {
        time,
        position,
        orientation: Vector3::new(roll, pitch, yaw),
        linear_velocity: vector(Channel::U, Channel::V, Channel::W),
        total_force: vector(Channel::TotalFx, Channel::TotalFy, Channel::TotalFz),
        total_moment: vector(Channel::TotalMx, Channel::TotalMy, Channel::TotalMz),
        components: ForceComponents {
            gravity: vector(Channel::GravityFx, Channel::GravityFy, Channel::GravityFz),
            hydrostatic: vector(
                Channel::HydrostaticFx,
                Channel::HydrostaticFy,
                Channel::HydrostaticFz,
            ),
            froude_krylov: vector(
                Channel::FroudeKrylovFx,
                Channel::FroudeKrylovFy,
                Channel::FroudeKrylovFz,
            ),
            diffraction: vector(
                Channel::DiffractionFx,
                Channel::DiffractionFy,
                Channel::DiffractionFz,
            ),
            radiation: vector(Channel::RadiationFx, Channel::RadiationFy, Channel::RadiationFz),
            resistance: vector(
                Channel::ResistanceFx,
                Channel::ResistanceFy,
                Channel::ResistanceFz,
            ),
            propulsion: vector(
                Channel::PropulsionFx,
                Channel::PropulsionFy,
                Channel::PropulsionFz,
            ),
        },
    })
}

/// Outcome of appending a frame to a time-ordered sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeOrder {
    /// Appended
    Kept,
    /// Same time as the last frame; dropped, the first sample wins
    Duplicate,
    /// Earlier than the last frame; dropped
    Backward,
    /// NaN or infinite time; dropped
    NonFinite,
}

/// Appends `frame` only if it keeps `frames` strictly increasing in time.
pub fn push_in_order(frames: &mut Vec<Frame>, frame: Frame) -> TimeOrder {
    if !frame.time.is_finite() {
        return TimeOrder::NonFinite;
    }

    match frames.last() {
        Some(last) if frame.time == last.time => TimeOrder::Duplicate,
        Some(last) if frame.time < last.time => TimeOrder::Backward,
        _ => {
            frames.push(frame);
            TimeOrder::Kept
        }
    }
}

/// Locale-invariant float parse; non-finite values are rejected.
pub fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const HEADER: &str = "t,x(ship),y(ship),z(ship),phi(ship),theta(ship),psi(ship)";

    fn parse(text: &str) -> ParsedLog {
        parse_log_str(text, &ParseOptions::default()).unwrap()
    }

    #[test]
    fn test_axis_conversion() {
        let log = parse(&format!("{HEADER}\n0.0,1.0,2.0,3.0,0.5,0.25,{}\n", std::f64::consts::PI));
        let f = &log.frames[0];

        assert_eq!(f.position, Vector3::new(1.0, -3.0, 2.0));
        assert_relative_eq!(f.roll(), 0.5);
        assert_relative_eq!(f.pitch(), 0.25);
        assert_relative_eq!(f.yaw(), 180.0, epsilon = 1e-9);
    }

    #[test]
    fn test_roll_pitch_radians_option() {
        let options = ParseOptions { roll_pitch_in_radians: true };
        let log = parse_log_str(&format!("{HEADER}\n0,0,0,0,{},0,0\n", std::f64::consts::FRAC_PI_2), &options)
            .unwrap();

        assert_relative_eq!(log.frames[0].roll(), 90.0, epsilon = 1e-9);
    }

    #[test]
    fn test_bad_token_defaults_to_zero() {
        let log = parse(&format!("{HEADER}\n0.0,abc,2.0,,0,0,0\n1.0,1,1,1,0,0,nan\n"));

        assert_eq!(log.frames.len(), 2);
        assert_eq!(log.frames[0].position.x, 0.0);
        assert_eq!(log.frames[0].position.y, 0.0);
        assert_eq!(log.frames[1].yaw(), 0.0);
    }

    #[test]
    fn test_bad_time_skips_row() {
        let log = parse(&format!("{HEADER}\n0.0,0,0,0,0,0,0\noops,1,1,1,0,0,0\n1.0,2,0,0,0,0,0\n"));

        assert_eq!(log.frames.len(), 2);
        assert_eq!(log.report.skipped_malformed, 1);
        assert_eq!(log.report.rows_read, 3);
    }

    #[test]
    fn test_short_rows_are_tolerated() {
        let log = parse(&format!("{HEADER}\n0.0,5\n1.0\n"));

        assert_eq!(log.frames.len(), 2);
        assert_eq!(log.frames[0].position.x, 5.0);
        assert_eq!(log.frames[1].position, Vector3::zeros());
    }

    #[test]
    fn test_duplicate_and_backward_times_dropped() {
        let log = parse(&format!(
            "{HEADER}\n0.0,0,0,0,0,0,0\n0.0,9,0,0,0,0,0\n1.0,1,0,0,0,0,0\n0.5,7,0,0,0,0,0\n2.0,2,0,0,0,0,0\n"
        ));

        let times: Vec<f64> = log.frames.iter().map(|f| f.time).collect();
        assert_eq!(times, vec![0.0, 1.0, 2.0]);
        assert_eq!(log.frames[0].position.x, 0.0);
        assert_eq!(log.report.dropped_duplicates, 1);
        assert_eq!(log.report.dropped_out_of_order, 1);
    }

    #[test]
    fn test_missing_time_column_is_fatal() {
        let err = parse_log_str("x(ship),y(ship)\n1,2\n", &ParseOptions::default()).unwrap_err();
        assert!(matches!(err, PlayerError::MissingTimeColumn));
    }

    #[test]
    fn test_empty_inputs() {
        assert!(matches!(
            parse_log_str("", &ParseOptions::default()),
            Err(PlayerError::EmptyLog)
        ));
        assert!(matches!(
            parse_log_str("t,x(ship)\n", &ParseOptions::default()),
            Err(PlayerError::EmptyLog)
        ));
    }

    #[test]
    fn test_single_frame_not_playable() {
        let log = parse(&format!("{HEADER}\n0.0,0,0,0,0,0,0\n"));
        assert!(!log.report.is_playable());
    }

    #[test]
    fn test_log_ending_before_zero_not_playable() {
        let log = parse("t,x(ship)\n-2,0\n-1,10\n");

        assert_eq!(log.frames.len(), 2);
        assert_relative_eq!(log.report.last_time, -1.0);
        assert!(!log.report.is_playable());

        let log = parse("t,x(ship)\n-1,0\n2,10\n");
        assert!(log.report.is_playable());
    }

    #[test]
    fn test_push_rejects_non_finite_time() {
        let mut frames = Vec::new();
        let at = |time: f64| Frame { time, ..Default::default() };

        assert_eq!(push_in_order(&mut frames, at(0.0)), TimeOrder::Kept);
        assert_eq!(push_in_order(&mut frames, at(f64::NAN)), TimeOrder::NonFinite);
        assert_eq!(push_in_order(&mut frames, at(f64::INFINITY)), TimeOrder::NonFinite);
        assert_eq!(push_in_order(&mut frames, at(-1.0)), TimeOrder::Backward);
        assert_eq!(push_in_order(&mut frames, at(1.0)), TimeOrder::Kept);
        assert_eq!(frames.len(), 2);
    }

    #[test]
    fn test_missing_file() {
        let err = parse_log_file(Path::new("/definitely/not/here.csv"), &ParseOptions::default())
            .unwrap_err();
        assert!(matches!(err, PlayerError::Io { .. }));
    }

    #[test]
    fn test_parse_number_invariant_locale() {
        assert_eq!(parse_number(" 1.5e3 "), Some(1500.0));
        assert_eq!(parse_number("-0.25"), Some(-0.25));
        assert_eq!(parse_number("1,5"), None);
        assert_eq!(parse_number("inf"), None);
    }
}
