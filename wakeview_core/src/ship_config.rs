//! Ship document reader.
//!
//! The solver's ship description is a YAML document, but only a handful of
//! scalars are needed: the initial pose of the body frame and the
//! propeller attachment point. They are pulled out with literal + numeric
//! patterns instead of a full YAML parser:
//!
//! ```text
//! initial position of body frame relative to NED:
//!     x: {value: 0, unit: m}
//!     phi: {value: 0, unit: rad}
//! ```
//!
//! A missing section or key reads as zero.

use crate::error::{PlayerError, Result};
use crate::settings::{PlayerSettings, INITIAL_POSE_SECTION, PROPELLER_SECTION};
use crate::transform::{body_to_local_position, InitialTransform};
use nalgebra::Vector3;
use regex::Regex;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Scalars read from the ship document, in the solver's native units/axes.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ShipConfig {
    /// Initial body-frame origin in NED (m)
    pub initial_position_ned: Vector3<f64>,

    /// Initial attitude (phi, theta, psi) in radians
    pub initial_attitude: Vector3<f64>,

    /// Propeller frame origin in body axes (x forward, y starboard, z down)
    pub propeller_position_body: Vector3<f64>,
}

impl ShipConfig {
    /// Extracts the pose and propeller fields from document text.
    pub fn parse(text: &str, initial_section: &str, propeller_section: &str) -> Result<Self> {
        let pattern = Regex::new(FIELD_PATTERN).map_err(PlayerError::Pattern)?;
        let pose = SectionReader::new(text, initial_section, &pattern);
        let prop = SectionReader::new(text, propeller_section, &pattern);

        let config = Self {
            initial_position_ned: Vector3::new(pose.length("x"), pose.length("y"), pose.length("z")),
            initial_attitude: Vector3::new(pose.angle("phi"), pose.angle("theta"), pose.angle("psi")),
            propeller_position_body: Vector3::new(prop.length("x"), prop.length("y"), prop.length("z")),
        };

        Ok(config)
    }

    /// Parses with the default section names.
    pub fn parse_default(text: &str) -> Result<Self> {
        Self::parse(text, INITIAL_POSE_SECTION, PROPELLER_SECTION)
    }

    /// Reads the document at `path` using the section names in `settings`.
    pub fn load(path: &Path, settings: &PlayerSettings) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| PlayerError::io(path, e))?;
        let config = Self::parse(&text, &settings.initial_pose_section, &settings.propeller_section)?;

        info!(
            "Ship document {}: initial NED position {:?}, propeller (body) {:?}",
            path.display(),
            config.initial_position_ned.as_slice(),
            config.propeller_position_body.as_slice()
        );

        Ok(config)
    }

    /// Fixed world transform for the initial pose.
    pub fn initial_transform(&self) -> InitialTransform {
        InitialTransform::from_ned(&self.initial_position_ned, &self.initial_attitude)
    }

    /// Propeller point in ship-local engine axes.
    pub fn propeller_position_local(&self) -> Vector3<f64> {
        body_to_local_position(&self.propeller_position_body)
    }
}

/// Any pose or propeller key followed by `{value: <number>[, unit: <word>]}`.
const FIELD_PATTERN: &str =
    r"\b(x|y|z|phi|theta|psi)\s*:\s*\{\s*value\s*:\s*([-+0-9.eE]+)\s*(?:,\s*unit\s*:\s*([A-Za-z]+))?";

/// Raw value and optional unit word.
type RawField = (Option<f64>, Option<String>);

/// Fields found after a section heading, in document order.
struct SectionReader<'a> {
    section: &'a str,
    fields: Vec<(&'a str, RawField)>,
}

impl<'a> SectionReader<'a> {
    fn new(text: &'a str, section: &'a str, pattern: &Regex) -> Self {
        let Some(start) = text.find(section) else {
            debug!("Section '{}' not found, using 0", section);
            return Self { section, fields: Vec::new() };
        };

        let fields = pattern
            .captures_iter(&text[start + section.len()..])
            .filter_map(|caps| {
                let key = caps.get(1)?.as_str();
                let value = caps
                    .get(2)
                    .and_then(|m| m.as_str().parse::<f64>().ok())
                    .filter(|v| v.is_finite());
                let unit = caps.get(3).map(|m| m.as_str().to_lowercase());
                Some((key, (value, unit)))
            })
            .collect();

        Self { section, fields }
    }

    /// First occurrence of `key` after the heading.
    fn field(&self, key: &str) -> Option<(f64, Option<&str>)> {
        let Some((_, (value, unit))) = self.fields.iter().find(|(k, _)| *k == key) else {
            debug!("'{}' / '{}' not found, using 0", self.section, key);
            return None;
        };

        value.map(|v| (v, unit.as_deref()))
    }

    fn length(&self, key: &str) -> f64 {
        self.field(key).map(|(v, _)| v).unwrap_or(0.0)
    }

    /// Angles come back in radians whatever unit the document used.
    fn angle(&self, key: &str) -> f64 {
        match self.field(key) {
            Some((v, Some(unit))) if unit.starts_with("deg") => v.to_radians(),
            Some((v, _)) => v,
            None => 0.0,
        }
    }
}
