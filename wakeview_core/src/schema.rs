//! Schema mapper: tolerant header to column index mapping.
//!
//! Log exporters rename, reorder and drop columns between solver versions.
//! Each logical [`Channel`] is matched against the lower-cased, trimmed
//! header cells by its canonical key first, then by its tag (the text
//! before the opening parenthesis) plus a qualifier that names the
//! physical effect. A channel with no matching header is simply absent.

/// Every logical channel the frame parser reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Time,
    X,
    Y,
    Z,
    Phi,
    Theta,
    Psi,
    U,
    V,
    W,
    TotalFx,
    TotalFy,
    TotalFz,
    TotalMx,
    TotalMy,
    TotalMz,
    GravityFx,
    GravityFy,
    GravityFz,
    HydrostaticFx,
    HydrostaticFy,
    HydrostaticFz,
    FroudeKrylovFx,
    FroudeKrylovFy,
    FroudeKrylovFz,
    DiffractionFx,
    DiffractionFy,
    DiffractionFz,
    RadiationFx,
    RadiationFy,
    RadiationFz,
    ResistanceFx,
    ResistanceFy,
    ResistanceFz,
    PropulsionFx,
    PropulsionFy,
    PropulsionFz,
}

/// Number of logical channels.
pub const CHANNEL_COUNT: usize = 37;

const SHIP: &[&str] = &["ship"];
const SUM: &[&str] = &["sum of forces"];
const GRAVITY: &[&str] = &["gravity"];
const HYDROSTATIC: &[&str] = &["hydrostatic"];
const FROUDE: &[&str] = &["froude"];
const DIFFRACTION: &[&str] = &["diffraction"];
const RADIATION: &[&str] = &["radiation"];
const RESISTANCE: &[&str] = &["holtrop", "resistance"];
const PROPULSION: &[&str] = &["propeller", "rudder"];

impl Channel {
    /// All channels in column-table order.
    pub const ALL: [Channel; CHANNEL_COUNT] = [
        Channel::Time,
        Channel::X,
        Channel::Y,
        Channel::Z,
        Channel::Phi,
        Channel::Theta,
        Channel::Psi,
        Channel::U,
        Channel::V,
        Channel::W,
        Channel::TotalFx,
        Channel::TotalFy,
        Channel::TotalFz,
        Channel::TotalMx,
        Channel::TotalMy,
        Channel::TotalMz,
        Channel::GravityFx,
        Channel::GravityFy,
        Channel::GravityFz,
        Channel::HydrostaticFx,
        Channel::HydrostaticFy,
        Channel::HydrostaticFz,
        Channel::FroudeKrylovFx,
        Channel::FroudeKrylovFy,
        Channel::FroudeKrylovFz,
        Channel::DiffractionFx,
        Channel::DiffractionFy,
        Channel::DiffractionFz,
        Channel::RadiationFx,
        Channel::RadiationFy,
        Channel::RadiationFz,
        Channel::ResistanceFx,
        Channel::ResistanceFy,
        Channel::ResistanceFz,
        Channel::PropulsionFx,
        Channel::PropulsionFy,
        Channel::PropulsionFz,
    ];

    /// Position of this channel in [`Channel::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// Canonical header text as written by the solver.
    pub fn key(self) -> &'static str {
        match self {
            Channel::Time => "t",
            Channel::X => "x(ship)",
            Channel::Y => "y(ship)",
            Channel::Z => "z(ship)",
            Channel::Phi => "phi(ship)",
            Channel::Theta => "theta(ship)",
            Channel::Psi => "psi(ship)",
            Channel::U => "u(ship)",
            Channel::V => "v(ship)",
            Channel::W => "w(ship)",
            Channel::TotalFx => "fx(sum of forces ship ship)",
            Channel::TotalFy => "fy(sum of forces ship ship)",
            Channel::TotalFz => "fz(sum of forces ship ship)",
            Channel::TotalMx => "mx(sum of forces ship ship)",
            Channel::TotalMy => "my(sum of forces ship ship)",
            Channel::TotalMz => "mz(sum of forces ship ship)",
            Channel::GravityFx => "fx(gravity ship ship)",
            Channel::GravityFy => "fy(gravity ship ship)",
            Channel::GravityFz => "fz(gravity ship ship)",
            Channel::HydrostaticFx => "fx(non-linear hydrostatic (fast) ship ship)",
            Channel::HydrostaticFy => "fy(non-linear hydrostatic (fast) ship ship)",
            Channel::HydrostaticFz => "fz(non-linear hydrostatic (fast) ship ship)",
            Channel::FroudeKrylovFx => "fx(non-linear froude-krylov ship ship)",
            Channel::FroudeKrylovFy => "fy(non-linear froude-krylov ship ship)",
            Channel::FroudeKrylovFz => "fz(non-linear froude-krylov ship ship)",
            Channel::DiffractionFx => "fx(diffraction ship ship)",
            Channel::DiffractionFy => "fy(diffraction ship ship)",
            Channel::DiffractionFz => "fz(diffraction ship ship)",
            Channel::RadiationFx => "fx(radiation damping ship ship)",
            Channel::RadiationFy => "fy(radiation damping ship ship)",
            Channel::RadiationFz => "fz(radiation damping ship ship)",
            Channel::ResistanceFx => "fx(holtrop & mennen ship ship)",
            Channel::ResistanceFy => "fy(holtrop & mennen ship ship)",
            Channel::ResistanceFz => "fz(holtrop & mennen ship ship)",
            Channel::PropulsionFx => "fx(propellerandrudder ship propellerandrudder)",
            Channel::PropulsionFy => "fy(propellerandrudder ship propellerandrudder)",
            Channel::PropulsionFz => "fz(propellerandrudder ship propellerandrudder)",
        }
    }

    /// Short axis tag (the text before the parenthesis).
    fn tag(self) -> &'static str {
        match self {
            Channel::Time => "t",
            Channel::X => "x",
            Channel::Y => "y",
            Channel::Z => "z",
            Channel::Phi => "phi",
            Channel::Theta => "theta",
            Channel::Psi => "psi",
            Channel::U => "u",
            Channel::V => "v",
            Channel::W => "w",
            Channel::TotalMx => "mx",
            Channel::TotalMy => "my",
            Channel::TotalMz => "mz",
            Channel::TotalFx
            | Channel::GravityFx
            | Channel::HydrostaticFx
            | Channel::FroudeKrylovFx
            | Channel::DiffractionFx
            | Channel::RadiationFx
            | Channel::ResistanceFx
            | Channel::PropulsionFx => "fx",
            Channel::TotalFy
            | Channel::GravityFy
            | Channel::HydrostaticFy
            | Channel::FroudeKrylovFy
            | Channel::DiffractionFy
            | Channel::RadiationFy
            | Channel::ResistanceFy
            | Channel::PropulsionFy => "fy",
            Channel::TotalFz
            | Channel::GravityFz
            | Channel::HydrostaticFz
            | Channel::FroudeKrylovFz
            | Channel::DiffractionFz
            | Channel::RadiationFz
            | Channel::ResistanceFz
            | Channel::PropulsionFz => "fz",
        }
    }

    /// Words one of which must appear after the tag.
    fn qualifiers(self) -> &'static [&'static str] {
        match self {
            Channel::Time => &[],
            Channel::X
            | Channel::Y
            | Channel::Z
            | Channel::Phi
            | Channel::Theta
            | Channel::Psi
            | Channel::U
            | Channel::V
            | Channel::W => SHIP,
            Channel::TotalFx
            | Channel::TotalFy
            | Channel::TotalFz
            | Channel::TotalMx
            | Channel::TotalMy
            | Channel::TotalMz => SUM,
            Channel::GravityFx | Channel::GravityFy | Channel::GravityFz => GRAVITY,
            Channel::HydrostaticFx | Channel::HydrostaticFy | Channel::HydrostaticFz => {
                HYDROSTATIC
            }
            Channel::FroudeKrylovFx | Channel::FroudeKrylovFy | Channel::FroudeKrylovFz => FROUDE,
            Channel::DiffractionFx | Channel::DiffractionFy | Channel::DiffractionFz => {
                DIFFRACTION
            }
            Channel::RadiationFx | Channel::RadiationFy | Channel::RadiationFz => RADIATION,
            Channel::ResistanceFx | Channel::ResistanceFy | Channel::ResistanceFz => RESISTANCE,
            Channel::PropulsionFx | Channel::PropulsionFy | Channel::PropulsionFz => PROPULSION,
        }
    }

    /// Tolerant match against an already normalised header cell.
    fn matches(self, header: &str) -> bool {
        let (tag, rest) = split_tag(header);

        if self == Channel::Time {
            return tag == "t" || header.contains("time");
        }

        tag == self.tag() && self.qualifiers().iter().any(|q| rest.contains(q))
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Splits `"fx(gravity ship ship)"` into `("fx", "gravity ship ship)")`.
fn split_tag(header: &str) -> (&str, &str) {
    match header.find(|c: char| c == '(' || c.is_whitespace()) {
        Some(pos) => (header[..pos].trim_end(), &header[pos..]),
        None => (header, ""),
    }
}

/// Lower-cases and trims one header cell.
pub fn normalize_header(raw: &str) -> String {
    raw.trim().trim_matches('"').trim().to_lowercase()
}

/// Column index per channel; `None` is the "not found" sentinel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    columns: [Option<usize>; CHANNEL_COUNT],
    header_count: usize,
}

impl ColumnMap {
    /// Builds the map from raw header cells.
    pub fn from_headers<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let normalized: Vec<String> = headers
            .into_iter()
            .map(|h| normalize_header(h.as_ref()))
            .collect();

        let mut columns = [None; CHANNEL_COUNT];
        for channel in Channel::ALL {
            let exact = normalized.iter().position(|h| h == channel.key());
            columns[channel.index()] =
                exact.or_else(|| normalized.iter().position(|h| channel.matches(h)));
        }

        Self {
            columns,
            header_count: normalized.len(),
        }
    }

    /// Column index for `channel`, if present.
    pub fn column(&self, channel: Channel) -> Option<usize> {
        self.columns[channel.index()]
    }

    /// True when `channel` maps to a column.
    pub fn contains(&self, channel: Channel) -> bool {
        self.column(channel).is_some()
    }

    /// Channels with no matching header.
    pub fn missing(&self) -> Vec<Channel> {
        Channel::ALL
            .into_iter()
            .filter(|c| !self.contains(*c))
            .collect()
    }

    /// Number of channels that mapped to a column.
    pub fn recognized(&self) -> usize {
        self.columns.iter().filter(|c| c.is_some()).count()
    }

    /// Number of header cells seen.
    pub fn header_count(&self) -> usize {
        self.header_count
    }
}
