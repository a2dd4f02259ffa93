use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::errors::{Result, SkopeError};

/// A well known geographic coordinate system, as accepted by OSR's
/// `SetWellKnownGeogCS`.
///
/// Parses from `"WGS84"`, `"WGS72"`, `"NAD27"`, `"NAD83"` (case insensitive) or
/// from the matching `"EPSG:n"` code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WellKnownGeogCs {
    Wgs84,
    Wgs72,
    Nad27,
    Nad83,
}

struct Datum {
    name: &'static str,
    datum: &'static str,
    spheroid: &'static str,
    semi_major: &'static str,
    inverse_flattening: &'static str,
    epsg: u16,
}

impl WellKnownGeogCs {
    pub fn all() -> &'static [WellKnownGeogCs] {
        use WellKnownGeogCs::*;
        &[Wgs84, Wgs72, Nad27, Nad83]
    }

    fn datum(&self) -> Datum {
        match self {
            WellKnownGeogCs::Wgs84 => Datum {
                name: "WGS 84",
                datum: "WGS_1984",
                spheroid: "WGS 84",
                semi_major: "6378137",
                inverse_flattening: "298.257223563",
                epsg: 4326,
            },
            WellKnownGeogCs::Wgs72 => Datum {
                name: "WGS 72",
                datum: "WGS_1972",
                spheroid: "WGS 72",
                semi_major: "6378135",
                inverse_flattening: "298.26",
                epsg: 4322,
            },
            WellKnownGeogCs::Nad27 => Datum {
                name: "NAD27",
                datum: "North_American_Datum_1927",
                spheroid: "Clarke 1866",
                semi_major: "6378206.4",
                inverse_flattening: "294.978698213898",
                epsg: 4267,
            },
            WellKnownGeogCs::Nad83 => Datum {
                name: "NAD83",
                datum: "North_American_Datum_1983",
                spheroid: "GRS 1980",
                semi_major: "6378137",
                inverse_flattening: "298.257222101",
                epsg: 4269,
            },
        }
    }

    /// Short name, e.g. `WGS84`.
    pub fn short_name(&self) -> &'static str {
        match self {
            WellKnownGeogCs::Wgs84 => "WGS84",
            WellKnownGeogCs::Wgs72 => "WGS72",
            WellKnownGeogCs::Nad27 => "NAD27",
            WellKnownGeogCs::Nad83 => "NAD83",
        }
    }

    /// Name as it appears in the `GEOGCS` node, e.g. `WGS 84`.
    pub fn name(&self) -> &'static str {
        self.datum().name
    }

    pub fn epsg(&self) -> u16 {
        self.datum().epsg
    }

    pub fn from_epsg(code: u16) -> Result<Self> {
        WellKnownGeogCs::all()
            .iter()
            .find(|cs| cs.epsg() == code)
            .copied()
            .ok_or_else(|| {
                SkopeError::BadArgument(format!("unsupported geographic CRS EPSG:{code}"))
            })
    }

    /// OGC WKT1 representation.
    pub fn to_wkt(&self) -> String {
        let d = self.datum();
        format!(
            "GEOGCS[\"{}\",DATUM[\"{}\",SPHEROID[\"{}\",{},{}]],PRIMEM[\"Greenwich\",0],\
             UNIT[\"degree\",0.0174532925199433],AUTHORITY[\"EPSG\",\"{}\"]]",
            d.name, d.datum, d.spheroid, d.semi_major, d.inverse_flattening, d.epsg
        )
    }
}

impl Display for WellKnownGeogCs {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.short_name())
    }
}

impl FromStr for WellKnownGeogCs {
    type Err = SkopeError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if let Some(code) = trimmed
            .strip_prefix("EPSG:")
            .or_else(|| trimmed.strip_prefix("epsg:"))
        {
            let code = code.parse::<u16>().map_err(|_| {
                SkopeError::BadArgument(format!("invalid EPSG code in '{s}'"))
            })?;
            return WellKnownGeogCs::from_epsg(code);
        }
        WellKnownGeogCs::all()
            .iter()
            .find(|cs| {
                cs.short_name().eq_ignore_ascii_case(trimmed)
                    || cs.name().eq_ignore_ascii_case(trimmed)
            })
            .copied()
            .ok_or_else(|| {
                SkopeError::BadArgument(format!("unknown geographic coordinate system '{s}'"))
            })
    }
}
