//! Coordinate reference systems and reprojection

mod projection;

pub use projection::{Projection, Transformer};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coordinate reference system identified by its EPSG code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CRS {
    epsg: u32,
}

impl CRS {
    pub fn from_epsg(code: u32) -> Self {
        Self { epsg: code }
    }

    /// WGS84 geographic (EPSG:4326), the CRS of station coordinates
    pub fn wgs84() -> Self {
        Self::from_epsg(4326)
    }

    /// Spherical Web Mercator (EPSG:3857), the default planar CRS
    pub fn web_mercator() -> Self {
        Self::from_epsg(3857)
    }

    pub fn epsg(&self) -> u32 {
        self.epsg
    }

    /// Whether coordinates are longitude/latitude degrees
    pub fn is_geographic(&self) -> bool {
        self.epsg == 4326
    }

    /// Parse "EPSG:32646", "epsg:3857" or a bare code
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let code = match s.split_once(':') {
            Some((auth, code)) if auth.eq_ignore_ascii_case("epsg") => code,
            Some(_) => return None,
            None => s,
        };
        code.trim().parse().ok().map(Self::from_epsg)
    }
}

impl fmt::Display for CRS {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg)
    }
}

impl Default for CRS {
    fn default() -> Self {
        Self::wgs84()
    }
}
