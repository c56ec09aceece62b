use chrono::{DateTime, Utc};

use super::error::PredictError;

pub const EARTH_ROTATION_RAD_S: f64 = 7.292_115e-5;

/// Fixed ground-station location. Longitude is east-positive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observer {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub elevation_m: f64,
}

impl Default for Observer {
    fn default() -> Self {
        Self {
            latitude_deg: 0.0,
            longitude_deg: 0.0,
            elevation_m: 0.0,
        }
    }
}

impl Observer {
    pub fn new(latitude_deg: f64, longitude_deg: f64, elevation_m: f64) -> Self {
        Self {
            latitude_deg,
            longitude_deg,
            elevation_m,
        }
    }

    pub fn lat_rad(&self) -> f64 {
        self.latitude_deg.to_radians()
    }

    pub fn lon_rad(&self) -> f64 {
        self.longitude_deg.to_radians()
    }

    pub fn position_ecef_km(&self) -> [f64; 3] {
        // WGS-84 constants
        let a = 6378.137;
        let e2 = 0.00669437999014;
        let lat = self.lat_rad();
        let lon = self.lon_rad();
        let sin_lat = lat.sin();
        let cos_lat = lat.cos();
        let sin_lon = lon.sin();
        let cos_lon = lon.cos();
        let n = a / (1.0 - e2 * sin_lat * sin_lat).sqrt();
        let alt_km = self.elevation_m / 1000.0;
        let x = (n + alt_km) * cos_lat * cos_lon;
        let y = (n + alt_km) * cos_lat * sin_lon;
        let z = (n * (1.0 - e2) + alt_km) * sin_lat;
        [x, y, z]
    }

    pub fn velocity_ecef_km_s(&self) -> [f64; 3] {
        let pos = self.position_ecef_km();
        [
            -EARTH_ROTATION_RAD_S * pos[1],
            EARTH_ROTATION_RAD_S * pos[0],
            0.0,
        ]
    }
}

/// Instantaneous observer-relative satellite state.
///
/// The all-zero `Default` value doubles as the "no data" result for an
/// uninitialized or failed tracker; consumers treat it as blank, not as an
/// error.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InstantState {
    pub azimuth_deg: f64,
    pub elevation_deg: f64,
    pub range_km: f64,
    /// Radial range rate in m/s, positive when receding.
    pub range_rate_m_s: f64,
    pub sub_lat_deg: f64,
    pub sub_lon_deg: f64,
    /// True when the satellite is inside the Earth's shadow.
    pub eclipsed: bool,
}

/// One predicted rise/set event. `aos <= max_time <= los` always holds for
/// results produced by the pass search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PassInfo {
    pub aos: DateTime<Utc>,
    pub aos_azimuth_deg: f64,
    pub max_time: DateTime<Utc>,
    pub max_azimuth_deg: f64,
    pub max_elevation_deg: f64,
    pub los: DateTime<Utc>,
    pub los_azimuth_deg: f64,
}

impl Default for PassInfo {
    /// Epoch-zero placeholder used before the first prediction; its `los` is
    /// in the distant past so the scheduler immediately requests a real pass.
    fn default() -> Self {
        let epoch = DateTime::<Utc>::UNIX_EPOCH;
        Self {
            aos: epoch,
            aos_azimuth_deg: 0.0,
            max_time: epoch,
            max_azimuth_deg: 0.0,
            max_elevation_deg: 0.0,
            los: epoch,
            los_azimuth_deg: 0.0,
        }
    }
}

impl PassInfo {
    pub fn duration(&self) -> chrono::Duration {
        self.los - self.aos
    }

    /// False while this is still the epoch-zero placeholder.
    pub fn is_predicted(&self) -> bool {
        self.los > DateTime::<Utc>::UNIX_EPOCH
    }
}

/// Row of the upcoming-pass table, deduplicated by satellite name and sorted
/// ascending by AOS.
#[derive(Debug, Clone, PartialEq)]
pub struct PassTableEntry {
    pub satellite: String,
    pub aos: DateTime<Utc>,
    pub max_elevation_deg: f64,
    pub los: DateTime<Utc>,
}

/// Continuous orbital-motion model relative to a fixed observer.
///
/// The pass search and ground-track projection only ever sample through this
/// trait, so they work against synthetic orbits as well as SGP4.
pub trait Propagator {
    fn instant(&self, at: DateTime<Utc>) -> Result<InstantState, PredictError>;
}
