use chrono::{DateTime, Utc};
use sgp4::{Constants, Elements};

use super::error::PredictError;
use super::types::{InstantState, Observer, Propagator, EARTH_ROTATION_RAD_S};

const EARTH_RADIUS_KM: f64 = 6378.137;

/// SGP4-backed satellite bound to a fixed observer.
pub struct SgpSatellite {
    elements: Elements,
    constants: Constants,
    observer: Observer,
}

impl SgpSatellite {
    pub fn new(
        name: Option<String>,
        line1: &str,
        line2: &str,
        observer: Observer,
    ) -> Result<Self, PredictError> {
        let elements = Elements::from_tle(name, line1.as_bytes(), line2.as_bytes())?;
        let constants = Constants::from_elements(&elements)?;
        Ok(Self {
            elements,
            constants,
            observer,
        })
    }

    pub fn set_observer(&mut self, observer: Observer) {
        self.observer = observer;
    }
}

impl Propagator for SgpSatellite {
    fn instant(&self, at: DateTime<Utc>) -> Result<InstantState, PredictError> {
        let naive = at.naive_utc();
        let minutes = self
            .elements
            .datetime_to_minutes_since_epoch(&naive)
            .map_err(|e| PredictError::Propagation(e.to_string()))?;
        let prediction = self.constants.propagate(minutes)?;

        let sidereal = sgp4::iau_epoch_to_sidereal_time(sgp4::julian_years_since_j2000(&naive));

        let sat_ecef = teme_to_ecef_position(prediction.position, sidereal);
        let sat_vel_ecef = teme_to_ecef_velocity(prediction.position, prediction.velocity, sidereal);

        let sta_ecef = self.observer.position_ecef_km();
        let sta_vel = self.observer.velocity_ecef_km_s();

        let dr = [
            sat_ecef[0] - sta_ecef[0],
            sat_ecef[1] - sta_ecef[1],
            sat_ecef[2] - sta_ecef[2],
        ];
        let range_km = (dr[0] * dr[0] + dr[1] * dr[1] + dr[2] * dr[2]).sqrt();

        let enu = ecef_to_enu(dr, self.observer.lat_rad(), self.observer.lon_rad());
        let azimuth = enu.0.atan2(enu.1).to_degrees().rem_euclid(360.0);
        let elevation = if range_km > 0.0 {
            (enu.2 / range_km).asin().to_degrees()
        } else {
            0.0
        };

        let los_unit = if range_km > 0.0 {
            [dr[0] / range_km, dr[1] / range_km, dr[2] / range_km]
        } else {
            [0.0, 0.0, 0.0]
        };
        let rel_vel = [
            sat_vel_ecef[0] - sta_vel[0],
            sat_vel_ecef[1] - sta_vel[1],
            sat_vel_ecef[2] - sta_vel[2],
        ];
        let range_rate_km_s =
            rel_vel[0] * los_unit[0] + rel_vel[1] * los_unit[1] + rel_vel[2] * los_unit[2];

        let (sub_lat_deg, sub_lon_deg) = ecef_to_geodetic(sat_ecef);

        let sun = sun_direction(&naive);
        let eclipsed = in_earth_shadow(prediction.position, sun);

        Ok(InstantState {
            azimuth_deg: azimuth,
            elevation_deg: elevation,
            range_km,
            range_rate_m_s: range_rate_km_s * 1000.0,
            sub_lat_deg,
            sub_lon_deg,
            eclipsed,
        })
    }
}

pub fn teme_to_ecef_position(pos_teme: [f64; 3], gmst: f64) -> [f64; 3] {
    let cos_gmst = gmst.cos();
    let sin_gmst = gmst.sin();
    [
        pos_teme[0] * cos_gmst + pos_teme[1] * sin_gmst,
        -pos_teme[0] * sin_gmst + pos_teme[1] * cos_gmst,
        pos_teme[2],
    ]
}

pub fn teme_to_ecef_velocity(pos_teme: [f64; 3], vel_teme: [f64; 3], gmst: f64) -> [f64; 3] {
    let cos_gmst = gmst.cos();
    let sin_gmst = gmst.sin();
    let pos = teme_to_ecef_position(pos_teme, gmst);
    let rotated = [
        vel_teme[0] * cos_gmst + vel_teme[1] * sin_gmst,
        -vel_teme[0] * sin_gmst + vel_teme[1] * cos_gmst,
        vel_teme[2],
    ];
    [
        rotated[0] + EARTH_ROTATION_RAD_S * pos[1],
        rotated[1] - EARTH_ROTATION_RAD_S * pos[0],
        rotated[2],
    ]
}

pub fn ecef_to_enu(dr: [f64; 3], lat_rad: f64, lon_rad: f64) -> (f64, f64, f64) {
    let sin_lat = lat_rad.sin();
    let cos_lat = lat_rad.cos();
    let sin_lon = lon_rad.sin();
    let cos_lon = lon_rad.cos();

    let east = -sin_lon * dr[0] + cos_lon * dr[1];
    let north = -sin_lat * cos_lon * dr[0] - sin_lat * sin_lon * dr[1] + cos_lat * dr[2];
    let up = cos_lat * cos_lon * dr[0] + cos_lat * sin_lon * dr[1] + sin_lat * dr[2];
    (east, north, up)
}

/// Geodetic sub-satellite point from an ECEF position, iterating the WGS-84
/// latitude a few times.
fn ecef_to_geodetic(ecef: [f64; 3]) -> (f64, f64) {
    const A: f64 = EARTH_RADIUS_KM;
    const E2: f64 = 0.00669437999014;

    let (x, y, z) = (ecef[0], ecef[1], ecef[2]);
    let lon = y.atan2(x);
    let p = (x * x + y * y).sqrt();
    if p == 0.0 {
        return (if z >= 0.0 { 90.0 } else { -90.0 }, 0.0);
    }

    let mut lat = (z / p).atan();
    for _ in 0..5 {
        let sin_lat = lat.sin();
        let n = A / (1.0 - E2 * sin_lat * sin_lat).sqrt();
        let h = p / lat.cos() - n;
        lat = (z / p / (1.0 - E2 * n / (n + h))).atan();
    }

    (lat.to_degrees(), lon.to_degrees())
}

/// Low-precision solar direction (unit vector, equatorial frame). Good to a
/// fraction of a degree, which is plenty for the shadow test.
fn sun_direction(at: &chrono::NaiveDateTime) -> [f64; 3] {
    let days = sgp4::julian_years_since_j2000(at) * 365.25;

    let mean_lon = (280.460 + 0.9856474 * days).rem_euclid(360.0).to_radians();
    let mean_anom = (357.528 + 0.9856003 * days).rem_euclid(360.0).to_radians();
    let ecliptic_lon = mean_lon
        + 1.915_f64.to_radians() * mean_anom.sin()
        + 0.020_f64.to_radians() * (2.0 * mean_anom).sin();
    let obliquity = (23.439 - 4.0e-7 * days).to_radians();

    [
        ecliptic_lon.cos(),
        obliquity.cos() * ecliptic_lon.sin(),
        obliquity.sin() * ecliptic_lon.sin(),
    ]
}

/// Cylindrical Earth-shadow test: the satellite is eclipsed when it sits on
/// the anti-sun side and within one Earth radius of the shadow axis.
fn in_earth_shadow(sat_pos_km: [f64; 3], sun_unit: [f64; 3]) -> bool {
    let along = sat_pos_km[0] * sun_unit[0] + sat_pos_km[1] * sun_unit[1] + sat_pos_km[2] * sun_unit[2];
    if along >= 0.0 {
        return false;
    }
    let perp = [
        sat_pos_km[0] - along * sun_unit[0],
        sat_pos_km[1] - along * sun_unit[1],
        sat_pos_km[2] - along * sun_unit[2],
    ];
    let perp_dist = (perp[0] * perp[0] + perp[1] * perp[1] + perp[2] * perp[2]).sqrt();
    perp_dist < EARTH_RADIUS_KM
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const ISS_LINE1: &str =
        "1 25544U 98067A   22273.81956581  .00006857  00000+0  12973-3 0  9999";
    const ISS_LINE2: &str =
        "2 25544  51.6432 305.0192 0002674 134.1797 327.8485 15.50354779361579";

    fn iss() -> SgpSatellite {
        let observer = Observer::new(40.414, -79.704, 347.0);
        SgpSatellite::new(Some("ISS".into()), ISS_LINE1, ISS_LINE2, observer).unwrap()
    }

    #[test]
    fn instant_produces_plausible_state() {
        let sat = iss();
        let at = Utc.with_ymd_and_hms(2022, 9, 30, 12, 0, 0).unwrap();
        let state = sat.instant(at).unwrap();

        assert!(state.azimuth_deg >= 0.0 && state.azimuth_deg < 360.0);
        assert!(state.elevation_deg >= -90.0 && state.elevation_deg <= 90.0);
        // Ground range to a ~420 km orbit is bounded by the horizon distance.
        assert!(state.range_km > 300.0 && state.range_km < 15000.0);
        // Orbital inclination bounds the sub-satellite latitude.
        assert!(state.sub_lat_deg.abs() < 52.5);
        assert!(state.sub_lon_deg >= -180.0 && state.sub_lon_deg <= 180.0);
        assert!(state.range_rate_m_s.abs() < 12_000.0);
    }

    #[test]
    fn rejects_corrupt_elements() {
        let observer = Observer::default();
        let bad = SgpSatellite::new(None, "1 garbage", "2 garbage", observer);
        assert!(bad.is_err());
    }

    #[test]
    fn shadow_test_is_directional() {
        let sun = [1.0, 0.0, 0.0];
        // Directly behind the Earth, on the shadow axis.
        assert!(in_earth_shadow([-7000.0, 0.0, 0.0], sun));
        // Sunlit side.
        assert!(!in_earth_shadow([7000.0, 0.0, 0.0], sun));
        // Anti-sun side but well off the shadow axis.
        assert!(!in_earth_shadow([-7000.0, 20_000.0, 0.0], sun));
    }

    #[test]
    fn sun_direction_is_a_unit_vector_within_obliquity() {
        let at = Utc
            .with_ymd_and_hms(2022, 6, 21, 0, 0, 0)
            .unwrap()
            .naive_utc();
        let sun = sun_direction(&at);
        let norm = (sun[0] * sun[0] + sun[1] * sun[1] + sun[2] * sun[2]).sqrt();
        assert!((norm - 1.0).abs() < 1e-9);
        // Declination never exceeds the obliquity of the ecliptic.
        assert!(sun[2].abs() <= (23.5_f64).to_radians().sin() + 1e-6);
        // Near the June solstice the Sun sits close to its northernmost point.
        assert!(sun[2] > 0.35);
    }
}
