use chrono::{DateTime, Duration, Utc};

use super::error::PredictError;
use super::types::Propagator;

/// Hard limit on polyline buffers. A track bracketed between consecutive
/// latitude extrema cannot wrap the map more than three times for realistic
/// orbital periods; samples past the fourth segment are dropped. Known
/// limitation for coarsely-sampled near-polar orbits.
pub const MAX_SEGMENTS: usize = 4;

/// Consecutive samples whose x-coordinates differ by at least this fraction
/// of the map width start a new polyline.
const BREAK_FRACTION: f64 = 0.25;

/// Sampling and hill-climbing step.
const STEP_SECONDS: i64 = 30;

/// Probe interval for deciding whether the satellite is headed north or south.
const HEADING_PROBE_SECONDS: i64 = 10;

/// Equirectangular map dimensions in pixels.
#[derive(Debug, Clone, Copy)]
pub struct MapGeometry {
    pub width: f64,
    pub height: f64,
}

impl MapGeometry {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Project latitude/longitude (degrees) to pixel coordinates with the
    /// origin at the top-left corner.
    pub fn to_xy(&self, lat_deg: f64, lon_deg: f64) -> (f64, f64) {
        let x = (lon_deg + 180.0) * self.width / 360.0;
        let y = (lat_deg - 90.0) * self.height / -180.0;
        (x, y)
    }
}

/// Projected ground track, split into polylines that never jump across the
/// longitude wrap.
#[derive(Debug, Default)]
pub struct GroundTrack {
    pub segments: Vec<Vec<(f64, f64)>>,
}

/// Compute the satellite's current ground-track polylines.
///
/// The track spans from the latitude extremum before `now` to the matching
/// extremum after the next one, so roughly one full orbit is drawn centered
/// on the current position.
pub fn ground_track<P: Propagator + ?Sized>(
    prop: &P,
    map: &MapGeometry,
    now: DateTime<Utc>,
) -> Result<GroundTrack, PredictError> {
    let step = Duration::seconds(STEP_SECONDS);
    let probe = Duration::seconds(HEADING_PROBE_SECONDS);

    let lat_now = prop.instant(now)?.sub_lat_deg;
    let lat_soon = prop.instant(now + probe)?.sub_lat_deg;
    let southbound = lat_soon - lat_now < 0.0;

    let (start, end) = if southbound {
        // Max-to-max span: previous maximum through the minimum ahead to the
        // maximum after that.
        let t1 = climb_latitude(prop, now, -step, Extremum::Max)? - step;
        let t2 = climb_latitude(prop, now, step, Extremum::Min)?;
        let t3 = climb_latitude(prop, t2, step, Extremum::Max)? + step;
        (t1, t3)
    } else {
        // Min-to-min span.
        let t1 = climb_latitude(prop, now, -step, Extremum::Min)? - step;
        let t2 = climb_latitude(prop, now, step, Extremum::Max)?;
        let t3 = climb_latitude(prop, t2, step, Extremum::Min)? + step;
        (t1, t3)
    };

    let break_width = map.width * BREAK_FRACTION;
    let mut track = GroundTrack::default();
    let mut segment: Vec<(f64, f64)> = Vec::new();
    let mut last_x: Option<f64> = None;

    let mut t = start;
    while t < end {
        let state = prop.instant(t)?;
        let (x, y) = map.to_xy(state.sub_lat_deg, state.sub_lon_deg);

        if let Some(lx) = last_x {
            if (x - lx).abs() >= break_width {
                if track.segments.len() == MAX_SEGMENTS - 1 {
                    // Fourth wrap within one span: drop the remainder.
                    break;
                }
                track.segments.push(std::mem::take(&mut segment));
            }
        }
        segment.push((x, y));
        last_x = Some(x);
        t += step;
    }
    if !segment.is_empty() {
        track.segments.push(segment);
    }

    Ok(track)
}

#[derive(Clone, Copy, PartialEq)]
enum Extremum {
    Max,
    Min,
}

/// Step-wise hill climb: advance by `step` while the latitude keeps
/// improving, stopping at the first non-improving sample.
fn climb_latitude<P: Propagator + ?Sized>(
    prop: &P,
    from: DateTime<Utc>,
    step: Duration,
    kind: Extremum,
) -> Result<DateTime<Utc>, PredictError> {
    let mut best = match kind {
        Extremum::Max => f64::MIN,
        Extremum::Min => f64::MAX,
    };
    let mut best_t = from;
    let mut t = from;
    let mut lat = prop.instant(t)?.sub_lat_deg;

    while match kind {
        Extremum::Max => lat > best,
        Extremum::Min => lat < best,
    } {
        best = lat;
        best_t = t;
        t += step;
        lat = prop.instant(t)?.sub_lat_deg;
    }

    Ok(best_t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predict::types::InstantState;
    use chrono::TimeZone;

    /// Inclined circular orbit: latitude is a sinusoid, longitude advances
    /// linearly and wraps at the antimeridian.
    struct InclinedOrbit {
        epoch: DateTime<Utc>,
        period_s: f64,
        inclination_deg: f64,
        lon0_deg: f64,
    }

    impl Propagator for InclinedOrbit {
        fn instant(&self, at: DateTime<Utc>) -> Result<InstantState, PredictError> {
            let t = (at - self.epoch).num_milliseconds() as f64 / 1000.0;
            let phase = (t / self.period_s) * std::f64::consts::TAU;
            let lat = self.inclination_deg * phase.sin();
            // Ground track drifts ~360 degrees per orbit in this synthetic
            // model, plenty to cross the wrap boundary.
            let lon = (self.lon0_deg + 360.0 * t / self.period_s + 180.0).rem_euclid(360.0) - 180.0;
            Ok(InstantState {
                sub_lat_deg: lat,
                sub_lon_deg: lon,
                ..InstantState::default()
            })
        }
    }

    fn epoch() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2022, 10, 1, 0, 0, 0).unwrap()
    }

    fn map() -> MapGeometry {
        MapGeometry::new(1280.0, 640.0)
    }

    #[test]
    fn projection_corners() {
        let m = map();
        assert_eq!(m.to_xy(90.0, -180.0), (0.0, 0.0));
        let (x, y) = m.to_xy(-90.0, 180.0);
        assert!((x - 1280.0).abs() < 1e-9);
        assert!((y - 640.0).abs() < 1e-9);
        let (cx, cy) = m.to_xy(0.0, 0.0);
        assert!((cx - 640.0).abs() < 1e-9);
        assert!((cy - 320.0).abs() < 1e-9);
    }

    #[test]
    fn segments_never_contain_a_wrap_jump() {
        let orbit = InclinedOrbit {
            epoch: epoch(),
            period_s: 5400.0,
            inclination_deg: 51.6,
            lon0_deg: 100.0,
        };
        let m = map();
        let track = ground_track(&orbit, &m, epoch() + Duration::minutes(20)).unwrap();

        assert!(!track.segments.is_empty());
        assert!(track.segments.len() <= MAX_SEGMENTS);
        let break_width = m.width * 0.25;
        for segment in &track.segments {
            assert!(!segment.is_empty());
            for pair in segment.windows(2) {
                assert!(
                    (pair[1].0 - pair[0].0).abs() < break_width,
                    "wrap jump left inside a segment"
                );
            }
        }
    }

    #[test]
    fn single_wrap_splits_into_two_segments() {
        // Longitude crosses +180 exactly once within a half-orbit window.
        struct OneWrap {
            epoch: DateTime<Utc>,
        }
        impl Propagator for OneWrap {
            fn instant(&self, at: DateTime<Utc>) -> Result<InstantState, PredictError> {
                let t = (at - self.epoch).num_milliseconds() as f64 / 1000.0;
                let phase = (t / 5400.0) * std::f64::consts::TAU;
                // Slow longitude drift: one wrap in the sampled span.
                let lon = (150.0 + 60.0 * t / 5400.0 + 180.0).rem_euclid(360.0) - 180.0;
                Ok(InstantState {
                    sub_lat_deg: 45.0 * phase.sin(),
                    sub_lon_deg: lon,
                    ..InstantState::default()
                })
            }
        }
        let orbit = OneWrap { epoch: epoch() };
        let m = map();
        let track = ground_track(&orbit, &m, epoch() + Duration::minutes(20)).unwrap();

        let non_empty: Vec<_> = track.segments.iter().filter(|s| !s.is_empty()).collect();
        assert_eq!(non_empty.len(), 2);
    }

    #[test]
    fn heading_selects_the_bracketing_extrema() {
        let orbit = InclinedOrbit {
            epoch: epoch(),
            period_s: 5400.0,
            inclination_deg: 51.6,
            lon0_deg: 0.0,
        };
        // Shortly after the epoch the satellite heads north; the track span
        // should then cover at least a full orbital period.
        let track = ground_track(&orbit, &map(), epoch() + Duration::minutes(5)).unwrap();
        let total_points: usize = track.segments.iter().map(|s| s.len()).sum();
        let span_s = total_points as i64 * STEP_SECONDS;
        assert!(span_s >= 5400);
    }
}
