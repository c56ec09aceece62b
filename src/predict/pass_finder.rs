use chrono::{DateTime, Duration, Utc};

use super::error::PredictError;
use super::types::{PassInfo, Propagator};

const COARSE_STEP_SECONDS: i64 = 60; // 1 minute for the initial scan
const FINE_STEP_SECONDS: i64 = 1; // 1 second for refinement
const HORIZON_ELEVATION: f64 = 0.0;
const SEARCH_WINDOW_HOURS: i64 = 48;

/// Backward step used to recover a pass already in progress.
const BACKUP_STEP_MINUTES: i64 = 10;
/// At most one day of backward steps; slower-than-that orbits give up and
/// keep the forward search result.
const MAX_BACKUP_STEPS: usize = 144;

/// Find the next complete pass rising at or after `from`.
///
/// A satellite already above the horizon at `from` is skipped: the search
/// reports the next rise, not the pass in progress. Use [`find_current_pass`]
/// when the in-progress pass is the one wanted.
pub fn find_next_pass<P: Propagator + ?Sized>(
    prop: &P,
    from: DateTime<Utc>,
) -> Result<PassInfo, PredictError> {
    let coarse_step = Duration::seconds(COARSE_STEP_SECONDS);
    let end = from + Duration::hours(SEARCH_WINDOW_HOURS);

    let mut cursor = from;
    let mut prev_visible = prop.instant(cursor)?.elevation_deg >= HORIZON_ELEVATION;

    let mut aos: Option<(DateTime<Utc>, f64)> = None;
    let mut max_el = f64::MIN;
    let mut max_el_time = cursor;

    while cursor <= end {
        let sample = prop.instant(cursor)?;
        let visible = sample.elevation_deg >= HORIZON_ELEVATION;

        if visible && !prev_visible {
            // Rising edge: refine the exact crossing.
            let refined = refine_crossing(prop, cursor - coarse_step, cursor, true)?;
            aos = Some(refined);
            max_el = sample.elevation_deg;
            max_el_time = cursor;
        } else if visible && aos.is_some() {
            if sample.elevation_deg > max_el {
                max_el = sample.elevation_deg;
                max_el_time = cursor;
            }
        } else if !visible && prev_visible {
            if let Some((aos_time, aos_az)) = aos {
                let (los_time, los_az) = refine_crossing(prop, cursor - coarse_step, cursor, false)?;
                let (max_time, max_az, max_elevation) =
                    refine_maximum(prop, max_el_time, aos_time, los_time)?;
                return Ok(PassInfo {
                    aos: aos_time,
                    aos_azimuth_deg: aos_az,
                    max_time,
                    max_azimuth_deg: max_az,
                    max_elevation_deg: max_elevation,
                    los: los_time,
                    los_azimuth_deg: los_az,
                });
            }
        }

        prev_visible = visible;
        cursor += coarse_step;
    }

    Err(PredictError::NoPassFound)
}

/// Cold-start variant: when the satellite is up at `now`, back out of the
/// pass in 10-minute steps and re-run the forward search so the reported
/// pass is the one currently in progress.
pub fn find_current_pass<P: Propagator + ?Sized>(
    prop: &P,
    now: DateTime<Utc>,
) -> Result<PassInfo, PredictError> {
    let mut pass = find_next_pass(prop, now)?;
    if prop.instant(now)?.elevation_deg <= HORIZON_ELEVATION {
        return Ok(pass);
    }

    let mut t = now;
    for _ in 0..MAX_BACKUP_STEPS {
        t -= Duration::minutes(BACKUP_STEP_MINUTES);
        pass = find_next_pass(prop, t)?;
        if prop.instant(t)?.elevation_deg <= HORIZON_ELEVATION {
            return Ok(pass);
        }
    }

    // Never dipped below the horizon within the cap; fall back to the
    // forward search result.
    find_next_pass(prop, now)
}

/// Next `count` passes with at least `min_elevation_deg` at culmination.
pub fn find_passes<P: Propagator + ?Sized>(
    prop: &P,
    from: DateTime<Utc>,
    count: usize,
    min_elevation_deg: f64,
) -> Result<Vec<PassInfo>, PredictError> {
    let mut passes = Vec::with_capacity(count);
    let mut cursor = from;

    while passes.len() < count {
        let pass = match find_next_pass(prop, cursor) {
            Ok(p) => p,
            Err(PredictError::NoPassFound) => break,
            Err(e) => return Err(e),
        };
        cursor = pass.los + Duration::minutes(1);
        if pass.max_elevation_deg >= min_elevation_deg {
            passes.push(pass);
        }
    }

    Ok(passes)
}

/// Bisect a horizon crossing down to one second. Returns the crossing time
/// and the azimuth there.
fn refine_crossing<P: Propagator + ?Sized>(
    prop: &P,
    before: DateTime<Utc>,
    after: DateTime<Utc>,
    rising: bool,
) -> Result<(DateTime<Utc>, f64), PredictError> {
    let mut low = before;
    let mut high = after;

    while (high - low).num_seconds() > FINE_STEP_SECONDS {
        let mid = low + (high - low) / 2;
        let above = prop.instant(mid)?.elevation_deg >= HORIZON_ELEVATION;
        if above == rising {
            high = mid;
        } else {
            low = mid;
        }
    }

    let sample = prop.instant(high)?;
    Ok((high, sample.azimuth_deg))
}

/// Walk the culmination down to one second around the best coarse sample.
/// The window is clamped to the pass itself so the refined time can never
/// fall outside [aos, los].
fn refine_maximum<P: Propagator + ?Sized>(
    prop: &P,
    coarse_max: DateTime<Utc>,
    aos: DateTime<Utc>,
    los: DateTime<Utc>,
) -> Result<(DateTime<Utc>, f64, f64), PredictError> {
    let mut low = (coarse_max - Duration::seconds(COARSE_STEP_SECONDS)).max(aos);
    let mut high = (coarse_max + Duration::seconds(COARSE_STEP_SECONDS)).min(los);

    // Ternary search works because elevation is unimodal across one pass.
    while (high - low).num_seconds() > FINE_STEP_SECONDS {
        let third = (high - low) / 3;
        let m1 = low + third;
        let m2 = high - third;
        if prop.instant(m1)?.elevation_deg < prop.instant(m2)?.elevation_deg {
            low = m1;
        } else {
            high = m2;
        }
    }

    let sample = prop.instant(high)?;
    Ok((high, sample.azimuth_deg, sample.elevation_deg))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::predict::types::InstantState;
    use chrono::TimeZone;

    /// Synthetic orbit: sinusoidal elevation with a configurable period and
    /// peak, passes centered on multiples of the period.
    pub(crate) struct SineOrbit {
        pub epoch: DateTime<Utc>,
        pub period_s: f64,
        pub peak_elevation_deg: f64,
        /// Fraction of the period the satellite spends above the horizon.
        pub visible_fraction: f64,
    }

    impl Propagator for SineOrbit {
        fn instant(&self, at: DateTime<Utc>) -> Result<InstantState, PredictError> {
            let t = (at - self.epoch).num_milliseconds() as f64 / 1000.0;
            let phase = (t / self.period_s) * std::f64::consts::TAU;
            // Elevation peaks at phase 0 (mod 2pi).
            let raw = phase.cos();
            let threshold = (std::f64::consts::PI * self.visible_fraction).cos();
            let elevation = (raw - threshold) / (1.0 - threshold) * self.peak_elevation_deg;
            Ok(InstantState {
                azimuth_deg: (t / 10.0).rem_euclid(360.0),
                elevation_deg: elevation,
                range_km: 1000.0,
                range_rate_m_s: -3000.0 * phase.sin(),
                sub_lat_deg: 0.0,
                sub_lon_deg: 0.0,
                eclipsed: false,
            })
        }
    }

    fn epoch() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2022, 10, 1, 0, 0, 0).unwrap()
    }

    fn orbit() -> SineOrbit {
        SineOrbit {
            epoch: epoch(),
            period_s: 5400.0, // 90 minutes
            peak_elevation_deg: 40.0,
            visible_fraction: 0.1, // 9-minute passes
        }
    }

    #[test]
    fn pass_times_are_ordered() {
        let orbit = orbit();
        // Start just after a culmination so the current pass is skipped.
        let from = epoch() + Duration::minutes(10);
        let pass = find_next_pass(&orbit, from).unwrap();
        assert!(pass.aos <= pass.max_time);
        assert!(pass.max_time <= pass.los);
        assert!(pass.max_elevation_deg >= 0.0);
        assert!(pass.aos >= from);
    }

    #[test]
    fn culmination_is_refined_near_the_peak() {
        let orbit = orbit();
        let from = epoch() + Duration::minutes(10);
        let pass = find_next_pass(&orbit, from).unwrap();
        // The next culmination is one full period after the epoch.
        let expected = epoch() + Duration::seconds(5400);
        assert!((pass.max_time - expected).num_seconds().abs() <= 2);
        assert!((pass.max_elevation_deg - 40.0).abs() < 0.1);
    }

    #[test]
    fn in_progress_pass_is_skipped_by_forward_search() {
        let orbit = orbit();
        // At the epoch the satellite is at culmination.
        let pass = find_next_pass(&orbit, epoch()).unwrap();
        assert!(pass.aos > epoch() + Duration::minutes(30));
    }

    #[test]
    fn current_pass_backs_up_to_the_one_in_progress() {
        let orbit = orbit();
        let now = epoch(); // mid-pass
        let pass = find_current_pass(&orbit, now).unwrap();
        assert!(pass.los >= now, "reported pass must still be in progress");
        assert!(pass.aos <= now);
    }

    #[test]
    fn never_setting_satellite_yields_no_pass() {
        struct AlwaysUp {
            epoch: DateTime<Utc>,
        }
        impl Propagator for AlwaysUp {
            fn instant(&self, at: DateTime<Utc>) -> Result<InstantState, PredictError> {
                // Geostationary-like: high and slow, never crosses the horizon.
                let t = (at - self.epoch).num_milliseconds() as f64 / 1000.0;
                let phase = (t / 86_400.0) * std::f64::consts::TAU;
                Ok(InstantState {
                    elevation_deg: 50.0 + 10.0 * phase.cos(),
                    ..InstantState::default()
                })
            }
        }
        let orbit = AlwaysUp { epoch: epoch() };
        // No horizon crossing anywhere: the search comes up empty and the
        // caller degrades to an invalid pass rather than spinning forever.
        assert!(matches!(
            find_current_pass(&orbit, epoch()),
            Err(PredictError::NoPassFound)
        ));
    }

    #[test]
    fn find_passes_filters_by_elevation() {
        let orbit = orbit();
        let from = epoch() + Duration::minutes(10);
        let all = find_passes(&orbit, from, 3, 0.0).unwrap();
        assert_eq!(all.len(), 3);
        // Successive passes one period apart, sorted by time.
        assert!(all[0].aos < all[1].aos && all[1].aos < all[2].aos);

        let none = find_passes(&orbit, from, 3, 80.0).unwrap();
        assert!(none.is_empty());
    }
}
