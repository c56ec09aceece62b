use std::path::Path;

use chrono::{DateTime, Utc};
use log::warn;

use crate::predict::{
    find_current_pass, find_next_pass, find_in_file, InstantState, Observer, PassInfo, Propagator,
    SgpSatellite,
};

/// One preset slot's satellite tracker.
///
/// Every operation degrades instead of failing: a tracker without a valid
/// element set answers `compute` with the all-zero [`InstantState`] and
/// `next_pass` with the epoch-zero [`PassInfo`]. Callers treat those as
/// "no data".
pub struct SatelliteTracker {
    name: String,
    observer: Observer,
    sat: Option<SgpSatellite>,
    pass: PassInfo,
    /// Backoff after a failed pass search, so a satellite with no upcoming
    /// pass is not re-searched every polling cycle.
    retry_after: Option<DateTime<Utc>>,
}

impl SatelliteTracker {
    pub fn new(observer: Observer) -> Self {
        Self {
            name: String::new(),
            observer,
            sat: None,
            pass: PassInfo::default(),
            retry_after: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn valid(&self) -> bool {
        self.sat.is_some()
    }

    /// Last computed pass. Epoch-zero until `next_pass` succeeds.
    pub fn pass(&self) -> PassInfo {
        self.pass
    }

    /// Update the observer location. Malformed input (non-finite or out of
    /// range) keeps the previous location; the ground station does not move
    /// at runtime, so this is logged rather than surfaced.
    pub fn set_observer(&mut self, latitude_deg: f64, longitude_deg: f64, elevation_m: f64) {
        if !latitude_deg.is_finite()
            || !longitude_deg.is_finite()
            || !elevation_m.is_finite()
            || latitude_deg.abs() > 90.0
            || longitude_deg.abs() > 180.0
        {
            warn!(
                "rejecting observer location ({latitude_deg}, {longitude_deg}, {elevation_m}), keeping previous"
            );
            return;
        }
        self.observer = Observer::new(latitude_deg, longitude_deg, elevation_m);
        if let Some(sat) = &mut self.sat {
            sat.set_observer(self.observer);
        }
    }

    #[allow(dead_code)]
    pub fn observer(&self) -> Observer {
        self.observer
    }

    /// Look up `name` in the element-group file and initialize the orbital
    /// model. Never fails to its caller: any problem leaves the tracker
    /// invalid and returns false.
    pub fn init_satellite(&mut self, name: &str, element_file: &Path) -> bool {
        self.sat = None;
        self.pass = PassInfo::default();
        self.retry_after = None;
        self.name = name.trim().to_uppercase();

        let (line1, line2) = match find_in_file(element_file, &self.name) {
            Ok(lines) => lines,
            Err(e) => {
                warn!("{}: element lookup failed: {e}", self.name);
                return false;
            }
        };

        match SgpSatellite::new(Some(self.name.clone()), &line1, &line2, self.observer) {
            Ok(sat) => {
                self.sat = Some(sat);
                true
            }
            Err(e) => {
                warn!("{}: element set rejected: {e}", self.name);
                false
            }
        }
    }

    /// Instantaneous state at `at`, or the zero state when the tracker is
    /// invalid or the propagation fails.
    pub fn compute(&self, at: DateTime<Utc>) -> InstantState {
        let Some(sat) = &self.sat else {
            return InstantState::default();
        };
        match sat.instant(at) {
            Ok(state) => state,
            Err(e) => {
                warn!("{}: propagation failed: {e}", self.name);
                InstantState::default()
            }
        }
    }

    /// Predict and store the next pass rising at or after `from`.
    pub fn next_pass(&mut self, from: DateTime<Utc>) -> PassInfo {
        if self.retry_after.is_some_and(|t| from < t) {
            return self.pass;
        }
        if let Some(sat) = &self.sat {
            match find_next_pass(sat, from) {
                Ok(pass) => {
                    self.pass = pass;
                    self.retry_after = None;
                }
                Err(e) => {
                    warn!("{}: pass search failed: {e}", self.name);
                    self.retry_after = Some(from + chrono::Duration::minutes(10));
                }
            }
        }
        self.pass
    }

    /// Cold-start variant of [`next_pass`]: when the satellite is already up
    /// at `now`, report the pass in progress instead of the one after it.
    pub fn current_pass(&mut self, now: DateTime<Utc>) -> PassInfo {
        if let Some(sat) = &self.sat {
            match find_current_pass(sat, now) {
                Ok(pass) => {
                    self.pass = pass;
                    self.retry_after = None;
                }
                Err(e) => {
                    warn!("{}: pass search failed: {e}", self.name);
                    self.retry_after = Some(now + chrono::Duration::minutes(10));
                }
            }
        }
        self.pass
    }
}
