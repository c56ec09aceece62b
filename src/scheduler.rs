use chrono::{DateTime, Utc};
use log::{debug, info};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::config::{Config, NUM_PRESETS};
use crate::context::SharedContext;
use crate::doppler;
use crate::predict::PassTableEntry;
use crate::tracker::SatelliteTracker;

const CYCLE: std::time::Duration = std::time::Duration::from_secs(1);

/// The 1 Hz tracking loop over all preset slots.
///
/// Each cycle recomputes every valid tracker, refreshes a pass prediction
/// whenever the previous pass has elapsed, and publishes the selected
/// preset's state and Doppler-corrected frequencies into the shared context.
pub struct Coordinator {
    trackers: Vec<SatelliteTracker>,
    ctx: SharedContext,
    startup: bool,
}

impl Coordinator {
    pub fn from_config(config: &Config, ctx: SharedContext) -> Self {
        let observer = config.observer();
        let mut trackers = Vec::with_capacity(NUM_PRESETS);
        for preset in &config.presets {
            let mut tracker = SatelliteTracker::new(observer);
            if !preset.satellite.is_empty()
                && tracker.init_satellite(&preset.satellite, &config.element_path(preset))
            {
                info!("preset {:?}: tracking {}", preset.name, tracker.name());
            }
            trackers.push(tracker);
        }
        while trackers.len() < NUM_PRESETS {
            trackers.push(SatelliteTracker::new(observer));
        }
        Self {
            trackers,
            ctx,
            startup: true,
        }
    }

    /// Push a new observer location to every slot. Called when the operator
    /// edits the ground-station configuration.
    #[allow(dead_code)]
    pub fn set_observer(&mut self, latitude_deg: f64, longitude_deg: f64, elevation_m: f64) {
        for tracker in &mut self.trackers {
            tracker.set_observer(latitude_deg, longitude_deg, elevation_m);
        }
    }

    pub fn tick(&mut self, now: DateTime<Utc>) {
        let mut new_pass = false;
        let selected = self.ctx.selected_preset();

        for (i, tracker) in self.trackers.iter_mut().enumerate() {
            if !tracker.valid() {
                continue;
            }

            // The sole trigger for refreshing pass data: the previous pass
            // (or the epoch-zero placeholder) has elapsed.
            if now > tracker.pass().los {
                tracker.next_pass(now);
                new_pass = true;
            }

            let state = tracker.compute(now);

            // First iteration only: a satellite already in view means the
            // forward search skipped the pass in progress; back up to it.
            if self.startup && state.elevation_deg > 0.0 {
                tracker.current_pass(now);
                new_pass = true;
            }

            if i == selected {
                let snap = self.ctx.snapshot();
                let uplink = doppler::correct_uplink(snap.uplink.desired_hz, state.range_rate_m_s);
                let downlink =
                    doppler::correct_downlink(snap.downlink.desired_hz, state.range_rate_m_s);
                self.ctx.set_corrected(uplink, downlink);
                self.ctx.set_current(state, tracker.pass());
            }
        }

        if new_pass {
            let table = build_pass_table(&self.trackers);
            debug!("pass table rebuilt, {} entries", table.len());
            self.ctx.publish_pass_table(table);
        }
        self.startup = false;
    }

    /// Run until the stop signal fires; the signal is observed within one
    /// sleep cycle.
    pub fn spawn(mut self) -> (oneshot::Sender<()>, JoinHandle<()>) {
        let (stop_tx, mut stop_rx) = oneshot::channel();
        let join = tokio::spawn(async move {
            info!("tracking loop starting");
            loop {
                let stopped = tokio::select! {
                    _ = tokio::time::sleep(CYCLE) => false,
                    _ = &mut stop_rx => true,
                };
                if stopped {
                    break;
                }
                self.tick(Utc::now());
            }
            info!("tracking loop exiting");
        });
        (stop_tx, join)
    }
}

/// Upcoming-pass table: one row per distinct satellite name across all valid
/// slots (the first slot wins), ascending by AOS time.
pub fn build_pass_table(trackers: &[SatelliteTracker]) -> Vec<PassTableEntry> {
    let mut table: Vec<PassTableEntry> = Vec::new();
    for tracker in trackers.iter().filter(|t| t.valid()) {
        if table.iter().any(|entry| entry.satellite == tracker.name()) {
            continue;
        }
        let pass = tracker.pass();
        if !pass.is_predicted() {
            continue;
        }
        table.push(PassTableEntry {
            satellite: tracker.name().to_string(),
            aos: pass.aos,
            max_elevation_deg: pass.max_elevation_deg,
            los: pass.los,
        });
    }
    table.sort_by_key(|entry| entry.aos);
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predict::Observer;
    use chrono::TimeZone;
    use std::io::Write;

    const ISS_LINE1: &str =
        "1 25544U 98067A   22273.81956581  .00006857  00000+0  12973-3 0  9999";
    const ISS_LINE2: &str =
        "2 25544  51.6432 305.0192 0002674 134.1797 327.8485 15.50354779361579";
    const AO7_LINE1: &str =
        "1 07530U 74089B   22273.84566985 -.00000038  00000+0  84892-4 0  9996";
    const AO7_LINE2: &str =
        "2 07530 101.9607 263.5963 0012280 142.2171 280.5016 12.53656985188971";

    fn element_file() -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("satcat-sched-{}.txt", std::process::id()));
        let mut f = std::fs::File::create(&path).unwrap();
        write!(
            f,
            "ISS (ZARYA)\n{ISS_LINE1}\n{ISS_LINE2}\nAO-07\n{AO7_LINE1}\n{AO7_LINE2}\n"
        )
        .unwrap();
        path
    }

    #[test]
    fn pass_table_dedups_by_name_and_sorts_by_aos() {
        let path = element_file();
        let observer = Observer::new(40.414, -79.704, 347.0);
        let now = Utc.with_ymd_and_hms(2022, 9, 30, 12, 0, 0).unwrap();

        // Two slots with the same satellite plus one distinct one.
        let mut trackers = vec![
            SatelliteTracker::new(observer),
            SatelliteTracker::new(observer),
            SatelliteTracker::new(observer),
            SatelliteTracker::new(observer),
        ];
        assert!(trackers[0].init_satellite("ISS (ZARYA)", &path));
        assert!(trackers[1].init_satellite("AO-07", &path));
        assert!(trackers[2].init_satellite("ISS (ZARYA)", &path));
        // Slot 3 stays invalid and must not appear.

        for tracker in trackers.iter_mut().take(3) {
            tracker.next_pass(now);
        }

        let table = build_pass_table(&trackers);
        assert_eq!(table.len(), 2, "same satellite listed once");
        assert!(table.windows(2).all(|w| w[0].aos <= w[1].aos));
        for entry in &table {
            assert!(entry.aos <= entry.los);
            assert!(entry.max_elevation_deg >= 0.0);
        }

        std::fs::remove_file(path).ok();
    }
}
