use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

use crate::config::Config;
use crate::predict::{InstantState, PassInfo, PassTableEntry};

/// Per-direction radio link state.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkState {
    /// Feed the Doppler-corrected frequency to the rig instead of the
    /// operator's desired frequency.
    pub doppler_enabled: bool,
    pub desired_hz: f64,
    pub corrected_hz: f64,
}

/// State shared between the tracking loop and the tuning loop.
#[derive(Debug, Clone, Default)]
pub struct ContextState {
    /// 0-based preset slot driving the live display and the rig.
    pub selected_preset: usize,
    pub cat_enabled: bool,
    /// Last observed rig communication status.
    pub connected: bool,
    pub uplink: LinkState,
    pub downlink: LinkState,
    /// Upcoming passes, deduplicated by satellite, ascending AOS.
    pub pass_table: Vec<PassTableEntry>,
    /// Earliest upcoming AOS, for the countdown display.
    pub next_aos: Option<DateTime<Utc>>,
    /// Latest instantaneous state of the selected preset.
    pub current: InstantState,
    /// Latest pass prediction of the selected preset.
    pub current_pass: PassInfo,
}

/// Shared handle over [`ContextState`].
///
/// The two loops poll at 1–2 s cadence and every field tolerates a
/// one-cycle-stale read: a racing update costs at most one delayed or extra
/// frequency command, never persistent wrong state. A single mutex with
/// short critical sections is therefore enough; no cross-field transactional
/// consistency is provided or needed.
#[derive(Clone)]
pub struct SharedContext {
    inner: Arc<Mutex<ContextState>>,
}

impl SharedContext {
    /// Seed the context from the configured startup preset.
    pub fn from_config(config: &Config) -> Self {
        let mut state = ContextState {
            selected_preset: config.selected_index(),
            cat_enabled: config.cat.enabled,
            ..ContextState::default()
        };
        if let Some(preset) = config.presets.get(state.selected_preset) {
            state.uplink = LinkState {
                doppler_enabled: preset.uplink.use_doppler,
                desired_hz: preset.uplink.frequency_hz(),
                corrected_hz: 0.0,
            };
            state.downlink = LinkState {
                doppler_enabled: preset.downlink.use_doppler,
                desired_hz: preset.downlink.frequency_hz(),
                corrected_hz: 0.0,
            };
        }
        Self {
            inner: Arc::new(Mutex::new(state)),
        }
    }

    pub fn snapshot(&self) -> ContextState {
        self.inner.lock().unwrap().clone()
    }

    pub fn selected_preset(&self) -> usize {
        self.inner.lock().unwrap().selected_preset
    }

    /// Switch the active preset and reload its link configuration. The
    /// corrected frequencies reset to zero until the tracking loop publishes
    /// fresh values. Part of the operator-interaction surface.
    #[allow(dead_code)]
    pub fn select_preset(&self, index: usize, config: &Config) {
        let mut locked = self.inner.lock().unwrap();
        locked.selected_preset = index;
        if let Some(preset) = config.presets.get(index) {
            locked.uplink = LinkState {
                doppler_enabled: preset.uplink.use_doppler,
                desired_hz: preset.uplink.frequency_hz(),
                corrected_hz: 0.0,
            };
            locked.downlink = LinkState {
                doppler_enabled: preset.downlink.use_doppler,
                desired_hz: preset.downlink.frequency_hz(),
                corrected_hz: 0.0,
            };
        }
    }

    /// Part of the operator-interaction surface.
    #[allow(dead_code)]
    pub fn set_cat_enabled(&self, enabled: bool) {
        self.inner.lock().unwrap().cat_enabled = enabled;
    }

    pub fn set_connected(&self, connected: bool) {
        self.inner.lock().unwrap().connected = connected;
    }

    pub fn set_corrected(&self, uplink_hz: f64, downlink_hz: f64) {
        let mut locked = self.inner.lock().unwrap();
        locked.uplink.corrected_hz = uplink_hz;
        locked.downlink.corrected_hz = downlink_hz;
    }

    pub fn set_current(&self, state: InstantState, pass: PassInfo) {
        let mut locked = self.inner.lock().unwrap();
        locked.current = state;
        locked.current_pass = pass;
    }

    pub fn publish_pass_table(&self, table: Vec<PassTableEntry>) {
        let mut locked = self.inner.lock().unwrap();
        locked.next_aos = table.first().map(|entry| entry.aos);
        locked.pass_table = table;
    }

    pub fn next_aos(&self) -> Option<DateTime<Utc>> {
        self.inner.lock().unwrap().next_aos
    }
}
