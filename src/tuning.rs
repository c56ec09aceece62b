use std::sync::Arc;

use log::{debug, info, warn};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::context::{LinkState, SharedContext};
use crate::radio::{open_rig, CatControl, CatSession, Channel};

const CYCLE: std::time::Duration = std::time::Duration::from_secs(2);

/// Threshold-based step rounding.
///
/// The remainder against the tuning step decides the direction: below the
/// threshold rounds down to the previous step boundary, at or above rounds
/// up to the next. The asymmetric threshold lets the operator bias the
/// rounding per radio/mode. A non-positive step or threshold disables
/// quantization.
pub fn quantize(target_hz: i64, step_hz: i64, threshold_hz: i64) -> i64 {
    if target_hz <= 0 || step_hz <= 0 || threshold_hz <= 0 {
        return target_hz;
    }
    let rem = target_hz % step_hz;
    if rem < threshold_hz {
        target_hz - rem
    } else {
        target_hz + (step_hz - rem)
    }
}

/// Per-direction command latch: a set-frequency command goes out only when
/// the quantized target moves away from the last acknowledged value.
struct LinkTuner {
    channel: Channel,
    last_hz: i64,
}

impl LinkTuner {
    fn new(channel: Channel) -> Self {
        Self { channel, last_hz: 0 }
    }

    /// Force a fresh command on the next cycle.
    fn reset(&mut self) {
        self.last_hz = 0;
    }

    fn tick(&mut self, cat: &mut dyn CatControl, link: &LinkState, step_hz: i64, threshold_hz: i64) {
        let source_hz = if link.doppler_enabled {
            link.corrected_hz
        } else {
            link.desired_hz
        };
        let target = source_hz.round() as i64;
        if target <= 0 {
            return;
        }
        let target = quantize(target, step_hz, threshold_hz);
        if target == self.last_hz {
            return;
        }
        match cat.set_frequency(self.channel, target) {
            Ok(true) => self.last_hz = target,
            Ok(false) => debug!("rig rejected channel {} frequency {target}", self.channel),
            Err(e) => debug!("channel {} frequency set failed: {e}", self.channel),
        }
    }
}

/// The 2-second rig control loop. Runs independently of the 1 Hz tracking
/// loop, reading its published frequencies through the shared context.
pub struct TuningLoop {
    ctx: SharedContext,
    config: Arc<Config>,
    session: Option<CatSession>,
    uplink: LinkTuner,
    downlink: LinkTuner,
    last_preset: usize,
    last_enabled: bool,
}

impl TuningLoop {
    pub fn new(ctx: SharedContext, config: Arc<Config>) -> Self {
        Self {
            ctx,
            config,
            session: None,
            uplink: LinkTuner::new(Channel::B),
            downlink: LinkTuner::new(Channel::A),
            last_preset: 0,
            last_enabled: false,
        }
    }

    fn tick(&mut self) {
        let snap = self.ctx.snapshot();

        if snap.cat_enabled != self.last_enabled {
            // Enable state flipped: both latches are stale either way.
            self.uplink.reset();
            self.downlink.reset();
            self.last_preset = snap.selected_preset;
            if snap.cat_enabled {
                match open_rig(&self.config.cat) {
                    Ok(mut session) => {
                        let preset = self.config.presets.get(snap.selected_preset);
                        match session.enable(preset) {
                            Ok(()) => self.session = Some(session),
                            Err(e) => warn!("rig enable failed: {e}"),
                        }
                    }
                    Err(e) => warn!("rig open failed: {e}"),
                }
            } else if let Some(mut session) = self.session.take() {
                session.disable();
            }
            self.last_enabled = snap.cat_enabled;
        }

        let Some(session) = &mut self.session else {
            self.ctx.set_connected(false);
            return;
        };

        if snap.selected_preset != self.last_preset {
            // A preset switch invalidates the frequency baseline.
            self.uplink.reset();
            self.downlink.reset();
            if let Some(preset) = self.config.presets.get(snap.selected_preset) {
                session.apply_preset(preset);
            }
            self.last_preset = snap.selected_preset;
        }

        // Frequency readback doubles as the connectivity probe.
        let connected = matches!(
            session.cat_mut().get_frequency(),
            Ok(resp) if !resp.is_empty() && resp.chars().all(|c| c.is_ascii_digit())
        );
        self.ctx.set_connected(connected);

        let (up_step, up_thresh, dn_step, dn_thresh) = self
            .config
            .presets
            .get(snap.selected_preset)
            .map(|p| {
                (
                    p.uplink.tuning_step_hz(),
                    p.uplink.tune_threshold_hz(),
                    p.downlink.tuning_step_hz(),
                    p.downlink.tune_threshold_hz(),
                )
            })
            .unwrap_or((0, 0, 0, 0));

        self.uplink
            .tick(session.cat_mut(), &snap.uplink, up_step, up_thresh);
        self.downlink
            .tick(session.cat_mut(), &snap.downlink, dn_step, dn_thresh);
    }

    /// Run until the stop signal fires; the signal is observed within one
    /// sleep cycle.
    pub fn spawn(mut self) -> (oneshot::Sender<()>, JoinHandle<()>) {
        let (stop_tx, mut stop_rx) = oneshot::channel();
        let join = tokio::spawn(async move {
            info!("tuning loop starting");
            loop {
                let stopped = tokio::select! {
                    _ = tokio::time::sleep(CYCLE) => false,
                    _ = &mut stop_rx => true,
                };
                if stopped {
                    break;
                }
                self.tick();
            }
            if let Some(mut session) = self.session.take() {
                session.disable();
            }
            info!("tuning loop exiting");
        });
        (stop_tx, join)
    }
}
