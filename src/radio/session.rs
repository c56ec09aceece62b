use log::{debug, info};

use super::cat::{CatControl, Channel};
use super::error::CatError;
use super::tones::ctcss_param;
use crate::config::PresetConfig;

/// Rig session wrapping a [`CatControl`] backend.
///
/// Remembers the frequency and mode the rig had when control was enabled and
/// restores them on disable, so toggling CAT control never leaves the radio
/// somewhere the operator did not put it.
pub struct CatSession {
    cat: Box<dyn CatControl>,
    orig_freq: String,
    orig_mode: String,
}

impl CatSession {
    pub fn new(cat: Box<dyn CatControl>) -> Self {
        Self {
            cat,
            orig_freq: String::new(),
            orig_mode: String::new(),
        }
    }

    pub fn cat_mut(&mut self) -> &mut dyn CatControl {
        self.cat.as_mut()
    }

    /// Take control: save the rig's current frequency/mode, switch to split
    /// operation and push the preset's modes and tone.
    pub fn enable(&mut self, preset: Option<&PresetConfig>) -> Result<(), CatError> {
        self.cat.init_rig()?;
        self.orig_freq = self.cat.get_frequency().unwrap_or_default();
        self.orig_mode = self.cat.ascii_cmd("MODE", &[]).unwrap_or_default();
        if let Err(e) = self.cat.set_split(true) {
            debug!("split enable failed: {e}");
        }
        if let Some(preset) = preset {
            self.apply_preset(preset);
        }
        info!("rig CAT control enabled");
        Ok(())
    }

    /// Push a preset's modes and CTCSS tone. Individual command failures are
    /// logged and skipped; the tuning loop keeps running on whatever state
    /// the rig accepted.
    pub fn apply_preset(&mut self, preset: &PresetConfig) {
        if !preset.downlink.mode.is_empty() {
            if let Err(e) = self.cat.set_mode(Channel::A, &preset.downlink.mode) {
                debug!("downlink mode set failed: {e}");
            }
        }
        if !preset.uplink.mode.is_empty() {
            if let Err(e) = self.cat.set_mode(Channel::B, &preset.uplink.mode) {
                debug!("uplink mode set failed: {e}");
            }
        }
        match ctcss_param(&preset.ctcss_tone) {
            Some("0") => {
                let _ = self.cat.ascii_cmd("TONE", &["OFF"]);
            }
            Some(param) => {
                let _ = self.cat.ascii_cmd("TONE", &["ENC", param]);
            }
            None if preset.ctcss_tone.trim().is_empty() => {}
            None => debug!("unknown CTCSS tone {:?}, not set", preset.ctcss_tone),
        }
    }

    /// Release control and restore what the operator had dialed in.
    pub fn disable(&mut self) {
        let _ = self.cat.set_split(false);
        if !self.orig_freq.is_empty() {
            let _ = self.cat.ascii_cmd("FREQ", &[&self.orig_freq]);
        }
        if !self.orig_mode.is_empty() {
            let _ = self.cat.ascii_cmd("MODE", &[&self.orig_mode]);
        }
        let _ = self.cat.ascii_cmd("TONE", &["OFF"]);
        info!("rig CAT control disabled");
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::LinkConfig;
    use crate::radio::cat::PortSettings;
    use std::sync::{Arc, Mutex};

    /// Scripted CAT backend recording every command into a shared log.
    pub(crate) struct MockCat {
        pub sent: Arc<Mutex<Vec<String>>>,
        pub freq_response: String,
        pub ack: bool,
    }

    impl MockCat {
        pub fn new() -> (Self, Arc<Mutex<Vec<String>>>) {
            let log = Arc::new(Mutex::new(Vec::new()));
            let mock = Self {
                sent: log.clone(),
                freq_response: "145000000".to_string(),
                ack: true,
            };
            (mock, log)
        }
    }

    impl CatControl for MockCat {
        fn configure_port(&mut self, _settings: &PortSettings) -> Result<(), CatError> {
            Ok(())
        }

        fn init_rig(&mut self) -> Result<(), CatError> {
            Ok(())
        }

        fn ascii_cmd(&mut self, cmd: &str, args: &[&str]) -> Result<String, CatError> {
            let mut line = cmd.to_string();
            for arg in args {
                line.push(' ');
                line.push_str(arg);
            }
            self.sent.lock().unwrap().push(line);
            match cmd {
                "FREQ" if args.is_empty() => Ok(self.freq_response.clone()),
                "MODE" if args.is_empty() => Ok("FM".to_string()),
                _ if self.ack => Ok("OK".to_string()),
                _ => Ok("ERR".to_string()),
            }
        }
    }

    fn preset() -> PresetConfig {
        PresetConfig {
            name: "ISS FM".into(),
            satellite: "ISS".into(),
            element_file: "nasabare.txt".into(),
            uplink: LinkConfig {
                frequency_mhz: "145.990".into(),
                mode: "FM".into(),
                ..LinkConfig::default()
            },
            downlink: LinkConfig {
                frequency_mhz: "437.800".into(),
                mode: "FM".into(),
                ..LinkConfig::default()
            },
            ctcss_tone: "67.0".into(),
        }
    }

    #[test]
    fn enable_saves_state_and_applies_preset() {
        let (mock, log) = MockCat::new();
        let mut session = CatSession::new(Box::new(mock));
        session.enable(Some(&preset())).unwrap();
        assert_eq!(session.orig_freq, "145000000");
        assert_eq!(session.orig_mode, "FM");

        let sent = log.lock().unwrap();
        assert!(sent.contains(&"SPLIT ON".to_string()));
        assert!(sent.contains(&"MODEA FM".to_string()));
        assert!(sent.contains(&"MODEB FM".to_string()));
        assert!(sent.contains(&"TONE ENC 670".to_string()));
    }

    #[test]
    fn disable_restores_saved_state() {
        let (mock, log) = MockCat::new();
        let mut session = CatSession::new(Box::new(mock));
        session.enable(None).unwrap();
        session.disable();

        let sent = log.lock().unwrap();
        assert!(sent.contains(&"SPLIT OFF".to_string()));
        assert!(sent.contains(&"FREQ 145000000".to_string()));
        assert!(sent.contains(&"MODE FM".to_string()));
        assert!(sent.contains(&"TONE OFF".to_string()));
    }
}
