use std::path::PathBuf;

use log::warn;
use serde::Deserialize;
use thiserror::Error;

use crate::predict::Observer;

/// Number of satellite preset slots.
pub const NUM_PRESETS: usize = 8;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Parse-with-default helpers for operator-entered numeric fields.
///
/// Config values arrive as free-form text; a value that does not parse falls
/// back to the supplied default (typically zero, which downstream code reads
/// as "not configured"). Only ever applied at this boundary — numeric state
/// inside the engine is never silently coerced.
pub fn parse_f64_or(s: &str, default: f64) -> f64 {
    s.trim().parse().unwrap_or(default)
}

pub fn parse_i64_or(s: &str, default: i64) -> i64 {
    s.trim().parse().unwrap_or(default)
}

pub fn parse_u32_or(s: &str, default: u32) -> u32 {
    s.trim().parse().unwrap_or(default)
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub observer: ObserverConfig,
    #[serde(default = "default_tle_dir")]
    pub tle_dir: PathBuf,
    #[serde(default)]
    pub cat: CatConfig,
    #[serde(default)]
    pub presets: Vec<PresetConfig>,
    /// 1-based preset selected at startup.
    #[serde(default = "default_selected")]
    pub selected_preset: String,
}

fn default_tle_dir() -> PathBuf {
    PathBuf::from("tle")
}

fn default_selected() -> String {
    "1".to_string()
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ObserverConfig {
    #[serde(default)]
    pub latitude: String,
    #[serde(default)]
    pub longitude: String,
    #[serde(default)]
    pub elevation: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub rig: String,
    #[serde(default)]
    pub port: String,
    #[serde(default)]
    pub baud: String,
    #[serde(default)]
    pub data_bits: String,
    #[serde(default)]
    pub parity: String,
    #[serde(default)]
    pub stop_bits: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PresetConfig {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub satellite: String,
    #[serde(default)]
    pub element_file: String,
    #[serde(default)]
    pub uplink: LinkConfig,
    #[serde(default)]
    pub downlink: LinkConfig,
    /// CTCSS access tone ("67.0" etc.), empty or "OFF" when unused.
    #[serde(default)]
    pub ctcss_tone: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LinkConfig {
    #[serde(default)]
    pub frequency_mhz: String,
    #[serde(default)]
    pub mode: String,
    #[serde(default)]
    pub use_doppler: bool,
    #[serde(default)]
    pub tuning_step_khz: String,
    #[serde(default)]
    pub tune_threshold_khz: String,
}

impl LinkConfig {
    pub fn frequency_hz(&self) -> f64 {
        parse_f64_or(&self.frequency_mhz, 0.0) * 1.0e6
    }

    pub fn tuning_step_hz(&self) -> i64 {
        (parse_f64_or(&self.tuning_step_khz, 0.0) * 1000.0) as i64
    }

    pub fn tune_threshold_hz(&self) -> i64 {
        (parse_f64_or(&self.tune_threshold_khz, 0.0) * 1000.0) as i64
    }
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = serde_yaml::from_str(&content)?;
        if config.presets.len() > NUM_PRESETS {
            warn!(
                "{} presets configured, keeping the first {NUM_PRESETS}",
                config.presets.len()
            );
            config.presets.truncate(NUM_PRESETS);
        }
        Ok(config)
    }

    pub fn observer(&self) -> Observer {
        Observer::new(
            parse_f64_or(&self.observer.latitude, 0.0),
            parse_f64_or(&self.observer.longitude, 0.0),
            parse_f64_or(&self.observer.elevation, 0.0),
        )
    }

    /// 0-based index of the startup preset, clamped to the configured slots.
    pub fn selected_index(&self) -> usize {
        let one_based = parse_i64_or(&self.selected_preset, 1).max(1) as usize;
        (one_based - 1).min(self.presets.len().saturating_sub(1))
    }

    pub fn element_path(&self, preset: &PresetConfig) -> PathBuf {
        self.tle_dir.join(&preset.element_file)
    }
}
