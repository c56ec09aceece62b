use strum_macros::{Display, EnumString};

use super::error::CatError;

/// Acknowledgement substring in rig responses.
pub const ACK: &str = "OK";

/// Rig VFO channel: A carries the downlink (main), B the uplink (sub) while
/// split operation is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum Channel {
    A,
    B,
}

/// Supported transceiver models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum RigModel {
    #[strum(serialize = "FT-817")]
    Ft817,
    #[strum(serialize = "FT-991")]
    Ft991,
    #[strum(serialize = "IC-7000")]
    Ic7000,
}

#[derive(Debug, Clone)]
pub struct PortSettings {
    pub port: String,
    pub baud: u32,
    pub data_bits: u8,
    /// "none", "odd" or "even".
    pub parity: String,
    pub stop_bits: u8,
    /// Read timeout; a rig that stays quiet longer than this counts as not
    /// connected for the current cycle.
    pub timeout_ms: u64,
}

impl Default for PortSettings {
    fn default() -> Self {
        Self {
            port: String::new(),
            baud: 9600,
            data_bits: 8,
            parity: "none".to_string(),
            stop_bits: 1,
            timeout_ms: 500,
        }
    }
}

/// Capability interface over a transceiver's CAT link.
///
/// The engine speaks a small ASCII command vocabulary; rig-specific byte
/// protocols live behind implementations of this trait. All calls are
/// synchronous and bounded by the port read timeout.
pub trait CatControl: Send {
    fn configure_port(&mut self, settings: &PortSettings) -> Result<(), CatError>;

    fn init_rig(&mut self) -> Result<(), CatError>;

    /// Send one ASCII command with arguments, return the raw response line.
    fn ascii_cmd(&mut self, cmd: &str, args: &[&str]) -> Result<String, CatError>;

    /// Current frequency readout; doubles as the connectivity probe.
    fn get_frequency(&mut self) -> Result<String, CatError> {
        self.ascii_cmd("FREQ", &[])
    }

    /// Returns true when the rig acknowledged the new frequency.
    fn set_frequency(&mut self, channel: Channel, hz: i64) -> Result<bool, CatError> {
        let cmd = match channel {
            Channel::A => "FREQA",
            Channel::B => "FREQB",
        };
        let resp = self.ascii_cmd(cmd, &[&hz.to_string()])?;
        Ok(resp.contains(ACK))
    }

    fn set_mode(&mut self, channel: Channel, mode: &str) -> Result<bool, CatError> {
        let cmd = match channel {
            Channel::A => "MODEA",
            Channel::B => "MODEB",
        };
        let resp = self.ascii_cmd(cmd, &[mode])?;
        Ok(resp.contains(ACK))
    }

    fn set_split(&mut self, on: bool) -> Result<bool, CatError> {
        let resp = self.ascii_cmd("SPLIT", &[if on { "ON" } else { "OFF" }])?;
        Ok(resp.contains(ACK))
    }
}
