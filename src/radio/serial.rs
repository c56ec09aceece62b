use std::io::{Read, Write};
use std::time::Duration;

use log::debug;
use serialport::SerialPort;

use super::cat::{CatControl, PortSettings, RigModel};
use super::error::CatError;

const MAX_RESPONSE_BYTES: usize = 128;

/// ASCII CAT transport over a serial port.
///
/// All supported models share the line-oriented ASCII command surface; the
/// model only affects session setup. Reads are bounded by the configured
/// port timeout, so a dead rig costs one timeout per command, never a hang.
pub struct SerialCat {
    model: RigModel,
    port: Option<Box<dyn SerialPort>>,
}

impl SerialCat {
    pub fn open(model: RigModel, settings: &PortSettings) -> Result<Self, CatError> {
        let mut cat = Self { model, port: None };
        cat.configure_port(settings)?;
        Ok(cat)
    }
}

impl CatControl for SerialCat {
    fn configure_port(&mut self, settings: &PortSettings) -> Result<(), CatError> {
        let data_bits = match settings.data_bits {
            5 => serialport::DataBits::Five,
            6 => serialport::DataBits::Six,
            7 => serialport::DataBits::Seven,
            _ => serialport::DataBits::Eight,
        };
        let parity = match settings.parity.to_ascii_lowercase().as_str() {
            "odd" => serialport::Parity::Odd,
            "even" => serialport::Parity::Even,
            _ => serialport::Parity::None,
        };
        let stop_bits = match settings.stop_bits {
            2 => serialport::StopBits::Two,
            _ => serialport::StopBits::One,
        };

        let port = serialport::new(settings.port.as_str(), settings.baud)
            .data_bits(data_bits)
            .parity(parity)
            .stop_bits(stop_bits)
            .timeout(Duration::from_millis(settings.timeout_ms))
            .open()?;
        self.port = Some(port);
        Ok(())
    }

    fn init_rig(&mut self) -> Result<(), CatError> {
        if self.port.is_none() {
            return Err(CatError::NotConnected);
        }
        debug!("{} CAT session ready", self.model);
        Ok(())
    }

    fn ascii_cmd(&mut self, cmd: &str, args: &[&str]) -> Result<String, CatError> {
        let port = self.port.as_mut().ok_or(CatError::NotConnected)?;

        let mut line = cmd.to_string();
        for arg in args {
            line.push(' ');
            line.push_str(arg);
        }
        line.push('\r');
        port.write_all(line.as_bytes())?;

        // Read one response line; a timeout with nothing received means the
        // rig is not answering.
        let mut response = String::new();
        let mut byte = [0u8; 1];
        loop {
            match port.read(&mut byte) {
                Ok(0) => break,
                Ok(_) => {
                    let c = byte[0] as char;
                    if c == '\r' || c == '\n' {
                        if !response.is_empty() {
                            break;
                        }
                    } else {
                        response.push(c);
                        if response.len() >= MAX_RESPONSE_BYTES {
                            break;
                        }
                    }
                }
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut => {
                    if response.is_empty() {
                        return Err(CatError::Timeout);
                    }
                    break;
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(response)
    }
}
