mod cat;
mod error;
mod serial;
mod session;
mod tones;

pub use cat::{CatControl, Channel, PortSettings, RigModel, ACK};
pub use error::CatError;
pub use serial::SerialCat;
pub use session::CatSession;
pub use tones::ctcss_param;

#[cfg(test)]
pub(crate) use session::tests::MockCat;

use crate::config::{parse_i64_or, parse_u32_or, CatConfig};

/// Build a CAT backend from the configured rig model and port parameters.
pub fn open_rig(config: &CatConfig) -> Result<CatSession, CatError> {
    let model: RigModel = config
        .rig
        .trim()
        .parse()
        .map_err(|_| CatError::UnknownRig(config.rig.clone()))?;

    let settings = PortSettings {
        port: config.port.clone(),
        baud: parse_u32_or(&config.baud, 9600),
        data_bits: parse_i64_or(&config.data_bits, 8) as u8,
        parity: if config.parity.is_empty() {
            "none".to_string()
        } else {
            config.parity.clone()
        },
        stop_bits: parse_i64_or(&config.stop_bits, 1) as u8,
        ..PortSettings::default()
    };

    let cat = SerialCat::open(model, &settings)?;
    Ok(CatSession::new(Box::new(cat)))
}
