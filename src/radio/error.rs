use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatError {
    #[error("serial port error: {0}")]
    Port(#[from] serialport::Error),
    #[error("serial I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("rig response timed out")]
    Timeout,
    #[error("rig not connected")]
    NotConnected,
    #[error("unknown rig model: {0}")]
    UnknownRig(String),
}
