use thiserror::Error;

#[derive(Debug, Error)]
pub enum PredictError {
    #[error("element file read error: {0}")]
    FileRead(#[from] std::io::Error),
    #[error("satellite {0} not found in element file")]
    SatelliteNotFound(String),
    #[error("invalid tle: {0}")]
    Tle(#[from] sgp4::TleError),
    #[error("elements error: {0}")]
    Elements(#[from] sgp4::ElementsError),
    #[error("propagation error: {0}")]
    Propagation(String),
    #[error("no pass found within the search window")]
    NoPassFound,
}

impl From<sgp4::Error> for PredictError {
    fn from(err: sgp4::Error) -> Self {
        PredictError::Propagation(err.to_string())
    }
}
