mod error;
mod ground_track;
mod pass_finder;
mod propagation;
mod tle;
mod types;

pub use error::PredictError;
pub use ground_track::{ground_track, GroundTrack, MapGeometry, MAX_SEGMENTS};
pub use pass_finder::{find_current_pass, find_next_pass, find_passes};
pub use propagation::SgpSatellite;
pub use tle::{find_in_file, satellite_names};
pub use types::{InstantState, Observer, PassInfo, PassTableEntry, Propagator};
