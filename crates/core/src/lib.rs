pub mod config;
pub mod error;
pub mod model;
pub mod urls;

pub use config::{AppConfig, ConfigIntervals, SimulatedConfig};
pub use error::{PlayerError, PlayerResult};
pub use model::{
    format_clock, ArtistDetails, Direction, PlaybackState, Playlist, Settings, Track,
    TransportState,
};
