pub mod config;
pub mod error;
pub mod flow;
pub mod generation;
pub mod geo;
pub mod location;
pub mod snapshot;
pub mod spots;

pub use config::{CatalogConfig, LocationConfig};
pub use error::{Error, Result};
pub use flow::{Discovery, discover_nearby};
pub use generation::Generation;
pub use geo::Coordinates;
pub use snapshot::Snapshot;
