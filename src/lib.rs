pub mod core;

pub use crate::core::{
    CatalogConfig, Coordinates, Discovery, Error, Generation, LocationConfig, Result, Snapshot,
    discover_nearby,
};
pub use crate::core::location::{
    LocationPhase, LocationProvider, LocationSample, LocationSession, LocationState, MapRegion,
    SimulatedLocationProvider,
};
pub use crate::core::spots::{CatalogState, InMemorySpotProvider, Spot, SpotCatalog, SpotProvider};
