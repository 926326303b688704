mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from kimamani for tests
pub use kimamani::core::location::{
    LocationAction, LocationPhase, LocationSample, LocationSession, LocationState, MapRegion,
    PermissionStatus, SimulatedLocationProvider, WatchId, WatchOptions,
};
pub use kimamani::core::spots::{
    CatalogAction, CatalogFile, CatalogState, InMemorySpotProvider, Review, ReviewAuthor, Spot,
    SpotCatalog, SpotCategory, SpotDetails, SpotMetadata, SpotProvider,
};
pub use kimamani::{
    CatalogConfig, Coordinates, Error, Generation, LocationConfig, Snapshot, discover_nearby,
};
