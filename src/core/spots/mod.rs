mod catalog;
mod memory;
mod model;
mod provider;
mod state;

pub use catalog::SpotCatalog;
pub use memory::{CatalogFile, InMemorySpotProvider};
pub use model::{Review, ReviewAuthor, Spot, SpotCategory, SpotDetails, SpotMetadata};
pub use provider::{SearchFilters, SpotProvider};
pub use state::{CatalogAction, CatalogGenerations, CatalogState, QueryParams};
