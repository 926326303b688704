use crate::core::{
    geo::Coordinates,
    spots::model::{Spot, SpotCategory, SpotDetails},
};

/// Optional narrowing applied to a free-text search.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchFilters {
    pub category: Option<String>,
    pub location: Option<Coordinates>,
    pub radius_m: Option<f64>,
}

/// The backend that knows about spots.
pub trait SpotProvider {
    /// Spots within `radius_m` of `center`, closest first.
    fn nearby(
        &self,
        center: Coordinates,
        radius_m: f64,
    ) -> impl Future<Output = anyhow::Result<Vec<Spot>>>;

    /// `Ok(None)` when the id is unknown.
    fn details(&self, spot_id: &str) -> impl Future<Output = anyhow::Result<Option<SpotDetails>>>;

    fn search(
        &self,
        query: &str,
        filters: &SearchFilters,
    ) -> impl Future<Output = anyhow::Result<Vec<Spot>>>;

    /// Persist the favorite flag. `Ok(false)` when the id is unknown.
    fn set_favorite(
        &self,
        spot_id: &str,
        favorite: bool,
    ) -> impl Future<Output = anyhow::Result<bool>>;

    fn categories(&self) -> impl Future<Output = anyhow::Result<Vec<SpotCategory>>>;
}
