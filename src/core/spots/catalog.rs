use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::core::{
    config::CatalogConfig,
    error::{Error, Result},
    geo::Coordinates,
    spots::{
        model::{Spot, SpotCategory, SpotDetails},
        provider::{SearchFilters, SpotProvider},
        state::{CatalogAction, CatalogState},
    },
};

/// Owns the spot catalog state and the provider calls that fill it.
pub struct SpotCatalog<P> {
    provider: P,
    config: CatalogConfig,
    state: RwLock<CatalogState>,
    // Toggles run one at a time so each reads the flag the previous one left.
    favorite_lock: Mutex<()>,
}

impl<P: SpotProvider> SpotCatalog<P> {
    pub fn new(provider: P, config: CatalogConfig) -> Self {
        let state = CatalogState::new(&config);
        Self {
            provider,
            config,
            state: RwLock::new(state),
            favorite_lock: Mutex::new(()),
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    pub async fn snapshot(&self) -> CatalogState {
        self.state.read().await.clone()
    }

    pub async fn dispatch(&self, action: CatalogAction) -> bool {
        self.state.write().await.apply(action)
    }

    /// Load the spots within `radius_m` of `center`, closest first, each
    /// annotated with its distance. Replaces both the catalog and the nearby
    /// list; on failure both are left untouched.
    pub async fn fetch_nearby(&self, center: Coordinates, radius_m: f64) -> Result<Vec<Spot>> {
        let generation = {
            let mut state = self.state.write().await;
            if !center.is_valid() || !radius_m.is_finite() || radius_m <= 0.0 {
                let error = Error::Fetch(format!("invalid area: {center} within {radius_m} m"));
                state.apply(CatalogAction::Failed(error.clone()));
                return Err(error);
            }
            let generation = state.generations.nearby.next();
            state.apply(CatalogAction::NearbyStarted(generation));
            generation
        };

        match self.provider.nearby(center, radius_m).await {
            Ok(spots) => {
                let spots = within_radius(spots, center, radius_m);
                let applied = self
                    .dispatch(CatalogAction::NearbyLoaded {
                        generation,
                        spots: spots.clone(),
                    })
                    .await;
                if applied {
                    info!(%generation, count = spots.len(), %center, radius_m, "nearby spots loaded");
                } else {
                    debug!(%generation, "discarding superseded nearby result");
                }
                Ok(spots)
            }
            Err(e) => {
                let error = Error::fetch(e);
                warn!(%generation, %error, "nearby fetch failed");
                self.dispatch(CatalogAction::NearbyFailed {
                    generation,
                    error: error.clone(),
                })
                .await;
                Err(error)
            }
        }
    }

    /// [`fetch_nearby`](Self::fetch_nearby) using the radius from the query params.
    pub async fn refresh_nearby(&self, center: Coordinates) -> Result<Vec<Spot>> {
        let radius_m = self.state.read().await.params.radius_m;
        self.fetch_nearby(center, radius_m).await
    }

    /// Resolve a spot's full record and its reviews into the selection.
    pub async fn fetch_details(&self, spot_id: &str) -> Result<SpotDetails> {
        let generation = {
            let mut state = self.state.write().await;
            let generation = state.generations.details.next();
            state.apply(CatalogAction::DetailsStarted(generation));
            generation
        };

        let error = match self.provider.details(spot_id).await {
            Ok(Some(details)) => {
                if !self
                    .dispatch(CatalogAction::DetailsLoaded {
                        generation,
                        details: details.clone(),
                    })
                    .await
                {
                    debug!(%generation, spot_id, "discarding superseded details");
                }
                return Ok(details);
            }
            Ok(None) => Error::NotFound(spot_id.to_string()),
            Err(e) => Error::fetch(e),
        };
        warn!(%generation, spot_id, %error, "spot details failed");
        self.dispatch(CatalogAction::DetailsFailed {
            generation,
            error: error.clone(),
        })
        .await;
        Err(error)
    }

    /// Free-text search with optional category and location narrowing.
    ///
    /// A blank query without a category resolves to no results without
    /// asking the provider.
    pub async fn search(
        &self,
        query: &str,
        category: Option<&str>,
        location: Option<Coordinates>,
    ) -> Result<Vec<Spot>> {
        let query = query.trim();
        let (generation, radius_m) = {
            let mut state = self.state.write().await;
            let generation = state.generations.search.next();
            state.apply(CatalogAction::SearchStarted(generation));
            (generation, state.params.radius_m)
        };

        let result = if query.is_empty() && category.is_none() {
            Ok(Vec::new())
        } else {
            let filters = SearchFilters {
                category: category.map(str::to_string),
                location,
                radius_m: location.map(|_| radius_m),
            };
            self.provider.search(query, &filters).await
        };

        match result {
            Ok(mut spots) => {
                if let Some(center) = location {
                    annotate_distances(&mut spots, center);
                }
                if self
                    .dispatch(CatalogAction::SearchLoaded {
                        generation,
                        spots: spots.clone(),
                    })
                    .await
                {
                    debug!(%generation, query, count = spots.len(), "search completed");
                } else {
                    debug!(%generation, query, "discarding superseded search result");
                }
                Ok(spots)
            }
            Err(e) => {
                let error = Error::fetch(e);
                warn!(%generation, query, %error, "search failed");
                self.dispatch(CatalogAction::SearchFailed {
                    generation,
                    error: error.clone(),
                })
                .await;
                Err(error)
            }
        }
    }

    /// [`search`](Self::search) using the stored query and category.
    pub async fn search_with_params(&self, location: Option<Coordinates>) -> Result<Vec<Spot>> {
        let params = self.state.read().await.params.clone();
        self.search(&params.query, params.category.as_deref(), location)
            .await
    }

    /// Flip the favorite flag of a catalog spot and return the new value.
    ///
    /// Each call flips whatever the flag currently is; there is no "set"
    /// form, so a caller wanting a specific outcome must read it first. Once
    /// the provider confirms, the confirmed value is written rather than
    /// flipped again, so a refetch landing in between cannot undo it.
    pub async fn toggle_favorite(&self, spot_id: &str) -> Result<bool> {
        let _serialized = self.favorite_lock.lock().await;

        let current = self.state.read().await.is_favorite(spot_id);
        let Some(current) = current else {
            return self.fail(Error::NotFound(spot_id.to_string())).await;
        };
        let desired = !current;

        match self.provider.set_favorite(spot_id, desired).await {
            Ok(true) => {
                let still_listed = {
                    let mut state = self.state.write().await;
                    state.apply(CatalogAction::FavoriteSet {
                        spot_id: spot_id.to_string(),
                        favorite: desired,
                    });
                    state.spot(spot_id).is_some()
                };
                if !still_listed {
                    let error = Error::NotFound(spot_id.to_string());
                    warn!(spot_id, %error, "spot left the catalog before the favorite was confirmed");
                    return Err(error);
                }
                debug!(spot_id, favorite = desired, "favorite toggled");
                Ok(desired)
            }
            Ok(false) => self.fail(Error::NotFound(spot_id.to_string())).await,
            Err(e) => self.fail(Error::fetch(e)).await,
        }
    }

    pub async fn load_categories(&self) -> Result<Vec<SpotCategory>> {
        match self.provider.categories().await {
            Ok(categories) => {
                self.dispatch(CatalogAction::CategoriesLoaded(categories.clone()))
                    .await;
                Ok(categories)
            }
            Err(e) => self.fail(Error::fetch(e)).await,
        }
    }

    /// Update search parameters. `None` leaves a field as it is; a category of
    /// `Some(None)` clears the filter. Nothing is fetched.
    pub async fn set_query_params(
        &self,
        query: Option<String>,
        category: Option<Option<String>>,
        radius_m: Option<f64>,
    ) {
        self.dispatch(CatalogAction::SetQueryParams {
            query,
            category,
            radius_m,
        })
        .await;
    }

    pub async fn select_spot(&self, spot: Option<Spot>) {
        self.dispatch(CatalogAction::SelectSpot(spot)).await;
    }

    pub async fn clear_search_results(&self) {
        self.dispatch(CatalogAction::ClearSearchResults).await;
    }

    pub async fn clear_error(&self) {
        self.dispatch(CatalogAction::ClearError).await;
    }

    async fn fail<T>(&self, error: Error) -> Result<T> {
        warn!(%error, "catalog operation failed");
        self.dispatch(CatalogAction::Failed(error.clone())).await;
        Err(error)
    }
}

fn annotate_distances(spots: &mut [Spot], center: Coordinates) {
    for spot in spots.iter_mut() {
        spot.distance = Some(center.distance_to(&spot.coordinates));
    }
}

fn within_radius(mut spots: Vec<Spot>, center: Coordinates, radius_m: f64) -> Vec<Spot> {
    annotate_distances(&mut spots, center);
    spots.retain(|s| s.distance.is_some_and(|d| d <= radius_m));
    spots.sort_by(|a, b| {
        a.distance
            .unwrap_or(f64::MAX)
            .total_cmp(&b.distance.unwrap_or(f64::MAX))
    });
    spots
}
