use serde::{Deserialize, Serialize};

use crate::core::{
    config::CatalogConfig,
    error::Error,
    generation::Generation,
    spots::model::{Review, Spot, SpotCategory, SpotDetails},
};

/// Search and filter inputs. Changing them never triggers a fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryParams {
    pub query: String,
    pub category: Option<String>,
    pub radius_m: f64,
}

impl QueryParams {
    pub fn new(config: &CatalogConfig) -> Self {
        Self {
            query: String::new(),
            category: None,
            radius_m: config.default_radius_m,
        }
    }
}

/// Latest issued request tag per kind of provider call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogGenerations {
    pub nearby: Generation,
    pub search: Generation,
    pub details: Generation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogState {
    pub spots: Vec<Spot>,
    pub nearby_spots: Vec<Spot>,
    /// Always exactly the spots in `spots` whose favorite flag is set.
    pub favorites: Vec<Spot>,
    pub search_results: Vec<Spot>,
    pub categories: Vec<SpotCategory>,
    pub selected_spot: Option<Spot>,
    pub spot_reviews: Vec<Review>,
    pub is_loading: bool,
    pub is_loading_reviews: bool,
    pub error: Option<String>,
    pub params: QueryParams,
    pub generations: CatalogGenerations,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CatalogAction {
    NearbyStarted(Generation),
    NearbyLoaded {
        generation: Generation,
        spots: Vec<Spot>,
    },
    NearbyFailed {
        generation: Generation,
        error: Error,
    },
    SearchStarted(Generation),
    SearchLoaded {
        generation: Generation,
        spots: Vec<Spot>,
    },
    SearchFailed {
        generation: Generation,
        error: Error,
    },
    DetailsStarted(Generation),
    DetailsLoaded {
        generation: Generation,
        details: SpotDetails,
    },
    DetailsFailed {
        generation: Generation,
        error: Error,
    },
    CategoriesLoaded(Vec<SpotCategory>),
    /// Flip the flag of a catalog spot.
    FavoriteToggled(String),
    /// Write a flag the provider has already confirmed.
    FavoriteSet {
        spot_id: String,
        favorite: bool,
    },
    Failed(Error),
    SetQueryParams {
        query: Option<String>,
        category: Option<Option<String>>,
        radius_m: Option<f64>,
    },
    SelectSpot(Option<Spot>),
    ClearSearchResults,
    ClearError,
}

impl Default for CatalogState {
    fn default() -> Self {
        Self::new(&CatalogConfig::default())
    }
}

impl CatalogState {
    pub fn new(config: &CatalogConfig) -> Self {
        Self {
            spots: Vec::new(),
            nearby_spots: Vec::new(),
            favorites: Vec::new(),
            search_results: Vec::new(),
            categories: Vec::new(),
            selected_spot: None,
            spot_reviews: Vec::new(),
            is_loading: false,
            is_loading_reviews: false,
            error: None,
            params: QueryParams::new(config),
            generations: CatalogGenerations::default(),
        }
    }

    pub fn spot(&self, spot_id: &str) -> Option<&Spot> {
        self.spots.iter().find(|s| s.id == spot_id)
    }

    pub fn is_favorite(&self, spot_id: &str) -> Option<bool> {
        self.spot(spot_id).map(|s| s.is_favorite)
    }

    /// Apply `action`. Returns `false` for a stale completion, which is
    /// dropped without touching the state.
    pub fn apply(&mut self, action: CatalogAction) -> bool {
        match action {
            CatalogAction::NearbyStarted(generation) => {
                self.generations.nearby = generation;
                self.begin_loading();
            }
            CatalogAction::NearbyLoaded { generation, spots } => {
                if generation != self.generations.nearby {
                    return false;
                }
                self.is_loading = false;
                self.nearby_spots = spots.clone();
                self.spots = spots;
                self.sync_favorites();
            }
            CatalogAction::NearbyFailed { generation, error } => {
                if generation != self.generations.nearby {
                    return false;
                }
                self.fail(error);
            }
            CatalogAction::SearchStarted(generation) => {
                self.generations.search = generation;
                self.begin_loading();
            }
            CatalogAction::SearchLoaded { generation, spots } => {
                if generation != self.generations.search {
                    return false;
                }
                self.is_loading = false;
                self.search_results = spots;
            }
            CatalogAction::SearchFailed { generation, error } => {
                if generation != self.generations.search {
                    return false;
                }
                self.fail(error);
            }
            CatalogAction::DetailsStarted(generation) => {
                self.generations.details = generation;
                self.is_loading_reviews = true;
                self.error = None;
            }
            CatalogAction::DetailsLoaded {
                generation,
                details,
            } => {
                if generation != self.generations.details {
                    return false;
                }
                self.is_loading_reviews = false;
                let mut spot = details.spot;
                if let Some(known) = self.spot(&spot.id) {
                    spot.distance = known.distance;
                    spot.is_favorite = known.is_favorite;
                }
                self.selected_spot = Some(spot);
                self.spot_reviews = details.reviews;
            }
            CatalogAction::DetailsFailed { generation, error } => {
                if generation != self.generations.details {
                    return false;
                }
                self.is_loading_reviews = false;
                self.error = Some(error.to_string());
            }
            CatalogAction::CategoriesLoaded(categories) => {
                self.categories = categories;
            }
            CatalogAction::FavoriteToggled(spot_id) => {
                let favorite = !self.is_favorite(&spot_id).unwrap_or_default();
                self.set_favorite(&spot_id, favorite);
            }
            CatalogAction::FavoriteSet { spot_id, favorite } => {
                self.set_favorite(&spot_id, favorite);
            }
            CatalogAction::Failed(error) => {
                self.error = Some(error.to_string());
            }
            CatalogAction::SetQueryParams {
                query,
                category,
                radius_m,
            } => {
                if let Some(query) = query {
                    self.params.query = query;
                }
                if let Some(category) = category {
                    self.params.category = category;
                }
                if let Some(radius_m) = radius_m {
                    self.params.radius_m = radius_m;
                }
            }
            CatalogAction::SelectSpot(spot) => {
                self.selected_spot = spot;
            }
            CatalogAction::ClearSearchResults => {
                self.search_results.clear();
                self.params.query.clear();
            }
            CatalogAction::ClearError => {
                self.error = None;
            }
        }
        true
    }

    fn begin_loading(&mut self) {
        self.is_loading = true;
        self.error = None;
    }

    fn fail(&mut self, error: Error) {
        self.is_loading = false;
        self.error = Some(error.to_string());
    }

    fn set_favorite(&mut self, spot_id: &str, favorite: bool) {
        let Some(spot) = self.spots.iter_mut().find(|s| s.id == spot_id) else {
            self.error = Some(Error::NotFound(spot_id.to_string()).to_string());
            return;
        };
        spot.is_favorite = favorite;

        // Keep the other views of the same spot in step with the catalog.
        for copy in self
            .nearby_spots
            .iter_mut()
            .chain(self.search_results.iter_mut())
            .chain(self.selected_spot.iter_mut())
            .filter(|s| s.id == spot_id)
        {
            copy.is_favorite = favorite;
        }
        self.sync_favorites();
    }

    fn sync_favorites(&mut self) {
        self.favorites = self
            .spots
            .iter()
            .filter(|s| s.is_favorite)
            .cloned()
            .collect();
    }
}
