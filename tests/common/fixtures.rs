#![allow(dead_code)]

use std::{
    collections::{BTreeSet, VecDeque},
    sync::{Arc, Mutex},
    time::Duration,
};

use kimamani::core::location::{LocationSample, LocationSession, SimulatedLocationProvider};
use kimamani::core::spots::{
    InMemorySpotProvider, SearchFilters, Spot, SpotCatalog, SpotCategory, SpotDetails,
    SpotMetadata, SpotProvider,
};
use kimamani::{CatalogConfig, Coordinates, LocationConfig};

pub const TOKYO_TOWER: Coordinates = Coordinates {
    latitude: 35.6586,
    longitude: 139.7454,
};

pub const SENSOJI: Coordinates = Coordinates {
    latitude: 35.7148,
    longitude: 139.7967,
};

pub fn sample_at(coords: Coordinates) -> LocationSample {
    LocationSample::new(coords.latitude, coords.longitude)
}

/// A device route heading north from Tokyo Tower in ~55 m steps.
pub fn northbound_route(points: usize) -> Vec<LocationSample> {
    (0..points)
        .map(|i| LocationSample::new(TOKYO_TOWER.latitude + 0.0005 * i as f64, TOKYO_TOWER.longitude))
        .collect()
}

pub fn session_for(device: SimulatedLocationProvider) -> LocationSession<SimulatedLocationProvider> {
    LocationSession::new(device, LocationConfig::default())
}

/// A session whose permission request already went through.
pub async fn granted_session(
    device: SimulatedLocationProvider,
) -> LocationSession<SimulatedLocationProvider> {
    let session = session_for(device);
    session
        .request_permission()
        .await
        .expect("permission should be granted");
    session
}

pub fn tokyo_catalog() -> SpotCatalog<InMemorySpotProvider> {
    SpotCatalog::new(InMemorySpotProvider::tokyo(), CatalogConfig::default())
}

/// A catalog already loaded with the spots around Tokyo Tower.
pub async fn loaded_catalog() -> SpotCatalog<InMemorySpotProvider> {
    let catalog = tokyo_catalog();
    catalog
        .fetch_nearby(TOKYO_TOWER, 5000.0)
        .await
        .expect("nearby fetch should succeed");
    catalog
}

pub fn make_spot(id: &str, name: &str, coords: Coordinates) -> Spot {
    Spot {
        id: id.to_string(),
        name: name.to_string(),
        description: format!("{name} description"),
        coordinates: coords,
        category: SpotCategory::new("tourist", "観光地", "camera", "#2196F3"),
        rating: 4.0,
        images: Vec::new(),
        address: "東京都".to_string(),
        metadata: SpotMetadata::default(),
        tags: BTreeSet::new(),
        distance: None,
        is_favorite: false,
    }
}

/// Ids of the favorites collection, sorted.
pub fn favorite_ids(spots: &[Spot]) -> Vec<String> {
    let mut ids: Vec<String> = spots.iter().map(|s| s.id.clone()).collect();
    ids.sort();
    ids
}

/// Ids of catalog spots carrying the favorite flag, sorted.
pub fn flagged_ids(spots: &[Spot]) -> Vec<String> {
    let mut ids: Vec<String> = spots
        .iter()
        .filter(|s| s.is_favorite)
        .map(|s| s.id.clone())
        .collect();
    ids.sort();
    ids
}

/// Wraps the Tokyo catalog with artificial latency: a queue of per-call
/// delays for `nearby`, and a fixed delay after a favorite has been stored
/// but before it is confirmed.
#[derive(Debug, Clone)]
pub struct DelayedSpotProvider {
    pub inner: InMemorySpotProvider,
    nearby_latencies: Arc<Mutex<VecDeque<Duration>>>,
    favorite_latency: Duration,
}

impl DelayedSpotProvider {
    pub fn tokyo() -> Self {
        Self {
            inner: InMemorySpotProvider::tokyo(),
            nearby_latencies: Arc::new(Mutex::new(VecDeque::new())),
            favorite_latency: Duration::ZERO,
        }
    }

    pub fn with_nearby_latencies(self, latencies: Vec<Duration>) -> Self {
        *self.nearby_latencies.lock().unwrap() = latencies.into();
        self
    }

    pub fn with_favorite_latency(mut self, latency: Duration) -> Self {
        self.favorite_latency = latency;
        self
    }
}

impl SpotProvider for DelayedSpotProvider {
    async fn nearby(&self, center: Coordinates, radius_m: f64) -> anyhow::Result<Vec<Spot>> {
        let latency = self.nearby_latencies.lock().unwrap().pop_front();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        self.inner.nearby(center, radius_m).await
    }

    async fn details(&self, spot_id: &str) -> anyhow::Result<Option<SpotDetails>> {
        self.inner.details(spot_id).await
    }

    async fn search(&self, query: &str, filters: &SearchFilters) -> anyhow::Result<Vec<Spot>> {
        self.inner.search(query, filters).await
    }

    async fn set_favorite(&self, spot_id: &str, favorite: bool) -> anyhow::Result<bool> {
        let stored = self.inner.set_favorite(spot_id, favorite).await?;
        tokio::time::sleep(self.favorite_latency).await;
        Ok(stored)
    }

    async fn categories(&self) -> anyhow::Result<Vec<SpotCategory>> {
        self.inner.categories().await
    }
}

pub fn delayed_catalog(provider: DelayedSpotProvider) -> SpotCatalog<DelayedSpotProvider> {
    SpotCatalog::new(provider, CatalogConfig::default())
}
