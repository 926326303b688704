use std::{
    collections::{BTreeSet, HashMap, HashSet},
    path::Path,
    sync::Arc,
};

use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};
use time::macros::datetime;
use tokio::{fs as async_fs, sync::RwLock};

use crate::core::{
    geo::Coordinates,
    spots::{
        model::{Review, ReviewAuthor, Spot, SpotCategory, SpotDetails, SpotMetadata},
        provider::{SearchFilters, SpotProvider},
    },
};

/// On-disk layout accepted by [`InMemorySpotProvider::from_json_file`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub categories: Vec<SpotCategory>,
    pub spots: Vec<Spot>,
    #[serde(default)]
    pub reviews: Vec<Review>,
}

/// A spot provider backed by a fixed in-process catalog.
///
/// Favorites and reviews are remembered for the lifetime of the provider.
/// Clones share the same data.
#[derive(Debug, Clone)]
pub struct InMemorySpotProvider {
    inner: Arc<RwLock<Inner>>,
}

#[derive(Debug)]
struct Inner {
    spots: Vec<Spot>,
    categories: Vec<SpotCategory>,
    reviews: HashMap<String, Vec<Review>>,
    favorites: HashSet<String>,
    failure: Option<String>,
}

impl InMemorySpotProvider {
    pub fn new(file: CatalogFile) -> anyhow::Result<Self> {
        let mut seen = HashSet::new();
        for spot in &file.spots {
            if !seen.insert(spot.id.as_str()) {
                bail!("duplicate spot id {:?}", spot.id);
            }
        }

        let favorites = file
            .spots
            .iter()
            .filter(|s| s.is_favorite)
            .map(|s| s.id.clone())
            .collect();
        let mut reviews: HashMap<String, Vec<Review>> = HashMap::new();
        for review in file.reviews {
            if !seen.contains(review.spot_id.as_str()) {
                bail!("review {:?} refers to unknown spot {:?}", review.id, review.spot_id);
            }
            reviews.entry(review.spot_id.clone()).or_default().push(review);
        }

        Ok(Self {
            inner: Arc::new(RwLock::new(Inner {
                spots: file.spots,
                categories: file.categories,
                reviews,
                favorites,
                failure: None,
            })),
        })
    }

    pub async fn from_json_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = async_fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read spot catalog {:?}", path))?;
        let file: CatalogFile = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid spot catalog {:?}", path))?;
        Self::new(file)
    }

    /// The built-in catalog of central Tokyo sights.
    pub fn tokyo() -> Self {
        let inner = Inner {
            spots: tokyo_spots(),
            categories: tokyo_categories(),
            reviews: tokyo_reviews()
                .into_iter()
                .fold(HashMap::new(), |mut acc: HashMap<String, Vec<Review>>, r| {
                    acc.entry(r.spot_id.clone()).or_default().push(r);
                    acc
                }),
            favorites: HashSet::new(),
            failure: None,
        };
        Self {
            inner: Arc::new(RwLock::new(inner)),
        }
    }

    /// Make every subsequent request fail with `message`, or recover with `None`.
    pub async fn set_failure(&self, message: Option<&str>) {
        self.inner.write().await.failure = message.map(str::to_string);
    }

    /// Append a review. Reviews are never edited or removed.
    pub async fn add_review(&self, review: Review) -> anyhow::Result<()> {
        let mut inner = self.inner.write().await;
        if !inner.spots.iter().any(|s| s.id == review.spot_id) {
            bail!("unknown spot {:?}", review.spot_id);
        }
        inner
            .reviews
            .entry(review.spot_id.clone())
            .or_default()
            .push(review);
        Ok(())
    }

    pub async fn spot_count(&self) -> usize {
        self.inner.read().await.spots.len()
    }
}

impl Inner {
    fn check(&self) -> anyhow::Result<()> {
        match &self.failure {
            Some(message) => bail!("{message}"),
            None => Ok(()),
        }
    }

    fn present(&self, spot: &Spot) -> Spot {
        let mut spot = spot.clone();
        spot.is_favorite = self.favorites.contains(&spot.id);
        spot
    }
}

impl SpotProvider for InMemorySpotProvider {
    async fn nearby(&self, center: Coordinates, radius_m: f64) -> anyhow::Result<Vec<Spot>> {
        let inner = self.inner.read().await;
        inner.check()?;
        let mut found: Vec<Spot> = inner
            .spots
            .iter()
            .filter_map(|s| {
                let distance = center.distance_to(&s.coordinates);
                (distance <= radius_m).then(|| {
                    let mut spot = inner.present(s);
                    spot.distance = Some(distance);
                    spot
                })
            })
            .collect();
        found.sort_by(|a, b| {
            a.distance
                .unwrap_or_default()
                .total_cmp(&b.distance.unwrap_or_default())
        });
        Ok(found)
    }

    async fn details(&self, spot_id: &str) -> anyhow::Result<Option<SpotDetails>> {
        let inner = self.inner.read().await;
        inner.check()?;
        let Some(spot) = inner.spots.iter().find(|s| s.id == spot_id) else {
            return Ok(None);
        };
        let mut reviews = inner.reviews.get(spot_id).cloned().unwrap_or_default();
        reviews.sort_by_key(|r| r.created_at);
        Ok(Some(SpotDetails {
            spot: inner.present(spot),
            reviews,
        }))
    }

    async fn search(&self, query: &str, filters: &SearchFilters) -> anyhow::Result<Vec<Spot>> {
        let inner = self.inner.read().await;
        inner.check()?;
        if query.is_empty() && filters.category.is_none() {
            return Ok(Vec::new());
        }
        Ok(inner
            .spots
            .iter()
            .filter(|s| query.is_empty() || s.matches_text(query))
            .filter(|s| {
                filters
                    .category
                    .as_ref()
                    .is_none_or(|c| &s.category.id == c)
            })
            .filter(|s| match (filters.location, filters.radius_m) {
                (Some(center), Some(radius_m)) => center.distance_to(&s.coordinates) <= radius_m,
                _ => true,
            })
            .map(|s| inner.present(s))
            .collect())
    }

    async fn set_favorite(&self, spot_id: &str, favorite: bool) -> anyhow::Result<bool> {
        let mut inner = self.inner.write().await;
        inner.check()?;
        if !inner.spots.iter().any(|s| s.id == spot_id) {
            return Ok(false);
        }
        if favorite {
            inner.favorites.insert(spot_id.to_string());
        } else {
            inner.favorites.remove(spot_id);
        }
        Ok(true)
    }

    async fn categories(&self) -> anyhow::Result<Vec<SpotCategory>> {
        let inner = self.inner.read().await;
        inner.check()?;
        Ok(inner.categories.clone())
    }
}

fn tokyo_categories() -> Vec<SpotCategory> {
    vec![
        SpotCategory::new("landmark", "ランドマーク", "landmark", "#FF6B6B"),
        SpotCategory::new("restaurant", "レストラン", "restaurant", "#FF9800"),
        SpotCategory::new("tourist", "観光地", "camera", "#2196F3"),
        SpotCategory::new("park", "公園", "leaf", "#4CAF50"),
        SpotCategory::new("shopping", "ショッピング", "bag", "#9C27B0"),
        SpotCategory::new("museum", "博物館", "library", "#795548"),
        SpotCategory::new("temple", "寺社", "home", "#F44336"),
    ]
}

fn category(id: &str) -> SpotCategory {
    tokyo_categories()
        .into_iter()
        .find(|c| c.id == id)
        .unwrap_or_else(|| SpotCategory::new(id, id, "pin", "#9E9E9E"))
}

struct Seed<'a> {
    id: &'a str,
    name: &'a str,
    description: &'a str,
    at: (f64, f64),
    category: &'a str,
    rating: f32,
    address: &'a str,
    tags: &'a [&'a str],
    hours: Option<&'a str>,
}

impl Seed<'_> {
    fn into_spot(self) -> Spot {
        Spot {
            id: self.id.to_string(),
            name: self.name.to_string(),
            description: self.description.to_string(),
            coordinates: Coordinates::new(self.at.0, self.at.1),
            category: category(self.category),
            rating: self.rating,
            images: vec![format!("https://example.com/spots/{}.jpg", self.id)],
            address: self.address.to_string(),
            metadata: SpotMetadata {
                opening_hours: self.hours.map(str::to_string),
                ..SpotMetadata::default()
            },
            tags: self.tags.iter().map(|t| t.to_string()).collect::<BTreeSet<_>>(),
            distance: None,
            is_favorite: false,
        }
    }
}

fn tokyo_spots() -> Vec<Spot> {
    [
        Seed {
            id: "1",
            name: "東京タワー",
            description: "東京のシンボルタワー",
            at: (35.6586, 139.7454),
            category: "landmark",
            rating: 4.5,
            address: "東京都港区芝公園4-2-8",
            tags: &["観光", "ランドマーク", "展望"],
            hours: Some("9:00-23:00"),
        },
        Seed {
            id: "2",
            name: "浅草寺",
            description: "都内最古の寺院",
            at: (35.7148, 139.7967),
            category: "temple",
            rating: 4.7,
            address: "東京都台東区浅草2-3-1",
            tags: &["寺社", "観光", "歴史"],
            hours: Some("6:00-17:00"),
        },
        Seed {
            id: "3",
            name: "上野動物園",
            description: "日本で最初の動物園",
            at: (35.7165, 139.7713),
            category: "tourist",
            rating: 4.3,
            address: "東京都台東区上野公園9-83",
            tags: &["動物", "家族", "観光"],
            hours: Some("9:30-17:00"),
        },
        Seed {
            id: "4",
            name: "新宿御苑",
            description: "都心に広がる庭園",
            at: (35.6852, 139.7100),
            category: "park",
            rating: 4.6,
            address: "東京都新宿区内藤町11",
            tags: &["公園", "桜", "庭園"],
            hours: Some("9:00-16:30"),
        },
        Seed {
            id: "5",
            name: "増上寺",
            description: "東京タワーを望む浄土宗の大本山",
            at: (35.6574, 139.7484),
            category: "temple",
            rating: 4.4,
            address: "東京都港区芝公園4-7-35",
            tags: &["寺社", "歴史"],
            hours: None,
        },
        Seed {
            id: "6",
            name: "東京国立博物館",
            description: "日本最古の博物館",
            at: (35.7188, 139.7765),
            category: "museum",
            rating: 4.5,
            address: "東京都台東区上野公園13-9",
            tags: &["博物館", "美術", "歴史"],
            hours: Some("9:30-17:00"),
        },
    ]
    .into_iter()
    .map(Seed::into_spot)
    .collect()
}

fn tokyo_reviews() -> Vec<Review> {
    let author = |id: &str, name: &str| ReviewAuthor {
        user_id: id.to_string(),
        user_name: name.to_string(),
        avatar: None,
    };
    vec![
        Review {
            id: "r1".to_string(),
            author: author("u1", "さくら"),
            spot_id: "1".to_string(),
            rating: 5.0,
            comment: "夜景がきれいでした".to_string(),
            created_at: datetime!(2024-03-02 19:30 UTC),
        },
        Review {
            id: "r2".to_string(),
            author: author("u2", "ken"),
            spot_id: "1".to_string(),
            rating: 4.0,
            comment: "展望台は混んでいたけど眺めは最高".to_string(),
            created_at: datetime!(2024-04-11 13:05 UTC),
        },
        Review {
            id: "r3".to_string(),
            author: author("u1", "さくら"),
            spot_id: "2".to_string(),
            rating: 5.0,
            comment: "雷門から仲見世まで楽しめる".to_string(),
            created_at: datetime!(2024-05-20 10:00 UTC),
        },
    ]
}
