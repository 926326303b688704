use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::core::geo::Coordinates;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpotCategory {
    pub id: String,
    pub name: String,
    pub icon: String,
    pub color: String,
}

impl SpotCategory {
    pub fn new(id: &str, name: &str, icon: &str, color: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            icon: icon.to_string(),
            color: color.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpotMetadata {
    pub opening_hours: Option<String>,
    pub website: Option<String>,
    pub phone_number: Option<String>,
    pub price: Option<String>,
}

/// A point of interest. Identity is `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spot {
    pub id: String,
    pub name: String,
    pub description: String,
    pub coordinates: Coordinates,
    pub category: SpotCategory,
    pub rating: f32,
    #[serde(default)]
    pub images: Vec<String>,
    pub address: String,
    #[serde(default)]
    pub metadata: SpotMetadata,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    /// Meters from the point the catalog was last fetched around.
    #[serde(default)]
    pub distance: Option<f64>,
    #[serde(default)]
    pub is_favorite: bool,
}

impl Spot {
    /// Case-insensitive match against name, description, address and tags.
    pub fn matches_text(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.name.to_lowercase().contains(&needle)
            || self.description.to_lowercase().contains(&needle)
            || self.address.to_lowercase().contains(&needle)
            || self.tags.iter().any(|t| t.to_lowercase().contains(&needle))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewAuthor {
    pub user_id: String,
    pub user_name: String,
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: String,
    pub author: ReviewAuthor,
    pub spot_id: String,
    pub rating: f32,
    pub comment: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// A spot's full record as resolved by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpotDetails {
    pub spot: Spot,
    pub reviews: Vec<Review>,
}
