use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tokio::fs as async_fs;

use crate::core::{location::LocationState, spots::CatalogState};

/// Both state containers at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(with = "time::serde::rfc3339")]
    pub taken_at: OffsetDateTime,
    pub location: LocationState,
    pub catalog: CatalogState,
}

impl Snapshot {
    pub fn new(location: LocationState, catalog: CatalogState) -> Self {
        Self {
            taken_at: OffsetDateTime::now_utc(),
            location,
            catalog,
        }
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub async fn save<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let path = path.as_ref();
        async_fs::write(path, self.to_json()?)
            .await
            .with_context(|| format!("Failed to write snapshot {:?}", path))
    }

    pub async fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = async_fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read snapshot {:?}", path))?;
        serde_json::from_str(&raw).with_context(|| format!("Invalid snapshot {:?}", path))
    }
}
