use std::time::Duration;

/// Tunables for the location session.
#[derive(Debug, Clone)]
pub struct LocationConfig {
    /// How old a cached fix may be and still satisfy a one-shot acquisition.
    pub fix_max_age: Duration,
    /// Minimum time between samples delivered by a continuous watch.
    pub watch_interval: Duration,
    /// Minimum displacement in meters that triggers a watch sample early.
    pub watch_distance_m: f64,
    /// Latitude/longitude span of the viewport derived from the first fix.
    pub initial_region_delta: f64,
    /// Capacity of the bounded channel carrying watch samples.
    pub sample_buffer: usize,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            fix_max_age: Duration::from_secs(60),
            watch_interval: Duration::from_secs(30),
            watch_distance_m: 100.0,
            initial_region_delta: 0.01,
            sample_buffer: 16,
        }
    }
}

/// Tunables for the spot catalog.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub default_radius_m: f64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            default_radius_m: 5000.0,
        }
    }
}
