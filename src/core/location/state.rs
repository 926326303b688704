use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::core::{
    config::LocationConfig,
    error::Error,
    generation::Generation,
    location::model::{LocationSample, MapRegion, WatchId},
};

/// Where the session sits in the acquisition lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LocationPhase {
    #[default]
    Idle,
    PermissionRequested,
    PermissionGranted,
    PermissionDenied,
    Acquiring,
    Acquired,
    AcquisitionFailed,
    Watching,
}

/// Everything the presentation layer reads about the device location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationState {
    pub current: Option<LocationSample>,
    pub has_permission: bool,
    pub service_enabled: bool,
    pub is_loading: bool,
    pub error: Option<String>,
    pub watch_id: Option<WatchId>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_updated: Option<OffsetDateTime>,
    pub map_region: Option<MapRegion>,
    pub phase: LocationPhase,
    pub acquire_generation: Generation,
    region_delta: f64,
}

/// State transitions. Produced either directly by the caller or by a
/// session task when a provider call completes.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationAction {
    PermissionRequested,
    PermissionGranted,
    PermissionRejected(Error),
    AcquireStarted(Generation),
    Acquired {
        generation: Generation,
        sample: LocationSample,
        at: OffsetDateTime,
    },
    AcquireFailed {
        generation: Generation,
        error: Error,
    },
    /// An operation was refused before reaching the device.
    Refused(Error),
    WatchStarted(WatchId),
    WatchStartFailed(Error),
    WatchSample {
        sample: LocationSample,
        at: OffsetDateTime,
    },
    WatchStopped,
    SampleReceived {
        sample: LocationSample,
        at: OffsetDateTime,
    },
    SetViewport(MapRegion),
    Reset,
    ClearError,
}

impl Default for LocationState {
    fn default() -> Self {
        Self::new(&LocationConfig::default())
    }
}

impl LocationState {
    pub fn new(config: &LocationConfig) -> Self {
        Self {
            current: None,
            has_permission: false,
            service_enabled: false,
            is_loading: false,
            error: None,
            watch_id: None,
            last_updated: None,
            map_region: None,
            phase: LocationPhase::Idle,
            acquire_generation: Generation::default(),
            region_delta: config.initial_region_delta,
        }
    }

    /// Permission granted and the platform service switched on.
    pub fn can_locate(&self) -> bool {
        self.has_permission && self.service_enabled
    }

    pub fn is_watching(&self) -> bool {
        self.watch_id.is_some()
    }

    /// Apply `action` to the state.
    ///
    /// Returns `false` when the action was a stale completion and got
    /// discarded without touching anything.
    pub fn apply(&mut self, action: LocationAction) -> bool {
        match action {
            LocationAction::PermissionRequested => {
                self.is_loading = true;
                self.error = None;
                self.phase = LocationPhase::PermissionRequested;
            }
            LocationAction::PermissionGranted => {
                self.is_loading = false;
                self.has_permission = true;
                self.service_enabled = true;
                self.error = None;
                self.phase = LocationPhase::PermissionGranted;
            }
            LocationAction::PermissionRejected(error) => {
                self.is_loading = false;
                self.has_permission = false;
                self.service_enabled = false;
                self.error = Some(error.to_string());
                self.phase = LocationPhase::PermissionDenied;
            }
            LocationAction::AcquireStarted(generation) => {
                self.acquire_generation = generation;
                self.is_loading = true;
                self.error = None;
                self.phase = LocationPhase::Acquiring;
            }
            LocationAction::Acquired {
                generation,
                sample,
                at,
            } => {
                if generation != self.acquire_generation {
                    return false;
                }
                self.is_loading = false;
                self.record_sample(sample, at);
                self.bootstrap_region(&sample);
                self.phase = self.settled_phase();
            }
            LocationAction::AcquireFailed { generation, error } => {
                if generation != self.acquire_generation {
                    return false;
                }
                self.is_loading = false;
                self.error = Some(error.to_string());
                self.phase = if self.is_watching() {
                    LocationPhase::Watching
                } else {
                    LocationPhase::AcquisitionFailed
                };
            }
            LocationAction::Refused(error) => {
                self.is_loading = false;
                self.error = Some(error.to_string());
            }
            LocationAction::WatchStarted(id) => {
                self.watch_id = Some(id);
                self.phase = LocationPhase::Watching;
            }
            LocationAction::WatchStartFailed(error) => {
                self.watch_id = None;
                self.error = Some(error.to_string());
            }
            LocationAction::WatchSample { sample, at } => {
                self.record_sample(sample, at);
            }
            LocationAction::WatchStopped => {
                self.watch_id = None;
                if self.phase == LocationPhase::Watching {
                    self.phase = self.settled_phase();
                }
            }
            LocationAction::SampleReceived { sample, at } => {
                self.record_sample(sample, at);
                self.bootstrap_region(&sample);
            }
            LocationAction::SetViewport(region) => {
                self.map_region = Some(region);
            }
            LocationAction::Reset => {
                self.current = None;
                self.map_region = None;
                self.last_updated = None;
                self.error = None;
                if matches!(
                    self.phase,
                    LocationPhase::Acquired | LocationPhase::AcquisitionFailed
                ) {
                    self.phase = LocationPhase::PermissionGranted;
                }
            }
            LocationAction::ClearError => {
                self.error = None;
            }
        }
        true
    }

    fn record_sample(&mut self, sample: LocationSample, at: OffsetDateTime) {
        self.current = Some(sample);
        self.last_updated = Some(at);
    }

    // The viewport follows only the first fix; later fixes move the marker.
    fn bootstrap_region(&mut self, sample: &LocationSample) {
        if self.map_region.is_none() {
            self.map_region = Some(MapRegion::centered_on(sample, self.region_delta));
        }
    }

    fn settled_phase(&self) -> LocationPhase {
        if self.is_watching() {
            LocationPhase::Watching
        } else if self.current.is_some() {
            LocationPhase::Acquired
        } else if self.can_locate() {
            LocationPhase::PermissionGranted
        } else {
            LocationPhase::Idle
        }
    }
}
