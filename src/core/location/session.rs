use std::sync::Arc;

use time::OffsetDateTime;
use tokio::{
    sync::{Mutex, RwLock},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

use crate::core::{
    config::LocationConfig,
    error::{Error, Result},
    location::{
        model::{LocationSample, MapRegion, WatchId},
        provider::{FixOptions, LocationProvider, WatchCanceller, WatchOptions},
        state::{LocationAction, LocationState},
    },
};

/// Owns the location state container and runs the provider-backed tasks
/// that feed it.
///
/// Every task follows the same shape: dispatch a "started" action, await the
/// provider, dispatch the completion. One-shot acquisitions are tagged with a
/// [`Generation`](crate::core::generation::Generation) so that when two calls
/// overlap only the most recently issued one lands in the state.
pub struct LocationSession<P> {
    provider: P,
    config: LocationConfig,
    state: Arc<RwLock<LocationState>>,
    watch: Mutex<Option<ActiveWatch>>,
}

struct ActiveWatch {
    id: WatchId,
    canceller: WatchCanceller,
    forwarder: JoinHandle<()>,
}

impl Drop for ActiveWatch {
    fn drop(&mut self) {
        self.canceller.cancel();
        self.forwarder.abort();
    }
}

impl<P: LocationProvider> LocationSession<P> {
    pub fn new(provider: P, config: LocationConfig) -> Self {
        let state = LocationState::new(&config);
        Self {
            provider,
            config,
            state: Arc::new(RwLock::new(state)),
            watch: Mutex::new(None),
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn config(&self) -> &LocationConfig {
        &self.config
    }

    /// A copy of the current state.
    pub async fn snapshot(&self) -> LocationState {
        self.state.read().await.clone()
    }

    /// Apply an action directly. Returns `false` if it was discarded as stale.
    pub async fn dispatch(&self, action: LocationAction) -> bool {
        self.state.write().await.apply(action)
    }

    /// Ask for foreground location access and check the platform service.
    pub async fn request_permission(&self) -> Result<()> {
        self.dispatch(LocationAction::PermissionRequested).await;

        let granted = match self.provider.request_permission().await {
            Ok(status) => status.is_granted(),
            Err(e) => {
                warn!("permission request failed: {e:#}");
                false
            }
        };
        if !granted {
            return self.reject_permission(Error::PermissionDenied).await;
        }

        let enabled = match self.provider.is_service_enabled().await {
            Ok(enabled) => enabled,
            Err(e) => {
                warn!("service status check failed: {e:#}");
                false
            }
        };
        if !enabled {
            return self.reject_permission(Error::ServiceDisabled).await;
        }

        self.dispatch(LocationAction::PermissionGranted).await;
        debug!("location permission granted");
        Ok(())
    }

    async fn reject_permission(&self, error: Error) -> Result<()> {
        warn!(%error, "location permission rejected");
        self.dispatch(LocationAction::PermissionRejected(error.clone())).await;
        Err(error)
    }

    /// Take a single fix, reusing a cached one within the configured max age.
    ///
    /// The first successful fix also centers the viewport. On failure the
    /// previous sample and viewport stay as they were.
    pub async fn acquire_once(&self) -> Result<LocationSample> {
        let generation = {
            let mut state = self.state.write().await;
            if !state.can_locate() {
                state.apply(LocationAction::Refused(Error::PermissionDenied));
                return Err(Error::PermissionDenied);
            }
            let generation = state.acquire_generation.next();
            state.apply(LocationAction::AcquireStarted(generation));
            generation
        };

        let options = FixOptions {
            max_age: self.config.fix_max_age,
        };
        match self.provider.current_fix(options).await {
            Ok(sample) => {
                let applied = self
                    .dispatch(LocationAction::Acquired {
                        generation,
                        sample,
                        at: OffsetDateTime::now_utc(),
                    })
                    .await;
                if applied {
                    info!(%generation, lat = sample.latitude, lng = sample.longitude, "location acquired");
                } else {
                    debug!(%generation, "discarding superseded fix");
                }
                Ok(sample)
            }
            Err(e) => {
                let error = Error::acquisition(e);
                warn!(%generation, %error, "location acquisition failed");
                self.dispatch(LocationAction::AcquireFailed {
                    generation,
                    error: error.clone(),
                })
                .await;
                Err(error)
            }
        }
    }

    /// Start continuous updates. Samples replace the current one as they
    /// arrive but never move the viewport.
    ///
    /// An already running watch is released first.
    pub async fn start_watch(&self) -> Result<WatchId> {
        if !self.state.read().await.can_locate() {
            self.dispatch(LocationAction::Refused(Error::PermissionDenied))
                .await;
            return Err(Error::PermissionDenied);
        }

        let mut active = self.watch.lock().await;
        if let Some(previous) = active.take() {
            debug!(watch_id = %previous.id, "replacing running watch");
            drop(previous);
            self.dispatch(LocationAction::WatchStopped).await;
        }

        let options = WatchOptions {
            min_interval: self.config.watch_interval,
            min_distance_m: self.config.watch_distance_m,
            buffer: self.config.sample_buffer,
        };
        let subscription = match self.provider.watch(options).await {
            Ok(subscription) => subscription,
            Err(e) => {
                let error = Error::watch_start(e);
                warn!(%error, "could not start location watch");
                self.dispatch(LocationAction::WatchStartFailed(error.clone()))
                    .await;
                return Err(error);
            }
        };

        let (id, mut samples, canceller) = subscription.into_parts();
        // Record the handle before the forwarder can observe the state.
        self.dispatch(LocationAction::WatchStarted(id)).await;

        let state = Arc::clone(&self.state);
        let forwarder = tokio::spawn(async move {
            while let Some(sample) = samples.recv().await {
                let mut state = state.write().await;
                if state.watch_id != Some(id) {
                    break;
                }
                state.apply(LocationAction::WatchSample {
                    sample,
                    at: OffsetDateTime::now_utc(),
                });
            }
            debug!(watch_id = %id, "watch stream closed");
        });

        *active = Some(ActiveWatch {
            id,
            canceller,
            forwarder,
        });
        info!(watch_id = %id, "location watch started");
        Ok(id)
    }

    /// Cancel the running watch, if any. Returns whether one was running.
    pub async fn stop_watch(&self) -> bool {
        let Some(active) = self.watch.lock().await.take() else {
            return false;
        };
        let id = active.id;
        drop(active);
        self.dispatch(LocationAction::WatchStopped).await;
        info!(watch_id = %id, "location watch stopped");
        true
    }

    pub async fn set_viewport(&self, region: MapRegion) {
        self.dispatch(LocationAction::SetViewport(region)).await;
    }

    /// Push a sample obtained outside of this session's own tasks.
    pub async fn update_location(&self, sample: LocationSample) {
        self.dispatch(LocationAction::SampleReceived {
            sample,
            at: OffsetDateTime::now_utc(),
        })
        .await;
    }

    /// Forget the sample, viewport, timestamp and error. Permission and
    /// service flags describe the device and are kept.
    pub async fn reset(&self) {
        self.dispatch(LocationAction::Reset).await;
    }

    pub async fn clear_error(&self) {
        self.dispatch(LocationAction::ClearError).await;
    }
}
