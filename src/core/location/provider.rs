use std::time::Duration;

use tokio::sync::{mpsc, oneshot};

use crate::core::location::model::{LocationSample, PermissionStatus, WatchId};

/// Options for a one-shot position fix.
#[derive(Debug, Clone, Copy)]
pub struct FixOptions {
    /// A cached fix no older than this may be returned instead of a fresh one.
    pub max_age: Duration,
}

/// Delivery policy for a continuous watch.
#[derive(Debug, Clone, Copy)]
pub struct WatchOptions {
    pub min_interval: Duration,
    pub min_distance_m: f64,
    pub buffer: usize,
}

impl WatchOptions {
    /// Whether `candidate` should be delivered given the last delivered sample
    /// and the time elapsed since then. Whichever threshold is reached first wins.
    pub fn should_emit(
        &self,
        last: Option<&LocationSample>,
        elapsed: Duration,
        candidate: &LocationSample,
    ) -> bool {
        let Some(last) = last else {
            return true;
        };
        if elapsed >= self.min_interval {
            return true;
        }
        last.coordinates().distance_to(&candidate.coordinates()) >= self.min_distance_m
    }
}

/// The device's location service.
pub trait LocationProvider {
    fn request_permission(&self) -> impl Future<Output = anyhow::Result<PermissionStatus>>;
    fn is_service_enabled(&self) -> impl Future<Output = anyhow::Result<bool>>;
    fn current_fix(&self, options: FixOptions) -> impl Future<Output = anyhow::Result<LocationSample>>;
    fn watch(&self, options: WatchOptions) -> impl Future<Output = anyhow::Result<WatchSubscription>>;
}

/// A running background watch.
///
/// Samples arrive on a bounded channel, so a slow consumer holds the producer
/// back instead of piling up readings. Dropping the subscription cancels it.
#[derive(Debug)]
pub struct WatchSubscription {
    id: WatchId,
    samples: mpsc::Receiver<LocationSample>,
    canceller: WatchCanceller,
}

impl WatchSubscription {
    /// Create a subscription together with the producer ends a provider feeds:
    /// the sample sender and the receiver that fires on cancellation.
    pub fn channel(
        buffer: usize,
    ) -> (Self, mpsc::Sender<LocationSample>, oneshot::Receiver<()>) {
        let (sample_tx, samples) = mpsc::channel(buffer.max(1));
        let (cancel_tx, cancel_rx) = oneshot::channel();
        let subscription = Self {
            id: WatchId::new(),
            samples,
            canceller: WatchCanceller(Some(cancel_tx)),
        };
        (subscription, sample_tx, cancel_rx)
    }

    pub fn id(&self) -> WatchId {
        self.id
    }

    /// Next delivered sample, or `None` once the watch has ended.
    pub async fn recv(&mut self) -> Option<LocationSample> {
        self.samples.recv().await
    }

    pub fn cancel(&mut self) -> bool {
        self.canceller.cancel()
    }

    pub fn into_parts(self) -> (WatchId, mpsc::Receiver<LocationSample>, WatchCanceller) {
        (self.id, self.samples, self.canceller)
    }
}

/// Releases the underlying device subscription.
#[derive(Debug)]
pub struct WatchCanceller(Option<oneshot::Sender<()>>);

impl WatchCanceller {
    /// Returns `false` if the watch was already cancelled or had ended.
    pub fn cancel(&mut self) -> bool {
        match self.0.take() {
            Some(tx) => tx.send(()).is_ok(),
            None => false,
        }
    }
}

impl Drop for WatchCanceller {
    fn drop(&mut self) {
        self.cancel();
    }
}
