use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use anyhow::bail;
use tokio::{
    sync::Mutex,
    time::{Instant, interval, sleep},
};
use tracing::trace;

use crate::core::location::{
    model::{LocationSample, PermissionStatus},
    provider::{FixOptions, LocationProvider, WatchOptions, WatchSubscription},
};

/// A scripted device. It walks a fixed route, one point per fix or per watch
/// tick, and stays on the last point once the route is exhausted.
#[derive(Debug, Clone)]
pub struct SimulatedLocationProvider {
    permission: PermissionStatus,
    service_enabled: bool,
    route: Arc<Vec<LocationSample>>,
    fix_latencies: Arc<Vec<Duration>>,
    fix_failure: Option<String>,
    watch_failure: Option<String>,
    tick: Duration,
    cursor: Arc<AtomicUsize>,
    cache: Arc<Mutex<Option<(Instant, LocationSample)>>>,
    counters: Arc<Counters>,
}

#[derive(Debug, Default)]
struct Counters {
    permission_requests: AtomicUsize,
    fix_requests: AtomicUsize,
    watch_requests: AtomicUsize,
    active_watches: AtomicUsize,
}

impl SimulatedLocationProvider {
    /// A device parked at `sample` with permission granted.
    pub fn at(sample: LocationSample) -> Self {
        Self::with_route(vec![sample])
    }

    pub fn with_route(route: Vec<LocationSample>) -> Self {
        Self {
            permission: PermissionStatus::Granted,
            service_enabled: true,
            route: Arc::new(route),
            fix_latencies: Arc::new(Vec::new()),
            fix_failure: None,
            watch_failure: None,
            tick: Duration::from_secs(1),
            cursor: Arc::new(AtomicUsize::new(0)),
            cache: Arc::new(Mutex::new(None)),
            counters: Arc::new(Counters::default()),
        }
    }

    pub fn with_permission(mut self, permission: PermissionStatus) -> Self {
        self.permission = permission;
        self
    }

    pub fn with_service_enabled(mut self, enabled: bool) -> Self {
        self.service_enabled = enabled;
        self
    }

    /// Delay for the n-th fresh fix; the last entry applies to later fixes.
    pub fn with_fix_latencies(mut self, latencies: Vec<Duration>) -> Self {
        self.fix_latencies = Arc::new(latencies);
        self
    }

    pub fn failing_fixes(mut self, message: impl Into<String>) -> Self {
        self.fix_failure = Some(message.into());
        self
    }

    pub fn failing_watch(mut self, message: impl Into<String>) -> Self {
        self.watch_failure = Some(message.into());
        self
    }

    /// How often the watch loop samples the route.
    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    pub fn permission_requests(&self) -> usize {
        self.counters.permission_requests.load(Ordering::SeqCst)
    }

    pub fn fix_requests(&self) -> usize {
        self.counters.fix_requests.load(Ordering::SeqCst)
    }

    pub fn watch_requests(&self) -> usize {
        self.counters.watch_requests.load(Ordering::SeqCst)
    }

    /// Number of watch loops still running on the device.
    pub fn active_watches(&self) -> usize {
        self.counters.active_watches.load(Ordering::SeqCst)
    }

    fn advance(&self) -> Option<(usize, LocationSample)> {
        next_point(&self.route, &self.cursor)
    }
}

fn next_point(route: &[LocationSample], cursor: &AtomicUsize) -> Option<(usize, LocationSample)> {
    let last = route.len().checked_sub(1)?;
    let n = cursor.fetch_add(1, Ordering::SeqCst);
    Some((n, route[n.min(last)]))
}

impl LocationProvider for SimulatedLocationProvider {
    async fn request_permission(&self) -> anyhow::Result<PermissionStatus> {
        self.counters
            .permission_requests
            .fetch_add(1, Ordering::SeqCst);
        Ok(self.permission)
    }

    async fn is_service_enabled(&self) -> anyhow::Result<bool> {
        Ok(self.service_enabled)
    }

    async fn current_fix(&self, options: FixOptions) -> anyhow::Result<LocationSample> {
        self.counters.fix_requests.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.fix_failure {
            bail!("{message}");
        }

        if let Some((taken_at, sample)) = *self.cache.lock().await {
            if taken_at.elapsed() <= options.max_age {
                trace!("serving cached fix");
                return Ok(sample);
            }
        }

        let Some((n, sample)) = self.advance() else {
            bail!("no position available");
        };
        let latency = self
            .fix_latencies
            .get(n)
            .or(self.fix_latencies.last())
            .copied()
            .unwrap_or_default();
        if !latency.is_zero() {
            sleep(latency).await;
        }

        *self.cache.lock().await = Some((Instant::now(), sample));
        Ok(sample)
    }

    async fn watch(&self, options: WatchOptions) -> anyhow::Result<WatchSubscription> {
        self.counters.watch_requests.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.watch_failure {
            bail!("{message}");
        }
        if self.route.is_empty() {
            bail!("no position available");
        }

        let (subscription, samples, mut cancelled) = WatchSubscription::channel(options.buffer);
        let route = Arc::clone(&self.route);
        let cursor = Arc::clone(&self.cursor);
        let counters = Arc::clone(&self.counters);
        let tick = self.tick;

        counters.active_watches.fetch_add(1, Ordering::SeqCst);
        tokio::spawn(async move {
            let mut ticker = interval(tick);
            let mut last: Option<(Instant, LocationSample)> = None;
            loop {
                tokio::select! {
                    _ = &mut cancelled => break,
                    _ = ticker.tick() => {
                        let Some((_, candidate)) = next_point(&route, &cursor) else {
                            break;
                        };
                        let elapsed = last.map(|(at, _)| at.elapsed()).unwrap_or_default();
                        if !options.should_emit(last.as_ref().map(|(_, s)| s), elapsed, &candidate) {
                            continue;
                        }
                        tokio::select! {
                            _ = &mut cancelled => break,
                            sent = samples.send(candidate) => {
                                if sent.is_err() {
                                    break;
                                }
                            }
                        }
                        last = Some((Instant::now(), candidate));
                    }
                }
            }
            counters.active_watches.fetch_sub(1, Ordering::SeqCst);
        });

        Ok(subscription)
    }
}
