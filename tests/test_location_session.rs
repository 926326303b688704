//! Integration tests for the one-shot side of the location session.
//!
//! Tests cover:
//! - Permission and service gating
//! - Single fixes, fix caching and the first-fix viewport
//! - Failure handling that keeps the previous sample
//! - Overlapping acquisitions resolved by request generation
//! - Reset, clear_error and externally injected samples

mod common;

use std::time::Duration;

use common::*;

#[tokio::test]
async fn test_request_permission_granted() -> anyhow::Result<()> {
    let session = session_for(SimulatedLocationProvider::at(sample_at(TOKYO_TOWER)));

    session.request_permission().await?;

    let state = session.snapshot().await;
    assert!(state.has_permission);
    assert!(state.service_enabled);
    assert!(!state.is_loading);
    assert_eq!(state.error, None);
    assert_eq!(state.phase, LocationPhase::PermissionGranted);
    Ok(())
}

#[tokio::test]
async fn test_permission_denied_clears_both_flags() {
    let device = SimulatedLocationProvider::at(sample_at(TOKYO_TOWER))
        .with_permission(PermissionStatus::Denied);
    let session = session_for(device);
    // Flags start out true to prove the failure resets them.
    session.dispatch(LocationAction::PermissionGranted).await;

    let result = session.request_permission().await;

    assert_eq!(result, Err(Error::PermissionDenied));
    let state = session.snapshot().await;
    assert!(!state.has_permission);
    assert!(!state.service_enabled);
    assert_eq!(state.error, Some(Error::PermissionDenied.to_string()));
    assert_eq!(state.error.as_deref(), Some("位置情報の許可が必要です"));
    assert_eq!(state.phase, LocationPhase::PermissionDenied);
}

#[tokio::test]
async fn test_service_disabled_clears_both_flags() {
    let device =
        SimulatedLocationProvider::at(sample_at(TOKYO_TOWER)).with_service_enabled(false);
    let session = session_for(device);
    session.dispatch(LocationAction::PermissionGranted).await;

    let result = session.request_permission().await;

    assert_eq!(result, Err(Error::ServiceDisabled));
    let state = session.snapshot().await;
    assert!(!state.has_permission);
    assert!(!state.service_enabled);
    assert_eq!(state.error, Some(Error::ServiceDisabled.to_string()));
    assert_eq!(state.error.as_deref(), Some("位置情報サービスが無効になっています"));
}

#[tokio::test]
async fn test_acquire_without_permission_never_reaches_device() {
    let device = SimulatedLocationProvider::at(sample_at(TOKYO_TOWER));
    let session = session_for(device.clone());

    let result = session.acquire_once().await;

    assert_eq!(result, Err(Error::PermissionDenied));
    assert_eq!(device.fix_requests(), 0);
    let state = session.snapshot().await;
    assert_eq!(state.current, None);
    assert_eq!(state.error, Some(Error::PermissionDenied.to_string()));
}

#[tokio::test]
async fn test_acquire_once_sets_sample_and_viewport() -> anyhow::Result<()> {
    let session = granted_session(SimulatedLocationProvider::at(sample_at(TOKYO_TOWER))).await;

    let sample = session.acquire_once().await?;

    let state = session.snapshot().await;
    assert_eq!(state.current, Some(sample));
    assert!(state.last_updated.is_some());
    assert_eq!(state.phase, LocationPhase::Acquired);
    assert_eq!(
        state.map_region,
        Some(MapRegion {
            latitude: TOKYO_TOWER.latitude,
            longitude: TOKYO_TOWER.longitude,
            latitude_delta: 0.01,
            longitude_delta: 0.01,
        })
    );
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_viewport_follows_first_fix_only() -> anyhow::Result<()> {
    let route = northbound_route(4);
    let session = granted_session(SimulatedLocationProvider::with_route(route.clone())).await;

    session.acquire_once().await?;
    let first_region = session.snapshot().await.map_region;

    for expected in &route[1..] {
        // Let the cached fix expire so each call reads a new point.
        tokio::time::advance(Duration::from_secs(61)).await;
        let sample = session.acquire_once().await?;
        assert_eq!(&sample, expected);

        let state = session.snapshot().await;
        assert_eq!(state.current, Some(*expected));
        assert_eq!(state.map_region, first_region);
    }
    Ok(())
}

#[tokio::test]
async fn test_explicit_viewport_is_kept_across_fixes() -> anyhow::Result<()> {
    let session = granted_session(SimulatedLocationProvider::at(sample_at(TOKYO_TOWER))).await;
    let region = MapRegion {
        latitude: SENSOJI.latitude,
        longitude: SENSOJI.longitude,
        latitude_delta: 0.05,
        longitude_delta: 0.05,
    };

    session.set_viewport(region).await;
    session.acquire_once().await?;

    assert_eq!(session.snapshot().await.map_region, Some(region));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_cached_fix_reused_within_max_age() -> anyhow::Result<()> {
    let route = northbound_route(3);
    let session = granted_session(SimulatedLocationProvider::with_route(route.clone())).await;

    let first = session.acquire_once().await?;
    tokio::time::advance(Duration::from_secs(30)).await;
    let second = session.acquire_once().await?;
    assert_eq!(first, route[0]);
    assert_eq!(second, route[0]);

    tokio::time::advance(Duration::from_secs(31)).await;
    let third = session.acquire_once().await?;
    assert_eq!(third, route[1]);
    Ok(())
}

#[tokio::test]
async fn test_acquire_failure_keeps_previous_sample() -> anyhow::Result<()> {
    let device = SimulatedLocationProvider::at(sample_at(TOKYO_TOWER)).failing_fixes("no satellites");
    let session = granted_session(device).await;
    session.update_location(sample_at(SENSOJI)).await;
    let before = session.snapshot().await;

    let result = session.acquire_once().await;

    match result {
        Err(Error::Acquisition(message)) => assert!(message.contains("no satellites")),
        other => panic!("expected acquisition error, got {other:?}"),
    }
    let after = session.snapshot().await;
    assert_eq!(after.current, before.current);
    assert_eq!(after.map_region, before.map_region);
    assert_eq!(after.last_updated, before.last_updated);
    assert_eq!(after.phase, LocationPhase::AcquisitionFailed);
    assert!(!after.is_loading);
    assert!(after.error.is_some());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_overlapping_acquisitions_keep_latest_request() -> anyhow::Result<()> {
    let route = northbound_route(2);
    // The first request is slow and resolves after the second one.
    let device = SimulatedLocationProvider::with_route(route.clone())
        .with_fix_latencies(vec![Duration::from_secs(5), Duration::from_secs(1)]);
    let session = granted_session(device).await;

    let (slow, fast) = tokio::join!(session.acquire_once(), session.acquire_once());
    assert_eq!(slow?, route[0]);
    assert_eq!(fast?, route[1]);

    let state = session.snapshot().await;
    assert_eq!(state.current, Some(route[1]));
    assert_eq!(state.acquire_generation.value(), 2);
    assert_eq!(state.map_region.map(|r| r.latitude), Some(route[1].latitude));
    assert!(!state.is_loading);
    Ok(())
}

#[tokio::test]
async fn test_reset_keeps_device_flags() -> anyhow::Result<()> {
    let session = granted_session(SimulatedLocationProvider::at(sample_at(TOKYO_TOWER))).await;
    session.acquire_once().await?;

    session.reset().await;

    let state = session.snapshot().await;
    assert_eq!(state.current, None);
    assert_eq!(state.map_region, None);
    assert_eq!(state.last_updated, None);
    assert_eq!(state.error, None);
    assert!(state.has_permission);
    assert!(state.service_enabled);

    // The next fix bootstraps the viewport again.
    session.acquire_once().await?;
    assert!(session.snapshot().await.map_region.is_some());
    Ok(())
}

#[tokio::test]
async fn test_clear_error() {
    let session = session_for(SimulatedLocationProvider::at(sample_at(TOKYO_TOWER)));
    let _ = session.acquire_once().await;
    assert!(session.snapshot().await.error.is_some());

    session.clear_error().await;

    assert_eq!(session.snapshot().await.error, None);
}

#[tokio::test]
async fn test_update_location_bootstraps_viewport_once() {
    let session = session_for(SimulatedLocationProvider::at(sample_at(TOKYO_TOWER)));

    session.update_location(sample_at(TOKYO_TOWER)).await;
    session.update_location(sample_at(SENSOJI)).await;

    let state = session.snapshot().await;
    assert_eq!(state.current, Some(sample_at(SENSOJI)));
    assert_eq!(state.map_region.map(|r| r.center()), Some(TOKYO_TOWER));
}
