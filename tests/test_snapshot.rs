mod common;

use common::*;

#[tokio::test]
async fn test_snapshot_round_trip_through_file() -> anyhow::Result<()> {
    let session = session_for(SimulatedLocationProvider::at(sample_at(TOKYO_TOWER)));
    let catalog = tokyo_catalog();
    discover_nearby(&session, &catalog).await?;
    catalog.toggle_favorite("1").await?;
    catalog.fetch_details("1").await?;

    let snapshot = Snapshot::new(session.snapshot().await, catalog.snapshot().await);
    let dir = tempfile::TempDir::new()?;
    let path = dir.path().join("state.json");
    snapshot.save(&path).await?;

    let loaded = Snapshot::load(&path).await?;
    assert_eq!(loaded.location.current, snapshot.location.current);
    assert_eq!(loaded.location.map_region, snapshot.location.map_region);
    assert_eq!(loaded.location.phase, LocationPhase::Acquired);
    assert_eq!(loaded.catalog.favorites, snapshot.catalog.favorites);
    assert_eq!(loaded.catalog.spot_reviews, snapshot.catalog.spot_reviews);
    assert_eq!(loaded.catalog.params, snapshot.catalog.params);
    Ok(())
}

#[tokio::test]
async fn test_snapshot_load_reports_bad_file() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let path = dir.path().join("broken.json");
    std::fs::write(&path, "{ not json")?;

    let err = Snapshot::load(&path).await.unwrap_err();

    assert!(format!("{err:#}").contains("Invalid snapshot"));
    Ok(())
}
