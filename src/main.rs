use std::{path::PathBuf, time::Duration};

use clap::Parser;
use tracing_subscriber::EnvFilter;

use kimamani::core::location::PermissionStatus;
use kimamani::{
    CatalogConfig, InMemorySpotProvider, LocationConfig, LocationSample, LocationSession,
    SimulatedLocationProvider, Snapshot, SpotCatalog, discover_nearby,
};

#[derive(Parser)]
#[command(name = "kimamani")]
#[command(about = "Find sightseeing spots around a (simulated) device location")]
struct Cli {
    /// Device latitude
    #[arg(long, default_value_t = 35.6586, allow_negative_numbers = true)]
    lat: f64,

    /// Device longitude
    #[arg(long, default_value_t = 139.7454, allow_negative_numbers = true)]
    lng: f64,

    /// Search radius in meters
    #[arg(short, long)]
    radius: Option<f64>,

    /// Free-text search to run after the nearby fetch
    #[arg(short, long)]
    query: Option<String>,

    /// Restrict the search to a category id
    #[arg(long)]
    category: Option<String>,

    /// Simulate the user refusing location access
    #[arg(long)]
    deny_permission: bool,

    /// Load the spot catalog from a JSON file instead of the built-in one
    #[arg(long, value_name = "FILE")]
    spots: Option<PathBuf>,

    /// Write both state containers to this file when done
    #[arg(long, value_name = "FILE")]
    snapshot: Option<PathBuf>,

    /// Keep a continuous watch running for this many seconds
    #[arg(long, value_name = "SECS")]
    watch_secs: Option<u64>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let default_level = if args.verbose { "kimamani=debug" } else { "kimamani=warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let mut catalog_config = CatalogConfig::default();
    if let Some(radius) = args.radius {
        catalog_config.default_radius_m = radius;
    }

    let permission = if args.deny_permission {
        PermissionStatus::Denied
    } else {
        PermissionStatus::Granted
    };
    let device = SimulatedLocationProvider::at(LocationSample::new(args.lat, args.lng).with_accuracy(15.0))
        .with_permission(permission);
    let provider = match &args.spots {
        Some(path) => InMemorySpotProvider::from_json_file(path).await?,
        None => InMemorySpotProvider::tokyo(),
    };

    let session = LocationSession::new(device, LocationConfig::default());
    let catalog = SpotCatalog::new(provider, catalog_config);

    match discover_nearby(&session, &catalog).await {
        Ok(discovery) => {
            println!("現在位置: {:.6}, {:.6}", discovery.origin.latitude, discovery.origin.longitude);
            println!("\n=== Nearby spots ({}) ===", discovery.spots.len());
            for spot in &discovery.spots {
                println!(
                    "  {} [{}] {:.0}m  ★{:.1}  {}",
                    spot.name,
                    spot.category.name,
                    spot.distance.unwrap_or_default(),
                    spot.rating,
                    spot.address
                );
            }
        }
        Err(e) => eprintln!("Discovery failed: {}", e),
    }

    if args.query.is_some() || args.category.is_some() {
        let query = args.query.clone().unwrap_or_default();
        let origin = session.snapshot().await.current.map(|s| s.coordinates());
        let results = catalog
            .search(&query, args.category.as_deref(), origin)
            .await?;
        println!("\n=== Search results for {:?} ({}) ===", query, results.len());
        for spot in &results {
            println!("  {} - {}", spot.name, spot.description);
        }
    }

    if let Some(secs) = args.watch_secs {
        let id = session.start_watch().await?;
        if args.verbose {
            println!("\nWatching location ({id}) for {secs}s...");
        }
        tokio::time::sleep(Duration::from_secs(secs)).await;
        session.stop_watch().await;
        if let Some(current) = session.snapshot().await.current {
            println!("Last watched position: {:.6}, {:.6}", current.latitude, current.longitude);
        }
    }

    if let Some(path) = &args.snapshot {
        Snapshot::new(session.snapshot().await, catalog.snapshot().await)
            .save(path)
            .await?;
        if args.verbose {
            println!("Snapshot written to {:?}", path);
        }
    }

    Ok(())
}
