use tracing::{debug, info};

use crate::core::{
    error::Result,
    location::{LocationProvider, LocationSample, LocationSession},
    spots::{Spot, SpotCatalog, SpotProvider},
};

/// What a completed discovery run produced.
#[derive(Debug, Clone)]
pub struct Discovery {
    pub origin: LocationSample,
    pub spots: Vec<Spot>,
}

/// Permission, then a fix, then the spots around that fix.
///
/// Each step starts only after the previous one succeeded; the first failure
/// is returned and has already been recorded on the owning state.
pub async fn discover_nearby<L, S>(
    session: &LocationSession<L>,
    catalog: &SpotCatalog<S>,
) -> Result<Discovery>
where
    L: LocationProvider,
    S: SpotProvider,
{
    session.request_permission().await?;
    debug!("permission step complete");

    let origin = session.acquire_once().await?;
    let spots = catalog.refresh_nearby(origin.coordinates()).await?;
    info!(count = spots.len(), "discovery complete");

    Ok(Discovery { origin, spots })
}
