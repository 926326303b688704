mod model;
mod provider;
mod session;
mod simulated;
mod state;

pub use model::{LocationSample, MapRegion, PermissionStatus, WatchId};
pub use provider::{FixOptions, LocationProvider, WatchCanceller, WatchOptions, WatchSubscription};
pub use session::LocationSession;
pub use simulated::SimulatedLocationProvider;
pub use state::{LocationAction, LocationPhase, LocationState};
