/// Geolocation port with a bounded wait
use std::time::Duration;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

/// How long [`locate`] waits by default.
pub const DEFAULT_LOCATE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coords {
    pub lat: f64,
    pub lon: f64,
}

impl Coords {
    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lon.is_finite()
    }
}

pub trait GeolocationPort: Send + Sync {
    /// Current position, or `None` when denied or unavailable.
    fn current_position(&self) -> BoxFuture<'_, Option<Coords>>;
}

/// Ask `port` for a position, giving up after `timeout`.
///
/// A missing port, a denial, a timeout and non-finite coordinates all
/// yield `None`.
pub async fn locate(port: Option<&dyn GeolocationPort>, timeout: Duration) -> Option<Coords> {
    let port = port?;
    match tokio::time::timeout(timeout, port.current_position()).await {
        Ok(Some(c)) if c.is_finite() => Some(c),
        Ok(Some(c)) => {
            log::warn!("discarding non-finite position {:?}", c);
            None
        }
        Ok(None) => None,
        Err(_) => {
            log::debug!("geolocation timed out after {:?}", timeout);
            None
        }
    }
}

/// Port that always reports the same position
pub struct FixedLocation {
    coords: Option<Coords>,
}

impl FixedLocation {
    pub fn new(coords: Option<Coords>) -> Self {
        FixedLocation { coords }
    }
}

impl GeolocationPort for FixedLocation {
    fn current_position(&self) -> BoxFuture<'_, Option<Coords>> {
        let coords = self.coords;
        Box::pin(async move { coords })
    }
}
