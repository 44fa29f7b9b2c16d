//! Platform provider boundary
//!
//! The engine never talks to platform APIs directly. The presentation layer
//! implements these traits over the real permission dialogs, GPS and compass;
//! tests and the demo binary use the implementations in [`mock`].

pub mod error;
pub mod mock;

pub use error::{ProviderError, ProviderResult};
pub use mock::{MockHeading, MockLocation, MockPermissions};

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

use crate::core::{GeoPoint, OrientationSample};

/// Permission the engine may need before acquiring sensor data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PermissionKind {
    Camera,
    Location,
}

impl std::fmt::Display for PermissionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PermissionKind::Camera => write!(f, "camera"),
            PermissionKind::Location => write!(f, "location"),
        }
    }
}

/// Platform answer to a permission query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PermissionStatus {
    Granted,
    /// Not granted yet, a request may still be shown
    Denied,
    /// The user refused and the platform will not ask again
    PermanentlyDenied,
}

impl PermissionStatus {
    pub fn is_granted(&self) -> bool {
        matches!(self, PermissionStatus::Granted)
    }
}

/// Lazy sequence of location fixes; dropping it unsubscribes
pub type FixStream = BoxStream<'static, ProviderResult<GeoPoint>>;

/// Lazy sequence of orientation readings; dropping it unsubscribes
pub type SampleStream = BoxStream<'static, ProviderResult<OrientationSample>>;

/// Permission status and request interface
#[async_trait]
pub trait PermissionProvider: Send + Sync {
    /// Current status without prompting the user
    async fn status(&self, kind: PermissionKind) -> ProviderResult<PermissionStatus>;

    /// Prompt for the permission and return the resulting status
    async fn request(&self, kind: PermissionKind) -> ProviderResult<PermissionStatus>;
}

/// GPS interface
#[async_trait]
pub trait LocationProvider: Send + Sync {
    /// Whether device-wide location services are switched on
    async fn services_enabled(&self) -> ProviderResult<bool>;

    /// Start a fresh sequence of fixes. Every call restarts the sequence.
    fn fixes(&self) -> FixStream;
}

/// Compass/tilt interface
pub trait HeadingProvider: Send + Sync {
    /// Start a fresh, potentially infinite, sequence of readings
    fn samples(&self) -> SampleStream;
}
