//! Qibla Finder
//!
//! Computes the great-circle bearing from the device to the Kaaba, acquires
//! the inputs it needs (permissions, a GPS fix, a compass heading) through a
//! deduplicated and cancellable state machine, and turns a live heading/pitch
//! stream into a jitter-free screen position with a left/right hint.

pub mod core;
pub mod algorithms;
pub mod processing;
pub mod validation;
pub mod providers;
pub mod utils;
pub mod api;

// Re-export commonly used types
pub use core::{
    BearingResult, FusedOrientation, GeoPoint, NavigationHint, OrientationSample, ScreenPosition,
    KAABA,
};
pub use algorithms::{bearing, distance_km, normalize_degrees, normalize_signed_degrees, qibla};
pub use processing::{CacheEntry, OrientationFilter};
pub use validation::{AcquisitionError, AcquisitionStage, ErrorKind, Remediation, ValidationError};
pub use providers::{
    HeadingProvider, LocationProvider, PermissionKind, PermissionProvider, PermissionStatus,
    ProviderError, ProviderResult,
};
pub use utils::{ConfigError, ConfigurationManager, EngineConfig};
pub use api::{
    AugmentedViewInitializer, BearingSource, CompassInitializer, FusionSession, InitializerConfig,
    PositionUpdate, Providers, ResourceInitializer, ResourceRegistry, ResourceState,
    ResourceStatus, ScreenPositioner, Viewport,
};
