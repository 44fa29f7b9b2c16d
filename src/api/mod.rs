//! Acquisition, positioning and streaming APIs
//!
//! [`ResourceInitializer`] acquires a bearing once per resource and caches it,
//! [`ScreenPositioner`] maps live orientation onto the screen, and
//! [`FusionSession`] ties a heading stream to both.

pub mod initializer;
pub mod positioner;
pub mod registry;
pub mod resources;
pub mod session;
pub mod types;

pub use initializer::ResourceInitializer;
pub use positioner::{project, PositionerConfig, ScreenPositioner, Viewport};
pub use registry::{Providers, ResourceRegistry};
pub use resources::{
    ensure_permission, AugmentedViewInitializer, AugmentedViewResource, CameraAccess,
    CompassInitializer, CompassResource, ResourceKind,
};
pub use session::{FusionSession, PositionUpdate};
pub use types::{BearingSource, InitializerConfig, ResourcePayload, ResourceState, ResourceStatus};
