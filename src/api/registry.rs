//! Process-wide owner of the resource initializers
//!
//! Every screen that needs the compass or the augmented view asks the registry
//! and receives a clone of the one shared initializer, so their callers
//! deduplicate against each other.

use std::sync::Arc;

use tracing::info;

use crate::api::resources::{
    AugmentedViewInitializer, AugmentedViewResource, CompassInitializer, CompassResource,
};
use crate::api::types::InitializerConfig;
use crate::providers::{HeadingProvider, LocationProvider, PermissionProvider};
use crate::utils::config::EngineConfig;

/// Platform collaborators shared by all resources
#[derive(Clone)]
pub struct Providers {
    pub permissions: Arc<dyn PermissionProvider>,
    pub location: Arc<dyn LocationProvider>,
    pub heading: Option<Arc<dyn HeadingProvider>>,
}

impl Providers {
    pub fn new(
        permissions: Arc<dyn PermissionProvider>,
        location: Arc<dyn LocationProvider>,
        heading: Option<Arc<dyn HeadingProvider>>,
    ) -> Self {
        Self {
            permissions,
            location,
            heading,
        }
    }
}

/// One initializer per resource kind
#[derive(Clone)]
pub struct ResourceRegistry {
    compass: CompassInitializer,
    augmented_view: AugmentedViewInitializer,
}

impl ResourceRegistry {
    pub fn new(providers: Providers, config: InitializerConfig) -> Self {
        let Providers {
            permissions,
            location,
            heading,
        } = providers;

        let compass = CompassInitializer::new(
            CompassResource,
            Arc::clone(&permissions),
            Arc::clone(&location),
            heading.clone(),
            config.clone(),
        );
        let augmented_view =
            AugmentedViewInitializer::new(AugmentedViewResource, permissions, location, heading, config);

        Self {
            compass,
            augmented_view,
        }
    }

    pub fn from_config(providers: Providers, config: &EngineConfig) -> Self {
        Self::new(providers, config.acquisition.initializer_config())
    }

    pub fn compass(&self) -> CompassInitializer {
        self.compass.clone()
    }

    pub fn augmented_view(&self) -> AugmentedViewInitializer {
        self.augmented_view.clone()
    }

    /// Reset every resource, abandoning in-flight acquisitions
    pub fn reset_all(&self) {
        self.compass.reset();
        self.augmented_view.reset();
        info!("all resources reset");
    }
}
