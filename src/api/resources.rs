//! Resource kinds the initializer can be instantiated with
//!
//! The acquisition state machine is identical for every resource. What
//! differs is the prerequisite permission set checked before the location
//! steps and the extra data carried in the payload; both are supplied by a
//! [`ResourceKind`].

use std::fmt::Debug;

use async_trait::async_trait;
use tracing::debug;

use crate::api::initializer::ResourceInitializer;
use crate::providers::{PermissionKind, PermissionProvider, PermissionStatus};
use crate::validation::{AcquisitionError, AcquisitionStage};

/// Strategy describing one kind of acquirable resource
#[async_trait]
pub trait ResourceKind: Send + Sync + 'static {
    /// Resource-specific payload data
    type Extras: Clone + Debug + PartialEq + Send + Sync + 'static;

    /// Name used in logs
    fn name(&self) -> &'static str;

    /// Prerequisite step run before location acquisition; errors are fatal
    async fn prepare(
        &self,
        permissions: &dyn PermissionProvider,
    ) -> Result<Self::Extras, AcquisitionError>;

    /// Non-fatal observation used when the caller overrides the bearing
    async fn observe(&self, permissions: &dyn PermissionProvider) -> Self::Extras;
}

/// Make sure `kind` is granted, prompting once if it has not been asked yet
pub async fn ensure_permission(
    permissions: &dyn PermissionProvider,
    kind: PermissionKind,
    stage: AcquisitionStage,
) -> Result<PermissionStatus, AcquisitionError> {
    let status = permissions
        .status(kind)
        .await
        .map_err(|e| AcquisitionError::provider(stage, &e))?;

    match status {
        PermissionStatus::Granted => Ok(status),
        PermissionStatus::PermanentlyDenied => {
            Err(AcquisitionError::permission_denied(kind, stage))
        }
        PermissionStatus::Denied => {
            debug!(permission = %kind, "permission not granted yet, requesting");
            permissions
                .request(kind)
                .await
                .map_err(|e| AcquisitionError::provider(stage, &e))?;

            let rechecked = permissions
                .status(kind)
                .await
                .map_err(|e| AcquisitionError::provider(stage, &e))?;
            if rechecked.is_granted() {
                Ok(rechecked)
            } else {
                Err(AcquisitionError::permission_denied(kind, stage))
            }
        }
    }
}

/// Compass-only resource: location and heading, no prerequisites
#[derive(Debug, Clone, Copy, Default)]
pub struct CompassResource;

#[async_trait]
impl ResourceKind for CompassResource {
    type Extras = ();

    fn name(&self) -> &'static str {
        "compass"
    }

    async fn prepare(&self, _permissions: &dyn PermissionProvider) -> Result<(), AcquisitionError> {
        Ok(())
    }

    async fn observe(&self, _permissions: &dyn PermissionProvider) {}
}

/// Camera access recorded for the augmented view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CameraAccess {
    /// Camera permission as last observed; `None` when the query failed
    pub status: Option<PermissionStatus>,
}

impl CameraAccess {
    pub fn is_granted(&self) -> bool {
        matches!(self.status, Some(PermissionStatus::Granted))
    }
}

/// Augmented camera view: requires camera access before the location steps
#[derive(Debug, Clone, Copy, Default)]
pub struct AugmentedViewResource;

#[async_trait]
impl ResourceKind for AugmentedViewResource {
    type Extras = CameraAccess;

    fn name(&self) -> &'static str {
        "augmented-view"
    }

    async fn prepare(
        &self,
        permissions: &dyn PermissionProvider,
    ) -> Result<CameraAccess, AcquisitionError> {
        let status =
            ensure_permission(permissions, PermissionKind::Camera, AcquisitionStage::Prerequisite)
                .await?;
        Ok(CameraAccess {
            status: Some(status),
        })
    }

    async fn observe(&self, permissions: &dyn PermissionProvider) -> CameraAccess {
        CameraAccess {
            status: permissions.status(PermissionKind::Camera).await.ok(),
        }
    }
}

/// Initializer for the compass screen
pub type CompassInitializer = ResourceInitializer<CompassResource>;

/// Initializer for the augmented camera view
pub type AugmentedViewInitializer = ResourceInitializer<AugmentedViewResource>;
