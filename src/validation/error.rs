//! Acquisition error classification and remediation hints

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::providers::{PermissionKind, ProviderError};

/// Classified reason an acquisition did not reach `Ready`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Device-wide location services are switched off
    ServicesDisabled,
    /// A required permission was refused
    PermissionDenied,
    /// No location fix arrived in time
    Timeout,
    /// Heading could not be read; recovered locally, never fails a resource
    SensorUnavailable,
    /// The acquisition was cancelled before it finished
    Cancelled,
    /// Any other provider failure
    Unknown,
}

/// What the user can do about a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Remediation {
    EnableLocationServices,
    GrantPermission,
    MoveToOpenSky,
    Retry,
    None,
}

impl Remediation {
    /// Default English text; the presentation layer localizes by category
    pub fn message(&self) -> &'static str {
        match self {
            Remediation::EnableLocationServices => {
                "Turn on location services in the device settings"
            }
            Remediation::GrantPermission => "Allow access in the app settings and try again",
            Remediation::MoveToOpenSky => "Move to a place with a clear view of the sky and retry",
            Remediation::Retry => "Something went wrong, please try again",
            Remediation::None => "",
        }
    }
}

impl ErrorKind {
    pub fn remediation(&self) -> Remediation {
        match self {
            ErrorKind::ServicesDisabled => Remediation::EnableLocationServices,
            ErrorKind::PermissionDenied => Remediation::GrantPermission,
            ErrorKind::Timeout => Remediation::MoveToOpenSky,
            ErrorKind::SensorUnavailable => Remediation::None,
            ErrorKind::Cancelled | ErrorKind::Unknown => Remediation::Retry,
        }
    }
}

/// Which part of the acquisition produced the error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AcquisitionStage {
    /// Resource-specific prerequisite such as camera access
    Prerequisite,
    /// Location services and location permission
    Permission,
    /// Waiting for the first fix
    Location,
    /// Waiting for the first heading sample
    Heading,
    /// Outside any single step (cancellation, lost state channel)
    Lifecycle,
}

/// Error captured in a `Failed` resource state
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind:?} during {stage:?}: {detail}")]
pub struct AcquisitionError {
    kind: ErrorKind,
    stage: AcquisitionStage,
    detail: String,
}

impl AcquisitionError {
    pub fn new(kind: ErrorKind, stage: AcquisitionStage, detail: impl Into<String>) -> Self {
        Self {
            kind,
            stage,
            detail: detail.into(),
        }
    }

    pub fn services_disabled() -> Self {
        Self::new(
            ErrorKind::ServicesDisabled,
            AcquisitionStage::Permission,
            "location services are disabled",
        )
    }

    pub fn permission_denied(permission: PermissionKind, stage: AcquisitionStage) -> Self {
        Self::new(
            ErrorKind::PermissionDenied,
            stage,
            format!("{} permission denied", permission),
        )
    }

    pub fn timeout(waited: std::time::Duration) -> Self {
        Self::new(
            ErrorKind::Timeout,
            AcquisitionStage::Location,
            format!("no location fix within {} ms", waited.as_millis()),
        )
    }

    pub fn cancelled() -> Self {
        Self::new(
            ErrorKind::Cancelled,
            AcquisitionStage::Lifecycle,
            "acquisition cancelled",
        )
    }

    /// Wrap a provider failure as `Unknown`
    pub fn provider(stage: AcquisitionStage, error: &ProviderError) -> Self {
        Self::new(ErrorKind::Unknown, stage, error.to_string())
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn stage(&self) -> AcquisitionStage {
        self.stage
    }

    pub fn detail(&self) -> &str {
        &self.detail
    }

    pub fn remediation(&self) -> Remediation {
        self.kind.remediation()
    }

    /// Remediation text suitable for showing alongside the failure
    pub fn remediation_message(&self) -> &'static str {
        self.remediation().message()
    }

    /// Failures the skip-on-location-failure policy may paper over
    pub fn is_location_failure(&self) -> bool {
        matches!(
            self.stage,
            AcquisitionStage::Permission | AcquisitionStage::Location
        ) && self.kind != ErrorKind::Cancelled
    }
}

/// Rejected input values
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("coordinate {latitude}, {longitude} is outside the valid range")]
    InvalidCoordinate { latitude: f64, longitude: f64 },
    #[error("orientation sample heading {heading}, pitch {pitch} is not usable")]
    InvalidSample { heading: f64, pitch: f64 },
    #[error("viewport {width}x{height} must have positive finite dimensions")]
    InvalidViewport { width: f64, height: f64 },
    #[error("{parameter} = {value} is invalid: {reason}")]
    InvalidParameter {
        parameter: String,
        value: String,
        reason: String,
    },
}
