//! Common API types and data structures

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::core::{BearingResult, GeoPoint, DEFAULT_ACQUISITION_TIMEOUT};
use crate::providers::PermissionStatus;
use crate::validation::AcquisitionError;

/// Lifecycle of a resource acquisition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceStatus {
    NotInitialized,
    Initializing,
    Ready,
    Failed,
}

/// How the bearing in a payload was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BearingSource {
    /// Computed from a real location fix
    Computed,
    /// Supplied by the caller
    Override,
    /// Location failed and the skip policy substituted true north
    Fallback,
}

/// Data held by a `Ready` resource
#[derive(Debug, Clone, PartialEq)]
pub struct ResourcePayload<E> {
    /// The fix the bearing was computed from, absent for override and fallback
    pub fix: Option<GeoPoint>,
    pub bearing: BearingResult,
    /// First heading sample, 0 when the sensor was unavailable
    pub heading_degrees: f64,
    pub source: BearingSource,
    /// Location permission as last observed, if it was queried successfully
    pub location_permission: Option<PermissionStatus>,
    /// Resource-specific data
    pub extras: E,
}

/// Snapshot of a resource initializer
///
/// Constructed only through the per-status constructors, so a payload exists
/// exactly when the status is `Ready` and an error exactly when it is `Failed`.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceState<E> {
    status: ResourceStatus,
    payload: Option<ResourcePayload<E>>,
    error: Option<AcquisitionError>,
    ready_at: Option<Instant>,
}

impl<E> ResourceState<E> {
    pub fn not_initialized() -> Self {
        Self {
            status: ResourceStatus::NotInitialized,
            payload: None,
            error: None,
            ready_at: None,
        }
    }

    pub fn initializing() -> Self {
        Self {
            status: ResourceStatus::Initializing,
            ..Self::not_initialized()
        }
    }

    pub fn ready(payload: ResourcePayload<E>, ready_at: Instant) -> Self {
        Self {
            status: ResourceStatus::Ready,
            payload: Some(payload),
            error: None,
            ready_at: Some(ready_at),
        }
    }

    pub fn failed(error: AcquisitionError) -> Self {
        Self {
            status: ResourceStatus::Failed,
            payload: None,
            error: Some(error),
            ready_at: None,
        }
    }

    pub fn status(&self) -> ResourceStatus {
        self.status
    }

    pub fn payload(&self) -> Option<&ResourcePayload<E>> {
        self.payload.as_ref()
    }

    pub fn error(&self) -> Option<&AcquisitionError> {
        self.error.as_ref()
    }

    pub fn ready_at(&self) -> Option<Instant> {
        self.ready_at
    }

    pub fn is_ready(&self) -> bool {
        self.status == ResourceStatus::Ready
    }

    /// `Ready` or `Failed`
    pub fn is_terminal(&self) -> bool {
        matches!(self.status, ResourceStatus::Ready | ResourceStatus::Failed)
    }

    /// Bearing in degrees if the resource is ready
    pub fn bearing_degrees(&self) -> Option<f64> {
        self.payload.as_ref().map(|p| p.bearing.bearing_degrees)
    }
}

impl<E> Default for ResourceState<E> {
    fn default() -> Self {
        Self::not_initialized()
    }
}

/// Acquisition policy for one resource initializer
#[derive(Debug, Clone, PartialEq)]
pub struct InitializerConfig {
    /// Maximum wait for the first location fix
    pub timeout: Duration,
    /// Degrade to a north-facing `Ready` state instead of failing on location errors
    pub skip_on_location_failure: bool,
    /// Age after which a ready fix counts as stale
    pub fix_ttl: Option<Duration>,
}

impl Default for InitializerConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_ACQUISITION_TIMEOUT,
            skip_on_location_failure: false,
            fix_ttl: None,
        }
    }
}

impl InitializerConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_skip_on_location_failure(mut self, skip: bool) -> Self {
        self.skip_on_location_failure = skip;
        self
    }

    pub fn with_fix_ttl(mut self, ttl: Duration) -> Self {
        self.fix_ttl = Some(ttl);
        self
    }
}
