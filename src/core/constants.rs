//! Physical constants and system parameters

use std::time::Duration;

use super::types::GeoPoint;

/// Location of the Kaaba, the fixed target every bearing is computed toward
pub const KAABA: GeoPoint = GeoPoint {
    latitude: 21.4225,
    longitude: 39.8262,
};

/// Mean Earth radius used by the haversine distance (km)
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Default time to wait for the first location fix
pub const DEFAULT_ACQUISITION_TIMEOUT: Duration = Duration::from_secs(60);

/// Fixed budget for the best-effort heading sample taken after a fix
pub const HEADING_SAMPLE_TIMEOUT: Duration = Duration::from_secs(5);

/// Default exponential smoothing weight for heading and pitch
pub const DEFAULT_SMOOTHING_ALPHA: f64 = 0.2;

/// Movements smaller than this (pixels) are treated as jitter
pub const DEFAULT_DEAD_BAND_PX: f64 = 2.0;

/// Fraction of the remaining distance the emitted point moves per tick
pub const DEFAULT_FOLLOW_FRACTION: f64 = 0.1;

/// Horizontal field of view of the virtual camera (degrees)
pub const DEFAULT_HORIZONTAL_FOV_DEG: f64 = 60.0;

/// Vertical field of view of the virtual camera (degrees)
pub const DEFAULT_VERTICAL_FOV_DEG: f64 = 45.0;

/// Angular tolerance within which the device counts as facing the target
pub const ALIGNMENT_TOLERANCE_DEG: f64 = 5.0;
