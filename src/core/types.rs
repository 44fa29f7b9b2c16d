//! Core data types for the direction finder

use serde::{Deserialize, Serialize};

/// Geographic coordinate in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// True when both components are finite and inside their ranges
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.latitude, self.longitude)
    }
}

/// Bearing and great-circle distance from an observer to the target
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BearingResult {
    /// Compass bearing in [0, 360), 0 = true north
    pub bearing_degrees: f64,
    /// Great-circle distance (km); 0 when no fix was available
    pub distance_km: f64,
}

impl BearingResult {
    /// Bearing known without an observer position (override or fallback)
    pub fn without_distance(bearing_degrees: f64) -> Self {
        Self {
            bearing_degrees,
            distance_km: 0.0,
        }
    }
}

/// One raw reading from the orientation sensors
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrientationSample {
    /// Compass heading in [0, 360)
    pub heading_degrees: f64,
    /// Device tilt in [-90, 90], positive when pointing up
    pub pitch_degrees: f64,
    /// Capture time (milliseconds since epoch)
    pub captured_at_ms: u64,
}

impl OrientationSample {
    pub fn new(heading_degrees: f64, pitch_degrees: f64, captured_at_ms: u64) -> Self {
        Self {
            heading_degrees,
            pitch_degrees,
            captured_at_ms,
        }
    }
}

/// Smoothed heading and pitch produced by the orientation filter
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FusedOrientation {
    pub heading_degrees: f64,
    pub pitch_degrees: f64,
}

/// Where the target should be drawn on screen
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenPosition {
    pub x: f64,
    pub y: f64,
    /// Signed offset between target bearing and heading, in (-180, 180]
    pub angle_diff_degrees: f64,
}

/// Which way the user should turn to face the target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NavigationHint {
    Left,
    Right,
    Aligned,
}

impl NavigationHint {
    pub fn from_angle_diff(angle_diff_degrees: f64, tolerance_degrees: f64) -> Self {
        if angle_diff_degrees.abs() <= tolerance_degrees {
            NavigationHint::Aligned
        } else if angle_diff_degrees < 0.0 {
            NavigationHint::Left
        } else {
            NavigationHint::Right
        }
    }
}
