//! Input validation for values crossing the provider boundary

use crate::core::{GeoPoint, OrientationSample};
use crate::validation::error::ValidationError;

/// Reject fixes with non-finite or out-of-range components
pub fn validate_fix(fix: GeoPoint) -> Result<GeoPoint, ValidationError> {
    if fix.is_valid() {
        Ok(fix)
    } else {
        Err(ValidationError::InvalidCoordinate {
            latitude: fix.latitude,
            longitude: fix.longitude,
        })
    }
}

/// Reject readings with a non-finite heading or a pitch outside [-90, 90]
pub fn validate_sample(sample: &OrientationSample) -> Result<OrientationSample, ValidationError> {
    if sample.heading_degrees.is_finite() && (-90.0..=90.0).contains(&sample.pitch_degrees) {
        Ok(*sample)
    } else {
        Err(ValidationError::InvalidSample {
            heading: sample.heading_degrees,
            pitch: sample.pitch_degrees,
        })
    }
}

/// Smoothing weights must lie in (0, 1]
pub fn validate_alpha(parameter: &str, alpha: f64) -> Result<f64, ValidationError> {
    if alpha > 0.0 && alpha <= 1.0 {
        Ok(alpha)
    } else {
        Err(ValidationError::InvalidParameter {
            parameter: parameter.to_string(),
            value: alpha.to_string(),
            reason: "must be in (0, 1]".to_string(),
        })
    }
}

/// Field of view must be a positive angle below a half turn
pub fn validate_fov(parameter: &str, degrees: f64) -> Result<f64, ValidationError> {
    if degrees > 0.0 && degrees < 180.0 {
        Ok(degrees)
    } else {
        Err(ValidationError::InvalidParameter {
            parameter: parameter.to_string(),
            value: degrees.to_string(),
            reason: "must be in (0, 180) degrees".to_string(),
        })
    }
}

/// Finite value that is not negative
pub fn validate_non_negative(parameter: &str, value: f64) -> Result<f64, ValidationError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(ValidationError::InvalidParameter {
            parameter: parameter.to_string(),
            value: value.to_string(),
            reason: "must be a finite, non-negative number".to_string(),
        })
    }
}
