//! Maps a target bearing and the device orientation to a screen point
//!
//! The projection is linear in angle: an offset of half the field of view
//! lands on the viewport edge. A dead-band followed by a partial step toward
//! the new point keeps the marker from jittering with sensor noise.

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use crate::algorithms::geodesic::normalize_signed_degrees;
use crate::core::{
    NavigationHint, ScreenPosition, ALIGNMENT_TOLERANCE_DEG, DEFAULT_DEAD_BAND_PX,
    DEFAULT_FOLLOW_FRACTION, DEFAULT_HORIZONTAL_FOV_DEG, DEFAULT_VERTICAL_FOV_DEG,
};
use crate::validation::{validate_fov, validate_non_negative, ValidationError};

/// Screen area in pixels; both dimensions are strictly positive
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Viewport {
    width: f64,
    height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Result<Self, ValidationError> {
        let valid = |v: f64| v.is_finite() && v > 0.0;
        if valid(width) && valid(height) {
            Ok(Self { width, height })
        } else {
            Err(ValidationError::InvalidViewport { width, height })
        }
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn center(&self) -> Vector2<f64> {
        Vector2::new(self.width / 2.0, self.height / 2.0)
    }
}

/// Projection and jitter suppression parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PositionerConfig {
    pub horizontal_fov_deg: f64,
    pub vertical_fov_deg: f64,
    /// Moves shorter than this, in pixels, are suppressed
    pub dead_band_px: f64,
    /// Share of the remaining distance covered per accepted update
    pub follow_fraction: f64,
    pub alignment_tolerance_deg: f64,
}

impl Default for PositionerConfig {
    fn default() -> Self {
        Self {
            horizontal_fov_deg: DEFAULT_HORIZONTAL_FOV_DEG,
            vertical_fov_deg: DEFAULT_VERTICAL_FOV_DEG,
            dead_band_px: DEFAULT_DEAD_BAND_PX,
            follow_fraction: DEFAULT_FOLLOW_FRACTION,
            alignment_tolerance_deg: ALIGNMENT_TOLERANCE_DEG,
        }
    }
}

impl PositionerConfig {
    /// Check every field, reporting the first invalid one
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_fov("horizontal_fov_deg", self.horizontal_fov_deg)?;
        validate_fov("vertical_fov_deg", self.vertical_fov_deg)?;
        validate_non_negative("dead_band_px", self.dead_band_px)?;
        validate_non_negative("alignment_tolerance_deg", self.alignment_tolerance_deg)?;
        if !(self.follow_fraction > 0.0 && self.follow_fraction <= 1.0) {
            return Err(ValidationError::InvalidParameter {
                parameter: "follow_fraction".to_string(),
                value: self.follow_fraction.to_string(),
                reason: "must be in (0, 1]".to_string(),
            });
        }
        Ok(())
    }
}

/// Raw projection of an angular offset and pitch onto the viewport
///
/// Returns the point together with the signed angle difference.
pub fn project(
    target_bearing: f64,
    heading: f64,
    pitch: f64,
    viewport: &Viewport,
    horizontal_fov_deg: f64,
    vertical_fov_deg: f64,
) -> (Vector2<f64>, f64) {
    let angle_diff = normalize_signed_degrees(target_bearing - heading);
    let half = viewport.center();

    let x = half.x + (angle_diff / (horizontal_fov_deg / 2.0)) * half.x;
    let y = half.y - (pitch / (vertical_fov_deg / 2.0)) * half.y;

    (Vector2::new(x, y), angle_diff)
}

/// Stateful positioner; one per view
#[derive(Debug, Clone, Default)]
pub struct ScreenPositioner {
    config: PositionerConfig,
    previous: Option<Vector2<f64>>,
}

impl ScreenPositioner {
    pub fn new(config: PositionerConfig) -> Self {
        Self {
            config,
            previous: None,
        }
    }

    pub fn config(&self) -> &PositionerConfig {
        &self.config
    }

    pub fn position_for(
        &mut self,
        target_bearing: f64,
        heading: f64,
        pitch: f64,
        viewport: &Viewport,
    ) -> ScreenPosition {
        let (raw, angle_diff) = project(
            target_bearing,
            heading,
            pitch,
            viewport,
            self.config.horizontal_fov_deg,
            self.config.vertical_fov_deg,
        );

        let emitted = match self.previous {
            None => raw,
            Some(previous) if (raw - previous).norm() < self.config.dead_band_px => previous,
            Some(previous) => previous + (raw - previous) * self.config.follow_fraction,
        };
        self.previous = Some(emitted);

        ScreenPosition {
            x: emitted.x,
            y: emitted.y,
            angle_diff_degrees: angle_diff,
        }
    }

    pub fn hint_for(&self, position: &ScreenPosition) -> NavigationHint {
        NavigationHint::from_angle_diff(
            position.angle_diff_degrees,
            self.config.alignment_tolerance_deg,
        )
    }

    /// Last emitted point, if any
    pub fn previous(&self) -> Option<Vector2<f64>> {
        self.previous
    }

    pub fn reset(&mut self) {
        self.previous = None;
    }
}
