//! Exponential smoothing of compass heading and device pitch

use crate::algorithms::geodesic::{normalize_degrees, normalize_signed_degrees};
use crate::core::{FusedOrientation, OrientationSample, DEFAULT_SMOOTHING_ALPHA};
use crate::validation::{validate_sample, ValidationError};

/// One exponential smoothing step: move `previous` toward `raw` by `alpha`
pub fn smooth(raw: f64, previous: f64, alpha: f64) -> f64 {
    previous + (raw - previous) * alpha
}

/// Smoothing step on the compass circle
///
/// The delta is taken the short way round, so 350° → 10° moves forward through
/// north instead of sweeping back across 180°. The result is in [0, 360).
pub fn smooth_heading(raw: f64, previous: f64, alpha: f64) -> f64 {
    let delta = normalize_signed_degrees(raw - previous);
    normalize_degrees(previous + delta * alpha)
}

/// Exponential smoothing over the heading and pitch channels
#[derive(Debug, Clone)]
pub struct OrientationFilter {
    /// Weight given to each new heading reading, in (0, 1]
    heading_alpha: f64,
    /// Weight given to each new pitch reading, in (0, 1]
    pitch_alpha: f64,
    /// Current estimate, `None` until the first sample
    state: Option<FusedOrientation>,
    /// Samples folded in since the last reset
    samples_seen: u64,
}

impl Default for OrientationFilter {
    fn default() -> Self {
        Self::new(DEFAULT_SMOOTHING_ALPHA, DEFAULT_SMOOTHING_ALPHA)
    }
}

impl OrientationFilter {
    /// Create a filter; alphas outside (0, 1] are clamped into range
    pub fn new(heading_alpha: f64, pitch_alpha: f64) -> Self {
        Self {
            heading_alpha: clamp_alpha(heading_alpha),
            pitch_alpha: clamp_alpha(pitch_alpha),
            state: None,
            samples_seen: 0,
        }
    }

    /// Fold one raw sample into the estimate and return the new estimate
    ///
    /// A sample with a non-finite heading or an out-of-range pitch is
    /// rejected and leaves the estimate untouched.
    pub fn update(
        &mut self,
        sample: &OrientationSample,
    ) -> Result<FusedOrientation, ValidationError> {
        let sample = validate_sample(sample)?;
        let next = match self.state {
            None => FusedOrientation {
                heading_degrees: normalize_degrees(sample.heading_degrees),
                pitch_degrees: sample.pitch_degrees,
            },
            Some(previous) => FusedOrientation {
                heading_degrees: smooth_heading(
                    sample.heading_degrees,
                    previous.heading_degrees,
                    self.heading_alpha,
                ),
                pitch_degrees: smooth(sample.pitch_degrees, previous.pitch_degrees, self.pitch_alpha),
            },
        };

        self.state = Some(next);
        self.samples_seen += 1;
        Ok(next)
    }

    pub fn current(&self) -> Option<FusedOrientation> {
        self.state
    }

    pub fn samples_seen(&self) -> u64 {
        self.samples_seen
    }

    pub fn heading_alpha(&self) -> f64 {
        self.heading_alpha
    }

    pub fn pitch_alpha(&self) -> f64 {
        self.pitch_alpha
    }

    pub fn reset(&mut self) {
        self.state = None;
        self.samples_seen = 0;
    }
}

fn clamp_alpha(alpha: f64) -> f64 {
    if alpha.is_nan() {
        DEFAULT_SMOOTHING_ALPHA
    } else {
        alpha.clamp(f64::EPSILON, 1.0)
    }
}
