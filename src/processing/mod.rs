//! Sensor smoothing and cached values

pub mod cache;
pub mod orientation;

pub use cache::CacheEntry;
pub use orientation::{smooth, smooth_heading, OrientationFilter};
