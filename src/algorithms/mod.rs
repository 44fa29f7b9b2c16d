//! Geodesic algorithms

pub mod geodesic;

pub use geodesic::{bearing, distance_km, normalize_degrees, normalize_signed_degrees, qibla};
