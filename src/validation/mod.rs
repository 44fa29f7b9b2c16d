//! Error classification and input validation

pub mod data;
pub mod error;

pub use data::{
    validate_alpha, validate_fix, validate_fov, validate_non_negative, validate_sample,
};
pub use error::{AcquisitionError, AcquisitionStage, ErrorKind, Remediation, ValidationError};
