//! Configuration and logging setup

pub mod config;
pub mod logging;

pub use config::{
    AcquisitionSettings, ConfigError, ConfigResult, ConfigurationManager, EngineConfig,
    FilterSettings, ValidationReport,
};
pub use logging::{init_logging, LoggingError};
