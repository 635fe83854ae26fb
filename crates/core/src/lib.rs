//! Core utilities shared by every renderer crate:
//! - Error type and result alias
//! - Logging initialization
//! - Frame timer
//! - TOML application configuration

pub mod config;
mod error;
pub mod logging;
mod timer;

pub use config::AppConfig;
pub use error::{Error, Result};
pub use logging::{init_logging, init_logging_with};
pub use timer::Timer;
