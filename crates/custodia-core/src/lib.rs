//! Custodia Core — configuration, error taxonomy, duration parsing.

pub mod config;
pub mod duration;
pub mod error;

pub use config::{CustodiaConfig, DataPaths};
pub use duration::parse_duration;
pub use error::{Error, Result};
