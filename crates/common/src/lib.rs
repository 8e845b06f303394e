//! Shared types, config, and error definitions for the boiler-bot.

pub mod config;
pub mod error;
pub mod source;
pub mod types;

pub use config::BoilerConfig;
pub use error::Error;
pub use types::*;

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, Error>;
