//! Shelfnorm CLI Library
//!
//! Configuration loading and the subcommand implementations behind the
//! `shelfnorm` binary. Exposed as a library for testing purposes.

pub mod commands;
pub mod config;
pub mod error;

pub use config::{AppConfig, OutputSettings, Overrides};
pub use error::{CliError, Result};
