//! Paperproxy service wiring
//!
//! Configuration, logging and the startup/shutdown sequence behind the
//! `paperproxy` binary.

pub mod config;
pub mod daemon;
pub mod logging;

pub use config::Config;
