//! Dwell CLI library.
//!
//! This crate provides the CLI interface and event-stream host for the
//! dwell-time tracker.

mod cli;
pub mod commands;
mod config;
pub mod feed;
pub mod identity;

pub use cli::{Cli, Commands};
pub use config::Config;
