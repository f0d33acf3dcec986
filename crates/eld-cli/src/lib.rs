//! Duty logbook CLI library.
//!
//! This crate provides the CLI interface for the duty logbook.

mod cli;
pub mod commands;
mod config;
pub mod driver;
pub mod lock;
pub mod outbox;

pub use cli::{Cli, Commands};
pub use config::Config;
