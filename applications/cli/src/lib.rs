//! Encore CLI
//!
//! Terminal front end over `encore-playback`: loads a JSON catalog, drives a
//! simulated media engine and maps line commands onto session commands.

pub mod catalog;
pub mod commands;
pub mod config;
pub mod engine;
pub mod error;
pub mod platform;
pub mod render;
pub mod shell;

pub use error::{CliError, Result};
