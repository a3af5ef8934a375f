//! CLI and service wiring for the content unroller.
//!
//! # Modules
//!
//! - [`cli`]: clap argument types
//! - [`config`]: [`UnrollerConfig`](config::UnrollerConfig) loading via confyg
//! - [`config_handlers`]: the `config` subcommands
//! - [`app`]: logging, source wiring and the HTTP server

#![doc = include_str!("../README.md")]

pub mod app;
pub mod cli;
pub mod config;
pub mod config_handlers;

pub use app::UnrollerCli;
pub use cli::CliArgs;
pub use config::UnrollerConfig;
