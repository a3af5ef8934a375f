//! Unroller API — the HTTP boundary of the content unroller.
//!
//! Exposes the four unroll operations as `POST` routes and the operational
//! endpoints (`/__health`, `/__gtg`, `/__ping`, `/__build-info`).

#![doc = include_str!("../README.md")]

pub mod error;
pub mod handlers;
pub mod health;
pub mod routes;
pub mod state;
pub mod validation;

pub use error::{ApiError, ErrorMessage};
pub use health::{HealthChecker, Upstream};
pub use routes::build_router;
pub use state::{AppState, BuildInfo};
