//! Shared state of the HTTP handlers.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use unroller_core::ContentUnroller;

use crate::health::HealthChecker;

/// Name and version reported by `/__build-info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildInfo {
    /// Service name.
    pub name: String,
    /// Service version.
    pub version: String,
}

impl BuildInfo {
    /// Creates build info for the given service.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

impl Default for BuildInfo {
    fn default() -> Self {
        Self::new("content-unroller", env!("CARGO_PKG_VERSION"))
    }
}

/// State handed to every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The engine behind the unroll routes.
    pub unroller: Arc<ContentUnroller>,
    /// Upstream checks behind `/__health` and `/__gtg`.
    pub health: Arc<HealthChecker>,
    /// Reported by `/__build-info`.
    pub build_info: Arc<BuildInfo>,
}

impl AppState {
    /// Creates the state with default build info.
    pub fn new(unroller: ContentUnroller, health: HealthChecker) -> Self {
        Self {
            unroller: Arc::new(unroller),
            health: Arc::new(health),
            build_info: Arc::new(BuildInfo::default()),
        }
    }

    /// Replaces the build info.
    pub fn with_build_info(mut self, build_info: BuildInfo) -> Self {
        self.build_info = Arc::new(build_info);
        self
    }
}
