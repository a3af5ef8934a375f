//! The content unroller application: logging, wiring and the server loop.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;
use unroller_api::{AppState, BuildInfo, HealthChecker, Upstream, build_router};
use unroller_core::source::{RetryingSource, build_client};
use unroller_core::{
    BatchReader, ContentSource, ContentSources, ContentUnroller, PreviewReader, Result,
};

use crate::cli::{CliArgs, Command};
use crate::config::UnrollerConfig;
use crate::config_handlers;

// ============================================================================
// UnrollerCli
// ============================================================================

/// The service application.
pub struct UnrollerCli {
    name: String,
    config: Arc<UnrollerConfig>,
    version: String,
}

impl UnrollerCli {
    /// Create from CLI args, loading config from file/env.
    pub fn from_args(name: impl Into<String>, args: &CliArgs) -> Result<Self> {
        let config = UnrollerConfig::load(args.config.as_deref())?;
        Ok(Self::new(name, config))
    }

    /// Create a new application.
    pub fn new(name: impl Into<String>, config: UnrollerConfig) -> Self {
        Self {
            name: name.into(),
            config: Arc::new(config),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Override the version string.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// The loaded configuration.
    pub fn config(&self) -> &UnrollerConfig {
        &self.config
    }

    /// Initialise tracing-based logging.
    ///
    /// Uses `RUST_LOG` env var if set, otherwise defaults based on verbosity flags.
    pub fn init_logging(&self, verbose: bool, quiet: bool) {
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else if quiet {
            EnvFilter::new("warn")
        } else if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        };

        let builder = tracing_subscriber::fmt().with_env_filter(filter);
        // Ignore error if a subscriber is already set (e.g. in tests).
        let _ = if self.config.logging.json {
            builder.json().try_init()
        } else {
            builder.try_init()
        };
    }

    /// Run the CLI with the given arguments.
    pub async fn run(&self, args: CliArgs) -> Result<()> {
        self.init_logging(args.verbose, args.quiet);

        match args.command {
            Some(Command::Version) => {
                println!("{} {}", self.name, self.version);
                Ok(())
            }
            Some(Command::Config(config_cmd)) => {
                config_handlers::handle_config_command(args.config.as_deref(), config_cmd.command)
            }
            Some(Command::Serve { port }) => self.serve(port).await,
            None => self.serve(None).await,
        }
    }

    /// Build the router and serve it until interrupted.
    pub async fn serve(&self, port: Option<u16>) -> Result<()> {
        let state = self.app_state()?;
        let addr = format!(
            "{}:{}",
            self.config.server.host,
            port.unwrap_or(self.config.server.port)
        );

        let listener = TcpListener::bind(&addr).await?;
        info!(
            %addr,
            version = %self.version,
            api_host = %self.config.api_host,
            "Starting {}",
            self.name
        );

        axum::serve(listener, build_router(state))
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("{} stopped", self.name);
        Ok(())
    }

    /// Wire the sources, unroller and health checks from the configuration.
    pub fn app_state(&self) -> Result<AppState> {
        let client = build_client(self.config.http.timeout())?;
        let unroller = ContentUnroller::new(
            build_sources(&self.config, &client),
            self.config.api_host.clone(),
        );

        let store = &self.config.content_store;
        let preview = &self.config.content_preview;
        let health = HealthChecker::new(
            client,
            vec![
                Upstream::new(&store.app_name, &store.host),
                Upstream::new(&preview.app_name, &preview.host),
            ],
        );

        Ok(AppState::new(unroller, health)
            .with_build_info(BuildInfo::new(&self.name, &self.version)))
    }
}

/// The four content sources described by `config`.
///
/// Batch sources are wrapped in a [`RetryingSource`] when
/// `http.max_attempts` is above 1; preview sources never fail, so they are
/// not.
pub fn build_sources(config: &UnrollerConfig, client: &reqwest::Client) -> ContentSources {
    let store = &config.content_store;
    let preview = &config.content_preview;
    let paths = &config.paths;
    let attempts = config.http.max_attempts;

    let content = BatchReader::new(client.clone(), &store.app_name, store.url(&paths.content))
        .with_member_expansion();
    let internal = BatchReader::new(
        client.clone(),
        &store.app_name,
        store.url(&paths.internal_content),
    );

    ContentSources {
        content: with_retry(Arc::new(content), attempts),
        internal: with_retry(Arc::new(internal), attempts),
        preview: Arc::new(PreviewReader::new(
            client.clone(),
            &preview.app_name,
            preview.url(&paths.content),
        )),
        internal_preview: Arc::new(PreviewReader::new(
            client.clone(),
            &preview.app_name,
            preview.url(&paths.internal_content),
        )),
    }
}

fn with_retry(source: Arc<dyn ContentSource>, max_attempts: u32) -> Arc<dyn ContentSource> {
    if max_attempts > 1 {
        Arc::new(RetryingSource::new(source).with_max_attempts(max_attempts))
    } else {
        source
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("Shutdown signal received");
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_unroller_cli_new() {
        let cli = UnrollerCli::new("content-unroller", UnrollerConfig::default())
            .with_version("9.9.9");
        assert_eq!(cli.name, "content-unroller");
        assert_eq!(cli.version, "9.9.9");
        assert_eq!(cli.config().server.port, 9090);
    }

    #[test]
    fn test_build_sources_names() {
        let config = UnrollerConfig::default();
        let client = build_client(config.http.timeout()).unwrap();
        let sources = build_sources(&config, &client);

        assert_eq!(sources.content.name(), "content-public-read");
        assert_eq!(sources.internal.name(), "content-public-read");
        assert_eq!(sources.preview.name(), "content-public-read-preview");
        assert_eq!(sources.internal_preview.name(), "content-public-read-preview");
    }

    #[test]
    fn test_build_sources_with_retry() {
        let mut config = UnrollerConfig::default();
        config.http.max_attempts = 3;
        let client = build_client(config.http.timeout()).unwrap();
        let sources = build_sources(&config, &client);

        assert_eq!(sources.content.name(), "content-public-read");
    }

    #[test]
    fn test_app_state_wires_health_checks() {
        let cli = UnrollerCli::new("content-unroller", UnrollerConfig::default());
        let state = cli.app_state().unwrap();

        let upstreams = state.health.upstreams();
        assert_eq!(upstreams.len(), 2);
        assert_eq!(upstreams[0].app_name, "content-public-read");
        assert_eq!(upstreams[1].host, "http://localhost:8080/__content-preview");
        assert_eq!(state.unroller.api_host(), "test.api.ft.com");
        assert_eq!(state.build_info.name, "content-unroller");
    }

    #[tokio::test]
    async fn test_run_version() {
        let cli = UnrollerCli::new("content-unroller", UnrollerConfig::default());
        let args = CliArgs::parse_from(["content-unroller", "--quiet", "version"]);
        assert!(cli.run(args).await.is_ok());
    }
}
