use std::sync::Arc;

use anyhow::{Context, Result};
use reqwest::Client;
use tokio::net::TcpListener;

use crate::{
    classifier::{build_classifier, log_available_models},
    config::AppConfig,
    http::{build_router, AppState},
    infrastructure::{directories::ResolvedPaths, shutdown::Shutdown},
};

pub struct IssueReporterApp {
    _paths: ResolvedPaths,
    listener: TcpListener,
    state: AppState,
    shutdown: Shutdown,
}

impl IssueReporterApp {
    pub async fn initialize(
        config: AppConfig,
        paths: ResolvedPaths,
        shutdown: Shutdown,
    ) -> Result<Self> {
        let config = Arc::new(config);

        let http_client = Client::builder()
            .user_agent(format!(
                "campus-issue-reporter/{}",
                env!("CARGO_PKG_VERSION")
            ))
            .timeout(config.gemini.request_timeout)
            .build()?;

        let bind_addr = config.server.bind_addr();
        let listener = TcpListener::bind(&bind_addr)
            .await
            .with_context(|| format!("failed to bind {bind_addr}"))?;

        log_available_models(&config, http_client.clone()).await;
        let classifier = build_classifier(&config, http_client)?;

        Ok(Self {
            _paths: paths,
            listener,
            state: AppState::new(config, classifier),
            shutdown,
        })
    }

    pub async fn run(self) -> Result<()> {
        let IssueReporterApp {
            _paths: _,
            listener,
            state,
            shutdown,
        } = self;

        let addr = listener.local_addr()?;
        tracing::info!(
            target: "server",
            %addr,
            classifier = state.classifier.name(),
            gemini_configured = state.config.gemini.is_configured(),
            "Campus Issue Reporter backend started"
        );
        for path in ["/", "/api/classify", "/api/health"] {
            tracing::info!(target: "server", "endpoint http://{addr}{path}");
        }

        let router = build_router(state);
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown.subscribe().wait())
            .await
            .context("HTTP server terminated with an error")?;

        tracing::info!(target: "server", "server stopped");
        Ok(())
    }
}
