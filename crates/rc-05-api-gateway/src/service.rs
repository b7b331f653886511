//! API Gateway service - main entry point.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use rc_04_report_ingestion::ReportIntake;
use shared_types::ReportRegistry;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::domain::config::GatewayConfig;
use crate::domain::error::GatewayError;
use crate::domain::origin::OriginPolicy;
use crate::router::{build_router, AppState};

/// HTTP front end of the collector.
pub struct ApiGatewayService {
    config: GatewayConfig,
    router: Router,
}

impl ApiGatewayService {
    /// Validate `config` and assemble the router.
    pub fn new(
        config: GatewayConfig,
        registry: Arc<ReportRegistry>,
        intake: Arc<dyn ReportIntake>,
    ) -> Result<Self, GatewayError> {
        config.validate()?;

        let policy = OriginPolicy::from_domains(&config.allowed_domains)?;
        if policy.allows_all() {
            warn!("No allowed domains configured; accepting reports from any origin");
        }

        let state = AppState { registry, intake };
        let router = build_router(state, Arc::new(policy), &config);

        Ok(Self { config, router })
    }

    /// Router for in-process use (tests, embedding).
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn bind_addr(&self) -> SocketAddr {
        self.config.bind_addr()
    }

    /// Bind the configured address and serve until `shutdown` resolves.
    pub async fn serve<F>(self, shutdown: F) -> Result<(), GatewayError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.bind_addr();
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| GatewayError::Bind { addr, source })?;
        self.serve_on(listener, shutdown).await
    }

    /// Serve on an already bound listener until `shutdown` resolves.
    ///
    /// In-flight requests complete before this returns.
    pub async fn serve_on<F>(self, listener: TcpListener, shutdown: F) -> Result<(), GatewayError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let local = listener.local_addr().map_err(GatewayError::Serve)?;
        info!(addr = %local, "Report gateway listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(GatewayError::Serve)?;

        info!("Report gateway stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoIntake;

    #[async_trait::async_trait]
    impl ReportIntake for NoIntake {
        async fn save_report(
            &self,
            _report_type: &str,
            _report: shared_types::Report,
            _user_agent: &str,
        ) -> Result<rc_04_report_ingestion::IntakeOutcome, rc_04_report_ingestion::IntakeError>
        {
            Ok(rc_04_report_ingestion::IntakeOutcome::Stored)
        }
    }

    fn service(config: GatewayConfig) -> Result<ApiGatewayService, GatewayError> {
        ApiGatewayService::new(
            config,
            Arc::new(ReportRegistry::with_defaults()),
            Arc::new(NoIntake),
        )
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = GatewayConfig {
            allowed_domains: vec!["*..example.com".into()],
            ..Default::default()
        };
        assert!(service(config).is_err());
    }

    #[tokio::test]
    async fn test_serve_stops_on_shutdown() {
        let gateway = service(GatewayConfig::default()).unwrap();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();

        let server = tokio::spawn(gateway.serve_on(listener, async {
            let _ = rx.await;
        }));
        tx.send(()).unwrap();

        let result = tokio::time::timeout(std::time::Duration::from_secs(5), server)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_ok());
    }
}
