//! PayPal webhook service entry point.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use tracing_subscriber::EnvFilter;

use paypal_webhooks::adapters::certificates::{FileCertificateStore, HttpCertificateSource};
use paypal_webhooks::adapters::events::InMemoryWebhookEventRepository;
use paypal_webhooks::adapters::handlers::LoggingEventHandler;
use paypal_webhooks::adapters::http::{app_router, WebhookAppState};
use paypal_webhooks::application::{HandlePaypalWebhookHandler, WebhookVerificationSettings};
use paypal_webhooks::config::{AppConfig, LogFormat, ServerConfig};
use paypal_webhooks::domain::webhook::{
    CertificateCache, EventDispatcher, IdempotentWebhookProcessor,
};

/// How often processed-event records are pruned.
const PRUNE_INTERVAL: Duration = Duration::from_secs(3600);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load_validated()?;
    init_tracing(&config.server);

    let paypal = &config.paypal;
    info!(
        environment = ?paypal.environment,
        api_base_url = paypal.api_base_url(),
        cert_cache_dir = %paypal.cert_cache_dir,
        cert_cache_ttl_secs = paypal.cert_cache_ttl_secs,
        "starting paypal-webhooks"
    );

    let certificates = CertificateCache::new(
        Arc::new(FileCertificateStore::new(&paypal.cert_cache_dir)),
        Arc::new(HttpCertificateSource::new(paypal.cert_fetch_timeout())?),
    )
    .with_ttl(paypal.cert_cache_ttl());

    let processor = Arc::new(IdempotentWebhookProcessor::new(
        Arc::new(InMemoryWebhookEventRepository::new()),
        EventDispatcher::new(Arc::new(LoggingEventHandler::new())),
    ));

    let webhook_handler = HandlePaypalWebhookHandler::new(
        WebhookVerificationSettings {
            webhook_id: paypal.webhook_id.clone(),
            allowed_cert_hosts: paypal.allowed_cert_hosts_list(),
        },
        Arc::new(certificates),
        processor.clone(),
    )
    .with_processing_timeout(config.server.request_timeout());

    let pruner = tokio::spawn(prune_processed_events(
        processor,
        paypal.processed_event_retention(),
    ));

    let app = app_router(
        WebhookAppState::new(Arc::new(webhook_handler)),
        config.server.max_body_bytes,
    );

    let addr = config.server.socket_addr()?;
    info!("paypal-webhooks listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pruner.abort();
    info!("paypal-webhooks exited");
    Ok(())
}

fn init_tracing(server: &ServerConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&server.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match server.log_format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

/// Periodically forgets event ids older than the retention window.
async fn prune_processed_events(processor: Arc<IdempotentWebhookProcessor>, retention: Duration) {
    let retention = match chrono::Duration::from_std(retention) {
        Ok(retention) => retention,
        Err(e) => {
            tracing::error!(error = %e, "Retention window out of range; pruning disabled");
            return;
        }
    };

    let mut interval = tokio::time::interval(PRUNE_INTERVAL);
    loop {
        interval.tick().await;
        match processor.prune_before(chrono::Utc::now() - retention).await {
            Ok(0) => {}
            Ok(removed) => tracing::debug!(removed, "Pruned processed webhook events"),
            Err(e) => tracing::warn!(error = %e, "Failed to prune processed webhook events"),
        }
    }
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
