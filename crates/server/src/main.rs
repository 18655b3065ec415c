//! Mailroom server entry point.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use mailroom_api::{AppState, router};
use mailroom_common::{Config, Metrics};
use mailroom_common::config::{DeliveryMode, QueueBackend};
use mailroom_queue::{
    DeadLetterSink, EmailService, JobProcessor, MemoryQueue, Queue, RedisQueue, RetryPolicy,
    Sender, SimulatedSender, SmtpSender, WorkerPool,
};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mailroom=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting mailroom server...");

    // Load configuration
    let config = Config::load()?;

    // Metrics collector, injected everywhere events are reported
    let metrics = Arc::new(Metrics::new());

    // Dead letter sink
    let dead_letters = Arc::new(DeadLetterSink::new());

    // Queue backend
    let queue: Arc<dyn Queue> = match config.queue.backend {
        QueueBackend::Memory => {
            info!(capacity = config.queue.capacity, "Using in-memory queue");
            Arc::new(MemoryQueue::new(config.queue.capacity, metrics.clone()))
        }
        QueueBackend::Redis => {
            info!(url = %config.queue.redis.url, key = %config.queue.redis.key, "Using redis queue");
            Arc::new(
                RedisQueue::connect(
                    &config.queue.redis.url,
                    config.queue.redis.key.clone(),
                    metrics.clone(),
                )
                .await?,
            )
        }
    };

    // Delivery capability
    let sender: Arc<dyn Sender> = match config.delivery.mode {
        DeliveryMode::Simulated => {
            info!(
                success_rate = config.delivery.success_rate,
                latency_ms = config.delivery.latency_ms,
                "Using simulated delivery"
            );
            Arc::new(SimulatedSender::new(
                Duration::from_millis(config.delivery.latency_ms),
                config.delivery.success_rate,
            ))
        }
        DeliveryMode::Smtp => {
            info!(url = %config.delivery.smtp.url, "Using SMTP delivery");
            Arc::new(SmtpSender::new(
                &config.delivery.smtp.url,
                &config.delivery.smtp.from,
            )?)
        }
    };

    // Dispatch engine
    let email_service = Arc::new(EmailService::new(
        queue.clone(),
        dead_letters.clone(),
        sender,
        metrics.clone(),
        RetryPolicy::new(config.retry.max_retries, config.retry.delay()),
    ));

    // Worker pool
    let pool = WorkerPool::new(config.workers.count, queue.clone());
    pool.start(email_service.clone() as Arc<dyn JobProcessor>)
        .await;

    // HTTP boundary
    let state = AppState::new(email_service, dead_letters, metrics);
    let app = router()
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "HTTP server listening");

    // Serve until the shutdown signal; new submissions stop first
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("HTTP server stopped accepting requests");

    // Close the queue so workers drain the buffer and run dry
    queue.close().await;
    info!("Queue closed for new jobs");

    // Wait for every worker to finish its in-flight job and exit
    pool.stop().await;
    info!("Shutdown complete");

    Ok(())
}
