use std::{net::SocketAddr, sync::Arc};

use anyhow::{bail, Context};
use http::HeaderValue;
use tokio::{signal, sync::watch};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

use erp_api as api;
use api::{
    config::AppConfig,
    documents::{DocumentRenderer, HttpDocumentRenderer, StaticPdfRenderer},
    email::{EmailSender, LogEmailSender},
    handlers::Adapters,
    message_queue::{InMemoryMessageQueue, MessageQueue, RedisMessageQueue},
    storage::{InMemoryStorage, ObjectStorage},
    tasks::{SendEmailHandler, TaskWorker, SEND_EMAIL, USER_ADMIN},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = api::config::load_config().context("failed to load configuration")?;
    api::config::init_tracing(cfg.log_level(), cfg.log_json);
    api::handlers::health::init_start_time();

    let base_logger = api::logging::setup_logger(api::logging::LoggerConfig::default());

    // Init DB
    let db_pool = api::db::establish_connection_from_app_config(&cfg).await?;
    if cfg.auto_migrate {
        api::db::run_migrations(&db_pool).await.map_err(|e| {
            error!("Failed running migrations: {}", e);
            e
        })?;
    }
    let db_arc = Arc::new(db_pool);

    // Init events
    let (event_sender, event_rx) = api::events::EventSender::channel(cfg.event_channel_capacity);
    let event_sender = Arc::new(event_sender);
    tokio::spawn(api::events::process_events(event_rx));

    let adapters = build_adapters(&cfg).await?;
    let email = build_email_sender(&cfg)?;

    // Background jobs share the queue the services enqueue on
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let worker = TaskWorker::new(adapters.queue.clone(), cfg.task_poll_interval())
        .register(SEND_EMAIL, Arc::new(SendEmailHandler::new(email.clone())))
        .register(
            USER_ADMIN,
            Arc::new(api::services::users::UserAdminHandler::new(
                db_arc.clone(),
                event_sender.clone(),
                email,
                cfg.app_url.clone(),
                cfg.email.from.clone(),
                api::logging::component_logger(&base_logger, "user_admin"),
            )),
        );
    let worker_handle = tokio::spawn(worker.run(shutdown_rx));

    let app_state = api::AppState::new(
        db_arc.clone(),
        cfg.clone(),
        event_sender,
        adapters,
        &base_logger,
    )?;
    let services = app_state.services.clone();

    let app = api::app_router(app_state, base_logger).layer(cors_layer(&cfg)?);

    // Bind and serve
    let addr: SocketAddr = format!("{}:{}", cfg.host, cfg.port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", cfg.host, cfg.port))?;
    info!("erp-api listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Debounced edits still waiting for their quiet period
    let summary = services.flush_pending().await;
    if summary.is_clean() {
        info!(written = summary.written, "pending writes flushed");
    } else {
        error!(
            written = summary.written,
            failed = summary.failed,
            "some pending writes could not be flushed"
        );
    }
    let _ = shutdown_tx.send(true);
    if let Err(e) = worker_handle.await {
        warn!(error = %e, "task worker ended abnormally");
    }

    Ok(())
}

async fn build_adapters(cfg: &AppConfig) -> anyhow::Result<Adapters> {
    let storage: Arc<dyn ObjectStorage> = match cfg.storage.backend.as_str() {
        #[cfg(feature = "s3")]
        "s3" => Arc::new(api::storage::S3Storage::from_config(&cfg.storage).await),
        #[cfg(not(feature = "s3"))]
        "s3" => bail!("storage backend 's3' requires the `s3` feature"),
        _ => InMemoryStorage::new(),
    };

    let renderer: Arc<dyn DocumentRenderer> = if cfg.renderer.base_url.trim().is_empty() {
        warn!("No renderer configured; releases attach a placeholder PDF");
        Arc::new(StaticPdfRenderer::new())
    } else {
        Arc::new(HttpDocumentRenderer::new(&cfg.renderer)?)
    };

    let queue: Arc<dyn MessageQueue> = match cfg.message_queue_backend.to_ascii_lowercase().as_str()
    {
        "redis" => match RedisMessageQueue::new(&cfg.redis_url, cfg.message_queue_namespace.clone())
        {
            Ok(queue) => Arc::new(queue),
            Err(err) => {
                error!(
                    "Failed to initialize Redis message queue (falling back to in-memory): {}",
                    err
                );
                Arc::new(InMemoryMessageQueue::new())
            }
        },
        _ => Arc::new(InMemoryMessageQueue::new()),
    };

    Ok(Adapters {
        renderer,
        storage,
        queue,
    })
}

fn build_email_sender(cfg: &AppConfig) -> anyhow::Result<Arc<dyn EmailSender>> {
    match cfg.email.backend.as_str() {
        #[cfg(feature = "smtp")]
        "smtp" => Ok(Arc::new(api::email::SmtpEmailSender::from_config(
            &cfg.email,
        )?)),
        #[cfg(not(feature = "smtp"))]
        "smtp" => bail!("email backend 'smtp' requires the `smtp` feature"),
        _ => Ok(Arc::new(LogEmailSender::new())),
    }
}

fn cors_layer(cfg: &AppConfig) -> anyhow::Result<CorsLayer> {
    let configured_origins: Option<Vec<HeaderValue>> = cfg
        .cors_allowed_origins
        .as_ref()
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .filter_map(|origin| HeaderValue::from_str(origin).ok())
                .collect::<Vec<_>>()
        })
        .filter(|origins| !origins.is_empty());

    if let Some(origins) = configured_origins {
        Ok(CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any))
    } else if cfg.should_allow_permissive_cors() {
        info!("Using permissive CORS because explicit origins were not configured");
        Ok(CorsLayer::permissive())
    } else {
        bail!("Missing CORS configuration: set APP__CORS_ALLOWED_ORIGINS or APP__CORS_ALLOW_ANY_ORIGIN=true")
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
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
}
