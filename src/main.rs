use std::sync::Arc;
use std::time::Duration;

use actix_web::middleware::{Logger, NormalizePath};
use actix_web::web::{Data, PayloadConfig};
use actix_web::{App, HttpServer};
use anyhow::Context;
use dotenvy::dotenv;
use tracing::info;
use tracing_appender::rolling;
use utoipa::OpenApi; // needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

use leave_quota::collaborators::{Clock, SystemClock};
use leave_quota::config::Config;
use leave_quota::db::init_db;
use leave_quota::directory::MySqlDirectory;
use leave_quota::docs::ApiDoc;
use leave_quota::leave::{AttachmentLimits, LeaveRequestService, QuotaLedger};
use leave_quota::notify::{MySqlNotificationSender, NotificationQueue};
use leave_quota::routes;
use leave_quota::storage::LocalAttachmentStorage;
use leave_quota::store::LeaveStore;
use leave_quota::store::mysql::MySqlLeaveStore;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "leave-quota.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    let level: tracing::Level = config
        .log_level
        .parse()
        .with_context(|| format!("invalid LOG_LEVEL {}", config.log_level))?;

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(level)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .init();

    info!(addr = %config.server_addr, "Server starting...");

    let pool = init_db(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    let store: Arc<dyn LeaveStore> = Arc::new(MySqlLeaveStore::new(pool.clone()));
    let directory = Arc::new(MySqlDirectory::new(pool.clone()));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let (queue, worker) = NotificationQueue::new(
        config.notification_queue_capacity,
        Arc::new(MySqlNotificationSender::new(pool.clone())),
    );
    let worker = worker.with_retry(
        config.notification_max_attempts,
        Duration::from_millis(500),
    );
    actix_web::rt::spawn(worker.run());

    let ledger = Arc::new(QuotaLedger::new(
        store.clone(),
        directory.clone(),
        directory.clone(),
        clock.clone(),
    ));
    let requests = Data::new(LeaveRequestService::new(
        store,
        ledger.clone(),
        directory.clone(),
        directory.clone(),
        Arc::new(LocalAttachmentStorage::new(
            &config.attachment_dir,
            &config.attachment_base_url,
        )),
        directory,
        Arc::new(queue),
        clock,
        AttachmentLimits {
            max_bytes: config.attachment_max_bytes,
            allowed_types: config.attachment_types.clone(),
        },
    ));
    let ledger = Data::from(ledger);

    // one byte over the limit still reaches the attachment check
    let payload_limit = usize::try_from(config.attachment_max_bytes)
        .unwrap_or(usize::MAX)
        .saturating_add(1);
    let server_addr = config.server_addr.clone();
    let config = Data::new(config);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(config.clone())
            .app_data(requests.clone())
            .app_data(ledger.clone())
            .app_data(PayloadConfig::new(payload_limit))
            // Protected routes with rate limiting
            .configure(|cfg| routes::configure(cfg, &config))
    })
    .bind(server_addr)?
    .run()
    .await?;

    Ok(())
}
