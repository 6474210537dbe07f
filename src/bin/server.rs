//! Ambient binary: wires config, logging, storage, the event pipeline, and
//! the HTTP transcoding layer (spec §1/§6) into a running process.
//!
//! Grounded in the teacher's `rocket()`/`build_rocket` startup sequence —
//! read config, build managed state, attach `AdHoc::on_liftoff` fairings
//! for background tasks — generalized from the teacher's webhook
//! dispatcher and retention fairings to this crate's event consumer and
//! TTL reaper startup.

use ephemeral_chat::config::{Backend, Config};
use ephemeral_chat::event_consumer::EventConsumer;
use ephemeral_chat::event_producer::{EventProducer, KafkaEventProducer};
use ephemeral_chat::http_api::{self, AppState};
use ephemeral_chat::messenger::Messenger;
use ephemeral_chat::storage::memory::InMemoryStorage;
use ephemeral_chat::storage::postgres::PostgresStorage;
use ephemeral_chat::storage::redis_kv::RedisStorage;
use ephemeral_chat::storage::Storage;
use ephemeral_chat::ttl_reaper::TtlReaper;
use ephemeral_chat::webhook::WebhookCaller;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Spec §5: drain in-flight work for at most this long after a shutdown
/// signal before the broker/db handles are dropped regardless.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[rocket::main]
async fn main() {
    dotenvy::dotenv().ok();

    let config = Config::from_env().unwrap_or_else(|err| {
        eprintln!("invalid configuration: {err}");
        std::process::exit(1);
    });

    ephemeral_chat::logging::init(config.app.env);

    let backend: Arc<dyn Storage> = build_backend(&config)
        .await
        .unwrap_or_else(|err| {
            error!(error = %err, "failed to initialize storage backend");
            std::process::exit(1);
        });

    // Spec §4.6: broker unreachability at startup fails the process.
    let producer: Arc<dyn EventProducer> =
        match KafkaEventProducer::new(&config.kafka.broker, &config.kafka.topic) {
            Ok(p) => Arc::new(p),
            Err(err) => {
                error!(error = %err, "failed to initialize event producer");
                std::process::exit(1);
            }
        };

    let webhook = match WebhookCaller::new(config.webhook.clone().into()) {
        Ok(w) => Arc::new(w),
        Err(err) => {
            error!(error = %err, "failed to initialize webhook caller");
            std::process::exit(1);
        }
    };

    let consumer = match EventConsumer::new(
        &config.kafka.broker,
        &config.kafka.consumer_group,
        &config.kafka.topic,
        std::time::Duration::from_secs(20),
        webhook,
    ) {
        Ok(c) => c,
        Err(err) => {
            error!(error = %err, "failed to initialize event consumer");
            std::process::exit(1);
        }
    };
    let shutdown = CancellationToken::new();
    let consumer_shutdown = shutdown.clone();
    let consumer_task = tokio::spawn(async move {
        tokio::select! {
            result = consumer.run() => {
                if let Err(err) = result {
                    error!(error = %err, "event consumer terminated, process restart required");
                }
            }
            () = consumer_shutdown.cancelled() => {
                info!("event consumer stopping for shutdown");
            }
        }
    });

    if let Err(err) = ephemeral_chat::metrics_layer::install(SocketAddr::from((
        [0, 0, 0, 0],
        config.app.port_http + 1,
    ))) {
        error!(error = %err, "failed to install metrics endpoint");
    }

    let messenger = Arc::new(Messenger::new(backend, producer, Arc::new(TtlReaper::new())));
    let state = AppState {
        messenger,
        request_timeout: config.app.request_timeout,
    };

    let grace_secs = SHUTDOWN_GRACE.as_secs();
    let figment = rocket::Config::figment()
        .merge(("address", config.app.address.clone()))
        .merge(("port", config.app.port_http))
        .merge(("shutdown.grace", grace_secs))
        .merge(("shutdown.mercy", grace_secs));

    let rocket = http_api::mount(rocket::custom(figment), state);

    let rocket = match rocket.ignite().await {
        Ok(rocket) => rocket,
        Err(err) => {
            error!(error = %err, "failed to ignite rocket server");
            std::process::exit(1);
        }
    };
    let rocket_shutdown = rocket.shutdown();

    let ctrl_c_shutdown = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received, draining in-flight requests");
            rocket_shutdown.notify();
            ctrl_c_shutdown.cancel();
        }
    });

    info!(port = config.app.port_http, "starting ephemeral-chat-server");
    if let Err(err) = rocket.launch().await {
        error!(error = %err, "rocket server terminated with error");
        std::process::exit(1);
    }

    shutdown.cancel();
    if tokio::time::timeout(SHUTDOWN_GRACE, consumer_task).await.is_err() {
        error!("event consumer did not stop within the shutdown grace period");
    }
}

async fn build_backend(config: &Config) -> Result<Arc<dyn Storage>, String> {
    match config.app.backend {
        Backend::InMemory => Ok(Arc::new(InMemoryStorage::new(
            config.app.max_chat_size,
            config.app.max_chats,
        ))),
        Backend::Postgres => PostgresStorage::connect(
            &config.backend.postgres_dsn(),
            config.app.max_chats as i64,
            config.app.max_chat_size as i64,
            config.backend.flush_on_start,
        )
        .await
        .map(|s| Arc::new(s) as Arc<dyn Storage>)
        .map_err(|e| e.to_string()),
        Backend::Redis => RedisStorage::connect(
            &config.backend.redis_addr(),
            config.app.max_chat_size as isize,
            config.app.max_chats as isize,
            config.backend.flush_on_start,
        )
        .await
        .map(|s| Arc::new(s) as Arc<dyn Storage>)
        .map_err(|e| e.to_string()),
    }
}
