//! Event consumer (C7): dedup + webhook dispatch, spec §4.7.
//!
//! Grounded in `kafkaconsumer/internal/kafka/kafka.go`: a single-partition
//! consumer reading from the latest offset at startup (`auto.offset.reset =
//! latest`, no committed group state to resume from), paired with the
//! dedup set (§4.10) and the webhook caller (C8). Consumer lifecycle
//! errors terminate the task per spec §7 ("require process restart") —
//! this function returns an error rather than retrying internally.

use crate::dedup::DedupSet;
use crate::webhook::WebhookCaller;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::message::Message;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

pub struct EventConsumer {
    consumer: StreamConsumer,
    dedup: DedupSet<String>,
    webhook: Arc<WebhookCaller>,
}

impl EventConsumer {
    pub fn new(
        broker: &str,
        group_id: &str,
        topic: &str,
        dedup_window: Duration,
        webhook: Arc<WebhookCaller>,
    ) -> Result<Self, rdkafka::error::KafkaError> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", broker)
            .set("group.id", group_id)
            .set("enable.auto.commit", "true")
            .set("auto.offset.reset", "latest")
            .create()?;
        consumer.subscribe(&[topic])?;

        Ok(Self {
            consumer,
            dedup: DedupSet::new(dedup_window),
            webhook,
        })
    }

    /// Runs until the underlying stream errors out (broker connection
    /// lost, subscription revoked); per spec §7 this is a lifecycle fault
    /// and the caller is expected to restart the process, not this task.
    pub async fn run(&self) -> Result<(), rdkafka::error::KafkaError> {
        loop {
            let message = self.consumer.recv().await?;
            let Some(payload) = message.payload() else {
                warn!("chat-created event had no payload, skipping");
                continue;
            };
            let chat_uuid = String::from_utf8_lossy(payload).into_owned();

            if self.dedup.is_exist(&chat_uuid) {
                info!(chat = %chat_uuid, "skipping duplicate chat-created event");
                continue;
            }

            match crate::ids::Handle::parse(&chat_uuid) {
                Ok(chat) => match self.webhook.deliver(chat).await {
                    Ok(()) => self.dedup.add(chat_uuid),
                    Err(err) => {
                        error!(chat = %chat_uuid, error = %err, "webhook delivery exhausted retries")
                    }
                },
                Err(_) => warn!(chat = %chat_uuid, "chat-created event had unparseable payload"),
            }
        }
    }
}
