//! Consumer-group record intake with per-partition ordered dispatch.
//!
//! Records are taken in batches: the loop waits for a first record, drains
//! follow-ups until the batch fills or the linger window closes, dispatches
//! each record in received order, and only then commits the batch's
//! offsets. A record is therefore redelivered after a crash rather than
//! lost, and a handler sees every record of a partition in order.

use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use parking_lot::RwLock;
use rdkafka::{
    ClientConfig, Message, Offset, TopicPartitionList,
    consumer::{CommitMode, Consumer, StreamConsumer},
    message::BorrowedMessage,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::{
    config::KafkaConfig,
    error::ConsumerError,
    handler::{Record, RecordHandler},
};

const RECEIVE_RETRY_DELAY: Duration = Duration::from_secs(1);

type HandlerMap = HashMap<String, Arc<dyn RecordHandler>>;

/// Consumer-group record intake.
///
/// Handlers are registered per topic before [`poll`](Self::poll) starts;
/// the poll loop then owns dispatch and offset commits until its
/// cancellation token fires.
pub struct RecordConsumer {
    consumer: StreamConsumer,
    handlers: RwLock<HandlerMap>,
    started: AtomicBool,
    max_batch_size: usize,
    batch_linger: Duration,
}

impl RecordConsumer {
    /// Build a consumer joining the `<user>-email-svc` group.
    ///
    /// Offsets are committed manually, after a batch has fully dispatched.
    ///
    /// # Errors
    ///
    /// Fails if the underlying Kafka client cannot be created.
    pub fn new(config: &KafkaConfig) -> Result<Self, ConsumerError> {
        let mut cfg = ClientConfig::new();
        cfg.set("bootstrap.servers", &config.brokers);
        cfg.set("session.timeout.ms", config.session_timeout_ms.to_string());
        cfg.set("enable.auto.commit", "false");
        cfg.set("group.id", config.group_id());
        cfg.set("auto.offset.reset", "earliest");

        let consumer: StreamConsumer = cfg.create().map_err(ConsumerError::Create)?;

        Ok(Self {
            consumer,
            handlers: RwLock::new(HashMap::new()),
            started: AtomicBool::new(false),
            max_batch_size: config.max_batch_size.max(1),
            batch_linger: Duration::from_millis(config.batch_linger_ms),
        })
    }

    /// Register `handler` for every record arriving on `topic`.
    ///
    /// # Errors
    ///
    /// A topic takes exactly one handler, and registration closes once
    /// polling has started.
    pub fn set_handler(
        &self,
        topic: impl Into<String>,
        handler: Arc<dyn RecordHandler>,
    ) -> Result<(), ConsumerError> {
        if self.started.load(Ordering::SeqCst) {
            return Err(ConsumerError::AlreadyPolling);
        }

        let topic = topic.into();
        let mut handlers = self.handlers.write();
        if handlers.contains_key(&topic) {
            return Err(ConsumerError::HandlerExists(topic));
        }
        handlers.insert(topic, handler);

        Ok(())
    }

    /// Poll for records until `cancel` fires.
    ///
    /// Cancellation is only observed between batches, so a batch in flight
    /// always dispatches and commits before the loop exits. Transient
    /// receive failures are logged and the loop continues.
    ///
    /// # Errors
    ///
    /// Fails if no handlers are registered, if the loop is already
    /// running, or if the topic subscription is rejected.
    pub async fn poll(&self, cancel: CancellationToken) -> Result<(), ConsumerError> {
        let topics: Vec<String> = self.handlers.read().keys().cloned().collect();
        if topics.is_empty() {
            return Err(ConsumerError::NoHandlers);
        }

        if self.started.swap(true, Ordering::SeqCst) {
            return Err(ConsumerError::AlreadyPolling);
        }

        let topic_refs: Vec<&str> = topics.iter().map(String::as_str).collect();
        self.consumer
            .subscribe(&topic_refs)
            .map_err(|source| ConsumerError::Subscribe {
                topics: topics.join(", "),
                source,
            })?;

        info!(topics = %topics.join(", "), "Consumer polling");

        loop {
            // The only cancellation point
            let first = tokio::select! {
                () = cancel.cancelled() => break,
                received = self.consumer.recv() => received,
            };

            let mut offsets = HashMap::new();

            match first {
                Ok(message) => {
                    dispatch(&self.handlers, record_of(&message)).await;
                    note_offset(&mut offsets, &message);
                }
                Err(error) => {
                    error!(%error, "Failed to receive record");
                    // A persistently failing broker must not spin the loop
                    tokio::time::sleep(RECEIVE_RETRY_DELAY).await;
                    continue;
                }
            }

            let mut dispatched = 1usize;
            let deadline = tokio::time::Instant::now() + self.batch_linger;

            while dispatched < self.max_batch_size {
                let Ok(received) = tokio::time::timeout_at(deadline, self.consumer.recv()).await
                else {
                    break;
                };

                match received {
                    Ok(message) => {
                        dispatch(&self.handlers, record_of(&message)).await;
                        note_offset(&mut offsets, &message);
                        dispatched += 1;
                    }
                    Err(error) => {
                        error!(%error, "Failed to receive record");
                        break;
                    }
                }
            }

            self.commit(&offsets);
        }

        info!("Consumer cancelled, leaving group");
        self.shutdown();

        Ok(())
    }

    /// Leave the group and stop fetching.
    ///
    /// Safe to call more than once, and without [`poll`](Self::poll) ever
    /// having started.
    pub fn shutdown(&self) {
        self.consumer.unsubscribe();
        debug!("Consumer unsubscribed");
    }

    fn commit(&self, offsets: &HashMap<(String, i32), i64>) {
        if offsets.is_empty() {
            return;
        }

        let mut list = TopicPartitionList::new();
        for ((topic, partition), offset) in offsets {
            // The committed offset names the next record to read
            if let Err(error) =
                list.add_partition_offset(topic, *partition, Offset::Offset(offset + 1))
            {
                error!(%error, topic, partition, "Failed to stage offset for commit");
                return;
            }
        }

        match self.consumer.commit(&list, CommitMode::Sync) {
            Ok(()) => debug!(partitions = list.count(), "Committed batch offsets"),
            Err(error) => {
                error!(%error, "Failed to commit batch offsets, records will be redelivered");
            }
        }
    }
}

fn record_of<'a>(message: &'a BorrowedMessage<'_>) -> Record<'a> {
    Record {
        topic: message.topic(),
        partition: message.partition(),
        offset: message.offset(),
        key: message.key(),
        payload: message.payload().unwrap_or_default(),
    }
}

fn note_offset(offsets: &mut HashMap<(String, i32), i64>, message: &BorrowedMessage<'_>) {
    let latest = offsets
        .entry((message.topic().to_string(), message.partition()))
        .or_insert(message.offset());
    *latest = (*latest).max(message.offset());
}

/// Hand `record` to the handler registered for its topic.
///
/// A topic nothing is registered for is logged and skipped; that is never
/// fatal to the poll loop.
async fn dispatch(handlers: &RwLock<HandlerMap>, record: Record<'_>) {
    let handler = handlers.read().get(record.topic).cloned();

    match handler {
        Some(handler) => handler.handle(record).await,
        None => warn!(
            topic = record.topic,
            partition = record.partition,
            offset = record.offset,
            "No handler registered for topic, skipping record"
        ),
    }
}
