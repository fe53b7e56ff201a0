//! End-to-end tests for the inbound forwarding pipeline.
//!
//! These wire a real Kafka consumer to an in-process provider stub and
//! verify the whole path: record intake, MIME decoding, forwarding, and
//! archiving. They require a running Kafka broker and only execute when
//! both `TEST_INTEGRATION` and `KAFKA_CONNECT` are set; otherwise each
//! test skips itself by returning early.

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod support;

use std::{collections::HashMap, sync::Arc, time::Duration};

use mailgate_delivery::{DeliveryConfig, HttpMailer, InboundEmailHandler, MailerConfig};
use mailgate_queue::{KafkaConfig, RecordConsumer, RecordHandler, TopicConfig};
use mailgate_store::{EmailStore, MemoryEmailStore};
use rdkafka::{
    ClientConfig,
    producer::{FutureProducer, FutureRecord},
};
use tokio_util::sync::CancellationToken;

use support::StubProvider;

macro_rules! maybe_skip_kafka_integration {
    () => {{
        match (
            std::env::var("TEST_INTEGRATION").is_ok(),
            std::env::var("KAFKA_CONNECT").ok(),
        ) {
            (true, Some(connection)) => connection,
            (true, None) => {
                panic!(
                    "TEST_INTEGRATION is set which requires running integration tests, but \
                    KAFKA_CONNECT is not set. Run a broker and set KAFKA_CONNECT to the host \
                    and port where it is accessible."
                )
            }
            (false, _) => {
                eprintln!(
                    "skipping end-to-end tests - set TEST_INTEGRATION and KAFKA_CONNECT to run"
                );
                return;
            }
        }
    }};
}

const HELLO: &[u8] = b"From: Customer <customer@acme.test>\r\n\
To: intake@mailgate.test\r\n\
Subject: Hello\r\n\
\r\n\
Hello from the outside.\r\n";

fn nanos() -> u128 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos()
}

async fn produce(producer: &FutureProducer, topic: &str, payload: &[u8]) {
    producer
        .send(
            FutureRecord::to(topic).payload(payload).key("test"),
            Duration::from_secs(5),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn inbound_records_are_decoded_forwarded_and_archived() {
    let connection = maybe_skip_kafka_integration!();

    let provider = StubProvider::start().await;
    let archive = Arc::new(MemoryEmailStore::new());

    let run = nanos();
    let topic = format!("mailgate-e2e-{run}");
    let kafka = KafkaConfig {
        brokers: connection.clone(),
        user: format!("e2e-{run}"),
        topics: TopicConfig {
            inbound_emails: topic.clone(),
        },
        session_timeout_ms: 6000,
        max_batch_size: 16,
        batch_linger_ms: 50,
    };

    let producer: FutureProducer = ClientConfig::new()
        .set("bootstrap.servers", &connection)
        .set("message.timeout.ms", "5000")
        .create()
        .unwrap();

    // An undecodable record first; it must be consumed without a send.
    produce(&producer, &topic, b"").await;
    produce(&producer, &topic, HELLO).await;

    let mailer = Arc::new(
        HttpMailer::new(&MailerConfig {
            base_url: provider.base_url(),
            api_key: "test-key".to_string(),
            request_timeout: 5,
        })
        .unwrap(),
    );
    let handler = InboundEmailHandler::new(
        DeliveryConfig {
            forward_from: "forwarder@mailgate.test".to_string(),
            remap: HashMap::new(),
        },
        mailer,
        Some(Arc::clone(&archive) as Arc<dyn EmailStore>),
    );

    let consumer = Arc::new(RecordConsumer::new(&kafka).unwrap());
    consumer
        .set_handler(topic.clone(), Arc::new(handler) as Arc<dyn RecordHandler>)
        .unwrap();

    let cancel = CancellationToken::new();
    let poll = {
        let consumer = Arc::clone(&consumer);
        let cancel = cancel.clone();
        tokio::spawn(async move { consumer.poll(cancel).await })
    };

    assert!(
        provider.wait_for(1, Duration::from_secs(30)).await,
        "forwarded email did not reach the provider in time"
    );

    // Give the empty record a moment in case it arrives out of turn,
    // then confirm it never produced a second send.
    tokio::time::sleep(Duration::from_millis(500)).await;
    let sends = provider.captured();
    assert_eq!(sends.len(), 1);

    let payload = &sends[0];
    assert_eq!(payload["subject"], "Hello");
    assert_eq!(payload["from"]["email"], "forwarder@mailgate.test");
    assert_eq!(payload["reply_to"]["email"], "customer@acme.test");
    assert_eq!(
        payload["to"],
        serde_json::json!([{ "email": "intake@mailgate.test" }])
    );

    let archived = archive.find_by_message_id("stub-1").await.unwrap();
    assert_eq!(archived.sender, "customer@acme.test");
    assert_eq!(archived.subject, "Hello");

    cancel.cancel();
    poll.await.unwrap().unwrap();
    provider.shutdown();
}
