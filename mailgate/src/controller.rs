//! Top-level controller: the configuration file given life.
//!
//! [`Mailgate`] deserializes straight from the RON config and owns the
//! startup sequence, the wiring between components, and the registration
//! of their cleanup handlers with the shutdown coordinator.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use mailgate_common::{logging, shutdown::ShutdownCoordinator};
use mailgate_delivery::{DeliveryConfig, HttpMailer, InboundEmailHandler, MailerConfig};
use mailgate_http::{AppState, HttpConfig, HttpServer};
use mailgate_queue::{KafkaConfig, RecordConsumer};
use mailgate_store::{EmailStore, PgEmailStore, PgUserStore, StoreConfig, connect};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::info;

const fn default_shutdown_grace() -> u64 {
    20
}

/// The whole service, as described by its configuration file.
#[derive(Debug, Deserialize)]
pub struct Mailgate {
    /// Log level, overridable with the `LOG_LEVEL` environment variable.
    #[serde(default)]
    log_level: Option<String>,

    /// How long shutdown handlers get before being abandoned, in seconds.
    #[serde(default = "default_shutdown_grace")]
    shutdown_grace: u64,

    kafka: KafkaConfig,
    store: StoreConfig,
    mailer: MailerConfig,
    delivery: DeliveryConfig,
    #[serde(default)]
    http: HttpConfig,
}

impl Mailgate {
    /// Bring up every component, then wait for an interrupt and wind
    /// them back down within the configured grace period.
    ///
    /// # Errors
    ///
    /// Fails when a collaborator cannot be built or reached during
    /// startup; once running, component failures are handled and logged
    /// where they occur.
    pub async fn run(self) -> anyhow::Result<()> {
        let started = Instant::now();
        logging::init(self.log_level.as_deref());

        let coordinator = ShutdownCoordinator::new();

        let pool = connect(&self.store).await?;
        {
            let pool = pool.clone();
            coordinator.add_handler("store", async move {
                pool.close().await;
                Ok(())
            });
        }
        let users = Arc::new(PgUserStore::try_new(pool.clone()).await?);
        let emails = Arc::new(PgEmailStore::try_new(pool).await?);

        let mailer = Arc::new(HttpMailer::new(&self.mailer)?);

        let consumer = Arc::new(RecordConsumer::new(&self.kafka)?);
        consumer.set_handler(
            self.kafka.topics.inbound_emails.clone(),
            Arc::new(InboundEmailHandler::new(
                self.delivery,
                mailer,
                Some(Arc::clone(&emails) as Arc<dyn EmailStore>),
            )),
        )?;
        info!(
            topic = %self.kafka.topics.inbound_emails,
            group = %self.kafka.group_id(),
            "Added inbound emails consumer"
        );

        let poll_cancel = CancellationToken::new();
        let polling = {
            let consumer = Arc::clone(&consumer);
            let cancel = poll_cancel.clone();
            tokio::spawn(async move { consumer.poll(cancel).await })
        };
        coordinator.add_handler("consumer", async move {
            poll_cancel.cancel();
            polling.await??;
            Ok(())
        });

        let server = HttpServer::new(&self.http, AppState::new(users, emails)).await?;
        info!(address = %server.local_addr(), "Started http server");

        let serve_cancel = CancellationToken::new();
        let serving = tokio::spawn(server.serve(serve_cancel.clone()));
        coordinator.add_handler("http", async move {
            serve_cancel.cancel();
            serving.await??;
            Ok(())
        });

        info!(elapsed = ?started.elapsed(), "Started application");

        coordinator
            .shutdown_on_interrupt(Duration::from_secs(self.shutdown_grace))
            .await?;

        Ok(())
    }
}
