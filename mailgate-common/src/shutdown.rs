//! Coordinated teardown of long-running collaborators.
//!
//! Components register named cleanup handlers with a [`ShutdownCoordinator`]
//! during startup. When the process receives `SIGTERM`/`SIGINT` (or shutdown
//! is triggered explicitly) every registered handler runs concurrently, the
//! whole set bounded by a single grace period. A handler that fails or
//! panics is logged and never prevents its siblings from running.

use std::{collections::BTreeSet, future::Future, sync::Arc, time::Duration};

use futures_util::future::BoxFuture;
use parking_lot::Mutex;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::error::ShutdownError;

/// Where a [`ShutdownCoordinator`] is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Accepting handler registrations.
    Idle,
    /// The shutdown sequence is running.
    ShuttingDown,
    /// The shutdown sequence has finished.
    Done,
}

struct Handler {
    name: String,
    task: BoxFuture<'static, anyhow::Result<()>>,
}

struct Inner {
    phase: Phase,
    handlers: Vec<Handler>,
}

/// Runs registered cleanup handlers exactly once at shutdown.
///
/// Cheap to clone; all clones share the same handler set and lifecycle, so
/// the coordinator can be handed to every component that needs to register
/// cleanup work. Duplicate or concurrent shutdown triggers collapse into a
/// single run.
#[derive(Clone)]
pub struct ShutdownCoordinator {
    inner: Arc<Mutex<Inner>>,
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                phase: Phase::Idle,
                handlers: Vec::new(),
            })),
        }
    }

    /// The coordinator's current lifecycle phase.
    pub fn phase(&self) -> Phase {
        self.inner.lock().phase
    }

    /// Register a named cleanup handler to run at shutdown.
    ///
    /// The handler does not run until shutdown is triggered. Registration
    /// after shutdown has begun is logged and dropped; the sequence only
    /// ever runs the handlers present when it started.
    pub fn add_handler<F>(&self, name: impl Into<String>, task: F)
    where
        F: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let name = name.into();
        let mut inner = self.inner.lock();

        if inner.phase == Phase::Idle {
            inner.handlers.push(Handler {
                name,
                task: Box::pin(task),
            });
        } else {
            warn!(
                handler = %name,
                "Shutdown already in progress, dropping cleanup handler"
            );
        }
    }

    /// Wait for `SIGTERM`/`SIGINT`, then run the shutdown sequence.
    ///
    /// # Errors
    ///
    /// Fails only if the OS signal handlers cannot be registered.
    pub async fn shutdown_on_interrupt(&self, grace: Duration) -> Result<(), ShutdownError> {
        wait_for_signal().await?;
        self.shutdown(grace).await;
        Ok(())
    }

    /// Run every registered handler, bounded by `grace`.
    ///
    /// Handlers run concurrently, each on its own task so that one that
    /// panics cannot take its siblings down with it. Handlers still running
    /// when the grace period elapses are abandoned and named in a warning.
    /// Once the sequence has started, further calls return immediately.
    pub async fn shutdown(&self, grace: Duration) {
        let handlers = {
            let mut inner = self.inner.lock();
            if inner.phase != Phase::Idle {
                debug!("Shutdown already requested");
                return;
            }
            inner.phase = Phase::ShuttingDown;
            std::mem::take(&mut inner.handlers)
        };

        info!(handlers = handlers.len(), "Shutting down");

        let pending: Arc<Mutex<BTreeSet<String>>> = Arc::new(Mutex::new(
            handlers.iter().map(|handler| handler.name.clone()).collect(),
        ));

        let mut tasks = JoinSet::new();
        for Handler { name, task } in handlers {
            let pending = Arc::clone(&pending);
            tasks.spawn(async move {
                match task.await {
                    Ok(()) => debug!(handler = %name, "Cleanup complete"),
                    Err(error) => error!(handler = %name, %error, "Cleanup failed"),
                }
                pending.lock().remove(&name);
            });
        }

        let drained = tokio::time::timeout(grace, async {
            while let Some(joined) = tasks.join_next().await {
                if let Err(error) = joined {
                    error!(%error, "Cleanup handler panicked");
                }
            }
        })
        .await;

        if drained.is_err() {
            let stragglers = pending
                .lock()
                .iter()
                .cloned()
                .collect::<Vec<_>>()
                .join(", ");
            warn!(
                grace = ?grace,
                handlers = %stragglers,
                "Shutdown grace period elapsed, abandoning remaining handlers"
            );
            tasks.abort_all();
        }

        self.inner.lock().phase = Phase::Done;
        info!("Shutdown complete");
    }
}

/// Wait for a `SIGTERM` or `SIGINT` to stop the process.
#[cfg(unix)]
pub async fn wait_for_signal() -> Result<(), ShutdownError> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut terminate = signal(SignalKind::terminate())?;
    let mut interrupt = signal(SignalKind::interrupt())?;

    tokio::select! {
        _ = terminate.recv() => info!("Received SIGTERM"),
        _ = interrupt.recv() => info!("Received SIGINT"),
    }

    Ok(())
}

/// Wait for a `ctrl+c` to stop the process on non-UNIX systems.
#[cfg(not(unix))]
pub async fn wait_for_signal() -> Result<(), ShutdownError> {
    tokio::signal::ctrl_c().await?;
    info!("Received interrupt");
    Ok(())
}
