//! The at-least-once ingestion loop.
//!
//! A background task that opens a subscription with bounded retry, pulls
//! messages in arrival order, hands each one to an [`EventProcessor`], and
//! commits only after processing succeeds. A crash between persistence and
//! commit causes a redelivery that the idempotent store absorbs; a crash
//! before persistence causes a redelivery with no partial effect.

use crate::error::BrokerError;
use crate::event::Event;
use crate::metrics::IngestMetrics;
use crate::processor::EventProcessor;
use crate::subscription::{Subscription, SubscriptionMessage};
use retry::{retry_with_backoff, RetryConfig};
use std::future::Future;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Lifecycle of the ingestion loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestState {
    Disconnected,
    Connecting,
    Consuming,
    Stopping,
    Stopped,
    /// Connection attempts exhausted. The loop has exited; ingestion is
    /// stopped and only the logs say so.
    Failed,
}

/// Spawns and names the ingestion task.
pub struct IngestWorker;

impl IngestWorker {
    /// Start the loop as a background task the host does not block on.
    ///
    /// `connect` opens a fresh subscription; it is retried with the given
    /// policy, and each failed attempt's partially-opened resources are
    /// released before the next one. On exhaustion the task logs, parks in
    /// [`IngestState::Failed`] and exits without propagating an error.
    pub fn spawn<E, P, S, F, Fut>(
        connect: F,
        processor: P,
        retry: RetryConfig,
        metrics: IngestMetrics,
    ) -> IngestHandle
    where
        E: Event,
        P: EventProcessor<E>,
        S: Subscription<E> + 'static,
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Result<S, BrokerError>> + Send + 'static,
    {
        let (state_tx, state_rx) = watch::channel(IngestState::Disconnected);
        let (stop_tx, stop_rx) = watch::channel(false);

        let join = tokio::spawn(run(connect, processor, retry, metrics, state_tx, stop_rx));

        IngestHandle {
            state_rx,
            stop_tx,
            join: Mutex::new(Some(join)),
        }
    }
}

/// Handle to a running ingestion task: observe its state, stop it, await it.
pub struct IngestHandle {
    state_rx: watch::Receiver<IngestState>,
    stop_tx: watch::Sender<bool>,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl IngestHandle {
    /// Current state of the loop.
    pub fn state(&self) -> IngestState {
        *self.state_rx.borrow()
    }

    /// A receiver that observes every state transition.
    pub fn state_receiver(&self) -> watch::Receiver<IngestState> {
        self.state_rx.clone()
    }

    /// Signal the loop to stop and wait for the task to unwind completely.
    ///
    /// Cooperative: an in-flight message finishes processing and committing
    /// first. Idempotent; later calls return once the task is gone.
    pub async fn stop(&self) {
        let _ = self.stop_tx.send(true);

        if let Some(join) = self.join.lock().await.take() {
            if let Err(e) = join.await {
                warn!(error = %e, "Ingestion task join error during stop");
            }
        }
    }
}

/// Resolve when a stop has been requested. Pends forever if the handle was
/// dropped without signaling, leaving the loop running detached.
async fn stop_requested(stop_rx: &mut watch::Receiver<bool>) {
    if stop_rx.wait_for(|stopped| *stopped).await.is_err() {
        std::future::pending::<()>().await;
    }
}

async fn run<E, P, S, F, Fut>(
    connect: F,
    processor: P,
    retry: RetryConfig,
    metrics: IngestMetrics,
    state_tx: watch::Sender<IngestState>,
    mut stop_rx: watch::Receiver<bool>,
) where
    E: Event,
    P: EventProcessor<E>,
    S: Subscription<E> + 'static,
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<S, BrokerError>> + Send + 'static,
{
    let _ = state_tx.send(IngestState::Connecting);

    let mut subscription = tokio::select! {
        _ = stop_requested(&mut stop_rx) => {
            info!("Stop requested while connecting, ingestion loop exiting");
            let _ = state_tx.send(IngestState::Stopped);
            return;
        }
        opened = retry_with_backoff(connect, retry) => match opened {
            Ok(subscription) => subscription,
            Err(e) => {
                error!(
                    processor = processor.name(),
                    error = %e,
                    "Could not open subscription, ingestion will not run"
                );
                let _ = state_tx.send(IngestState::Failed);
                return;
            }
        }
    };

    let _ = state_tx.send(IngestState::Consuming);
    info!(processor = processor.name(), "Ingestion loop consuming");

    loop {
        // Stop flag is honored at the loop boundary only; a message already
        // being processed below runs to completion.
        if *stop_rx.borrow() {
            break;
        }

        tokio::select! {
            _ = stop_requested(&mut stop_rx) => break,
            next = subscription.next() => match next {
                Ok(Some(message)) => {
                    metrics.received();
                    handle_message(&processor, message, &metrics).await;
                }
                Ok(None) => {
                    info!("Subscription ended, ingestion loop exiting");
                    break;
                }
                Err(e) => {
                    warn!(error = %e, "Error pulling next message");
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
            }
        }
    }

    let _ = state_tx.send(IngestState::Stopping);
    drop(subscription);
    let _ = state_tx.send(IngestState::Stopped);
    info!("Ingestion loop stopped");
}

async fn handle_message<E, P, M>(processor: &P, message: M, metrics: &IngestMetrics)
where
    E: Event,
    P: EventProcessor<E>,
    M: SubscriptionMessage<E>,
{
    let event_id = message.event().event_id();

    if message.delivery_count() > 1 {
        debug!(
            event_id = %event_id,
            delivery_count = message.delivery_count(),
            "Processing redelivered message"
        );
    }

    match processor.process(message.event()).await {
        Ok(()) => {
            // Commit strictly after persistence.
            match message.commit().await {
                Ok(()) => metrics.committed(),
                Err(e) => warn!(
                    event_id = %event_id,
                    error = %e,
                    "Persisted but commit failed, expecting redelivery"
                ),
            }
        }
        Err(e) => {
            metrics.failed();
            warn!(
                event_id = %event_id,
                error = %e,
                "Processing failed, message left uncommitted"
            );
        }
    }
}
