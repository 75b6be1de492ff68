//! Subscription over the event log: an ordered message sequence with
//! explicit commit.

use crate::config::BrokerConfig;
use crate::error::BrokerError;
use crate::event::Event;
use crate::publisher::ensure_stream;
use async_nats::jetstream::consumer::pull::{Config as ConsumerConfig, Stream as MessageStream};
use async_nats::jetstream::consumer::AckPolicy;
use async_nats::jetstream::{self, Message};
use async_trait::async_trait;
use futures::StreamExt;
use std::marker::PhantomData;
use tracing::{debug, info, warn};

/// An ordered source of events with per-message commit.
///
/// This is the seam between the ingestion loop and the broker client; tests
/// drive the loop with an in-memory implementation.
#[async_trait]
pub trait Subscription<E: Event>: Send {
    type Message: SubscriptionMessage<E>;

    /// The next message in arrival order. `Ok(None)` means the sequence has
    /// ended and the loop should shut down cleanly.
    async fn next(&mut self) -> Result<Option<Self::Message>, BrokerError>;
}

/// One delivered event, committable exactly once.
#[async_trait]
pub trait SubscriptionMessage<E: Event>: Send {
    fn event(&self) -> &E;

    /// How many times the broker has delivered this message (1 = first time).
    fn delivery_count(&self) -> u32;

    /// Acknowledge durable processing, advancing the consumer's position.
    async fn commit(self) -> Result<(), BrokerError>;
}

/// Durable pull consumer bound to (stream, consumer group).
pub struct JetStreamSubscription<E: Event> {
    messages: MessageStream,
    subject: String,
    _marker: PhantomData<E>,
}

impl<E: Event> JetStreamSubscription<E> {
    /// Open the subscription: connect, make sure the stream and the durable
    /// consumer exist, and start the message sequence.
    ///
    /// Every resource is owned by the returned value, so a failed attempt
    /// tears itself down when dropped and the caller can simply retry.
    pub async fn open(config: &BrokerConfig) -> Result<Self, BrokerError> {
        let client = async_nats::connect(&config.url)
            .await
            .map_err(|e| BrokerError::connect(e.to_string()))?;

        let jetstream = jetstream::new(client);
        ensure_stream(&jetstream, &config.stream, &config.subject).await?;

        let stream = jetstream
            .get_stream(&config.stream)
            .await
            .map_err(|e| BrokerError::connect(e.to_string()))?;

        let consumer = match stream
            .get_consumer::<ConsumerConfig>(&config.consumer_group)
            .await
        {
            Ok(consumer) => {
                debug!(consumer = %config.consumer_group, "Consumer already exists");
                consumer
            }
            Err(_) => {
                info!(
                    consumer = %config.consumer_group,
                    stream = %config.stream,
                    "Creating durable consumer"
                );
                stream
                    .create_consumer(ConsumerConfig {
                        durable_name: Some(config.consumer_group.clone()),
                        name: Some(config.consumer_group.clone()),
                        ack_policy: AckPolicy::Explicit,
                        filter_subject: config.subject.clone(),
                        ..Default::default()
                    })
                    .await
                    .map_err(|e| BrokerError::connect(e.to_string()))?
            }
        };

        let messages = consumer
            .messages()
            .await
            .map_err(|e| BrokerError::connect(e.to_string()))?;

        info!(
            stream = %config.stream,
            consumer = %config.consumer_group,
            "Subscription opened"
        );

        Ok(Self {
            messages,
            subject: config.subject.clone(),
            _marker: PhantomData,
        })
    }
}

#[async_trait]
impl<E: Event> Subscription<E> for JetStreamSubscription<E> {
    type Message = JetStreamMessage<E>;

    async fn next(&mut self) -> Result<Option<Self::Message>, BrokerError> {
        loop {
            let message = match self.messages.next().await {
                None => return Ok(None),
                Some(Err(e)) => return Err(BrokerError::consumer(e.to_string())),
                Some(Ok(message)) => message,
            };

            let (sequence, delivery_count) = match message.info() {
                Ok(info) => (info.stream_sequence, info.delivered as u32),
                Err(e) => {
                    warn!(error = %e, "Failed to read message info, using defaults");
                    (0, 1)
                }
            };

            match serde_json::from_slice::<E>(&message.payload) {
                Ok(event) => {
                    return Ok(Some(JetStreamMessage {
                        event,
                        message,
                        sequence,
                        delivery_count,
                    }));
                }
                Err(e) => {
                    // A payload that cannot decode will never succeed on
                    // redelivery; commit it and move on.
                    warn!(
                        subject = %self.subject,
                        sequence = sequence,
                        error = %e,
                        "Skipping undecodable message"
                    );
                    if let Err(ack_err) = message.ack().await {
                        warn!(error = %ack_err, "Failed to ack undecodable message");
                    }
                }
            }
        }
    }
}

/// A message received from JetStream with its broker metadata.
pub struct JetStreamMessage<E: Event> {
    event: E,
    message: Message,
    /// Stream sequence (the offset analog).
    pub sequence: u64,
    delivery_count: u32,
}

#[async_trait]
impl<E: Event> SubscriptionMessage<E> for JetStreamMessage<E> {
    fn event(&self) -> &E {
        &self.event
    }

    fn delivery_count(&self) -> u32 {
        self.delivery_count
    }

    async fn commit(self) -> Result<(), BrokerError> {
        self.message
            .ack()
            .await
            .map_err(|e| BrokerError::consumer(e.to_string()))
    }
}
