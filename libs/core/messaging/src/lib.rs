//! Event log broker capability on NATS JetStream.
//!
//! This library carries everything the notification pipeline needs to talk to
//! the event log:
//!
//! - [`EventPublisher`]: one shared outbound connection, bounded connect retry,
//!   publish-with-acknowledgment.
//! - [`JetStreamSubscription`]: a durable pull consumer yielding an ordered
//!   message sequence with explicit commit.
//! - [`IngestWorker`]: the at-least-once ingestion loop — connect with retry,
//!   process, commit after persistence, cooperative stop.
//!
//! # Broker capability mapping
//!
//! | Pipeline concept        | JetStream concept                     |
//! |-------------------------|---------------------------------------|
//! | topic                   | subject within a stream               |
//! | consumer group          | durable pull consumer                 |
//! | partition + offset ack  | (stream, sequence) in the publish ack |
//! | offset commit           | explicit message ack                  |
//!
//! Per-partition ordering maps to per-stream order of a single durable
//! consumer; this process is the subscription's only reader.

mod config;
mod error;
mod event;
mod ingest;
pub mod metrics;
mod processor;
mod publisher;
mod subscription;

pub use config::BrokerConfig;
pub use error::{BrokerError, ProcessingError};
pub use event::Event;
pub use ingest::{IngestHandle, IngestState, IngestWorker};
pub use crate::metrics::IngestMetrics;
pub use processor::EventProcessor;
pub use publisher::{EventPublisher, PublishReceipt};
pub use subscription::{JetStreamMessage, JetStreamSubscription, Subscription, SubscriptionMessage};
