//! Processor trait the ingestion loop drives.

use crate::error::ProcessingError;
use crate::event::Event;
use async_trait::async_trait;

/// Handles one event from the subscription.
///
/// Implementations must be idempotent with respect to redelivery: returning
/// `Ok` commits the message, returning `Err` leaves it uncommitted so the
/// broker delivers it again later.
#[async_trait]
pub trait EventProcessor<E: Event>: Send + Sync + 'static {
    async fn process(&self, event: &E) -> Result<(), ProcessingError>;

    /// Name used in logs and metrics.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
