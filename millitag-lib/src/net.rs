//! Interface boundary to the network collaborator.
//!
//! The surface is identical regardless of the underlying transport
//! technology; connection reuse vs. reconnect-per-message is transport
//! policy, not a codec concern.

use bytes::Bytes;

use crate::error::BeaconError;

#[allow(async_fn_in_trait)]
pub trait Transport {
    async fn connect(&mut self) -> Result<(), BeaconError>;

    fn is_connected(&self) -> bool;

    /// Deliver one frame. Callers bound the call with a timeout.
    async fn send(&mut self, frame: Bytes) -> Result<(), BeaconError>;

    async fn disconnect(&mut self) -> Result<(), BeaconError>;
}
