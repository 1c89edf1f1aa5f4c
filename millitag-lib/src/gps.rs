//! Interface boundary to the GPS collaborator.

use crate::error::BeaconError;
use crate::telemetry::PositionFix;

/// A source of position fixes.
///
/// Lazy accessor: returns the most recent fix, or `None` while the receiver
/// has nothing usable yet. Callers bound every wait with their
/// own timeout; implementations must not block unboundedly.
#[allow(async_fn_in_trait)]
pub trait FixSource {
    async fn current_fix(&mut self) -> Result<Option<PositionFix>, BeaconError>;
}
