//! Completion barrier shared by every message of one update cascade.
//!
//! Each in-flight update carries a [`Cascade`] clone. The cascade is settled
//! once every clone has been dropped, i.e. once every message it produced,
//! directly or through descendants, has been fully processed. Failures are
//! recorded on the cascade instead of stalling it.

use tokio::sync::mpsc;
use tracing::{debug, warn};
use weave_core::error::WeaveError;

/// Create a cascade and the waiter observing it
pub fn cascade() -> (Cascade, CascadeWaiter) {
    let (failures, receiver) = mpsc::unbounded_channel();
    (Cascade { failures }, CascadeWaiter { failures: receiver })
}

/// Membership token in a cascade; clone it into every message sent on its behalf
#[derive(Debug, Clone)]
pub struct Cascade {
    failures: mpsc::UnboundedSender<WeaveError>,
}

impl Cascade {
    /// Record a failure; the cascade still settles normally
    pub fn fail(&self, error: WeaveError) {
        warn!("Update failed: {}", error);
        if self.failures.send(error).is_err() {
            debug!("Cascade waiter is gone, failure discarded");
        }
    }
}

/// Waits for a cascade to become quiescent
#[derive(Debug)]
pub struct CascadeWaiter {
    failures: mpsc::UnboundedReceiver<WeaveError>,
}

impl CascadeWaiter {
    /// Resolve once every [`Cascade`] clone is dropped, with the first
    /// recorded failure if there was one
    pub async fn settled(mut self) -> Result<(), WeaveError> {
        let mut first = None;
        while let Some(error) = self.failures.recv().await {
            match first {
                None => first = Some(error),
                Some(_) => debug!("Additional cascade failure: {}", error),
            }
        }
        first.map_or(Ok(()), Err)
    }
}
