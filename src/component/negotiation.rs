use std::cell::Cell;

use medea_reactive::ObservableCell;
use tokio::task;
use tracing::info;

/// Kind of negotiation requested from the connection layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NegotiationKind {
    /// First negotiation, establishes the connection.
    Initial,

    /// Local media of an established connection changed.
    Renegotiation,
}

impl NegotiationKind {
    /// Value passed as `is_initiator` to the connection layer.
    pub fn is_initiator(self) -> bool {
        matches!(self, Self::Initial)
    }
}

/// Notifies the external connection layer once local media settles.
pub struct RenegotiationTrigger {
    negotiate: Box<dyn Fn(bool)>,
    acquisitions_in_progress: ObservableCell<u32>,
    negotiations: Cell<u32>,
}

impl RenegotiationTrigger {
    pub fn new<F>(negotiate: F) -> Self
    where
        F: Fn(bool) + 'static,
    {
        Self {
            negotiate: Box::new(negotiate),
            acquisitions_in_progress: ObservableCell::new(0),
            negotiations: Cell::new(0),
        }
    }

    /// Marks an acquisition as in flight until the returned guard drops.
    pub fn acquisition_started(&self) -> AcquisitionGuard<'_> {
        self.acquisitions_in_progress
            .set(self.acquisitions_in_progress.get() + 1);
        AcquisitionGuard(self)
    }

    pub fn acquisitions_in_progress(&self) -> u32 {
        self.acquisitions_in_progress.get()
    }

    /// Resolves once no acquisition is in flight and pending work queued
    /// before this call got a chance to run.
    pub async fn when_settled(&self) {
        // The cell lives as long as `self`, so it cannot be dropped while
        // awaited.
        let _ = self.acquisitions_in_progress.when_eq(0).await;
        task::yield_now().await;
    }

    /// Invokes the connection layer. The first call is the initial one.
    pub fn fire(&self) -> NegotiationKind {
        let kind = if self.negotiations.get() == 0 {
            NegotiationKind::Initial
        } else {
            NegotiationKind::Renegotiation
        };
        self.negotiations.set(self.negotiations.get() + 1);

        info!(?kind, "Local media settled, negotiating");
        (self.negotiate)(kind.is_initiator());
        kind
    }

    /// Number of negotiations requested so far.
    pub fn negotiations(&self) -> u32 {
        self.negotiations.get()
    }
}

/// Keeps one acquisition counted as in flight.
pub struct AcquisitionGuard<'a>(&'a RenegotiationTrigger);

impl Drop for AcquisitionGuard<'_> {
    fn drop(&mut self) {
        let counter = &self.0.acquisitions_in_progress;
        counter.set(counter.get().saturating_sub(1));
    }
}
