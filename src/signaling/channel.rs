use std::cell::Cell;

use futures::channel::mpsc;

use crate::errors::SignalingSendError;

/// Outbound half of the signaling connection.
///
/// Frames are written fire-and-forget and arrive in send order.
pub trait SignalingChannel {
    fn is_open(&self) -> bool;

    fn send(&self, frame: String) -> Result<(), SignalingSendError>;
}

/// Connection state of an [`OutboundChannel`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReadyState {
    Connecting,
    Open,
    Closed,
}

/// [`SignalingChannel`] writing frames into an in-process queue.
///
/// The transport task drains the receiving half returned by
/// [`OutboundChannel::new`].
pub struct OutboundChannel {
    state: Cell<ReadyState>,
    tx: mpsc::UnboundedSender<String>,
}

impl OutboundChannel {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded();
        let channel = Self {
            state: Cell::new(ReadyState::Connecting),
            tx,
        };
        (channel, rx)
    }

    pub fn ready_state(&self) -> ReadyState {
        self.state.get()
    }

    pub fn set_ready_state(&self, state: ReadyState) {
        self.state.set(state);
    }
}

impl SignalingChannel for OutboundChannel {
    fn is_open(&self) -> bool {
        self.state.get() == ReadyState::Open
    }

    fn send(&self, frame: String) -> Result<(), SignalingSendError> {
        if !self.is_open() {
            return Err(SignalingSendError::NotOpen);
        }
        self.tx
            .unbounded_send(frame)
            .map_err(|_| SignalingSendError::Disconnected)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_send_requires_open_state() {
        let (channel, mut rx) = OutboundChannel::new();

        assert_eq!(
            channel.send("a".into()),
            Err(SignalingSendError::NotOpen)
        );

        channel.set_ready_state(ReadyState::Open);
        channel.send("b".into()).unwrap();
        assert_eq!(rx.try_next().unwrap(), Some("b".to_string()));

        drop(rx);
        assert_eq!(
            channel.send("c".into()),
            Err(SignalingSendError::Disconnected)
        );
    }
}
