//! Error types of the call subsystem.
//!
//! None of these errors is fatal: device failures degrade to an absent
//! stream, decode failures are left to the caller (drop the frame or close the
//! connection), and send failures are reported as a `bool` by the
//! [`SubscriptionManager`](crate::signaling::SubscriptionManager).

use thiserror::Error;

/// Capture device could not be acquired.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DeviceError {
    /// User or platform denied access to the device.
    #[error("permission to capture media was denied")]
    PermissionDenied,

    /// No device of the requested kind is present.
    #[error("requested capture device not found")]
    NotFound,

    /// User dismissed the display picker.
    #[error("capture request was cancelled by the user")]
    Cancelled,

    /// Any other platform failure.
    #[error("capture device failure: {0}")]
    Other(String),
}

/// Inbound signaling frame could not be decoded.
#[derive(Debug, Error)]
pub enum ProtocolDecodeError {
    /// Outer frame is not valid JSON.
    #[error("malformed frame: {0}")]
    Frame(#[source] serde_json::Error),

    /// Outer frame is valid JSON but not an object.
    #[error("frame is not a JSON object")]
    NotAnObject,

    /// Nested `DATA` payload is not valid JSON.
    #[error("malformed DATA payload: {0}")]
    Data(#[source] serde_json::Error),

    /// Nested `DATA` payload is neither absent nor a JSON-encoded string.
    #[error("DATA payload is not a string")]
    DataNotString,

    /// Payload does not match the shape fixed for its `TYPE`.
    #[error("invalid payload for {tag}: {source}")]
    Payload {
        tag: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Outbound frame could not be written to the signaling channel.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum SignalingSendError {
    /// Channel is still connecting or already closed.
    #[error("signaling channel is not open")]
    NotOpen,

    /// Receiving half of the channel is gone.
    #[error("signaling channel disconnected")]
    Disconnected,
}

/// Local media cycle could not run.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum CallMediaError {
    /// Local media was torn down before the cycle got its turn.
    #[error("local media is torn down")]
    Closed,
}
