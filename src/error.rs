//! Common error type for SDK operations.

use core::fmt;

/// Recoverable failures reported by features and the device client.
///
/// Every variant describes a condition the caller can react to (retry,
/// reconnect, drop the message). Programming errors such as overflowing a
/// [`FixedCapacitySequence`](crate::container::FixedCapacitySequence)
/// directly are not represented here, they halt instead.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// The transport is not connected to the broker.
    NotConnected,
    /// The transport refused to start a connection attempt.
    ConnectFailed,
    /// A fixed-capacity container has no room for the requested records.
    CapacityExceeded,
    /// The transport failed to subscribe to a topic.
    SubscribeFailed,
    /// The transport failed to unsubscribe from a topic.
    UnsubscribeFailed,
    /// The transport failed to publish a message.
    PublishFailed,
    /// An incoming message carried no payload.
    EmptyPayload,
    /// An incoming payload could not be parsed as JSON.
    MalformedPayload,
    /// A required key was absent from a JSON payload.
    MissingField,
    /// A JSON value had an unexpected type or content.
    UnexpectedValue,
    /// A payload or topic does not fit into the available buffer.
    BufferTooSmall,
    /// A request of this kind is already waiting for its response.
    RequestPending,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Error::NotConnected => "not connected",
            Error::ConnectFailed => "connect failed",
            Error::CapacityExceeded => "maximum subscriptions exceeded",
            Error::SubscribeFailed => "subscribe failed",
            Error::UnsubscribeFailed => "unsubscribe failed",
            Error::PublishFailed => "publish failed",
            Error::EmptyPayload => "empty payload",
            Error::MalformedPayload => "malformed payload",
            Error::MissingField => "missing field",
            Error::UnexpectedValue => "unexpected value",
            Error::BufferTooSmall => "buffer too small",
            Error::RequestPending => "request already pending",
        };
        f.write_str(msg)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}
