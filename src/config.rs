//! Build-time defaults and runtime client settings.

/// Default size in bytes of the transport receive buffer.
pub const DEFAULT_RECEIVE_BUFFER_SIZE: u16 = 256;
/// Default size in bytes of the transport send buffer.
pub const DEFAULT_SEND_BUFFER_SIZE: u16 = 256;
/// Default number of shared attribute callbacks a fixed-capacity feature holds.
pub const DEFAULT_MAX_SHARED_ATTRIBUTE_SUBSCRIPTIONS: usize = 2;
/// Default number of client-side RPC requests that may be outstanding at once.
pub const DEFAULT_MAX_RPC_REQUESTS: usize = 2;
/// Default request timeout in microseconds.
pub const DEFAULT_REQUEST_TIMEOUT_MICROSECONDS: u64 = 5_000_000;

/// Topic the device publishes time-series data to.
pub const TELEMETRY_TOPIC: &str = "v1/devices/me/telemetry";
/// Topic for client attributes (publish) and shared attribute updates (subscribe).
pub const ATTRIBUTE_TOPIC: &str = "v1/devices/me/attributes";
/// Prefix of client-side RPC request topics; the request id is appended.
pub const RPC_REQUEST_TOPIC_PREFIX: &str = "v1/devices/me/rpc/request/";
/// Prefix of client-side RPC response topics; the request id is appended.
pub const RPC_RESPONSE_TOPIC_PREFIX: &str = "v1/devices/me/rpc/response/";
/// Wildcard subscription covering every client-side RPC response.
pub const RPC_RESPONSE_SUBSCRIBE_TOPIC: &str = "v1/devices/me/rpc/response/+";
/// Topic a provisioning request is published to.
pub const PROVISION_REQUEST_TOPIC: &str = "/provision/request";
/// Topic the provisioning response arrives on.
pub const PROVISION_RESPONSE_TOPIC: &str = "/provision/response";
/// Username used while connected with provisioning credentials.
pub const PROVISION_ACCESS_TOKEN: &str = "provision";

/// Largest topic the SDK builds for outbound requests.
pub const MAX_TOPIC_LENGTH: usize = 64;
/// Largest outbound JSON document serialized on the stack.
pub const MAX_OUTBOUND_PAYLOAD: usize = 512;

/// Runtime settings applied to the transport when a device client is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClientSettings {
    /// Bytes reserved for inbound messages.
    pub receive_buffer_size: u16,
    /// Bytes reserved for outbound messages. Larger payloads are rejected
    /// before they reach the transport.
    ///
    /// Payloads the SDK encodes itself (serialized telemetry and
    /// attributes, RPC and provisioning requests) are built on the stack
    /// and are further capped at [`MAX_OUTBOUND_PAYLOAD`] bytes. Raw JSON
    /// sends are limited by this size alone.
    pub send_buffer_size: u16,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            receive_buffer_size: DEFAULT_RECEIVE_BUFFER_SIZE,
            send_buffer_size: DEFAULT_SEND_BUFFER_SIZE,
        }
    }
}

impl ClientSettings {
    /// Settings with both buffers set to `size` bytes.
    pub const fn symmetric(size: u16) -> Self {
        Self {
            receive_buffer_size: size,
            send_buffer_size: size,
        }
    }
}
