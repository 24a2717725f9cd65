//! Transport capabilities consumed by the SDK.
//!
//! The SDK never speaks MQTT or HTTP on the wire. Concrete clients (ESP-IDF's
//! mqtt component, a PubSubClient port, an embedded-nal socket stack) are
//! adapted to the traits below and handed to the device client.
//!
//! Features only ever see the narrow, object-safe [`MqttLink`]. The full
//! [`MqttClient`] adds connection management and callback registration and
//! is what [`DeviceClient`](crate::client::DeviceClient) owns.

#![deny(unsafe_code)]

mod connection;
mod http;

pub use connection::{ConnectionError, ConnectionMonitor, ConnectionState};
pub use http::HttpClient;

use heapless::{String, Vec};

use crate::callback::Callback;

/// Longest topic an inbound message may carry.
pub const MAX_PACKET_TOPIC: usize = 256;
/// Largest payload an inbound message may carry.
pub const MAX_PACKET_PAYLOAD: usize = 1024;

/// An incoming publish packet.
#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct PublishPacket {
    /// The topic of the message.
    pub topic: String<MAX_PACKET_TOPIC>,
    /// The payload of the message.
    pub payload: Vec<u8, MAX_PACKET_PAYLOAD>,
}

impl PublishPacket {
    /// Copies `topic` and `payload` into a packet, or returns `None` if
    /// either exceeds the packet limits.
    pub fn new(topic: &str, payload: &[u8]) -> Option<Self> {
        let mut packet = Self::default();
        packet.topic.push_str(topic).ok()?;
        packet.payload.extend_from_slice(payload).ok()?;
        Some(packet)
    }
}

/// Operations features need from an MQTT transport.
///
/// All methods report failure as `false`; the transport is expected to log
/// the cause itself.
pub trait MqttLink {
    /// Whether the transport currently holds a broker session.
    fn connected(&self) -> bool;

    /// Publishes `payload` on `topic`.
    fn publish(&mut self, topic: &str, payload: &[u8]) -> bool;

    /// Subscribes to `topic` (MQTT wildcards allowed).
    fn subscribe(&mut self, topic: &str) -> bool;

    /// Unsubscribes from `topic`.
    fn unsubscribe(&mut self, topic: &str) -> bool;
}

impl<L: MqttLink + ?Sized> MqttLink for &mut L {
    fn connected(&self) -> bool {
        (**self).connected()
    }

    fn publish(&mut self, topic: &str, payload: &[u8]) -> bool {
        (**self).publish(topic, payload)
    }

    fn subscribe(&mut self, topic: &str) -> bool {
        (**self).subscribe(topic)
    }

    fn unsubscribe(&mut self, topic: &str) -> bool {
        (**self).unsubscribe(topic)
    }
}

/// A complete MQTT client as owned by the device client.
///
/// Callbacks registered here borrow for `'a`. Blocking transports invoke
/// them from inside [`poll`](MqttClient::poll); event-driven transports may
/// invoke them from their own task, in which case the transport must
/// serialize the calls.
pub trait MqttClient<'a>: MqttLink {
    /// Sets the broker endpoint used by the next [`connect`](MqttClient::connect).
    fn set_server(&mut self, host: &str, port: u16);

    /// Starts connecting to the configured broker.
    ///
    /// Event-driven transports return as soon as the attempt is initiated and
    /// report completion through the state-changed callback.
    fn connect(&mut self, client_id: &str, username: &str, password: Option<&str>) -> bool;

    /// Closes the broker session.
    fn disconnect(&mut self);

    /// Services the connection. Returns `false` if the transport is not
    /// connected or hit an error.
    fn poll(&mut self) -> bool;

    /// Registers the callback receiving every inbound message.
    fn set_data_callback(&mut self, callback: Callback<'a, PublishPacket>);

    /// Registers the callback invoked once a session is established.
    fn set_connect_callback(&mut self, callback: Callback<'a, ()>);

    /// Registers the single connection-state observer, replacing any
    /// previous one.
    fn subscribe_connection_state_changed_callback(
        &mut self,
        callback: Callback<'a, (ConnectionState, ConnectionError)>,
    );

    /// Current connection state.
    fn connection_state(&self) -> ConnectionState;

    /// Error recorded by the last transition into
    /// [`ConnectionState::Error`].
    fn last_connection_error(&self) -> ConnectionError;

    /// Resizes the receive and send buffers.
    fn set_buffer_size(&mut self, receive_buffer_size: u16, send_buffer_size: u16) -> bool;

    /// Current receive buffer size in bytes.
    fn receive_buffer_size(&self) -> u16;

    /// Current send buffer size in bytes.
    fn send_buffer_size(&self) -> u16;
}
