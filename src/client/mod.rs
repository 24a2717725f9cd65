//! Device client: owns the transport and the registered features.
//!
//! ```rust,no_run
//! # use iotlink::network::*;
//! # use iotlink::Callback;
//! # struct Esp;
//! # impl MqttLink for Esp {
//! #     fn connected(&self) -> bool { true }
//! #     fn publish(&mut self, _: &str, _: &[u8]) -> bool { true }
//! #     fn subscribe(&mut self, _: &str) -> bool { true }
//! #     fn unsubscribe(&mut self, _: &str) -> bool { true }
//! # }
//! # impl<'a> MqttClient<'a> for Esp {
//! #     fn set_server(&mut self, _: &str, _: u16) {}
//! #     fn connect(&mut self, _: &str, _: &str, _: Option<&str>) -> bool { true }
//! #     fn disconnect(&mut self) {}
//! #     fn poll(&mut self) -> bool { true }
//! #     fn set_data_callback(&mut self, _: Callback<'a, PublishPacket>) {}
//! #     fn set_connect_callback(&mut self, _: Callback<'a, ()>) {}
//! #     fn subscribe_connection_state_changed_callback(
//! #         &mut self,
//! #         _: Callback<'a, (ConnectionState, ConnectionError)>,
//! #     ) {}
//! #     fn connection_state(&self) -> ConnectionState { ConnectionState::Connected }
//! #     fn last_connection_error(&self) -> ConnectionError { ConnectionError::None }
//! #     fn set_buffer_size(&mut self, _: u16, _: u16) -> bool { true }
//! #     fn receive_buffer_size(&self) -> u16 { 256 }
//! #     fn send_buffer_size(&self) -> u16 { 256 }
//! # }
//! # fn micros() -> u64 { 0 }
//! use iotlink::api::{FixedClientSideRpc, FixedSharedAttributeUpdate};
//! use iotlink::client::{DeviceClient, InboundQueue};
//! use iotlink::config::ClientSettings;
//! use serde_json::Value;
//!
//! let inbox = InboundQueue::<4>::new();
//! let on_data = |packet: &PublishPacket| {
//!     inbox.push(packet);
//! };
//!
//! let mut transport = Esp;
//! transport.set_data_callback(Callback::new(&on_data));
//!
//! let features = (
//!     FixedSharedAttributeUpdate::<Value>::new(),
//!     FixedClientSideRpc::<Value>::new(),
//! );
//! let mut client = DeviceClient::new(transport, features, ClientSettings::default());
//! client.connect("demo.thingsboard.io", 1883, "ACCESS_TOKEN", None, None).unwrap();
//!
//! loop {
//!     client.poll(micros());
//!     client.drain(&inbox);
//!     client.send_telemetry_data("temperature", &21.5).ok();
//! }
//! ```

mod http;
mod inbox;

pub use http::HttpDeviceClient;
pub use inbox::InboundQueue;

use serde::Serialize;

use crate::api::ApiRegistry;
use crate::config::{ATTRIBUTE_TOPIC, ClientSettings, MAX_OUTBOUND_PAYLOAD, TELEMETRY_TOPIC};
use crate::error::Error;
use crate::json::{JsonObject, JsonWriter};
use crate::network::{ConnectionState, MqttClient};

/// Connects a transport `T` with the feature registry `A`.
///
/// Inbound messages are parsed once and handed to every feature whose topic
/// matches, in registration order.
#[derive(Debug)]
pub struct DeviceClient<T, A> {
    transport: T,
    apis: A,
    last_state: ConnectionState,
}

impl<'a, T, A> DeviceClient<T, A>
where
    T: MqttClient<'a>,
    A: ApiRegistry,
{
    /// Wraps `transport` and applies the buffer sizes from `settings`.
    pub fn new(mut transport: T, apis: A, settings: ClientSettings) -> Self {
        if !transport.set_buffer_size(settings.receive_buffer_size, settings.send_buffer_size) {
            warn!(
                "transport rejected buffer sizes {}/{}",
                settings.receive_buffer_size,
                settings.send_buffer_size
            );
        }
        let last_state = transport.connection_state();
        Self {
            transport,
            apis,
            last_state,
        }
    }

    /// The transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The feature registry.
    pub fn apis(&self) -> &A {
        &self.apis
    }

    /// Both halves at once, for feature calls that talk to the broker:
    ///
    /// ```rust,ignore
    /// let (link, (updates, rpc)) = client.split_mut();
    /// rpc.request(link, request, now)?;
    /// ```
    pub fn split_mut(&mut self) -> (&mut T, &mut A) {
        (&mut self.transport, &mut self.apis)
    }

    /// Gives back the transport and the registry.
    pub fn into_parts(self) -> (T, A) {
        (self.transport, self.apis)
    }

    /// Resizes the transport buffers.
    pub fn set_buffer_size(&mut self, receive: u16, send: u16) -> Result<(), Error> {
        if self.transport.set_buffer_size(receive, send) {
            Ok(())
        } else {
            error!("transport rejected buffer sizes {}/{}", receive, send);
            Err(Error::BufferTooSmall)
        }
    }

    /// Connects to `host:port` using `access_token` as MQTT username.
    ///
    /// `client_id` defaults to the access token. Feature subscriptions are
    /// restored as soon as the transport reports the session, here if it
    /// connects synchronously, otherwise from [`poll`](Self::poll).
    pub fn connect(
        &mut self,
        host: &str,
        port: u16,
        access_token: &str,
        client_id: Option<&str>,
        password: Option<&str>,
    ) -> Result<(), Error> {
        self.track_connection();
        self.transport.set_server(host, port);
        let client_id = client_id.unwrap_or(access_token);
        info!("connecting to {}:{} as {}", host, port, client_id);
        if !self.transport.connect(client_id, access_token, password) {
            error!("failed to connect to {}:{}", host, port);
            return Err(Error::ConnectFailed);
        }
        self.track_connection();
        Ok(())
    }

    /// Closes the broker session.
    pub fn disconnect(&mut self) {
        self.transport.disconnect();
        self.track_connection();
    }

    /// Whether the transport holds a broker session.
    pub fn connected(&self) -> bool {
        self.transport.connected()
    }

    /// The transport's connection state.
    pub fn connection_state(&self) -> ConnectionState {
        self.transport.connection_state()
    }

    /// Services the transport, resubscribes if the session came up since
    /// the last call, then expires overdue requests.
    pub fn poll(&mut self, now_micros: u64) -> bool {
        let alive = self.transport.poll();
        self.track_connection();
        self.apis.process_timeouts(now_micros);
        alive
    }

    /// Resubscribes every feature on each transition into
    /// [`ConnectionState::Connected`].
    fn track_connection(&mut self) {
        let state = self.transport.connection_state();
        if state == ConnectionState::Connected && self.last_state != ConnectionState::Connected {
            info!("session established, restoring subscriptions");
            self.resubscribe();
        }
        self.last_state = state;
    }

    /// Processes every message queued by the transport's data callback.
    /// Returns the number of messages taken from the queue.
    pub fn drain<const N: usize>(&mut self, queue: &InboundQueue<N>) -> usize {
        let mut processed = 0;
        while let Some(packet) = queue.pop() {
            self.process_message(&packet.topic, &packet.payload);
            processed += 1;
        }
        processed
    }

    /// Parses `payload` and dispatches it to the matching features.
    ///
    /// Empty and malformed payloads are logged and dropped. Returns whether
    /// any feature handled the message.
    pub fn process_message(&mut self, topic: &str, payload: &[u8]) -> bool {
        if payload.is_empty() {
            warn!("empty payload on {}", topic);
            return false;
        }
        let Some(data) = <A::Json as JsonObject>::parse(payload) else {
            error!("malformed payload on {} ({} bytes)", topic, payload.len());
            return false;
        };
        let handled = self.apis.dispatch(topic, &data);
        if !handled {
            debug!("no feature handles {}", topic);
        }
        handled
    }

    /// Re-issues every feature subscription, e.g. after a reconnect.
    /// Failures are logged, never returned.
    pub fn resubscribe(&mut self) {
        self.apis.resubscribe_all(&mut self.transport);
    }

    /// Unsubscribes every feature and drops their records.
    pub fn cleanup_subscriptions(&mut self) -> Result<(), Error> {
        self.apis.unsubscribe_all(&mut self.transport)
    }

    /// Publishes raw JSON telemetry.
    pub fn send_telemetry_json(&mut self, json: &str) -> Result<(), Error> {
        self.send_checked(TELEMETRY_TOPIC, json.as_bytes())
    }

    /// Publishes raw JSON client attributes.
    pub fn send_attributes_json(&mut self, json: &str) -> Result<(), Error> {
        self.send_checked(ATTRIBUTE_TOPIC, json.as_bytes())
    }

    /// Publishes `value` as telemetry. It must serialize to a JSON object.
    ///
    /// The payload is encoded on the stack and may not exceed
    /// [`MAX_OUTBOUND_PAYLOAD`] bytes, whatever the send buffer size.
    pub fn send_telemetry<V: Serialize + ?Sized>(&mut self, value: &V) -> Result<(), Error> {
        self.send_serialized(TELEMETRY_TOPIC, value)
    }

    /// Publishes `value` as client attributes. It must serialize to a JSON
    /// object.
    pub fn send_attributes<V: Serialize + ?Sized>(&mut self, value: &V) -> Result<(), Error> {
        self.send_serialized(ATTRIBUTE_TOPIC, value)
    }

    /// Publishes `{key: value}` as telemetry.
    pub fn send_telemetry_data<V: Serialize + ?Sized>(
        &mut self,
        key: &str,
        value: &V,
    ) -> Result<(), Error> {
        self.send_key_value(TELEMETRY_TOPIC, key, value)
    }

    /// Publishes `{key: value}` as a client attribute.
    pub fn send_attribute_data<V: Serialize + ?Sized>(
        &mut self,
        key: &str,
        value: &V,
    ) -> Result<(), Error> {
        self.send_key_value(ATTRIBUTE_TOPIC, key, value)
    }

    fn send_serialized<V: Serialize + ?Sized>(
        &mut self,
        topic: &str,
        value: &V,
    ) -> Result<(), Error> {
        let mut buffer = [0u8; MAX_OUTBOUND_PAYLOAD];
        let len = serde_json_core::to_slice(value, &mut buffer).map_err(|_| {
            error!("payload for {} exceeds {} bytes", topic, MAX_OUTBOUND_PAYLOAD);
            Error::BufferTooSmall
        })?;
        self.send_checked(topic, &buffer[..len])
    }

    fn send_key_value<V: Serialize + ?Sized>(
        &mut self,
        topic: &str,
        key: &str,
        value: &V,
    ) -> Result<(), Error> {
        let mut buffer = [0u8; MAX_OUTBOUND_PAYLOAD];
        let mut writer = JsonWriter::new(&mut buffer);
        writer.raw(b"{")?.string(key)?.raw(b":")?.serialize(value)?.raw(b"}")?;
        let len = writer.finish();
        self.send_checked(topic, &buffer[..len])
    }

    fn send_checked(&mut self, topic: &str, payload: &[u8]) -> Result<(), Error> {
        let limit = usize::from(self.transport.send_buffer_size());
        if payload.len() > limit {
            error!(
                "payload of {} bytes for {} exceeds send buffer of {}",
                payload.len(),
                topic,
                limit
            );
            return Err(Error::BufferTooSmall);
        }
        if !self.transport.connected() {
            warn!("not connected, dropping message for {}", topic);
            return Err(Error::NotConnected);
        }
        if !self.transport.publish(topic, payload) {
            error!("failed to publish to {}", topic);
            return Err(Error::PublishFailed);
        }
        Ok(())
    }
}
