use core::fmt::Write as _;

use heapless::String;
use serde::Serialize;

use crate::config::MAX_OUTBOUND_PAYLOAD;
use crate::error::Error;
use crate::network::HttpClient;

const HTTP_OK: u16 = 200;
const JSON_CONTENT_TYPE: &str = "application/json";
const MAX_PATH_LENGTH: usize = 128;

/// Sends telemetry and attributes over HTTP instead of MQTT.
#[derive(Debug)]
pub struct HttpDeviceClient<'t, H> {
    client: H,
    host: &'t str,
    port: u16,
    access_token: &'t str,
    keep_alive: bool,
}

impl<'t, H: HttpClient> HttpDeviceClient<'t, H> {
    /// Posts to `host:port` on behalf of the device owning `access_token`.
    /// Without `keep_alive` the connection is closed after every request.
    pub fn new(
        mut client: H,
        host: &'t str,
        port: u16,
        access_token: &'t str,
        keep_alive: bool,
    ) -> Self {
        client.set_keep_alive(keep_alive);
        Self {
            client,
            host,
            port,
            access_token,
            keep_alive,
        }
    }

    /// Posts raw JSON telemetry.
    pub fn send_telemetry_json(&mut self, json: &str) -> Result<(), Error> {
        self.post_json("telemetry", json.as_bytes())
    }

    /// Posts raw JSON client attributes.
    pub fn send_attributes_json(&mut self, json: &str) -> Result<(), Error> {
        self.post_json("attributes", json.as_bytes())
    }

    /// Posts `value` as telemetry.
    pub fn send_telemetry<V: Serialize + ?Sized>(&mut self, value: &V) -> Result<(), Error> {
        self.post_serialized("telemetry", value)
    }

    /// Posts `value` as client attributes.
    pub fn send_attributes<V: Serialize + ?Sized>(&mut self, value: &V) -> Result<(), Error> {
        self.post_serialized("attributes", value)
    }

    /// Closes the connection.
    pub fn stop(&mut self) {
        self.client.stop();
    }

    /// Gives back the wrapped HTTP client.
    pub fn into_inner(self) -> H {
        self.client
    }

    fn post_serialized<V: Serialize + ?Sized>(
        &mut self,
        endpoint: &str,
        value: &V,
    ) -> Result<(), Error> {
        let mut buffer = [0u8; MAX_OUTBOUND_PAYLOAD];
        let len =
            serde_json_core::to_slice(value, &mut buffer).map_err(|_| Error::BufferTooSmall)?;
        self.post_json(endpoint, &buffer[..len])
    }

    fn post_json(&mut self, endpoint: &str, body: &[u8]) -> Result<(), Error> {
        let mut path: String<MAX_PATH_LENGTH> = String::new();
        write!(path, "/api/v1/{}/{}", self.access_token, endpoint)
            .map_err(|_| Error::BufferTooSmall)?;

        if !self.client.connect(self.host, self.port) {
            error!("failed to connect to {}:{}", self.host, self.port);
            return Err(Error::ConnectFailed);
        }

        let sent = self.client.post(&path, JSON_CONTENT_TYPE, body);
        let status = if sent { self.client.response_status_code() } else { 0 };
        if !self.keep_alive {
            self.client.stop();
        }

        if !sent {
            error!("failed to post to {}", path.as_str());
            return Err(Error::PublishFailed);
        }
        if status != HTTP_OK {
            error!("post to {} answered with status {}", path.as_str(), status);
            return Err(Error::PublishFailed);
        }
        Ok(())
    }
}
