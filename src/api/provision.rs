//! Device provisioning.
//!
//! A device holding only the shared provisioning key and secret of a device
//! profile connects with the username [`PROVISION_ACCESS_TOKEN`], publishes a
//! request to [`PROVISION_REQUEST_TOPIC`] and receives its own credentials on
//! [`PROVISION_RESPONSE_TOPIC`]. [`DeviceCredentials::from_provision_response`]
//! decodes the answer so the application can reconnect as the new device.
//!
//! [`PROVISION_ACCESS_TOKEN`]: crate::config::PROVISION_ACCESS_TOKEN

use core::fmt;

use heapless::String;
use serde::Serialize;

use crate::api::ApiImplementation;
use crate::callback::Callback;
use crate::config::{MAX_OUTBOUND_PAYLOAD, PROVISION_REQUEST_TOPIC, PROVISION_RESPONSE_TOPIC};
use crate::error::Error;
use crate::json::JsonObject;
use crate::network::MqttLink;

const ACCESS_TOKEN_CREDENTIALS: &str = "ACCESS_TOKEN";
const MQTT_BASIC_CREDENTIALS: &str = "MQTT_BASIC";
const X509_CREDENTIALS: &str = "X509_CERTIFICATE";
const SUCCESS_STATUS: &str = "SUCCESS";

/// Longest credential string [`DeviceCredentials`] can hold.
pub const MAX_CREDENTIAL_LENGTH: usize = 64;

/// Credentials the device asks the cloud to register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ProvisionCredentials<'a> {
    /// Let the cloud generate an access token.
    #[default]
    ServerGenerated,
    /// Use the given access token.
    AccessToken {
        /// The token.
        token: &'a str,
    },
    /// Use MQTT basic authentication.
    MqttBasic {
        /// MQTT client id.
        client_id: &'a str,
        /// MQTT username.
        username: &'a str,
        /// MQTT password.
        password: &'a str,
    },
    /// Use the X.509 certificate with the given hash.
    X509 {
        /// Certificate hash.
        hash: &'a str,
    },
}

/// A provisioning request and the callbacks for its outcome.
pub struct ProvisionCallback<'a, J> {
    callback: Callback<'a, J>,
    device_key: &'a str,
    device_secret: &'a str,
    device_name: Option<&'a str>,
    credentials: ProvisionCredentials<'a>,
    timeout_micros: u64,
    timeout_callback: Callback<'a, ()>,
}

impl<'a, J> ProvisionCallback<'a, J> {
    /// Requests server-generated credentials with the provisioning key and
    /// secret of a device profile.
    pub const fn new(
        callback: Callback<'a, J>,
        device_key: &'a str,
        device_secret: &'a str,
    ) -> Self {
        Self {
            callback,
            device_key,
            device_secret,
            device_name: None,
            credentials: ProvisionCredentials::ServerGenerated,
            timeout_micros: 0,
            timeout_callback: Callback::empty(),
        }
    }

    /// Names the new device. An empty name lets the cloud pick one.
    pub fn with_device_name(mut self, device_name: &'a str) -> Self {
        self.device_name = Some(device_name).filter(|name| !name.is_empty());
        self
    }

    /// Asks for specific credentials instead of a generated access token.
    pub fn with_credentials(mut self, credentials: ProvisionCredentials<'a>) -> Self {
        self.credentials = credentials;
        self
    }

    /// Gives up `timeout_micros` after the request was sent. Zero disables
    /// the timeout.
    pub fn with_timeout(mut self, timeout_micros: u64, timeout_callback: Callback<'a, ()>) -> Self {
        self.timeout_micros = timeout_micros;
        self.timeout_callback = timeout_callback;
        self
    }

    /// The requested credentials.
    pub fn credentials(&self) -> ProvisionCredentials<'a> {
        self.credentials
    }

    fn encode(&self, buffer: &mut [u8]) -> Result<usize, Error> {
        let mut request = ProvisionRequest {
            device_name: self.device_name,
            provision_device_key: self.device_key,
            provision_device_secret: self.device_secret,
            ..ProvisionRequest::default()
        };
        match self.credentials {
            ProvisionCredentials::ServerGenerated => {}
            ProvisionCredentials::AccessToken { token } => {
                request.credentials_type = Some(ACCESS_TOKEN_CREDENTIALS);
                request.token = Some(token);
            }
            ProvisionCredentials::MqttBasic {
                client_id,
                username,
                password,
            } => {
                request.credentials_type = Some(MQTT_BASIC_CREDENTIALS);
                request.client_id = Some(client_id);
                request.username = Some(username);
                request.password = Some(password);
            }
            ProvisionCredentials::X509 { hash } => {
                request.credentials_type = Some(X509_CREDENTIALS);
                request.hash = Some(hash);
            }
        }
        serde_json_core::to_slice(&request, buffer).map_err(|_| Error::BufferTooSmall)
    }
}

impl<J> Clone for ProvisionCallback<'_, J> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<J> Copy for ProvisionCallback<'_, J> {}

impl<J> fmt::Debug for ProvisionCallback<'_, J> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProvisionCallback")
            .field("device_name", &self.device_name)
            .field("credentials", &self.credentials)
            .field("timeout_micros", &self.timeout_micros)
            .finish()
    }
}

#[derive(Serialize, Default)]
#[serde(rename_all = "camelCase")]
struct ProvisionRequest<'r> {
    #[serde(skip_serializing_if = "Option::is_none")]
    device_name: Option<&'r str>,
    provision_device_key: &'r str,
    provision_device_secret: &'r str,
    #[serde(skip_serializing_if = "Option::is_none")]
    credentials_type: Option<&'r str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    token: Option<&'r str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    client_id: Option<&'r str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    username: Option<&'r str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    password: Option<&'r str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hash: Option<&'r str>,
}

/// Provisioning feature. At most one request is in flight.
pub struct Provision<'a, J> {
    pending: Option<ProvisionCallback<'a, J>>,
    issued_at: u64,
}

impl<'a, J: JsonObject> Provision<'a, J> {
    /// A feature with no request in flight.
    pub const fn new() -> Self {
        Self {
            pending: None,
            issued_at: 0,
        }
    }

    /// Subscribes to the response topic and publishes the request.
    ///
    /// Fails with [`Error::RequestPending`] while an earlier request has
    /// neither been answered nor timed out.
    pub fn provision_request(
        &mut self,
        link: &mut dyn MqttLink,
        request: ProvisionCallback<'a, J>,
        now_micros: u64,
    ) -> Result<(), Error> {
        if self.pending.is_some() {
            warn!("provision request already pending");
            return Err(Error::RequestPending);
        }

        let mut payload = [0u8; MAX_OUTBOUND_PAYLOAD];
        let len = request.encode(&mut payload)?;

        if !link.subscribe(PROVISION_RESPONSE_TOPIC) {
            error!("failed to subscribe to {}", PROVISION_RESPONSE_TOPIC);
            return Err(Error::SubscribeFailed);
        }
        if !link.publish(PROVISION_REQUEST_TOPIC, &payload[..len]) {
            error!("failed to publish to {}", PROVISION_REQUEST_TOPIC);
            return Err(Error::PublishFailed);
        }

        info!("provision request sent");
        self.pending = Some(request);
        self.issued_at = now_micros;
        Ok(())
    }

    /// Whether a request awaits its response.
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

impl<J: JsonObject> Default for Provision<'_, J> {
    fn default() -> Self {
        Self::new()
    }
}

impl<J> fmt::Debug for Provision<'_, J> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provision")
            .field("pending", &self.pending)
            .field("issued_at", &self.issued_at)
            .finish()
    }
}

impl<'a, J: JsonObject> ApiImplementation for Provision<'a, J> {
    type Json = J;

    fn response_topic(&self) -> &str {
        PROVISION_RESPONSE_TOPIC
    }

    fn process_json_response(&mut self, topic: &str, data: &J) {
        match self.pending.take() {
            Some(request) => request.callback.call_callback(data),
            None => warn!("unexpected provision response on {}", topic),
        }
    }

    fn unsubscribe(&mut self, link: &mut dyn MqttLink) -> Result<(), Error> {
        self.pending = None;
        if !link.unsubscribe(PROVISION_RESPONSE_TOPIC) {
            error!("failed to unsubscribe from {}", PROVISION_RESPONSE_TOPIC);
            return Err(Error::UnsubscribeFailed);
        }
        Ok(())
    }

    fn resubscribe_topic(&mut self, link: &mut dyn MqttLink) -> Result<(), Error> {
        if self.pending.is_none() {
            return Ok(());
        }
        if !link.subscribe(PROVISION_RESPONSE_TOPIC) {
            error!("failed to subscribe to {}", PROVISION_RESPONSE_TOPIC);
            return Err(Error::SubscribeFailed);
        }
        Ok(())
    }

    fn process_timeouts(&mut self, now_micros: u64) {
        let Some(request) = self.pending else {
            return;
        };
        if request.timeout_micros == 0
            || now_micros.saturating_sub(self.issued_at) < request.timeout_micros
        {
            return;
        }
        self.pending = None;
        warn!(
            "provision request timed out after {} us",
            request.timeout_micros
        );
        request.timeout_callback.call_callback(&());
    }
}

/// Credentials issued by a successful provisioning response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceCredentials {
    /// Connect with this access token as MQTT username.
    AccessToken {
        /// The token.
        token: String<MAX_CREDENTIAL_LENGTH>,
    },
    /// Connect with MQTT basic authentication.
    MqttBasic {
        /// MQTT client id.
        client_id: String<MAX_CREDENTIAL_LENGTH>,
        /// MQTT username.
        username: String<MAX_CREDENTIAL_LENGTH>,
        /// MQTT password.
        password: String<MAX_CREDENTIAL_LENGTH>,
    },
}

impl DeviceCredentials {
    /// Decodes the credentials from a provisioning response.
    ///
    /// Fails if the status is not `SUCCESS`, if the credentials type is
    /// neither access token nor MQTT basic, or if a value is missing or too
    /// long.
    pub fn from_provision_response<J: JsonObject>(response: &J) -> Result<Self, Error> {
        let status = response
            .get("status")
            .and_then(JsonObject::as_str)
            .ok_or(Error::MissingField)?;
        if status != SUCCESS_STATUS {
            error!(
                "provisioning failed: {}",
                response
                    .get("errorMsg")
                    .and_then(JsonObject::as_str)
                    .unwrap_or(status)
            );
            return Err(Error::UnexpectedValue);
        }

        let credentials_type = response
            .get("credentialsType")
            .and_then(JsonObject::as_str)
            .ok_or(Error::MissingField)?;
        let value = response.get("credentialsValue").ok_or(Error::MissingField)?;

        match credentials_type {
            ACCESS_TOKEN_CREDENTIALS => Ok(DeviceCredentials::AccessToken {
                token: credential(Some(value))?,
            }),
            MQTT_BASIC_CREDENTIALS => Ok(DeviceCredentials::MqttBasic {
                client_id: credential(value.get("clientId"))?,
                username: credential(value.get("userName"))?,
                password: credential(value.get("password"))?,
            }),
            other => {
                error!("unexpected provision credentials type {}", other);
                Err(Error::UnexpectedValue)
            }
        }
    }

    /// Username, password and client id to connect with.
    pub fn connect_parameters(&self) -> (&str, Option<&str>, Option<&str>) {
        match self {
            DeviceCredentials::AccessToken { token } => (token.as_str(), None, None),
            DeviceCredentials::MqttBasic {
                client_id,
                username,
                password,
            } => (
                username.as_str(),
                Some(password.as_str()).filter(|p| !p.is_empty()),
                Some(client_id.as_str()),
            ),
        }
    }
}

fn credential<J: JsonObject>(value: Option<&J>) -> Result<String<MAX_CREDENTIAL_LENGTH>, Error> {
    let text = value
        .and_then(JsonObject::as_str)
        .ok_or(Error::MissingField)?;
    let mut owned = String::new();
    owned.push_str(text).map_err(|_| Error::BufferTooSmall)?;
    Ok(owned)
}
