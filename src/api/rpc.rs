//! Client-side RPC: requests issued by the device, answered by the cloud.
//!
//! [`ClientSideRpc::request`] allocates a request id, publishes
//! `{"method":...,"params":...}` on `v1/devices/me/rpc/request/{id}` and
//! keeps the [`RpcRequestCallback`] until the response arrives on
//! `v1/devices/me/rpc/response/{id}` or its timeout elapses.

use core::fmt::{self, Write as _};
use core::marker::PhantomData;

use heapless::String;

use crate::api::ApiImplementation;
use crate::callback::Callback;
use crate::config::{
    DEFAULT_MAX_RPC_REQUESTS, MAX_OUTBOUND_PAYLOAD, MAX_TOPIC_LENGTH, RPC_REQUEST_TOPIC_PREFIX,
    RPC_RESPONSE_SUBSCRIBE_TOPIC, RPC_RESPONSE_TOPIC_PREFIX,
};
use crate::container::{FixedCapacitySequence, Sequence};
use crate::error::Error;
use crate::json::{JsonObject, JsonWriter};
use crate::network::MqttLink;

#[cfg(feature = "alloc")]
use crate::container::DynamicSequence;

/// A pending client-side RPC request.
///
/// The method name and parameters are borrowed; the caller keeps them alive
/// until the request completes or times out.
pub struct RpcRequestCallback<'a, J> {
    method: &'a str,
    params: Option<&'a J>,
    callback: Callback<'a, J>,
    timeout_micros: u64,
    timeout_callback: Callback<'a, ()>,
    request_id: u32,
    issued_at: u64,
}

impl<'a, J> RpcRequestCallback<'a, J> {
    /// A request for `method` without a timeout.
    pub const fn new(method: &'a str, params: Option<&'a J>, callback: Callback<'a, J>) -> Self {
        Self {
            method,
            params,
            callback,
            timeout_micros: 0,
            timeout_callback: Callback::empty(),
            request_id: 0,
            issued_at: 0,
        }
    }

    /// Expires the request `timeout_micros` after it was issued, invoking
    /// `timeout_callback` instead of the response callback. Zero disables
    /// the timeout.
    pub fn with_timeout(mut self, timeout_micros: u64, timeout_callback: Callback<'a, ()>) -> Self {
        self.timeout_micros = timeout_micros;
        self.timeout_callback = timeout_callback;
        self
    }

    /// The remote method name.
    pub fn method(&self) -> &'a str {
        self.method
    }

    /// The request parameters, if any.
    pub fn params(&self) -> Option<&'a J> {
        self.params
    }

    /// Correlation id, assigned when the request is issued.
    pub fn request_id(&self) -> u32 {
        self.request_id
    }

    /// Timeout in microseconds; zero if the request never expires.
    pub fn timeout_micros(&self) -> u64 {
        self.timeout_micros
    }

    fn is_expired(&self, now_micros: u64) -> bool {
        self.timeout_micros != 0 && now_micros.saturating_sub(self.issued_at) >= self.timeout_micros
    }
}

impl<J> Clone for RpcRequestCallback<'_, J> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<J> Copy for RpcRequestCallback<'_, J> {}

impl<J> fmt::Debug for RpcRequestCallback<'_, J> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RpcRequestCallback")
            .field("method", &self.method)
            .field("request_id", &self.request_id)
            .field("timeout_micros", &self.timeout_micros)
            .finish()
    }
}

/// Client-side RPC feature, generic over the pending-request storage `S`.
pub struct ClientSideRpc<'a, J, S> {
    requests: S,
    last_request_id: u32,
    _records: PhantomData<RpcRequestCallback<'a, J>>,
}

/// [`ClientSideRpc`] with at most `N` requests outstanding.
pub type FixedClientSideRpc<'a, J, const N: usize = { DEFAULT_MAX_RPC_REQUESTS }> =
    ClientSideRpc<'a, J, FixedCapacitySequence<RpcRequestCallback<'a, J>, N>>;

/// [`ClientSideRpc`] with unbounded, heap-backed request storage.
#[cfg(feature = "alloc")]
pub type DynamicClientSideRpc<'a, J> =
    ClientSideRpc<'a, J, DynamicSequence<RpcRequestCallback<'a, J>>>;

impl<'a, J, S> ClientSideRpc<'a, J, S>
where
    J: JsonObject,
    S: Sequence<RpcRequestCallback<'a, J>>,
{
    /// A feature with nothing outstanding.
    pub fn new() -> Self {
        Self {
            requests: S::default(),
            last_request_id: 0,
            _records: PhantomData,
        }
    }

    /// Issues `request` at `now_micros` and returns its id.
    ///
    /// The request is only stored once it has been published.
    pub fn request(
        &mut self,
        link: &mut dyn MqttLink,
        mut request: RpcRequestCallback<'a, J>,
        now_micros: u64,
    ) -> Result<u32, Error> {
        if !self.requests.can_hold(1) {
            error!(
                "too many outstanding rpc requests, capacity {}",
                self.requests.capacity()
            );
            return Err(Error::CapacityExceeded);
        }
        if !link.subscribe(RPC_RESPONSE_SUBSCRIBE_TOPIC) {
            error!("failed to subscribe to {}", RPC_RESPONSE_SUBSCRIBE_TOPIC);
            return Err(Error::SubscribeFailed);
        }

        let request_id = self.next_request_id();
        let mut topic: String<MAX_TOPIC_LENGTH> = String::new();
        write!(topic, "{}{}", RPC_REQUEST_TOPIC_PREFIX, request_id)
            .map_err(|_| Error::BufferTooSmall)?;

        let mut payload = [0u8; MAX_OUTBOUND_PAYLOAD];
        let len = encode_request(&mut payload, request.method, request.params)?;
        if !link.publish(&topic, &payload[..len]) {
            error!("failed to publish rpc request {}", request.method);
            return Err(Error::PublishFailed);
        }

        request.request_id = request_id;
        request.issued_at = now_micros;
        self.requests.push(request);
        debug!("rpc request {} sent as {}", request.method, request_id);
        Ok(request_id)
    }

    /// Number of requests awaiting a response.
    pub fn pending(&self) -> usize {
        self.requests.len()
    }

    /// Whether request `id` is still awaiting a response.
    pub fn is_pending(&self, request_id: u32) -> bool {
        self.requests.iter().any(|r| r.request_id == request_id)
    }

    /// Next id after the last one issued, skipping zero and ids still in
    /// flight.
    fn next_request_id(&mut self) -> u32 {
        loop {
            self.last_request_id = self.last_request_id.wrapping_add(1);
            let candidate = self.last_request_id;
            if candidate != 0 && !self.is_pending(candidate) {
                return candidate;
            }
        }
    }
}

fn encode_request<J: JsonObject>(
    buffer: &mut [u8],
    method: &str,
    params: Option<&J>,
) -> Result<usize, Error> {
    let mut writer = JsonWriter::new(buffer);
    writer.raw(b"{\"method\":")?.string(method)?.raw(b",\"params\":")?;
    match params {
        Some(params) => writer.document(params)?,
        None => writer.raw(b"{}")?,
    };
    writer.raw(b"}")?;
    Ok(writer.finish())
}

impl<'a, J, S> Default for ClientSideRpc<'a, J, S>
where
    J: JsonObject,
    S: Sequence<RpcRequestCallback<'a, J>>,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<J, S: fmt::Debug> fmt::Debug for ClientSideRpc<'_, J, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientSideRpc")
            .field("requests", &self.requests)
            .field("last_request_id", &self.last_request_id)
            .finish()
    }
}

impl<'a, J, S> ApiImplementation for ClientSideRpc<'a, J, S>
where
    J: JsonObject,
    S: Sequence<RpcRequestCallback<'a, J>>,
{
    type Json = J;

    fn response_topic(&self) -> &str {
        RPC_RESPONSE_SUBSCRIBE_TOPIC
    }

    fn handles_topic(&self, topic: &str) -> bool {
        topic.starts_with(RPC_RESPONSE_TOPIC_PREFIX)
    }

    fn process_json_response(&mut self, topic: &str, data: &J) {
        let Some(request_id) = topic
            .strip_prefix(RPC_RESPONSE_TOPIC_PREFIX)
            .and_then(|id| id.parse::<u32>().ok())
        else {
            warn!("rpc response without request id on {}", topic);
            return;
        };

        match self.requests.iter().position(|r| r.request_id == request_id) {
            Some(index) => {
                let request = self.requests.erase(index);
                trace!("rpc response for {} ({})", request.method, request_id);
                request.callback.call_callback(data);
            }
            None => warn!("dropping unmatched rpc response {}", request_id),
        }
    }

    fn unsubscribe(&mut self, link: &mut dyn MqttLink) -> Result<(), Error> {
        self.requests.clear();
        if !link.unsubscribe(RPC_RESPONSE_SUBSCRIBE_TOPIC) {
            error!("failed to unsubscribe from {}", RPC_RESPONSE_SUBSCRIBE_TOPIC);
            return Err(Error::UnsubscribeFailed);
        }
        Ok(())
    }

    fn resubscribe_topic(&mut self, link: &mut dyn MqttLink) -> Result<(), Error> {
        if self.requests.is_empty() {
            return Ok(());
        }
        if !link.subscribe(RPC_RESPONSE_SUBSCRIBE_TOPIC) {
            error!("failed to subscribe to {}", RPC_RESPONSE_SUBSCRIBE_TOPIC);
            return Err(Error::SubscribeFailed);
        }
        Ok(())
    }

    fn process_timeouts(&mut self, now_micros: u64) {
        let mut index = 0;
        while index < self.requests.len() {
            if !self.requests.at(index).is_expired(now_micros) {
                index += 1;
                continue;
            }
            let expired = self.requests.erase(index);
            warn!(
                "rpc request {} ({}) timed out after {} us",
                expired.method,
                expired.request_id,
                expired.timeout_micros
            );
            expired.timeout_callback.call_callback(&());
        }
    }
}
