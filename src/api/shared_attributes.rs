//! Shared attribute update notifications.
//!
//! The cloud pushes changed shared attributes to [`ATTRIBUTE_TOPIC`]. Each
//! registered [`SharedAttributeCallback`] names the keys it cares about; an
//! empty key list means every update.
//!
//! ```rust
//! # use iotlink::network::MqttLink;
//! # struct Loopback;
//! # impl MqttLink for Loopback {
//! #     fn connected(&self) -> bool { true }
//! #     fn publish(&mut self, _: &str, _: &[u8]) -> bool { true }
//! #     fn subscribe(&mut self, _: &str) -> bool { true }
//! #     fn unsubscribe(&mut self, _: &str) -> bool { true }
//! # }
//! use iotlink::api::{ApiImplementation, FixedSharedAttributeUpdate, SharedAttributeCallback};
//! use iotlink::json::JsonObject;
//! use iotlink::Callback;
//! use serde_json::Value;
//!
//! let print = |data: &Value| println!("attributes changed: {}", data);
//! let on_update: Callback<'_, Value> = Callback::new(&print);
//! let keys = ["temperature", "humidity"];
//!
//! let mut link = Loopback;
//! let mut updates = FixedSharedAttributeUpdate::<Value>::new();
//! updates
//!     .subscribe(&mut link, SharedAttributeCallback::new(&keys, on_update))
//!     .unwrap();
//!
//! let payload = Value::parse(br#"{"shared":{"humidity":40}}"#).unwrap();
//! updates.process_json_response("v1/devices/me/attributes", &payload);
//! ```

use core::fmt;
use core::marker::PhantomData;

use crate::api::ApiImplementation;
use crate::callback::Callback;
use crate::config::{ATTRIBUTE_TOPIC, DEFAULT_MAX_SHARED_ATTRIBUTE_SUBSCRIPTIONS};
use crate::container::{FixedCapacitySequence, Sequence};
use crate::error::Error;
use crate::json::JsonObject;
use crate::network::MqttLink;

#[cfg(feature = "alloc")]
use crate::container::DynamicSequence;

/// Key wrapping the attributes inside a shared attribute update.
const SHARED_RESPONSE_KEY: &str = "shared";

/// Interest in a set of shared attribute keys.
pub struct SharedAttributeCallback<'a, J> {
    keys: &'a [&'a str],
    callback: Callback<'a, J>,
}

impl<'a, J> SharedAttributeCallback<'a, J> {
    /// Invokes `callback` when an update contains any of `keys`. An empty
    /// slice subscribes to every update.
    pub const fn new(keys: &'a [&'a str], callback: Callback<'a, J>) -> Self {
        Self { keys, callback }
    }

    /// Invokes `callback` on every update.
    pub const fn all(callback: Callback<'a, J>) -> Self {
        Self {
            keys: &[],
            callback,
        }
    }

    /// The subscribed keys.
    pub fn keys(&self) -> &'a [&'a str] {
        self.keys
    }

    /// Replaces the callback, e.g. on a default-constructed record.
    pub fn set_callback(&mut self, callback: Callback<'a, J>) {
        self.callback = callback;
    }

    /// First non-empty subscribed key present in `data`.
    fn matched_key(&self, data: &J) -> Option<&'a str>
    where
        J: JsonObject,
    {
        self.keys
            .iter()
            .copied()
            .find(|key| !key.is_empty() && data.contains_key(key))
    }
}

impl<J> Clone for SharedAttributeCallback<'_, J> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<J> Copy for SharedAttributeCallback<'_, J> {}

impl<J> Default for SharedAttributeCallback<'_, J> {
    fn default() -> Self {
        Self::all(Callback::empty())
    }
}

impl<J> fmt::Debug for SharedAttributeCallback<'_, J> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedAttributeCallback")
            .field("keys", &self.keys)
            .field("callback", &self.callback)
            .finish()
    }
}

/// Shared attribute update feature, generic over the record storage `S`.
pub struct SharedAttributeUpdate<'a, J, S> {
    callbacks: S,
    _records: PhantomData<SharedAttributeCallback<'a, J>>,
}

/// [`SharedAttributeUpdate`] holding at most `N` records inline.
pub type FixedSharedAttributeUpdate<
    'a,
    J,
    const N: usize = { DEFAULT_MAX_SHARED_ATTRIBUTE_SUBSCRIPTIONS },
> = SharedAttributeUpdate<'a, J, FixedCapacitySequence<SharedAttributeCallback<'a, J>, N>>;

/// [`SharedAttributeUpdate`] with heap-backed, growable record storage.
#[cfg(feature = "alloc")]
pub type DynamicSharedAttributeUpdate<'a, J> =
    SharedAttributeUpdate<'a, J, DynamicSequence<SharedAttributeCallback<'a, J>>>;

impl<'a, J, S> SharedAttributeUpdate<'a, J, S>
where
    J: JsonObject,
    S: Sequence<SharedAttributeCallback<'a, J>>,
{
    /// A feature with no records.
    pub fn new() -> Self {
        Self {
            callbacks: S::default(),
            _records: PhantomData,
        }
    }

    /// Registers `callback` and subscribes to the attribute topic.
    ///
    /// Nothing is stored if the storage is full or the transport refuses
    /// the subscription.
    pub fn subscribe(
        &mut self,
        link: &mut dyn MqttLink,
        callback: SharedAttributeCallback<'a, J>,
    ) -> Result<(), Error> {
        self.subscribe_many(link, core::slice::from_ref(&callback))
    }

    /// Registers every record in `callbacks` with a single subscription.
    ///
    /// Either all records are stored or none are.
    pub fn subscribe_many(
        &mut self,
        link: &mut dyn MqttLink,
        callbacks: &[SharedAttributeCallback<'a, J>],
    ) -> Result<(), Error> {
        if !self.callbacks.can_hold(callbacks.len()) {
            error!(
                "too many shared attribute subscriptions, capacity {}",
                self.callbacks.capacity()
            );
            return Err(Error::CapacityExceeded);
        }
        if !link.subscribe(ATTRIBUTE_TOPIC) {
            error!("failed to subscribe to {}", ATTRIBUTE_TOPIC);
            return Err(Error::SubscribeFailed);
        }
        self.callbacks.extend_from_slice(callbacks);
        debug!("{} shared attribute callbacks registered", self.callbacks.len());
        Ok(())
    }

    /// Number of registered records.
    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    /// Whether no record is registered.
    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }
}

impl<'a, J, S> Default for SharedAttributeUpdate<'a, J, S>
where
    J: JsonObject,
    S: Sequence<SharedAttributeCallback<'a, J>>,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<J, S: fmt::Debug> fmt::Debug for SharedAttributeUpdate<'_, J, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedAttributeUpdate")
            .field("callbacks", &self.callbacks)
            .finish()
    }
}

impl<'a, J, S> ApiImplementation for SharedAttributeUpdate<'a, J, S>
where
    J: JsonObject,
    S: Sequence<SharedAttributeCallback<'a, J>>,
{
    type Json = J;

    fn response_topic(&self) -> &str {
        ATTRIBUTE_TOPIC
    }

    fn process_json_response(&mut self, topic: &str, data: &J) {
        if !data.is_object() {
            warn!("shared attribute update on {} is not an object", topic);
            return;
        }
        let data = data.get(SHARED_RESPONSE_KEY).unwrap_or(data);
        if !data.is_object() {
            warn!("shared attributes on {} are not an object", topic);
            return;
        }

        for record in self.callbacks.iter() {
            if record.keys.is_empty() {
                record.callback.call_callback(data);
                continue;
            }
            match record.matched_key(data) {
                Some(key) => {
                    trace!("shared attribute {} matched", key);
                    record.callback.call_callback(data);
                }
                None => continue,
            }
        }
    }

    fn unsubscribe(&mut self, link: &mut dyn MqttLink) -> Result<(), Error> {
        self.callbacks.clear();
        if !link.unsubscribe(ATTRIBUTE_TOPIC) {
            error!("failed to unsubscribe from {}", ATTRIBUTE_TOPIC);
            return Err(Error::UnsubscribeFailed);
        }
        Ok(())
    }

    fn resubscribe_topic(&mut self, link: &mut dyn MqttLink) -> Result<(), Error> {
        if self.callbacks.is_empty() {
            return Ok(());
        }
        if !link.subscribe(ATTRIBUTE_TOPIC) {
            error!("failed to subscribe to {}", ATTRIBUTE_TOPIC);
            return Err(Error::SubscribeFailed);
        }
        Ok(())
    }
}
