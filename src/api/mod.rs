//! Pluggable cloud API features and the registry dispatching to them.
//!
//! A feature owns one response topic (or a family of topics), keeps its
//! callback records in a [`Sequence`](crate::container::Sequence) and turns
//! parsed inbound documents into user callbacks. The device client holds the
//! features as an [`ApiRegistry`]: a tuple of features, or an array of
//! feature trait objects, whose order is the dispatch order.
//!
//! Features never own the transport. Operations that need to talk to the
//! broker take it as `&mut dyn MqttLink`; obtain both halves from
//! [`DeviceClient::split_mut`](crate::client::DeviceClient::split_mut).

pub mod provision;
pub mod rpc;
pub mod shared_attributes;

pub use provision::{DeviceCredentials, Provision, ProvisionCallback, ProvisionCredentials};
pub use rpc::{ClientSideRpc, FixedClientSideRpc, RpcRequestCallback};
pub use shared_attributes::{
    FixedSharedAttributeUpdate, SharedAttributeCallback, SharedAttributeUpdate,
};

#[cfg(feature = "alloc")]
pub use rpc::DynamicClientSideRpc;
#[cfg(feature = "alloc")]
pub use shared_attributes::DynamicSharedAttributeUpdate;

use crate::error::Error;
use crate::json::JsonObject;
use crate::network::MqttLink;

/// One cloud API surface.
pub trait ApiImplementation {
    /// Document type inbound payloads are parsed into.
    type Json: JsonObject;

    /// Topic (or topic filter) the feature subscribes to for its responses.
    fn response_topic(&self) -> &str;

    /// Whether an inbound message on `topic` belongs to this feature.
    ///
    /// Defaults to an exact match against
    /// [`response_topic`](ApiImplementation::response_topic).
    fn handles_topic(&self, topic: &str) -> bool {
        topic == self.response_topic()
    }

    /// Handles a parsed inbound document.
    fn process_json_response(&mut self, topic: &str, data: &Self::Json);

    /// Drops every registered record and unsubscribes the response topic.
    fn unsubscribe(&mut self, link: &mut dyn MqttLink) -> Result<(), Error>;

    /// Re-issues the subscription after a reconnect. Succeeds without
    /// touching the transport when there is nothing to resubscribe.
    fn resubscribe_topic(&mut self, link: &mut dyn MqttLink) -> Result<(), Error>;

    /// Housekeeping for requests awaiting a response. `now_micros` is a
    /// monotonic timestamp in microseconds.
    fn process_timeouts(&mut self, now_micros: u64) {
        let _ = now_micros;
    }
}

impl<A: ApiImplementation + ?Sized> ApiImplementation for &mut A {
    type Json = A::Json;

    fn response_topic(&self) -> &str {
        (**self).response_topic()
    }

    fn handles_topic(&self, topic: &str) -> bool {
        (**self).handles_topic(topic)
    }

    fn process_json_response(&mut self, topic: &str, data: &Self::Json) {
        (**self).process_json_response(topic, data)
    }

    fn unsubscribe(&mut self, link: &mut dyn MqttLink) -> Result<(), Error> {
        (**self).unsubscribe(link)
    }

    fn resubscribe_topic(&mut self, link: &mut dyn MqttLink) -> Result<(), Error> {
        (**self).resubscribe_topic(link)
    }

    fn process_timeouts(&mut self, now_micros: u64) {
        (**self).process_timeouts(now_micros)
    }
}

/// An ordered set of features sharing one document type.
pub trait ApiRegistry {
    /// Document type shared by every feature.
    type Json: JsonObject;

    /// Hands `data` to every feature handling `topic`, in registration
    /// order. Returns whether any feature took it.
    fn dispatch(&mut self, topic: &str, data: &Self::Json) -> bool;

    /// Unsubscribes every feature. All features are attempted; the first
    /// failure is returned.
    fn unsubscribe_all(&mut self, link: &mut dyn MqttLink) -> Result<(), Error>;

    /// Resubscribes every feature. Failures are logged and skipped.
    fn resubscribe_all(&mut self, link: &mut dyn MqttLink);

    /// Runs timeout housekeeping on every feature.
    fn process_timeouts(&mut self, now_micros: u64);
}

fn dispatch_one<A: ApiImplementation>(api: &mut A, topic: &str, data: &A::Json) -> bool {
    if !api.handles_topic(topic) {
        return false;
    }
    trace!("dispatching {} to {}", topic, api.response_topic());
    api.process_json_response(topic, data);
    true
}

fn resubscribe_one<A: ApiImplementation>(api: &mut A, link: &mut dyn MqttLink) {
    if let Err(e) = api.resubscribe_topic(link) {
        warn!("resubscribe of {} failed: {:?}", api.response_topic(), e);
    }
}

fn unsubscribe_one<A: ApiImplementation>(
    api: &mut A,
    link: &mut dyn MqttLink,
    result: &mut Result<(), Error>,
) {
    if let Err(e) = api.unsubscribe(link) {
        warn!("unsubscribe of {} failed: {:?}", api.response_topic(), e);
        if result.is_ok() {
            *result = Err(e);
        }
    }
}

macro_rules! impl_api_registry_for_tuple {
    ($first:ident $(, $rest:ident)*) => {
        impl<$first $(, $rest)*> ApiRegistry for ($first, $($rest,)*)
        where
            $first: ApiImplementation,
            $($rest: ApiImplementation<Json = <$first as ApiImplementation>::Json>,)*
        {
            type Json = <$first as ApiImplementation>::Json;

            #[allow(non_snake_case, unused_mut)]
            fn dispatch(&mut self, topic: &str, data: &Self::Json) -> bool {
                let ($first, $($rest,)*) = self;
                let mut handled = dispatch_one($first, topic, data);
                $(handled |= dispatch_one($rest, topic, data);)*
                handled
            }

            #[allow(non_snake_case)]
            fn unsubscribe_all(&mut self, link: &mut dyn MqttLink) -> Result<(), Error> {
                let ($first, $($rest,)*) = self;
                let mut result = Ok(());
                unsubscribe_one($first, link, &mut result);
                $(unsubscribe_one($rest, link, &mut result);)*
                result
            }

            #[allow(non_snake_case)]
            fn resubscribe_all(&mut self, link: &mut dyn MqttLink) {
                let ($first, $($rest,)*) = self;
                resubscribe_one($first, link);
                $(resubscribe_one($rest, link);)*
            }

            #[allow(non_snake_case)]
            fn process_timeouts(&mut self, now_micros: u64) {
                let ($first, $($rest,)*) = self;
                $first.process_timeouts(now_micros);
                $($rest.process_timeouts(now_micros);)*
            }
        }
    };
}

impl_api_registry_for_tuple!(A);
impl_api_registry_for_tuple!(A, B);
impl_api_registry_for_tuple!(A, B, C);
impl_api_registry_for_tuple!(A, B, C, D);

impl<'f, J: JsonObject, const N: usize> ApiRegistry
    for [&'f mut (dyn ApiImplementation<Json = J> + 'f); N]
{
    type Json = J;

    fn dispatch(&mut self, topic: &str, data: &J) -> bool {
        let mut handled = false;
        for api in self.iter_mut() {
            handled |= dispatch_one(api, topic, data);
        }
        handled
    }

    fn unsubscribe_all(&mut self, link: &mut dyn MqttLink) -> Result<(), Error> {
        let mut result = Ok(());
        for api in self.iter_mut() {
            unsubscribe_one(api, link, &mut result);
        }
        result
    }

    fn resubscribe_all(&mut self, link: &mut dyn MqttLink) {
        for api in self.iter_mut() {
            resubscribe_one(api, link);
        }
    }

    fn process_timeouts(&mut self, now_micros: u64) {
        for api in self.iter_mut() {
            api.process_timeouts(now_micros);
        }
    }
}
