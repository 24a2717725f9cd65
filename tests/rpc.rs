#![cfg(feature = "alloc")]

use std::cell::Cell;

use iotlink::api::{ApiImplementation, FixedClientSideRpc, RpcRequestCallback};
use iotlink::config::{RPC_RESPONSE_SUBSCRIBE_TOPIC, RPC_RESPONSE_TOPIC_PREFIX};
use iotlink::{Callback, Error};
use serde_json::{Value, json};

mod support;
use support::{MockTransport, Recorder};

fn response_topic(id: u32) -> String {
    format!("{}{}", RPC_RESPONSE_TOPIC_PREFIX, id)
}

#[test]
fn test_request_publishes_method_and_params() {
    let noop = |_: &Value| {};
    let params = json!({"pin": 4});
    let mut link = MockTransport::connected();
    let mut rpc = FixedClientSideRpc::<Value>::new();

    let id = rpc
        .request(
            &mut link,
            RpcRequestCallback::new("setGpio", Some(&params), Callback::new(&noop)),
            0,
        )
        .unwrap();
    let plain = rpc
        .request(
            &mut link,
            RpcRequestCallback::new("getCurrentTime", None, Callback::new(&noop)),
            0,
        )
        .unwrap();

    assert_eq!(id, 1);
    assert_eq!(plain, 2);
    assert_eq!(link.subscription_count(RPC_RESPONSE_SUBSCRIBE_TOPIC), 2);
    assert_eq!(
        link.published_on("v1/devices/me/rpc/request/1"),
        vec![json!({"method": "setGpio", "params": {"pin": 4}})]
    );
    assert_eq!(
        link.published_on("v1/devices/me/rpc/request/2"),
        vec![json!({"method": "getCurrentTime", "params": {}})]
    );
}

#[test]
fn test_response_invokes_matching_callback_once() {
    let first = Recorder::default();
    let second = Recorder::default();
    let on_first = |data: &Value| first.record(data);
    let on_second = |data: &Value| second.record(data);
    let mut link = MockTransport::connected();
    let mut rpc = FixedClientSideRpc::<Value>::new();

    let a = rpc
        .request(&mut link, RpcRequestCallback::new("a", None, Callback::new(&on_first)), 0)
        .unwrap();
    let b = rpc
        .request(&mut link, RpcRequestCallback::new("b", None, Callback::new(&on_second)), 0)
        .unwrap();
    assert_ne!(a, b);

    let topic = response_topic(b);
    assert!(rpc.handles_topic(&topic));
    rpc.process_json_response(&topic, &json!({"time": 1700000000}));
    assert_eq!(first.count(), 0);
    assert_eq!(second.last(), Some(json!({"time": 1700000000})));
    assert!(!rpc.is_pending(b));
    assert!(rpc.is_pending(a));

    rpc.process_json_response(&topic, &json!({"time": 1}));
    assert_eq!(second.count(), 1);
    assert_eq!(rpc.pending(), 1);
}

#[test]
fn test_ids_stay_unique_while_outstanding() {
    let noop = |_: &Value| {};
    let callback: Callback<'_, Value> = Callback::new(&noop);
    let mut link = MockTransport::connected();
    let mut rpc = FixedClientSideRpc::<Value, 4>::new();

    let mut outstanding = Vec::new();
    for _ in 0..4 {
        outstanding.push(
            rpc.request(&mut link, RpcRequestCallback::new("m", None, callback), 0)
                .unwrap(),
        );
    }
    let answered = outstanding.remove(1);
    rpc.process_json_response(&response_topic(answered), &Value::Null);

    let next = rpc
        .request(&mut link, RpcRequestCallback::new("m", None, callback), 0)
        .unwrap();
    assert!(!outstanding.contains(&next));
    outstanding.push(next);

    let mut sorted = outstanding.clone();
    sorted.sort_unstable();
    sorted.dedup();
    assert_eq!(sorted.len(), outstanding.len());
}

#[test]
fn test_timeout_invokes_only_timeout_callback() {
    let responses = Recorder::default();
    let timeouts = Cell::new(0);
    let record = |data: &Value| responses.record(data);
    let count = |_: &()| timeouts.set(timeouts.get() + 1);
    let on_response: Callback<'_, Value> = Callback::new(&record);
    let on_timeout: Callback<'_, ()> = Callback::new(&count);
    let mut link = MockTransport::connected();
    let mut rpc = FixedClientSideRpc::<Value>::new();

    let request =
        RpcRequestCallback::new("slow", None, on_response).with_timeout(5_000_000, on_timeout);
    let id = rpc.request(&mut link, request, 1_000).unwrap();

    rpc.process_timeouts(4_000_000);
    assert_eq!(timeouts.get(), 0);
    assert!(rpc.is_pending(id));

    rpc.process_timeouts(5_001_000);
    assert_eq!(timeouts.get(), 1);
    assert_eq!(rpc.pending(), 0);

    rpc.process_timeouts(9_000_000);
    rpc.process_json_response(&response_topic(id), &json!({"late": true}));
    assert_eq!(timeouts.get(), 1);
    assert_eq!(responses.count(), 0);
}

#[test]
fn test_request_without_timeout_never_expires() {
    let noop = |_: &Value| {};
    let mut link = MockTransport::connected();
    let mut rpc = FixedClientSideRpc::<Value>::new();
    let id = rpc
        .request(&mut link, RpcRequestCallback::new("m", None, Callback::new(&noop)), 0)
        .unwrap();

    rpc.process_timeouts(u64::MAX);
    assert!(rpc.is_pending(id));
}

#[test]
fn test_capacity_exceeded_publishes_nothing() {
    let noop = |_: &Value| {};
    let callback: Callback<'_, Value> = Callback::new(&noop);
    let mut link = MockTransport::connected();
    let mut rpc = FixedClientSideRpc::<Value, 1>::new();

    rpc.request(&mut link, RpcRequestCallback::new("a", None, callback), 0)
        .unwrap();
    let result = rpc.request(&mut link, RpcRequestCallback::new("b", None, callback), 0);

    assert_eq!(result, Err(Error::CapacityExceeded));
    assert_eq!(link.published.len(), 1);
}

#[test]
fn test_transport_failures_store_nothing() {
    let noop = |_: &Value| {};
    let callback: Callback<'_, Value> = Callback::new(&noop);
    let mut link = MockTransport::connected();
    let mut rpc = FixedClientSideRpc::<Value>::new();

    link.fail_subscribe = true;
    assert_eq!(
        rpc.request(&mut link, RpcRequestCallback::new("a", None, callback), 0),
        Err(Error::SubscribeFailed)
    );

    link.fail_subscribe = false;
    link.fail_publish = true;
    assert_eq!(
        rpc.request(&mut link, RpcRequestCallback::new("a", None, callback), 0),
        Err(Error::PublishFailed)
    );
    assert_eq!(rpc.pending(), 0);
}

#[test]
fn test_unsubscribe_drops_pending_requests() {
    let recorder = Recorder::default();
    let record = |data: &Value| recorder.record(data);
    let mut link = MockTransport::connected();
    let mut rpc = FixedClientSideRpc::<Value>::new();
    let id = rpc
        .request(&mut link, RpcRequestCallback::new("a", None, Callback::new(&record)), 0)
        .unwrap();

    rpc.unsubscribe(&mut link).unwrap();
    rpc.process_json_response(&response_topic(id), &json!(1));

    assert_eq!(recorder.count(), 0);
    assert_eq!(link.unsubscriptions, vec![RPC_RESPONSE_SUBSCRIBE_TOPIC.to_string()]);
    assert_eq!(rpc.resubscribe_topic(&mut link), Ok(()));
    assert_eq!(link.subscription_count(RPC_RESPONSE_SUBSCRIBE_TOPIC), 1);
}
