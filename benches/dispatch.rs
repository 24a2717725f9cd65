use criterion::{BatchSize, Criterion, Throughput};
use iotlink::Callback;
use iotlink::api::{
    FixedClientSideRpc, FixedSharedAttributeUpdate, RpcRequestCallback, SharedAttributeCallback,
};
use iotlink::client::DeviceClient;
use iotlink::config::{ATTRIBUTE_TOPIC, ClientSettings};
use iotlink::network::{ConnectionError, ConnectionState, MqttClient, MqttLink, PublishPacket};
use serde_json::Value;
use std::cell::Cell;
use std::hint::black_box;

/// Broker stand-in that accepts everything and drops what is published.
#[derive(Debug, Default)]
struct NullTransport;

impl MqttLink for NullTransport {
    fn connected(&self) -> bool {
        true
    }

    fn publish(&mut self, _topic: &str, payload: &[u8]) -> bool {
        black_box(payload);
        true
    }

    fn subscribe(&mut self, _topic: &str) -> bool {
        true
    }

    fn unsubscribe(&mut self, _topic: &str) -> bool {
        true
    }
}

impl<'a> MqttClient<'a> for NullTransport {
    fn set_server(&mut self, _host: &str, _port: u16) {}

    fn connect(&mut self, _client_id: &str, _username: &str, _password: Option<&str>) -> bool {
        true
    }

    fn disconnect(&mut self) {}

    fn poll(&mut self) -> bool {
        true
    }

    fn set_data_callback(&mut self, _callback: Callback<'a, PublishPacket>) {}

    fn set_connect_callback(&mut self, _callback: Callback<'a, ()>) {}

    fn subscribe_connection_state_changed_callback(
        &mut self,
        _callback: Callback<'a, (ConnectionState, ConnectionError)>,
    ) {
    }

    fn connection_state(&self) -> ConnectionState {
        ConnectionState::Connected
    }

    fn last_connection_error(&self) -> ConnectionError {
        ConnectionError::None
    }

    fn set_buffer_size(&mut self, _receive: u16, _send: u16) -> bool {
        true
    }

    fn receive_buffer_size(&self) -> u16 {
        1024
    }

    fn send_buffer_size(&self) -> u16 {
        1024
    }
}

pub fn bench_shared_attribute_dispatch(c: &mut Criterion) {
    let hits = Cell::new(0u64);
    let count = |_: &Value| hits.set(hits.get() + 1);
    let on_update: Callback<'_, Value> = Callback::new(&count);
    let keys = ["led", "mode", "fw_version"];
    let payload = br#"{"shared":{"mode":2,"threshold":17.5,"label":"kitchen"}}"#;

    let features = (FixedSharedAttributeUpdate::<Value, 4>::new(),);
    let mut client = DeviceClient::new(NullTransport, features, ClientSettings::symmetric(1024));
    let (link, (updates,)) = client.split_mut();
    updates
        .subscribe_many(
            link,
            &[
                SharedAttributeCallback::all(on_update),
                SharedAttributeCallback::new(&keys, on_update),
            ],
        )
        .expect("subscribe");

    let mut group = c.benchmark_group("shared_attribute_dispatch");
    group.throughput(Throughput::Bytes(payload.len() as u64));
    group.bench_function("process_message", |b| {
        b.iter(|| black_box(client.process_message(ATTRIBUTE_TOPIC, black_box(payload))))
    });
    group.finish();
}

pub fn bench_rpc_round_trip(c: &mut Criterion) {
    let noop = |_: &Value| {};
    let on_response: Callback<'_, Value> = Callback::new(&noop);
    let mut client = DeviceClient::new(
        NullTransport,
        (FixedClientSideRpc::<Value>::new(),),
        ClientSettings::symmetric(1024),
    );

    let mut group = c.benchmark_group("rpc_round_trip");
    group.bench_function("request_and_response", |b| {
        b.iter_batched(
            || RpcRequestCallback::new("getTime", None, on_response),
            |request| {
                let (link, (rpc,)) = client.split_mut();
                let id = rpc.request(link, request, 0).expect("request");
                let mut topic = String::from("v1/devices/me/rpc/response/");
                topic.push_str(&id.to_string());
                black_box(client.process_message(&topic, br#"{"time":1}"#))
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}
