#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;

use iotlink::Callback;
use iotlink::network::{
    ConnectionError, ConnectionMonitor, ConnectionState, HttpClient, MqttClient, MqttLink,
    PublishPacket,
};
use serde_json::Value;

/// In-memory MQTT transport recording everything features ask of it.
#[derive(Debug)]
pub struct MockTransport<'a> {
    pub monitor: ConnectionMonitor<'a>,
    pub server: Option<(String, u16)>,
    pub client_id: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub subscriptions: Vec<String>,
    pub unsubscriptions: Vec<String>,
    pub published: Vec<(String, Vec<u8>)>,
    pub incoming: VecDeque<PublishPacket>,
    pub receive_buffer_size: u16,
    pub send_buffer_size: u16,
    pub fail_subscribe: bool,
    pub fail_unsubscribe: bool,
    pub fail_publish: bool,
    pub refuse_connect: bool,
    pub connect_synchronously: bool,
    on_data: Callback<'a, PublishPacket>,
    on_connect: Callback<'a, ()>,
}

impl<'a> MockTransport<'a> {
    pub fn new() -> Self {
        Self {
            monitor: ConnectionMonitor::new(),
            server: None,
            client_id: None,
            username: None,
            password: None,
            subscriptions: Vec::new(),
            unsubscriptions: Vec::new(),
            published: Vec::new(),
            incoming: VecDeque::new(),
            receive_buffer_size: 128,
            send_buffer_size: 128,
            fail_subscribe: false,
            fail_unsubscribe: false,
            fail_publish: false,
            refuse_connect: false,
            connect_synchronously: true,
            on_data: Callback::empty(),
            on_connect: Callback::empty(),
        }
    }

    /// A transport that already holds a broker session.
    pub fn connected() -> Self {
        let mut transport = Self::new();
        transport.monitor.begin_connect();
        transport.monitor.report_connected();
        transport
    }

    /// Queues a message delivered on the next `poll`.
    pub fn deliver(&mut self, topic: &str, payload: &[u8]) {
        let packet = PublishPacket::new(topic, payload).expect("packet fits");
        self.incoming.push_back(packet);
    }

    /// Completes a pending asynchronous connect.
    pub fn complete_connect(&mut self) {
        self.monitor.report_connected();
        self.on_connect.call_callback(&());
    }

    pub fn published_on(&self, topic: &str) -> Vec<Value> {
        self.published
            .iter()
            .filter(|(t, _)| t == topic)
            .map(|(_, payload)| serde_json::from_slice(payload).expect("published payload is json"))
            .collect()
    }

    pub fn subscription_count(&self, topic: &str) -> usize {
        self.subscriptions.iter().filter(|t| *t == topic).count()
    }
}

impl MqttLink for MockTransport<'_> {
    fn connected(&self) -> bool {
        self.monitor.is_connected()
    }

    fn publish(&mut self, topic: &str, payload: &[u8]) -> bool {
        if self.fail_publish {
            return false;
        }
        self.published.push((topic.to_string(), payload.to_vec()));
        true
    }

    fn subscribe(&mut self, topic: &str) -> bool {
        if self.fail_subscribe {
            return false;
        }
        self.subscriptions.push(topic.to_string());
        true
    }

    fn unsubscribe(&mut self, topic: &str) -> bool {
        if self.fail_unsubscribe {
            return false;
        }
        self.unsubscriptions.push(topic.to_string());
        true
    }
}

impl<'a> MqttClient<'a> for MockTransport<'a> {
    fn set_server(&mut self, host: &str, port: u16) {
        self.server = Some((host.to_string(), port));
    }

    fn connect(&mut self, client_id: &str, username: &str, password: Option<&str>) -> bool {
        self.monitor.begin_connect();
        if self.refuse_connect {
            self.monitor.report_error(ConnectionError::NotAuthorized);
            return false;
        }
        self.client_id = Some(client_id.to_string());
        self.username = Some(username.to_string());
        self.password = password.map(str::to_string);
        if self.connect_synchronously {
            self.complete_connect();
        }
        true
    }

    fn disconnect(&mut self) {
        self.monitor.begin_disconnect();
        self.monitor.report_disconnected();
    }

    fn poll(&mut self) -> bool {
        while let Some(packet) = self.incoming.pop_front() {
            self.on_data.call_callback(&packet);
        }
        self.monitor.is_connected()
    }

    fn set_data_callback(&mut self, callback: Callback<'a, PublishPacket>) {
        self.on_data = callback;
    }

    fn set_connect_callback(&mut self, callback: Callback<'a, ()>) {
        self.on_connect = callback;
    }

    fn subscribe_connection_state_changed_callback(
        &mut self,
        callback: Callback<'a, (ConnectionState, ConnectionError)>,
    ) {
        self.monitor.subscribe(callback);
    }

    fn connection_state(&self) -> ConnectionState {
        self.monitor.state()
    }

    fn last_connection_error(&self) -> ConnectionError {
        self.monitor.last_error()
    }

    fn set_buffer_size(&mut self, receive_buffer_size: u16, send_buffer_size: u16) -> bool {
        if receive_buffer_size == 0 || send_buffer_size == 0 {
            return false;
        }
        self.receive_buffer_size = receive_buffer_size;
        self.send_buffer_size = send_buffer_size;
        true
    }

    fn receive_buffer_size(&self) -> u16 {
        self.receive_buffer_size
    }

    fn send_buffer_size(&self) -> u16 {
        self.send_buffer_size
    }
}

/// Collects every document a callback receives.
#[derive(Debug, Default)]
pub struct Recorder {
    pub received: RefCell<Vec<Value>>,
}

impl Recorder {
    pub fn record(&self, data: &Value) {
        self.received.borrow_mut().push(data.clone());
    }

    pub fn count(&self) -> usize {
        self.received.borrow().len()
    }

    pub fn last(&self) -> Option<Value> {
        self.received.borrow().last().cloned()
    }
}

/// Blocking HTTP client double answering every request with `status`.
#[derive(Debug)]
pub struct MockHttp {
    pub status: u16,
    pub keep_alive: bool,
    pub connected_to: Option<(String, u16)>,
    pub posts: Vec<(String, String, Vec<u8>)>,
    pub stops: usize,
    pub refuse_connect: bool,
    body: Vec<u8>,
}

impl MockHttp {
    pub fn answering(status: u16) -> Self {
        Self {
            status,
            keep_alive: false,
            connected_to: None,
            posts: Vec::new(),
            stops: 0,
            refuse_connect: false,
            body: Vec::new(),
        }
    }
}

impl HttpClient for MockHttp {
    fn set_keep_alive(&mut self, keep_alive: bool) {
        self.keep_alive = keep_alive;
    }

    fn connect(&mut self, host: &str, port: u16) -> bool {
        if self.refuse_connect {
            return false;
        }
        self.connected_to = Some((host.to_string(), port));
        true
    }

    fn stop(&mut self) {
        self.stops += 1;
        self.connected_to = None;
    }

    fn post(&mut self, path: &str, content_type: &str, body: &[u8]) -> bool {
        self.posts
            .push((path.to_string(), content_type.to_string(), body.to_vec()));
        true
    }

    fn get(&mut self, _path: &str) -> bool {
        true
    }

    fn response_status_code(&mut self) -> u16 {
        self.status
    }

    fn response_body(&mut self) -> &[u8] {
        &self.body
    }
}
