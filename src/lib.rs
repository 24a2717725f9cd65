//! # iotlink - device-to-cloud client SDK
//!
//! Connects microcontrollers to an IoT platform over MQTT. The SDK is a
//! narrow feature framework: concrete MQTT/HTTP clients and the JSON library
//! are supplied by the application through small capability traits, and the
//! crate provides the pieces in between.
//!
//! ## Building blocks
//!
//! - [`container`]: one [`Sequence`](container::Sequence) interface with a
//!   fixed-capacity (`heapless`) and a heap-backed implementation. Every
//!   feature stores its records in one, so the same feature code runs on
//!   devices with and without an allocator.
//! - [`Callback`]: borrowed, optionally-empty function handle. Calling an
//!   empty one returns the default value.
//! - [`network`]: the [`MqttLink`](network::MqttLink) and
//!   [`MqttClient`](network::MqttClient) transport traits, the
//!   connection-state machine and the [`HttpClient`](network::HttpClient)
//!   trait.
//! - [`json`]: the [`JsonObject`](json::JsonObject) capability.
//! - [`api`]: the features (shared attribute updates, client-side RPC,
//!   provisioning) and the registry dispatching inbound messages to them.
//! - [`client`]: [`DeviceClient`](client::DeviceClient), which owns a
//!   transport and a feature registry, and an HTTP variant.
//!
//! ## Execution model
//!
//! Nothing in the SDK blocks on I/O or locks. The application calls
//! [`DeviceClient::poll`](client::DeviceClient::poll) with a monotonic
//! microsecond timestamp from its main loop; request timeouts are checked
//! there. Feature records are not synchronized: transports delivering
//! callbacks from another task must serialize them onto the polling context,
//! e.g. through an [`InboundQueue`](client::InboundQueue).
//!
//! ## Optional features
//!
//! - `alloc` (default): `DynamicSequence` and the `serde_json::Value` JSON
//!   implementation.
//! - `std`: hosted builds, implies `alloc`.
//! - `log`: diagnostics through the `log` facade.
//! - `defmt`: diagnostics through `defmt`, plus `defmt::Format` on public
//!   enums.

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

#[cfg(feature = "alloc")]
extern crate alloc;

// Must come first so the logging macros are visible in every module.
#[macro_use]
mod fmt;

pub mod api;
pub mod callback;
pub mod client;
pub mod config;
pub mod container;
pub mod error;
pub mod json;
pub mod network;

pub use callback::Callback;
pub use error::Error;
