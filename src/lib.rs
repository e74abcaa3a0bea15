//! A client-side MQTT protocol engine driven by an external readiness loop.
//!
//! The crate owns protocol state, not sockets. Connection establishment
//! (TCP, optional TLS, then the MQTT CONNECT handshake) runs as a staged,
//! non-blocking process over a [`transport::Transport`] the embedder
//! implements; inbound CONNACK/SUBACK/UNSUBACK/PINGRESP packets are
//! dispatched against a socket-keyed client registry. Packet bytes are the
//! business of [`mqttbytes`], and the readiness loop itself is the
//! embedder's.
//!
//! A full walkthrough against an in-memory transport lives in
//! `demos/hello_world.rs`.
pub mod client;
pub mod codec;
pub mod endpoint;
pub mod engine;
pub mod registry;
pub mod transport;
