//! In-memory store backend for Stratum.
//!
//! Implements the `stratum-client` boundary against a shared in-process
//! map. Every client connected through the same [`MemoryStore`] sees
//! the same data, so a value written over one transient connection is
//! visible to the next - the same observable behavior as a store
//! daemon reached over a socket.
//!
//! Change notifications are real: a mutation that touches a watched key
//! queues an event on each watching connection and pokes that
//! connection's wake descriptor, so an external event loop polling
//! [`readiness_fd`](stratum_client::StoreClient::readiness_fd) wakes up
//! and can call `process_updates`.
//!
//! # Example
//!
//! ```rust
//! use stratum_client::{GroupIdentifier, KeyIdentifier, StoreClient, StoreTransport, Value, ValueKind};
//! use stratum_memory::MemoryStore;
//!
//! let store = MemoryStore::new();
//! let mut client = store.connect().unwrap();
//!
//! client.create_group(&GroupIdentifier::new("settings", "user")).unwrap();
//!
//! let key = KeyIdentifier::typed("settings", "brightness", "user", ValueKind::Int32);
//! client.set_value(&key, Value::from(70i32)).unwrap();
//! assert_eq!(client.get_value(&key).unwrap(), Value::Int32(70));
//! ```

mod client;
mod store;

pub use client::MemoryClient;
pub use store::MemoryStore;
