//! # stratum-simple
//!
//! A simplified client façade over a layered Stratum store.
//!
//! The façade remembers a (group, layer) pair once and lets callers
//! address keys by short name after that, with one typed set and get
//! per supported scalar kind. Failures are reported through a
//! last-error cell on the client, errno-style: setters return nothing,
//! getters return the kind's zero value, and `last_error()` says what
//! actually happened.
//!
//! ## Connection modes
//!
//! A client starts in *transient* mode: every request opens its own
//! store connection and closes it before returning. Calling
//! [`SimpleClient::open`] switches to *persistent* mode, holding one
//! connection until [`SimpleClient::close`]. Persistent mode is
//! required for change notifications - a per-request connection would
//! be gone before any event could arrive.
//!
//! ## Example
//!
//! ```rust
//! use stratum_memory::MemoryStore;
//! use stratum_simple::SimpleClient;
//!
//! let mut client = SimpleClient::new(MemoryStore::new());
//!
//! client.set_group("settings", "user");
//! client.set_i32("brightness", 70);
//! assert_eq!(client.get_i32("brightness"), 70);
//! assert_eq!(client.last_error(), None);
//! ```
//!
//! ## Notifications
//!
//! ```rust
//! use stratum_memory::MemoryStore;
//! use stratum_simple::SimpleClient;
//!
//! let store = MemoryStore::new();
//! let mut watcher = SimpleClient::new(store.clone());
//! watcher.set_group("settings", "user");
//! watcher.open();
//! watcher.register_notify("brightness", |value, name| {
//!     println!("{} changed to {:?}", name, value);
//! });
//!
//! // ... hand watcher.reactor_fd() to an event loop, and call
//! // watcher.process_updates() whenever it signals readiness.
//! ```

mod address;
mod client;
mod error;
mod notify;

pub use address::{AmbientAddress, MAX_NAME_LEN};
pub use client::SimpleClient;
pub use error::ErrorKind;
pub use notify::{Interest, Reactor};

// Re-export the boundary types callers see in signatures.
pub use stratum_client::{StoreClient, StoreTransport, Value, ValueKind};
