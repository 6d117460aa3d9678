//! Store client traits: StoreTransport, StoreClient.

use std::os::fd::RawFd;

use crate::error::StoreError;
use crate::key::{GroupIdentifier, KeyIdentifier};
use crate::value::Value;

/// Callback invoked when a watched key changes or is removed.
///
/// `None` means the key was removed; `Some(value)` is the new value.
/// The key name is passed alongside so one callback can serve several
/// registrations.
pub type NotifyCallback = Box<dyn FnMut(Option<Value>, &str) + Send>;

/// Opens connections to a store.
///
/// Disconnecting is dropping the client. Transports are cheap to keep
/// around; the façade holds one for the life of its context and
/// connects through it either once (persistent mode) or per request
/// (transient mode).
pub trait StoreTransport {
    type Client: StoreClient;

    /// Establish a new connection.
    fn connect(&self) -> Result<Self::Client, StoreError>;
}

/// One live connection to a store.
///
/// All requests are blocking: the round trip completes before the
/// method returns. Change notifications are the exception - they are
/// queued on the connection and only delivered when the owner calls
/// [`process_updates`](StoreClient::process_updates), typically from an
/// event loop watching [`readiness_fd`](StoreClient::readiness_fd).
///
/// # Object Safety
///
/// This trait is object-safe: you can use `Box<dyn StoreClient>`.
pub trait StoreClient {
    /// Store a value under a key. The identifier's kind, when present,
    /// must match the value's kind.
    fn set_value(&mut self, key: &KeyIdentifier, value: Value) -> Result<(), StoreError>;

    /// Fetch the value under a key.
    ///
    /// # Errors
    ///
    /// * [`StoreError::NotFound`] - no value stored under the key.
    /// * [`StoreError::KindMismatch`] - stored kind differs from the
    ///   identifier's kind.
    fn get_value(&mut self, key: &KeyIdentifier) -> Result<Value, StoreError>;

    /// Create a group, or succeed silently if it already exists.
    fn create_group(&mut self, group: &GroupIdentifier) -> Result<(), StoreError>;

    /// Remove a group and every key in it. Watchers of removed keys
    /// receive a removal notification.
    fn remove_group(&mut self, group: &GroupIdentifier) -> Result<(), StoreError>;

    /// Subscribe to changes of one key. Registering the same key name
    /// again replaces the previous callback; deduplication is the
    /// store's business, not guaranteed here.
    fn register_notification(
        &mut self,
        key: &KeyIdentifier,
        callback: NotifyCallback,
    ) -> Result<(), StoreError>;

    /// Drop the subscription for a key. Unsubscribing a key that was
    /// never registered succeeds.
    fn unregister_notification(&mut self, key: &KeyIdentifier) -> Result<(), StoreError>;

    /// Deliver pending change notifications to their callbacks,
    /// returning how many were delivered. Non-blocking.
    fn process_updates(&mut self) -> Result<usize, StoreError>;

    /// The descriptor that becomes readable when notifications are
    /// pending, for registration with an external event loop. `None`
    /// if this client has no readiness mechanism.
    fn readiness_fd(&self) -> Option<RawFd>;
}

// Blanket implementations for boxes

impl<T: StoreClient + ?Sized> StoreClient for Box<T> {
    fn set_value(&mut self, key: &KeyIdentifier, value: Value) -> Result<(), StoreError> {
        self.as_mut().set_value(key, value)
    }

    fn get_value(&mut self, key: &KeyIdentifier) -> Result<Value, StoreError> {
        self.as_mut().get_value(key)
    }

    fn create_group(&mut self, group: &GroupIdentifier) -> Result<(), StoreError> {
        self.as_mut().create_group(group)
    }

    fn remove_group(&mut self, group: &GroupIdentifier) -> Result<(), StoreError> {
        self.as_mut().remove_group(group)
    }

    fn register_notification(
        &mut self,
        key: &KeyIdentifier,
        callback: NotifyCallback,
    ) -> Result<(), StoreError> {
        self.as_mut().register_notification(key, callback)
    }

    fn unregister_notification(&mut self, key: &KeyIdentifier) -> Result<(), StoreError> {
        self.as_mut().unregister_notification(key)
    }

    fn process_updates(&mut self) -> Result<usize, StoreError> {
        self.as_mut().process_updates()
    }

    fn readiness_fd(&self) -> Option<RawFd> {
        self.as_ref().readiness_fd()
    }
}
