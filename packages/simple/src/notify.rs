//! Notification bridge: per-key subscriptions and reactor wiring.
//!
//! Subscriptions need the persistent connection - register after
//! [`SimpleClient::open`](crate::SimpleClient::open). Delivery is
//! pull-based: an external event loop watches the client's readiness
//! descriptor and calls [`process_updates`](crate::SimpleClient::process_updates)
//! when it signals, which runs the registered callbacks on the calling
//! thread.

use std::os::fd::RawFd;

use tracing::debug;

use stratum_client::{StoreClient, StoreTransport, Value};

use crate::client::SimpleClient;
use crate::error::ErrorKind;

/// Readiness conditions to watch a descriptor for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Interest {
    pub read: bool,
    pub error: bool,
}

impl Interest {
    pub const READ: Interest = Interest {
        read: true,
        error: false,
    };

    /// Read plus error interest - what the notification bridge
    /// registers with.
    pub const READ_ERROR: Interest = Interest {
        read: true,
        error: true,
    };
}

/// The external event loop boundary.
///
/// The bridge only adds descriptors. It never removes them; a
/// registration lives until the reactor itself is torn down, a
/// limitation carried over from the original design.
pub trait Reactor {
    type Handle;

    /// Watch a descriptor. Returns `None` if the reactor refuses the
    /// registration.
    fn add_descriptor(&mut self, fd: RawFd, interest: Interest) -> Option<Self::Handle>;
}

impl<T: StoreTransport> SimpleClient<T> {
    /// Subscribe to changes of a key under the current ambient
    /// address.
    ///
    /// Requires the client to be locked open; records
    /// [`ErrorKind::NotConnected`] otherwise. The callback receives
    /// `None` when the key is removed and the new value otherwise,
    /// always with the key name. Registering the same key again
    /// replaces the callback - the façade does not deduplicate.
    pub fn register_notify(
        &mut self,
        key: &str,
        callback: impl FnMut(Option<Value>, &str) + Send + 'static,
    ) {
        if !self.locked {
            debug!("connection must first be locked open before registering");
            self.last_error = Some(ErrorKind::NotConnected);
            return;
        }
        let key_id = self.address.watch_key(key);
        let Some(connection) = self.connection.as_mut() else {
            self.last_error = Some(ErrorKind::NotConnected);
            return;
        };

        let result = connection.register_notification(&key_id, Box::new(callback));
        match result {
            Ok(()) => {
                debug!(key = %key_id, "registration successful");
                self.last_error = None;
            }
            Err(e) => {
                debug!(key = %key_id, error = %e, "register notification call failed");
                self.last_error = Some(ErrorKind::RegistrationFailed);
            }
        }
    }

    /// Drop the subscription for a key under the current ambient
    /// address. Unsubscribing a key that was never registered is a
    /// no-op.
    pub fn unregister_notify(&mut self, key: &str) {
        if !self.locked {
            self.last_error = Some(ErrorKind::NotConnected);
            return;
        }
        let key_id = self.address.watch_key(key);
        let Some(connection) = self.connection.as_mut() else {
            self.last_error = Some(ErrorKind::NotConnected);
            return;
        };

        let result = connection.unregister_notification(&key_id);
        match result {
            Ok(()) => self.last_error = None,
            Err(e) => {
                debug!(key = %key_id, error = %e, "unregister notification call failed");
                self.last_error = Some(ErrorKind::RegistrationFailed);
            }
        }
    }

    /// The persistent connection's readiness descriptor, for an
    /// external event loop. `None` in transient mode.
    pub fn reactor_fd(&self) -> Option<RawFd> {
        self.connection.as_ref().and_then(|c| c.readiness_fd())
    }

    /// Register the readiness descriptor with a reactor under
    /// read+error interest.
    ///
    /// On readiness the reactor's dispatch must call
    /// [`process_updates`](Self::process_updates). Records
    /// [`ErrorKind::NotConnected`] without a persistent connection and
    /// [`ErrorKind::RegistrationFailed`] if the reactor declines.
    pub fn register_reactor<R: Reactor>(&mut self, reactor: &mut R) -> Option<R::Handle> {
        let Some(fd) = self.reactor_fd() else {
            debug!("no readiness descriptor; lock the client open first");
            self.last_error = Some(ErrorKind::NotConnected);
            return None;
        };
        match reactor.add_descriptor(fd, Interest::READ_ERROR) {
            Some(handle) => {
                self.last_error = None;
                Some(handle)
            }
            None => {
                debug!("reactor refused the descriptor registration");
                self.last_error = Some(ErrorKind::RegistrationFailed);
                None
            }
        }
    }

    /// Deliver pending change notifications to their callbacks,
    /// returning how many were delivered.
    ///
    /// Call this from the reactor's dispatch whenever the readiness
    /// descriptor signals. Returns 0 and records an error without a
    /// persistent connection.
    pub fn process_updates(&mut self) -> usize {
        let Some(connection) = self.connection.as_mut() else {
            self.last_error = Some(ErrorKind::NotConnected);
            return 0;
        };

        let result = connection.process_updates();
        match result {
            Ok(delivered) => {
                self.last_error = None;
                delivered
            }
            Err(e) => {
                debug!(error = %e, "update dispatch failed");
                self.last_error = Some(ErrorKind::AccessDenied);
                0
            }
        }
    }
}
