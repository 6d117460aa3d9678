//! The simplified client: connection manager plus request façade.

use tracing::debug;

use stratum_client::{StoreClient, StoreTransport, Value, ValueKind};

use crate::address::AmbientAddress;
use crate::error::ErrorKind;

/// A simplified client over a layered store.
///
/// Owns the connection policy (transient per-request connections, or
/// one persistent locked connection), the ambient (group, layer)
/// address, and the last-error cell. All store access goes through the
/// transport given at construction.
///
/// Every operation updates the last-error cell: `None` after success,
/// the failure kind otherwise. Getters additionally return the
/// requested kind's zero value on failure, which is indistinguishable
/// from a stored zero - check [`last_error`](Self::last_error) to tell
/// them apart.
pub struct SimpleClient<T: StoreTransport> {
    pub(crate) transport: T,
    pub(crate) connection: Option<T::Client>,
    pub(crate) locked: bool,
    pub(crate) address: AmbientAddress,
    pub(crate) last_error: Option<ErrorKind>,
}

impl<T: StoreTransport> SimpleClient<T> {
    /// Create a client in transient mode with an empty ambient
    /// address.
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            connection: None,
            locked: false,
            address: AmbientAddress::default(),
            last_error: None,
        }
    }

    /// The outcome of the most recent operation: `None` for success.
    pub fn last_error(&self) -> Option<ErrorKind> {
        self.last_error
    }

    /// The current ambient (group, layer) address.
    pub fn address(&self) -> &AmbientAddress {
        &self.address
    }

    /// Whether the client is locked open (persistent mode).
    pub fn is_open(&self) -> bool {
        self.locked
    }

    /// Lock the client open with a persistent connection.
    ///
    /// Fails with [`ErrorKind::AlreadyLocked`] if already open - the
    /// existing lock stays valid - and [`ErrorKind::NotConnected`] if
    /// the store cannot be reached.
    pub fn open(&mut self) {
        if self.locked {
            self.last_error = Some(ErrorKind::AlreadyLocked);
            return;
        }
        match self.transport.connect() {
            Ok(connection) => {
                self.connection = Some(connection);
                self.locked = true;
                self.last_error = None;
            }
            Err(e) => {
                debug!(error = %e, "store connection failed");
                self.last_error = Some(ErrorKind::NotConnected);
            }
        }
    }

    /// Unlock the client and drop any held connection.
    ///
    /// Safe without a prior [`open`](Self::open).
    pub fn close(&mut self) {
        self.locked = false;
        self.connection = None;
        self.last_error = None;
    }

    /// Run one request against a connection: the held one when locked,
    /// a fresh transient one otherwise. A transient connection is
    /// dropped before this returns.
    pub(crate) fn with_connection<R>(
        &mut self,
        f: impl FnOnce(&mut T::Client) -> R,
    ) -> Result<R, ErrorKind> {
        if self.locked {
            match self.connection.as_mut() {
                Some(connection) => Ok(f(connection)),
                None => Err(ErrorKind::NotConnected),
            }
        } else {
            match self.transport.connect() {
                Ok(mut connection) => Ok(f(&mut connection)),
                Err(e) => {
                    debug!(error = %e, "implicit store connection failed");
                    Err(ErrorKind::NotConnected)
                }
            }
        }
    }

    /// Switch the ambient address and create-or-switch the group in
    /// the store.
    ///
    /// Both names are truncated to the stored bound first. The ambient
    /// address keeps the new values even if the store request fails or
    /// the transient connection closes; only the group-switch outcome
    /// is reported through the error cell.
    pub fn set_group(&mut self, group: &str, layer: &str) {
        self.address.set(group, layer);
        let group_id = self.address.group_id();
        match self.with_connection(|connection| connection.create_group(&group_id)) {
            Ok(Ok(())) => {
                debug!(group = self.address.group(), layer = self.address.layer(), "switched group");
                self.last_error = None;
            }
            Ok(Err(e)) => {
                debug!(error = %e, "create group call failed");
                self.last_error = Some(ErrorKind::GroupSwitchFailed);
            }
            Err(kind) => self.last_error = Some(kind),
        }
    }

    /// Remove a group and every key in it, addressed explicitly -
    /// the ambient address is not consulted and not changed.
    pub fn remove_group(&mut self, group: &str, layer: &str) {
        let group_id = stratum_client::GroupIdentifier::new(group, layer);
        match self.with_connection(|connection| connection.remove_group(&group_id)) {
            Ok(Ok(())) => self.last_error = None,
            Ok(Err(e)) => {
                debug!(error = %e, "remove group call failed");
                self.last_error = Some(ErrorKind::RemoveFailed);
            }
            Err(kind) => self.last_error = Some(kind),
        }
    }

    /// Generic set: every typed setter funnels through here.
    fn request_set(&mut self, key: &str, value: Value) {
        let key_id = self.address.key(key, value.kind());
        match self.with_connection(|connection| connection.set_value(&key_id, value)) {
            Ok(Ok(())) => self.last_error = None,
            Ok(Err(e)) => {
                debug!(key = %key_id, error = %e, "set call failed");
                self.last_error = Some(ErrorKind::AccessDenied);
            }
            Err(kind) => self.last_error = Some(kind),
        }
    }

    /// Generic get: every typed getter funnels through here. Returns
    /// the kind's zero value on any failure path.
    fn request_get(&mut self, key: &str, kind: ValueKind) -> Value {
        let key_id = self.address.key(key, kind);
        match self.with_connection(|connection| connection.get_value(&key_id)) {
            Ok(Ok(value)) => {
                self.last_error = None;
                value
            }
            Ok(Err(e)) => {
                debug!(key = %key_id, error = %e, "get call failed");
                self.last_error = Some(ErrorKind::AccessDenied);
                kind.zero_value()
            }
            Err(error_kind) => {
                self.last_error = Some(error_kind);
                kind.zero_value()
            }
        }
    }

    pub fn set_i32(&mut self, key: &str, value: i32) {
        self.request_set(key, Value::from(value));
    }

    pub fn get_i32(&mut self, key: &str) -> i32 {
        self.request_get(key, ValueKind::Int32)
            .as_i32()
            .unwrap_or_default()
    }

    pub fn set_u32(&mut self, key: &str, value: u32) {
        self.request_set(key, Value::from(value));
    }

    pub fn get_u32(&mut self, key: &str) -> u32 {
        self.request_get(key, ValueKind::UInt32)
            .as_u32()
            .unwrap_or_default()
    }

    pub fn set_i64(&mut self, key: &str, value: i64) {
        self.request_set(key, Value::from(value));
    }

    pub fn get_i64(&mut self, key: &str) -> i64 {
        self.request_get(key, ValueKind::Int64)
            .as_i64()
            .unwrap_or_default()
    }

    pub fn set_u64(&mut self, key: &str, value: u64) {
        self.request_set(key, Value::from(value));
    }

    pub fn get_u64(&mut self, key: &str) -> u64 {
        self.request_get(key, ValueKind::UInt64)
            .as_u64()
            .unwrap_or_default()
    }

    pub fn set_f32(&mut self, key: &str, value: f32) {
        self.request_set(key, Value::from(value));
    }

    pub fn get_f32(&mut self, key: &str) -> f32 {
        self.request_get(key, ValueKind::Float)
            .as_f32()
            .unwrap_or_default()
    }

    pub fn set_f64(&mut self, key: &str, value: f64) {
        self.request_set(key, Value::from(value));
    }

    pub fn get_f64(&mut self, key: &str) -> f64 {
        self.request_get(key, ValueKind::Double)
            .as_f64()
            .unwrap_or_default()
    }

    pub fn set_bool(&mut self, key: &str, value: bool) {
        self.request_set(key, Value::from(value));
    }

    pub fn get_bool(&mut self, key: &str) -> bool {
        self.request_get(key, ValueKind::Boolean)
            .as_bool()
            .unwrap_or_default()
    }

    pub fn set_string(&mut self, key: &str, value: &str) {
        self.request_set(key, Value::from(value));
    }

    pub fn get_string(&mut self, key: &str) -> String {
        self.request_get(key, ValueKind::String)
            .into_string()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stratum_client::StoreError;
    use stratum_memory::MemoryStore;

    /// Transport whose connections always fail to establish.
    struct DownTransport;

    impl StoreTransport for DownTransport {
        type Client = stratum_memory::MemoryClient;

        fn connect(&self) -> Result<Self::Client, StoreError> {
            Err(StoreError::Connection {
                message: "store unreachable".to_string(),
            })
        }
    }

    fn client_with_group() -> SimpleClient<MemoryStore> {
        let mut client = SimpleClient::new(MemoryStore::new());
        client.set_group("g1", "user");
        assert_eq!(client.last_error(), None);
        client
    }

    #[test]
    fn open_twice_reports_already_locked() {
        let mut client = client_with_group();
        client.open();
        assert_eq!(client.last_error(), None);
        assert!(client.is_open());

        client.open();
        assert_eq!(client.last_error(), Some(ErrorKind::AlreadyLocked));
        // The first lock is still usable.
        assert!(client.is_open());
        client.set_i32("k", 1);
        assert_eq!(client.last_error(), None);
    }

    #[test]
    fn close_without_open_is_safe() {
        let mut client = client_with_group();
        client.close();
        assert_eq!(client.last_error(), None);
        assert!(!client.is_open());
        assert!(client.connection.is_none());
    }

    #[test]
    fn open_against_down_store_reports_not_connected() {
        let mut client = SimpleClient::new(DownTransport);
        client.open();
        assert_eq!(client.last_error(), Some(ErrorKind::NotConnected));
        assert!(!client.is_open());
    }

    #[test]
    fn transient_request_against_down_store_reports_not_connected() {
        let mut client = SimpleClient::new(DownTransport);
        client.set_i32("k", 1);
        assert_eq!(client.last_error(), Some(ErrorKind::NotConnected));
        assert_eq!(client.get_i32("k"), 0);
        assert_eq!(client.last_error(), Some(ErrorKind::NotConnected));
    }

    #[test]
    fn set_group_updates_address_even_on_failure() {
        let mut client = SimpleClient::new(DownTransport);
        client.set_group("g2", "system");
        assert_eq!(client.last_error(), Some(ErrorKind::NotConnected));
        assert_eq!(client.address().group(), "g2");
        assert_eq!(client.address().layer(), "system");
    }

    #[test]
    fn set_group_truncates_long_names() {
        let mut client = SimpleClient::new(MemoryStore::new());
        let long = "g".repeat(crate::MAX_NAME_LEN * 2);
        client.set_group(&long, "user");
        assert_eq!(client.address().group().len(), crate::MAX_NAME_LEN - 1);
        assert_eq!(client.address().layer(), "user");
    }

    #[test]
    fn round_trips_for_every_kind() {
        let mut client = client_with_group();

        client.set_i32("i32", -42);
        assert_eq!(client.last_error(), None);
        assert_eq!(client.get_i32("i32"), -42);
        assert_eq!(client.last_error(), None);

        client.set_u32("u32", 42);
        assert_eq!(client.get_u32("u32"), 42);

        client.set_i64("i64", -1 << 40);
        assert_eq!(client.get_i64("i64"), -1 << 40);

        client.set_u64("u64", 1 << 40);
        assert_eq!(client.get_u64("u64"), 1 << 40);

        client.set_f32("f32", 1.5);
        assert_eq!(client.get_f32("f32"), 1.5);

        client.set_f64("f64", -2.25);
        assert_eq!(client.get_f64("f64"), -2.25);

        client.set_bool("bool", true);
        assert!(client.get_bool("bool"));

        client.set_string("string", "hello");
        assert_eq!(client.get_string("string"), "hello");
        assert_eq!(client.last_error(), None);
    }

    #[test]
    fn get_of_missing_key_is_zero_and_flagged() {
        let mut client = client_with_group();
        assert_eq!(client.get_i32("never_set"), 0);
        assert_eq!(client.last_error(), Some(ErrorKind::AccessDenied));

        assert_eq!(client.get_string("never_set"), "");
        assert_eq!(client.last_error(), Some(ErrorKind::AccessDenied));
    }

    #[test]
    fn get_under_wrong_kind_is_zero_and_flagged() {
        let mut client = client_with_group();
        client.set_i32("k", 7);
        assert_eq!(client.get_string("k"), "");
        assert_eq!(client.last_error(), Some(ErrorKind::AccessDenied));
    }

    #[test]
    fn success_clears_previous_error() {
        let mut client = client_with_group();
        assert_eq!(client.get_i32("missing"), 0);
        assert_eq!(client.last_error(), Some(ErrorKind::AccessDenied));

        client.set_i32("k", 3);
        assert_eq!(client.last_error(), None);
    }

    #[test]
    fn remove_group_reports_store_rejection() {
        let mut client = client_with_group();
        client.remove_group("no_such_group", "user");
        assert_eq!(client.last_error(), Some(ErrorKind::RemoveFailed));

        client.remove_group("g1", "user");
        assert_eq!(client.last_error(), None);
    }

    #[test]
    fn remove_group_leaves_ambient_address_alone() {
        let mut client = client_with_group();
        client.remove_group("g1", "user");
        assert_eq!(client.address().group(), "g1");
        assert_eq!(client.address().layer(), "user");
    }

    #[test]
    fn locked_connection_serves_many_requests() {
        let mut client = client_with_group();
        client.open();
        client.set_i32("a", 1);
        client.set_i32("b", 2);
        assert_eq!(client.get_i32("a"), 1);
        assert_eq!(client.get_i32("b"), 2);
        client.close();

        // Data persists in the store after the lock is released.
        assert_eq!(client.get_i32("a"), 1);
    }
}
