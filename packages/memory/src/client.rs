//! One connection to a [`MemoryStore`].

use std::collections::HashMap;
use std::io::{ErrorKind, Read};
use std::os::fd::{AsRawFd, RawFd};
use std::os::unix::net::UnixStream;
use std::sync::mpsc::{channel, Receiver};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;

use stratum_client::{
    GroupIdentifier, KeyIdentifier, NotifyCallback, StoreClient, StoreError, Value,
};

use crate::store::{ClientId, EntryKey, Event, Mailbox, MemoryStore, SharedState};

fn entry_key(key: &KeyIdentifier) -> EntryKey {
    (key.group.clone(), key.layer.clone(), key.name.clone())
}

/// A live connection to an in-memory store.
///
/// Dropping the client disconnects it: its event queue and watch
/// registrations are removed from the shared store.
pub struct MemoryClient {
    id: ClientId,
    state: Arc<Mutex<SharedState>>,
    events: Receiver<Event>,
    wake_rx: UnixStream,
    callbacks: HashMap<EntryKey, NotifyCallback>,
}

impl MemoryClient {
    pub(crate) fn connect(store: &MemoryStore) -> Result<Self, StoreError> {
        let (wake_rx, wake_tx) = UnixStream::pair()?;
        wake_rx.set_nonblocking(true)?;
        wake_tx.set_nonblocking(true)?;
        let (sender, receiver) = channel();

        let mut state = lock(store.state())?;
        let id = state.next_client_id;
        state.next_client_id += 1;
        state.mailboxes.insert(
            id,
            Mailbox {
                events: sender,
                wake: wake_tx,
            },
        );
        drop(state);

        Ok(Self {
            id,
            state: store.state().clone(),
            events: receiver,
            wake_rx,
            callbacks: HashMap::new(),
        })
    }

    /// Consume any bytes pending on the wake descriptor.
    fn drain_wake(&mut self) -> Result<(), StoreError> {
        let mut buf = [0u8; 64];
        loop {
            match self.wake_rx.read(&mut buf) {
                Ok(0) => return Ok(()),
                Ok(_) => continue,
                Err(e) if e.kind() == ErrorKind::WouldBlock => return Ok(()),
                Err(e) => return Err(StoreError::Io(e)),
            }
        }
    }
}

fn lock(state: &Arc<Mutex<SharedState>>) -> Result<MutexGuard<'_, SharedState>, StoreError> {
    state.lock().map_err(|_| StoreError::Connection {
        message: "store state poisoned".to_string(),
    })
}

impl StoreClient for MemoryClient {
    fn set_value(&mut self, key: &KeyIdentifier, value: Value) -> Result<(), StoreError> {
        if let Some(kind) = key.kind {
            if kind != value.kind() {
                return Err(StoreError::KindMismatch {
                    expected: kind,
                    found: value.kind(),
                });
            }
        }

        let entry = entry_key(key);
        let mut state = lock(&self.state)?;
        if !state
            .groups
            .contains(&(key.group.clone(), key.layer.clone()))
        {
            return Err(StoreError::Rejected {
                message: format!("unknown group {}:{}", key.layer, key.group),
            });
        }
        state.entries.insert(entry.clone(), value.clone());
        state.notify_watchers(&entry, Some(value));
        Ok(())
    }

    fn get_value(&mut self, key: &KeyIdentifier) -> Result<Value, StoreError> {
        let entry = entry_key(key);
        let state = lock(&self.state)?;
        let stored = state.entries.get(&entry).ok_or(StoreError::NotFound)?;
        if let Some(kind) = key.kind {
            if kind != stored.kind() {
                return Err(StoreError::KindMismatch {
                    expected: kind,
                    found: stored.kind(),
                });
            }
        }
        Ok(stored.clone())
    }

    fn create_group(&mut self, group: &GroupIdentifier) -> Result<(), StoreError> {
        let mut state = lock(&self.state)?;
        state
            .groups
            .insert((group.group.clone(), group.layer.clone()));
        Ok(())
    }

    fn remove_group(&mut self, group: &GroupIdentifier) -> Result<(), StoreError> {
        let mut state = lock(&self.state)?;
        if !state
            .groups
            .remove(&(group.group.clone(), group.layer.clone()))
        {
            return Err(StoreError::Rejected {
                message: format!("unknown group {}", group),
            });
        }

        let removed: Vec<EntryKey> = state
            .entries
            .keys()
            .filter(|(g, l, _)| g == &group.group && l == &group.layer)
            .cloned()
            .collect();
        for entry in removed {
            state.entries.remove(&entry);
            state.notify_watchers(&entry, None);
        }
        Ok(())
    }

    fn register_notification(
        &mut self,
        key: &KeyIdentifier,
        callback: NotifyCallback,
    ) -> Result<(), StoreError> {
        let entry = entry_key(key);
        let mut state = lock(&self.state)?;
        state.watchers.entry(entry.clone()).or_default().insert(self.id);
        drop(state);

        // Same-key registration replaces the callback; the watcher set
        // already holds this client.
        self.callbacks.insert(entry, callback);
        debug!(key = %key, "notification registered");
        Ok(())
    }

    fn unregister_notification(&mut self, key: &KeyIdentifier) -> Result<(), StoreError> {
        let entry = entry_key(key);
        let mut state = lock(&self.state)?;
        if let Some(ids) = state.watchers.get_mut(&entry) {
            ids.remove(&self.id);
            if ids.is_empty() {
                state.watchers.remove(&entry);
            }
        }
        drop(state);

        self.callbacks.remove(&entry);
        Ok(())
    }

    fn process_updates(&mut self) -> Result<usize, StoreError> {
        self.drain_wake()?;

        let mut delivered = 0;
        while let Ok(event) = self.events.try_recv() {
            // The registration may have gone away after the event was
            // queued; skip silently in that case.
            if let Some(callback) = self.callbacks.get_mut(&event.entry) {
                let (_, _, name) = &event.entry;
                callback(event.value, name);
                delivered += 1;
            }
        }
        Ok(delivered)
    }

    fn readiness_fd(&self) -> Option<RawFd> {
        Some(self.wake_rx.as_raw_fd())
    }
}

impl Drop for MemoryClient {
    fn drop(&mut self) {
        if let Ok(mut state) = self.state.lock() {
            state.drop_client(self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use stratum_client::{StoreTransport, ValueKind};

    fn connected_store() -> (MemoryStore, MemoryClient) {
        let store = MemoryStore::new();
        let mut client = store.connect().unwrap();
        client
            .create_group(&GroupIdentifier::new("g", "user"))
            .unwrap();
        (store, client)
    }

    #[test]
    fn set_get_round_trip() {
        let (_store, mut client) = connected_store();
        let key = KeyIdentifier::typed("g", "k", "user", ValueKind::Int64);

        client.set_value(&key, Value::from(99i64)).unwrap();
        assert_eq!(client.get_value(&key).unwrap(), Value::Int64(99));
    }

    #[test]
    fn value_visible_across_connections() {
        let (store, mut writer) = connected_store();
        let key = KeyIdentifier::typed("g", "k", "user", ValueKind::String);
        writer.set_value(&key, Value::from("shared")).unwrap();

        let mut reader = store.connect().unwrap();
        assert_eq!(reader.get_value(&key).unwrap(), Value::from("shared"));
    }

    #[test]
    fn set_to_unknown_group_is_rejected() {
        let store = MemoryStore::new();
        let mut client = store.connect().unwrap();
        let key = KeyIdentifier::typed("nope", "k", "user", ValueKind::Int32);

        let err = client.set_value(&key, Value::from(1i32)).unwrap_err();
        assert!(matches!(err, StoreError::Rejected { .. }));
    }

    #[test]
    fn get_checks_kind() {
        let (_store, mut client) = connected_store();
        let key = KeyIdentifier::typed("g", "k", "user", ValueKind::Int32);
        client.set_value(&key, Value::from(1i32)).unwrap();

        let wrong = KeyIdentifier::typed("g", "k", "user", ValueKind::String);
        let err = client.get_value(&wrong).unwrap_err();
        assert!(matches!(
            err,
            StoreError::KindMismatch {
                expected: ValueKind::String,
                found: ValueKind::Int32,
            }
        ));
    }

    #[test]
    fn set_checks_kind_against_identifier() {
        let (_store, mut client) = connected_store();
        let key = KeyIdentifier::typed("g", "k", "user", ValueKind::Boolean);
        let err = client.set_value(&key, Value::from(3i32)).unwrap_err();
        assert!(matches!(err, StoreError::KindMismatch { .. }));
    }

    #[test]
    fn change_notification_is_delivered() {
        let (store, mut watcher) = connected_store();
        let watch = KeyIdentifier::watch("g", "k", "user");

        let (tx, rx) = mpsc::channel();
        watcher
            .register_notification(
                &watch,
                Box::new(move |value, name| {
                    tx.send((value, name.to_string())).unwrap();
                }),
            )
            .unwrap();

        let mut writer = store.connect().unwrap();
        let key = KeyIdentifier::typed("g", "k", "user", ValueKind::Int32);
        writer.set_value(&key, Value::from(5i32)).unwrap();

        assert_eq!(watcher.process_updates().unwrap(), 1);
        let (value, name) = rx.try_recv().unwrap();
        assert_eq!(value, Some(Value::Int32(5)));
        assert_eq!(name, "k");
    }

    #[test]
    fn removal_notification_carries_none() {
        let (store, mut watcher) = connected_store();
        let key = KeyIdentifier::typed("g", "k", "user", ValueKind::Int32);
        watcher.set_value(&key, Value::from(5i32)).unwrap();

        let (tx, rx) = mpsc::channel();
        watcher
            .register_notification(
                &KeyIdentifier::watch("g", "k", "user"),
                Box::new(move |value, name| {
                    tx.send((value, name.to_string())).unwrap();
                }),
            )
            .unwrap();

        let mut other = store.connect().unwrap();
        other
            .remove_group(&GroupIdentifier::new("g", "user"))
            .unwrap();

        assert_eq!(watcher.process_updates().unwrap(), 1);
        let (value, name) = rx.try_recv().unwrap();
        assert_eq!(value, None);
        assert_eq!(name, "k");
    }

    #[test]
    fn wake_descriptor_becomes_readable() {
        let (store, mut watcher) = connected_store();
        watcher
            .register_notification(
                &KeyIdentifier::watch("g", "k", "user"),
                Box::new(|_, _| {}),
            )
            .unwrap();
        let fd = watcher.readiness_fd();
        assert!(fd.is_some());

        let mut writer = store.connect().unwrap();
        let key = KeyIdentifier::typed("g", "k", "user", ValueKind::Boolean);
        writer.set_value(&key, Value::from(true)).unwrap();

        // The wake byte must be consumable without blocking.
        assert_eq!(watcher.process_updates().unwrap(), 1);
        assert_eq!(watcher.process_updates().unwrap(), 0);
    }

    #[test]
    fn unregister_stops_delivery() {
        let (store, mut watcher) = connected_store();
        let watch = KeyIdentifier::watch("g", "k", "user");
        watcher
            .register_notification(&watch, Box::new(|_, _| panic!("should not fire")))
            .unwrap();
        watcher.unregister_notification(&watch).unwrap();

        let mut writer = store.connect().unwrap();
        let key = KeyIdentifier::typed("g", "k", "user", ValueKind::Int32);
        writer.set_value(&key, Value::from(1i32)).unwrap();

        assert_eq!(watcher.process_updates().unwrap(), 0);
    }

    #[test]
    fn unregister_unknown_key_is_noop() {
        let (_store, mut client) = connected_store();
        client
            .unregister_notification(&KeyIdentifier::watch("g", "never", "user"))
            .unwrap();
    }

    #[test]
    fn remove_unknown_group_is_rejected() {
        let store = MemoryStore::new();
        let mut client = store.connect().unwrap();
        let err = client
            .remove_group(&GroupIdentifier::new("nope", "user"))
            .unwrap_err();
        assert!(matches!(err, StoreError::Rejected { .. }));
    }

    #[test]
    fn dropped_client_is_forgotten() {
        let (store, watcher) = connected_store();
        let id = watcher.id;
        drop(watcher);
        assert!(!store
            .state()
            .lock()
            .unwrap()
            .mailboxes
            .contains_key(&id));
    }
}
