//! Shared state behind every connected memory client.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::io::Write;
use std::os::unix::net::UnixStream;
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};

use stratum_client::{StoreError, StoreTransport, Value};

use crate::client::MemoryClient;

/// (group, layer, key name) - the full address of one entry.
pub(crate) type EntryKey = (String, String, String);

pub(crate) type ClientId = u64;

/// A pending change event, queued per watching connection.
#[derive(Clone, Debug)]
pub(crate) struct Event {
    pub(crate) entry: EntryKey,
    /// `None` for a removal.
    pub(crate) value: Option<Value>,
}

/// Per-connection delivery channel: the event queue plus the write end
/// of the wake descriptor pair.
pub(crate) struct Mailbox {
    pub(crate) events: Sender<Event>,
    pub(crate) wake: UnixStream,
}

#[derive(Default)]
pub(crate) struct SharedState {
    pub(crate) groups: HashSet<(String, String)>,
    pub(crate) entries: BTreeMap<EntryKey, Value>,
    pub(crate) watchers: HashMap<EntryKey, HashSet<ClientId>>,
    pub(crate) mailboxes: HashMap<ClientId, Mailbox>,
    pub(crate) next_client_id: ClientId,
}

impl SharedState {
    /// Queue an event on every connection watching `entry` and poke
    /// each one's wake descriptor.
    pub(crate) fn notify_watchers(&mut self, entry: &EntryKey, value: Option<Value>) {
        let Some(ids) = self.watchers.get(entry) else {
            return;
        };
        for id in ids {
            let Some(mailbox) = self.mailboxes.get_mut(id) else {
                continue;
            };
            let event = Event {
                entry: entry.clone(),
                value: value.clone(),
            };
            if mailbox.events.send(event).is_err() {
                continue;
            }
            // A full wake buffer just means readiness is already
            // pending; losing the byte is harmless.
            let _ = mailbox.wake.write(&[1]);
        }
    }

    pub(crate) fn drop_client(&mut self, id: ClientId) {
        self.mailboxes.remove(&id);
        for ids in self.watchers.values_mut() {
            ids.remove(&id);
        }
        self.watchers.retain(|_, ids| !ids.is_empty());
    }
}

/// An in-memory store shared by every client connected through it.
///
/// Cloning is cheap and yields a handle to the same store.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<SharedState>>,
}

impl MemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn state(&self) -> &Arc<Mutex<SharedState>> {
        &self.state
    }
}

impl StoreTransport for MemoryStore {
    type Client = MemoryClient;

    fn connect(&self) -> Result<MemoryClient, StoreError> {
        MemoryClient::connect(self)
    }
}
