//! Database event pub/sub (spec.md §4.1's `event_listen`/`event_notify`).
//!
//! `sled` has no native notification mechanism, so this is an in-memory
//! registry of channels: callers get a handle back from
//! `listen` and a receiver they `await` on; `notify` fans a payload out
//! to every subscriber whose spec matches at that instant. Nothing here
//! is persisted — per spec.md §4.1, "no persistence; a listener may
//! additionally poll its predicate because events may be lost on
//! disconnect."

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use tokio::sync::mpsc;

/// A typed event header: `{ type, key }`. For IBAN transfer events, `key`
/// is `code.to_be_bytes() || debit_iban_hash` (spec.md §6's wire format,
/// minus the `size`/`reserved` fields which only matter for an actual
/// wire encoding outside this crate's scope).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EventSpec {
    pub event_type: u16,
    pub key: Vec<u8>,
}

impl EventSpec {
    pub fn iban_transfer(code: u64, debit_iban_hash: [u8; 32]) -> Self {
        let mut key = Vec::with_capacity(8 + 32);
        key.extend_from_slice(&code.to_be_bytes());
        key.extend_from_slice(&debit_iban_hash);
        EventSpec { event_type: EVENT_TYPE_IBAN_TRANSFER, key }
    }
}

/// `ANASTASIS_AUTH_IBAN_TRANSFER` in spec.md §4.3.
pub const EVENT_TYPE_IBAN_TRANSFER: u16 = 1;

pub type ListenHandle = u64;

struct Subscriber {
    spec: EventSpec,
    sender: mpsc::Sender<Vec<u8>>,
}

#[derive(Default)]
pub struct EventBus {
    subscribers: Mutex<HashMap<ListenHandle, Subscriber>>,
    next_handle: AtomicU64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register interest in `spec`; returns a handle (for
    /// `event_listen_cancel`) and a receiver that yields the `extra`
    /// payload of each matching `event_notify` call.
    pub fn listen(&self, spec: EventSpec) -> (ListenHandle, mpsc::Receiver<Vec<u8>>) {
        let (tx, rx) = mpsc::channel(8);
        let handle = self.next_handle.fetch_add(1, Ordering::Relaxed);
        self.subscribers
            .lock()
            .expect("event bus lock poisoned")
            .insert(handle, Subscriber { spec, sender: tx });
        (handle, rx)
    }

    pub fn cancel(&self, handle: ListenHandle) {
        self.subscribers
            .lock()
            .expect("event bus lock poisoned")
            .remove(&handle);
    }

    /// Deliver `extra` to every subscriber currently registered for
    /// `spec`. Best-effort: a subscriber whose receiver was dropped (or
    /// whose bounded channel is full) simply misses the notification,
    /// per spec.md §5 ("listeners must also poll the persistent state on
    /// startup to close the race window").
    pub fn notify(&self, spec: &EventSpec, extra: &[u8]) {
        let subs = self.subscribers.lock().expect("event bus lock poisoned");
        for sub in subs.values() {
            if &sub.spec == spec {
                let _ = sub.sender.try_send(extra.to_vec());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn delivers_to_a_matching_subscriber_only() {
        let bus = EventBus::new();
        let spec_a = EventSpec::iban_transfer(1234, [1u8; 32]);
        let spec_b = EventSpec::iban_transfer(5678, [1u8; 32]);
        let (_h, mut rx_a) = bus.listen(spec_a.clone());
        let (_h2, mut rx_b) = bus.listen(spec_b);

        bus.notify(&spec_a, b"EUR:10");

        assert_eq!(rx_a.recv().await, Some(b"EUR:10".to_vec()));
        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn cancelled_handle_receives_nothing() {
        let bus = EventBus::new();
        let spec = EventSpec::iban_transfer(1, [0u8; 32]);
        let (handle, mut rx) = bus.listen(spec.clone());
        bus.cancel(handle);
        bus.notify(&spec, b"x");
        assert!(rx.try_recv().is_err());
    }
}
