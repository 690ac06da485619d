// ── Callback slots ──
//
// Each event class has exactly one subscriber slot. Three of them
// (device state, scan, connection state) are plain in-process
// indirections the client fully owns, so re-registering silently
// replaces the previous callback. The RSSI slot is different: it is
// backed by the single external property watch, which cannot be
// silently rebound -- a second registration without an intervening
// unset is an error.
//
// Dispatch never holds the slot table lock across a callback: the
// callback is cloned out (it lives in its own Arc<Mutex>) and invoked
// after the table lock is released, so a callback is free to call back
// into the client.

use std::sync::{Arc, Mutex};

use tracing::trace;

use crate::error::WifiError;
use crate::events::{ConnectionEvent, DeviceStateEvent, ScanEvent};
use crate::model::RssiLevel;

type Callback<E> = Arc<Mutex<dyn FnMut(E) + Send>>;

fn wrap<E, F>(callback: F) -> Callback<E>
where
    F: FnMut(E) + Send + 'static,
{
    Arc::new(Mutex::new(callback))
}

/// Poison-tolerant lock: a panic inside a user callback must not wedge
/// the whole client.
pub(crate) fn lock<T: ?Sized>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// A single-subscriber slot for one event class.
pub(crate) struct CallbackCell<E> {
    slot: Mutex<Option<Callback<E>>>,
    /// What the logs call this slot.
    name: &'static str,
}

impl<E> CallbackCell<E> {
    pub(crate) fn new(name: &'static str) -> Self {
        Self {
            slot: Mutex::new(None),
            name,
        }
    }

    /// Last-writer-wins registration.
    pub(crate) fn set_overwrite<F>(&self, callback: F)
    where
        F: FnMut(E) + Send + 'static,
    {
        *lock(&self.slot) = Some(wrap(callback));
    }

    /// Exclusive registration: occupied slot is an error.
    pub(crate) fn set_exclusive<F>(&self, callback: F) -> Result<(), WifiError>
    where
        F: FnMut(E) + Send + 'static,
    {
        let mut slot = lock(&self.slot);
        if slot.is_some() {
            return Err(WifiError::invalid_operation(format!(
                "{} callback already registered",
                self.name
            )));
        }
        *slot = Some(wrap(callback));
        Ok(())
    }

    /// Remove the registration; an empty slot is an error.
    pub(crate) fn unset(&self) -> Result<(), WifiError> {
        lock(&self.slot)
            .take()
            .map(|_| ())
            .ok_or_else(|| {
                WifiError::invalid_operation(format!("no {} callback registered", self.name))
            })
    }

    /// Unconditional clear (deinitialization). Returns whether a
    /// registration was present.
    pub(crate) fn force_clear(&self) -> bool {
        lock(&self.slot).take().is_some()
    }

    pub(crate) fn is_registered(&self) -> bool {
        lock(&self.slot).is_some()
    }

    /// Invoke the registered callback, if any. No registration means
    /// the event is dropped silently -- never an error.
    pub(crate) fn dispatch(&self, event: E) {
        let callback = lock(&self.slot).clone();
        if let Some(callback) = callback {
            let mut callback = lock(&callback);
            (*callback)(event);
        } else {
            trace!(slot = self.name, "no subscriber, event dropped");
        }
    }
}

/// The three daemon-event slots owned by a session. (The RSSI slot
/// lives on the client, next to the property watch it is bound to.)
pub(crate) struct CallbackSlots {
    pub(crate) device_state: CallbackCell<DeviceStateEvent>,
    pub(crate) scan: CallbackCell<ScanEvent>,
    pub(crate) connection: CallbackCell<ConnectionEvent>,
}

impl CallbackSlots {
    pub(crate) fn new() -> Self {
        Self {
            device_state: CallbackCell::new("device state"),
            scan: CallbackCell::new("scan"),
            connection: CallbackCell::new("connection state"),
        }
    }

    /// Deinitialization sweep.
    pub(crate) fn clear_all(&self) {
        self.device_state.force_clear();
        self.scan.force_clear();
        self.connection.force_clear();
    }
}

/// The RSSI slot type, kept separate from the session slots.
pub(crate) type RssiCell = CallbackCell<RssiLevel>;

pub(crate) fn rssi_cell() -> RssiCell {
    CallbackCell::new("RSSI level")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn overwrite_slot_replaces_silently() {
        let cell: CallbackCell<u32> = CallbackCell::new("test");
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        let hits = Arc::clone(&first);
        cell.set_overwrite(move |_| {
            hits.fetch_add(1, Ordering::SeqCst);
        });
        let hits = Arc::clone(&second);
        cell.set_overwrite(move |_| {
            hits.fetch_add(1, Ordering::SeqCst);
        });

        cell.dispatch(7);
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn exclusive_slot_rejects_second_registration() {
        let cell: CallbackCell<u32> = CallbackCell::new("test");
        cell.set_exclusive(|_| {}).expect("first registration");

        let err = cell.set_exclusive(|_| {}).expect_err("must reject");
        assert!(matches!(err, WifiError::InvalidOperation { .. }));

        // After an unset the slot is free again.
        cell.unset().expect("unset");
        cell.set_exclusive(|_| {}).expect("re-registration");
    }

    #[test]
    fn unset_empty_slot_is_an_error() {
        let cell: CallbackCell<u32> = CallbackCell::new("test");
        assert!(matches!(
            cell.unset(),
            Err(WifiError::InvalidOperation { .. })
        ));
    }

    #[test]
    fn dispatch_without_subscriber_is_silent() {
        let cell: CallbackCell<u32> = CallbackCell::new("test");
        cell.dispatch(7); // must not panic or error
    }

    #[test]
    fn callback_sees_every_dispatch() {
        let cell: CallbackCell<u32> = CallbackCell::new("test");
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&seen);
        cell.set_overwrite(move |v| lock(&sink).push(v));

        cell.dispatch(1);
        cell.dispatch(2);
        cell.dispatch(3);
        assert_eq!(*lock(&seen), vec![1, 2, 3]);
    }

    #[test]
    fn force_clear_reports_presence() {
        let cell: CallbackCell<u32> = CallbackCell::new("test");
        assert!(!cell.force_clear());

        cell.set_overwrite(|_| {});
        assert!(cell.is_registered());
        assert!(cell.force_clear());
        assert!(!cell.is_registered());
    }
}
