//! Multicast signals for Horizon Gadget.
//!
//! A [`Signal`] is a named connection point: any number of
//! [`Callable`]s can be connected, and emitting the signal calls each of
//! them in connection order with the same arguments. Scriptable objects
//! expose signals as properties (`onclick`, `onmousedown`, ...) so script
//! handlers and native handlers share one mechanism.
//!
//! # Key Types
//!
//! - [`Signal`] - The connection point, declared with a signature
//! - [`ConnectionId`] - Returned by [`Signal::connect`], used to disconnect
//! - [`ConnectionGuard`] - RAII guard that disconnects when dropped
//!
//! # Reentrancy
//!
//! Emission works on a snapshot of the connection list, so handlers may
//! connect or disconnect handlers (including themselves) on the signal
//! being emitted. A handler disconnected during emission is not called
//! afterwards; a handler connected during emission is first called by the
//! next emission.
//!
//! # Example
//!
//! ```
//! use horizon_gadget_core::{functor_slot, Signal, Variant, VariantType};
//!
//! let changed = Signal::with_signature(VariantType::Void, vec![VariantType::String]);
//! changed.connect(functor_slot(|text: String| println!("now {text}")));
//! changed.emit(&[Variant::from("hello")]);
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use slotmap::{SlotMap, new_key_type};

use crate::callable::{Callable, CallableRef};
use crate::logging::targets;
use crate::variant::{ResultVariant, Variant, VariantType};

new_key_type! {
    /// A unique identifier for a signal connection.
    ///
    /// The ID remains valid until the connection is explicitly disconnected
    /// or the signal is dropped.
    pub struct ConnectionId;
}

/// Internal storage for a single connection.
struct Connection {
    slot: CallableRef,
    blocked: bool,
}

/// A multicast connection point with a declared signature.
///
/// # Thread Safety
///
/// `Signal` is `Send + Sync`; the connection table is guarded by a mutex
/// that is never held while a handler runs.
pub struct Signal {
    connections: Mutex<SlotMap<ConnectionId, Connection>>,
    blocked: AtomicBool,
    return_type: VariantType,
    arg_types: Vec<VariantType>,
}

impl Default for Signal {
    fn default() -> Self {
        Self::new()
    }
}

impl Signal {
    /// Create a signal taking no arguments and returning nothing.
    pub fn new() -> Self {
        Self::with_signature(VariantType::Void, Vec::new())
    }

    /// Create a signal with the given signature.
    pub fn with_signature(return_type: VariantType, arg_types: Vec<VariantType>) -> Self {
        Self {
            connections: Mutex::new(SlotMap::with_key()),
            blocked: AtomicBool::new(false),
            return_type,
            arg_types,
        }
    }

    /// The declared return type.
    pub fn return_type(&self) -> VariantType {
        self.return_type
    }

    /// The declared argument types.
    pub fn arg_types(&self) -> &[VariantType] {
        &self.arg_types
    }

    /// Whether `slot` can be connected to this signal.
    ///
    /// Slots without metadata are always compatible. Otherwise the argument
    /// counts must match, each argument type must match or be
    /// [`VariantType::Any`] on either side, and a non-void signal needs a
    /// slot returning the same type or `Any`.
    pub fn is_compatible(&self, slot: &dyn Callable) -> bool {
        if !slot.has_metadata() {
            return true;
        }
        if slot.arg_count() != self.arg_types.len() {
            return false;
        }
        let args_match = self
            .arg_types
            .iter()
            .zip(slot.arg_types())
            .all(|(ours, theirs)| types_compatible(*ours, *theirs));
        let return_matches = self.return_type == VariantType::Void
            || types_compatible(self.return_type, slot.return_type());
        args_match && return_matches
    }

    /// Connect a handler.
    ///
    /// Returns `None` (and logs) when the handler's signature is
    /// incompatible with the signal.
    pub fn connect(&self, slot: CallableRef) -> Option<ConnectionId> {
        if !self.is_compatible(slot.as_ref()) {
            tracing::warn!(
                target: targets::SIGNAL,
                signal_args = ?self.arg_types,
                slot_args = ?slot.arg_types(),
                "refusing to connect a handler with an incompatible signature"
            );
            return None;
        }
        let id = self.connections.lock().insert(Connection {
            slot,
            blocked: false,
        });
        tracing::trace!(target: targets::SIGNAL, ?id, "connected handler");
        Some(id)
    }

    /// Connect a handler that is disconnected when the returned guard drops.
    pub fn connect_scoped(self: &Arc<Self>, slot: CallableRef) -> Option<ConnectionGuard> {
        let id = self.connect(slot)?;
        Some(ConnectionGuard {
            signal: Arc::downgrade(self),
            id,
        })
    }

    /// Disconnect a handler by its connection ID.
    ///
    /// Returns `true` if the connection was found and removed.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        self.connections.lock().remove(id).is_some()
    }

    /// Disconnect the first handler equal to `slot`.
    pub fn disconnect_slot(&self, slot: &dyn Callable) -> bool {
        let mut connections = self.connections.lock();
        let found = connections
            .iter()
            .find(|(_, connection)| *connection.slot == *slot)
            .map(|(id, _)| id);
        found.is_some_and(|id| connections.remove(id).is_some())
    }

    /// Disconnect all handlers.
    pub fn disconnect_all(&self) {
        self.connections.lock().clear();
    }

    /// Get the number of connected handlers.
    pub fn connection_count(&self) -> usize {
        self.connections.lock().len()
    }

    /// Whether any connected handler is currently unblocked.
    pub fn has_active_connections(&self) -> bool {
        !self.is_blocked() && self.connections.lock().values().any(|c| !c.blocked)
    }

    /// The handler behind a connection.
    pub fn slot(&self, id: ConnectionId) -> Option<CallableRef> {
        self.connections.lock().get(id).map(|c| Arc::clone(&c.slot))
    }

    /// Block or unblock a single connection.
    pub fn set_connection_blocked(&self, id: ConnectionId, blocked: bool) -> bool {
        match self.connections.lock().get_mut(id) {
            Some(connection) => {
                connection.blocked = blocked;
                true
            }
            None => false,
        }
    }

    /// Block signal emission temporarily.
    ///
    /// While blocked, calls to `emit()` do nothing.
    pub fn set_blocked(&self, blocked: bool) {
        self.blocked.store(blocked, Ordering::SeqCst);
    }

    /// Check if signal emission is currently blocked.
    pub fn is_blocked(&self) -> bool {
        self.blocked.load(Ordering::SeqCst)
    }

    /// Emit the signal, calling every unblocked handler in connection order.
    ///
    /// Returns the last handler's result, or the zero value of the declared
    /// return type when no handler ran.
    ///
    /// # Panics
    ///
    /// Panics if `args` does not match the declared argument count.
    #[tracing::instrument(skip_all, target = "horizon_gadget_core::signal", level = "trace")]
    pub fn emit(&self, args: &[Variant]) -> ResultVariant {
        assert_eq!(
            args.len(),
            self.arg_types.len(),
            "signal emitted with the wrong number of arguments"
        );
        let mut result = ResultVariant::new(Variant::default_of(self.return_type));
        if self.is_blocked() {
            tracing::trace!(target: targets::SIGNAL, "signal blocked, skipping emit");
            return result;
        }

        let snapshot: Vec<(ConnectionId, CallableRef)> = self
            .connections
            .lock()
            .iter()
            .filter(|(_, connection)| !connection.blocked)
            .map(|(id, connection)| (id, Arc::clone(&connection.slot)))
            .collect();
        tracing::trace!(target: targets::SIGNAL, connection_count = snapshot.len(), "emitting signal");

        for (id, slot) in snapshot {
            let still_connected = self
                .connections
                .lock()
                .get(id)
                .is_some_and(|connection| !connection.blocked);
            if !still_connected {
                continue;
            }
            result = slot.call(args);
        }
        result
    }
}

fn types_compatible(a: VariantType, b: VariantType) -> bool {
    a == b || a == VariantType::Any || b == VariantType::Any
}

/// Disconnects its connection when dropped.
///
/// The guard holds the signal weakly; dropping it after the signal is gone
/// does nothing.
pub struct ConnectionGuard {
    signal: Weak<Signal>,
    id: ConnectionId,
}

impl ConnectionGuard {
    /// The guarded connection.
    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        if let Some(signal) = self.signal.upgrade() {
            signal.disconnect(self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callable::{dynamic_slot, function_slot, functor_slot};

    fn recorder() -> (Arc<Mutex<Vec<i64>>>, CallableRef) {
        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&received);
        let slot = functor_slot(move |value: i64| sink.lock().push(value));
        (received, slot)
    }

    fn int_signal() -> Signal {
        Signal::with_signature(VariantType::Void, vec![VariantType::Int64])
    }

    #[test]
    fn test_signal_connect_emit() {
        let signal = int_signal();
        let (received, slot) = recorder();
        signal.connect(slot).unwrap();

        signal.emit(&[Variant::Int64(42)]);
        signal.emit(&[Variant::from("7")]);
        assert_eq!(*received.lock(), vec![42, 7]);
    }

    #[test]
    fn test_signal_disconnect() {
        let signal = int_signal();
        let (received, slot) = recorder();
        let id = signal.connect(slot).unwrap();

        signal.emit(&[Variant::Int64(1)]);
        assert!(signal.disconnect(id));
        assert!(!signal.disconnect(id));
        signal.emit(&[Variant::Int64(2)]);
        assert_eq!(*received.lock(), vec![1]);
    }

    #[test]
    fn test_disconnect_by_slot_equality() {
        fn handler(_: i64) {}

        let signal = int_signal();
        signal.connect(function_slot(handler)).unwrap();
        assert_eq!(signal.connection_count(), 1);
        assert!(signal.disconnect_slot(function_slot(handler).as_ref()));
        assert_eq!(signal.connection_count(), 0);
    }

    #[test]
    fn test_signal_blocked() {
        let signal = int_signal();
        let (received, slot) = recorder();
        signal.connect(slot).unwrap();

        signal.set_blocked(true);
        assert!(signal.is_blocked());
        signal.emit(&[Variant::Int64(1)]);
        signal.set_blocked(false);
        signal.emit(&[Variant::Int64(2)]);
        assert_eq!(*received.lock(), vec![2]);
    }

    #[test]
    fn test_connection_blocked() {
        let signal = int_signal();
        let (first, first_slot) = recorder();
        let (second, second_slot) = recorder();
        let id = signal.connect(first_slot).unwrap();
        signal.connect(second_slot).unwrap();

        assert!(signal.set_connection_blocked(id, true));
        signal.emit(&[Variant::Int64(3)]);
        assert!(first.lock().is_empty());
        assert_eq!(*second.lock(), vec![3]);
    }

    #[test]
    fn test_incompatible_slot_rejected() {
        let signal = int_signal();
        assert!(signal.connect(functor_slot(|| ())).is_none());
        assert!(signal.connect(functor_slot(|_: String, _: i64| ())).is_none());
        assert!(signal.connect(functor_slot(|_: Variant| ())).is_some());
        assert!(signal.connect(dynamic_slot(|_: &[Variant]| Variant::Void)).is_some());
    }

    #[test]
    fn test_emit_returns_last_result() {
        let signal = Signal::with_signature(VariantType::Int64, Vec::new());
        assert_eq!(*signal.emit(&[]).v(), Variant::Int64(0));
        signal.connect(functor_slot(|| 1_i64)).unwrap();
        signal.connect(functor_slot(|| 2_i64)).unwrap();
        assert_eq!(*signal.emit(&[]).v(), Variant::Int64(2));
    }

    #[test]
    fn test_handler_disconnects_during_emit() {
        let signal = Arc::new(Signal::new());
        let calls = Arc::new(Mutex::new(Vec::new()));

        let weak = Arc::downgrade(&signal);
        let later: Arc<Mutex<Option<ConnectionId>>> = Arc::new(Mutex::new(None));
        let later_id = Arc::clone(&later);
        let log = Arc::clone(&calls);
        signal
            .connect(functor_slot(move || {
                log.lock().push("first");
                if let (Some(signal), Some(id)) = (weak.upgrade(), *later_id.lock()) {
                    signal.disconnect(id);
                }
            }))
            .unwrap();
        let log = Arc::clone(&calls);
        let id = signal
            .connect(functor_slot(move || log.lock().push("second")))
            .unwrap();
        *later.lock() = Some(id);

        signal.emit(&[]);
        assert_eq!(*calls.lock(), vec!["first"]);
        assert_eq!(signal.connection_count(), 1);
    }

    #[test]
    fn test_connection_guard() {
        let signal = Arc::new(int_signal());
        let (received, slot) = recorder();
        {
            let _guard = signal.connect_scoped(slot).unwrap();
            signal.emit(&[Variant::Int64(1)]);
        }
        signal.emit(&[Variant::Int64(2)]);
        assert_eq!(*received.lock(), vec![1]);
        assert_eq!(signal.connection_count(), 0);
    }

    #[test]
    #[should_panic(expected = "wrong number of arguments")]
    fn test_emit_with_wrong_arity_panics() {
        int_signal().emit(&[]);
    }
}
