//! Application event definitions

use crate::tray::TrayAction;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use winit::event_loop::EventLoopProxy;

/// Wrapper around `mpsc::UnboundedSender<AppEvent>` that also wakes the
/// winit event loop via `EventLoopProxy` after every send, so the loop can
/// run with `ControlFlow::Wait` without missing background events (hotkey
/// thread, tray thread, tick thread).
#[derive(Clone)]
pub struct EventSender {
    tx: mpsc::UnboundedSender<AppEvent>,
    proxy: EventLoopProxy<()>,
}

impl EventSender {
    pub fn new(tx: mpsc::UnboundedSender<AppEvent>, proxy: EventLoopProxy<()>) -> Self {
        Self { tx, proxy }
    }

    pub fn send(&self, event: AppEvent) -> Result<(), mpsc::error::SendError<AppEvent>> {
        let result = self.tx.send(event);
        let _ = self.proxy.send_event(());
        result
    }
}

/// Application-wide events for inter-module communication
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// The boss key fired and a trigger is pending in the slot
    BossKey,

    /// One second of wall-clock time elapsed
    Tick,

    /// Tray menu or tray icon action
    Tray(TrayAction),
}

/// Bounded single-slot trigger channel.
///
/// The hotkey listener posts at most one pending trigger; the state
/// machine consumes it. Posts that arrive while a previous trigger's
/// action sequence is still executing are dropped outright - no queue, no
/// backpressure, a rapid double-press is a no-op on the second press.
#[derive(Clone, Default)]
pub struct TriggerSlot {
    inner: Arc<SlotState>,
}

#[derive(Default)]
struct SlotState {
    pending: AtomicBool,
    executing: AtomicBool,
}

impl TriggerSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Post a trigger. Returns false (dropped) if an action sequence is
    /// executing or a trigger is already pending.
    pub fn post(&self) -> bool {
        if self.inner.executing.load(Ordering::SeqCst) {
            return false;
        }
        self.inner
            .pending
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// Consume the pending trigger, if any, and mark execution started.
    /// Callers must pair this with [`TriggerSlot::finish`].
    ///
    /// The executing flag goes up before the pending slot is cleared, so
    /// a post racing with the consume is dropped instead of landing in
    /// the freshly emptied slot and being serviced after the fact.
    pub fn take(&self) -> bool {
        self.inner.executing.store(true, Ordering::SeqCst);
        if self
            .inner
            .pending
            .compare_exchange(true, false, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            true
        } else {
            self.inner.executing.store(false, Ordering::SeqCst);
            false
        }
    }

    /// Execution of the consumed trigger finished; posting is allowed again.
    pub fn finish(&self) {
        self.inner.executing.store(false, Ordering::SeqCst);
    }
}
