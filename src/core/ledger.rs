//! Minimized-window ledger
//!
//! Tracks which window handles this tool minimized during the current
//! "boss present" interval, so they - and only they - get restored
//! afterward. No handle is ever restored twice.

use crate::os::WindowHandle;

#[derive(Debug, Default)]
pub struct WindowLedger {
    handles: Vec<WindowHandle>,
}

impl WindowLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a minimized window. Idempotent: duplicates are ignored,
    /// insertion order is preserved.
    pub fn record(&mut self, handle: WindowHandle) {
        if !self.handles.contains(&handle) {
            self.handles.push(handle);
        }
    }

    /// Return every recorded handle in order and clear the ledger
    /// unconditionally, stale handles included.
    pub fn drain(&mut self) -> Vec<WindowHandle> {
        std::mem::take(&mut self.handles)
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_is_idempotent() {
        let mut ledger = WindowLedger::new();
        ledger.record(10);
        ledger.record(20);
        ledger.record(10);
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.drain(), vec![10, 20]);
    }

    #[test]
    fn test_drain_clears() {
        let mut ledger = WindowLedger::new();
        ledger.record(1);
        ledger.record(2);
        ledger.record(3);
        assert_eq!(ledger.drain(), vec![1, 2, 3]);
        assert!(ledger.is_empty());
        assert_eq!(ledger.drain(), Vec::<WindowHandle>::new());
    }

    #[test]
    fn test_record_after_drain_starts_fresh() {
        let mut ledger = WindowLedger::new();
        ledger.record(5);
        ledger.drain();
        ledger.record(5);
        assert_eq!(ledger.drain(), vec![5]);
    }
}
