//! Non-Windows stand-in adapter
//!
//! The camouflage design is window-manager-specific and only the Win32
//! adapter does real window and audio work. This implementation keeps the
//! crate building and the core testable elsewhere: shell-open and spawn
//! use the portable default methods, window and audio operations warn and
//! report an unsupported outcome.

use super::{DesktopAdapter, ProcessInfo, WindowHandle};
use crate::error::{Error, Result};
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Default)]
pub struct FallbackDesktop;

impl FallbackDesktop {
    pub fn new() -> Self {
        Self
    }
}

fn unsupported(operation: &'static str) -> Error {
    warn!("{} is not supported on this platform", operation);
    Error::process_op(operation, "unsupported on this platform")
}

impl DesktopAdapter for FallbackDesktop {
    fn find_processes(&self, _pattern: &str) -> Vec<ProcessInfo> {
        Vec::new()
    }

    fn close_or_kill(&self, _process: &ProcessInfo, _timeout: Duration) -> Result<()> {
        Err(unsupported("close process"))
    }

    fn minimize(&self, _window: WindowHandle) -> Result<()> {
        Err(unsupported("minimize window"))
    }

    fn restore(&self, _window: WindowHandle) -> Result<()> {
        Err(unsupported("restore window"))
    }

    fn is_window_alive(&self, _window: WindowHandle) -> bool {
        false
    }

    fn query_mute(&self) -> Result<bool> {
        Err(unsupported("query mute"))
    }

    fn toggle_mute(&self) -> Result<()> {
        Err(unsupported("toggle mute"))
    }
}
