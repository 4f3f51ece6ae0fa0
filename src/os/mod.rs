//! Window/process side-effect operations
//!
//! Thin adapter over the OS window manager. Every operation is
//! independently retryable and reports failure as a result outcome; none
//! may panic. The state machine drives the adapter and knows nothing
//! about how the operations are carried out.

#[cfg(target_os = "windows")]
mod windows;
#[cfg(target_os = "windows")]
pub use self::windows::WindowsDesktop as PlatformDesktop;

#[cfg(not(target_os = "windows"))]
mod fallback;
#[cfg(not(target_os = "windows"))]
pub use self::fallback::FallbackDesktop as PlatformDesktop;

use crate::error::{Error, Result};
use std::path::Path;
use std::process::Command;
use std::time::Duration;

/// Opaque OS window identifier
pub type WindowHandle = isize;

/// A process located by name, with its main window if it has one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInfo {
    pub pid: u32,
    /// Image name without extension ("notepad", not "notepad.exe")
    pub name: String,
    pub main_window: Option<WindowHandle>,
}

/// Grace period for a cooperative close before force-terminating
pub const CLOSE_GRACE: Duration = Duration::from_millis(100);

pub trait DesktopAdapter {
    /// Every running process whose image name matches `pattern`
    /// case-insensitively (extension ignored).
    fn find_processes(&self, pattern: &str) -> Vec<ProcessInfo>;

    /// Ask the process to close; if it has not exited within `timeout`,
    /// force-terminate it. Never blocks beyond `timeout`.
    fn close_or_kill(&self, process: &ProcessInfo, timeout: Duration) -> Result<()>;

    fn minimize(&self, window: WindowHandle) -> Result<()>;

    fn restore(&self, window: WindowHandle) -> Result<()>;

    fn is_window_alive(&self, window: WindowHandle) -> bool;

    /// Whether the system output is currently muted
    fn query_mute(&self) -> Result<bool>;

    /// Simulate a single hardware mute key press (a toggle, not an
    /// absolute set).
    fn toggle_mute(&self) -> Result<()>;

    /// Drive the mute state to `desired` by toggling only when it
    /// differs. An external actor changing the volume between the query
    /// and the toggle can invert the result; known limitation of the
    /// toggle-key approach.
    fn set_muted(&self, desired: bool) -> Result<()> {
        if self.query_mute()? != desired {
            self.toggle_mute()?;
        }
        Ok(())
    }

    /// Open a file, folder or URL through the OS shell handler.
    fn open_target(&self, target: &str) -> Result<()> {
        open::that_detached(target)
            .map_err(|e| Error::process_op("open target", format!("{target}: {e}")))
    }

    /// Start an executable, optionally with a single argument. The
    /// argument is passed as-is; the OS layer takes care of quoting
    /// paths with spaces.
    fn spawn(&self, program: &Path, arg: Option<&str>) -> Result<()> {
        let mut command = Command::new(program);
        if let Some(arg) = arg {
            command.arg(arg);
        }
        command
            .spawn()
            .map(|_| ())
            .map_err(|e| Error::process_op("spawn", format!("{program:?}: {e}")))
    }
}

/// Case-insensitive exact match of a process image name against a
/// configured pattern. The pattern may be a bare name, a name with
/// extension, or a full path; everything but the file stem is ignored.
pub fn name_matches(image_name: &str, pattern: &str) -> bool {
    let wanted = Path::new(pattern)
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();
    if wanted.is_empty() {
        return false;
    }
    image_name.eq_ignore_ascii_case(&wanted)
}

/// Strip a trailing executable extension from an image name
pub(crate) fn strip_exe_suffix(image: &str) -> &str {
    image
        .strip_suffix(".exe")
        .or_else(|| image.strip_suffix(".EXE"))
        .unwrap_or(image)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_matches_bare_name() {
        assert!(name_matches("notepad", "notepad"));
        assert!(name_matches("Notepad", "NOTEPAD"));
        assert!(!name_matches("notepad2", "notepad"));
        assert!(!name_matches("note", "notepad"));
    }

    #[test]
    fn test_name_matches_strips_extension_and_path() {
        assert!(name_matches("notepad", "notepad.exe"));
        assert!(name_matches("notepad", "C:\\Windows\\notepad.exe"));
        assert!(name_matches("notepad", "/usr/bin/notepad"));
    }

    #[test]
    fn test_name_matches_empty_pattern() {
        assert!(!name_matches("notepad", ""));
    }

    #[test]
    fn test_strip_exe_suffix() {
        assert_eq!(strip_exe_suffix("notepad.exe"), "notepad");
        assert_eq!(strip_exe_suffix("notepad.EXE"), "notepad");
        assert_eq!(strip_exe_suffix("notepad"), "notepad");
    }
}
