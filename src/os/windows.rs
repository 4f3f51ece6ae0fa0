//! Win32 implementation of the desktop adapter
//!
//! Process lookup goes through a ToolHelp snapshot, window discovery
//! through `EnumWindows`, minimize/restore through `ShowWindow`, and mute
//! through a simulated hardware mute key (`keybd_event` with
//! `VK_VOLUME_MUTE`) - the same toggle-key approach the stock volume
//! flyout reacts to, deliberately not an absolute volume API.

use super::{name_matches, strip_exe_suffix, DesktopAdapter, ProcessInfo, WindowHandle};
use crate::error::{Error, Result};
use std::time::Duration;
use tracing::debug;
use windows::Win32::Foundation::{CloseHandle, HWND, LPARAM, WAIT_OBJECT_0, WPARAM};
use windows::Win32::Media::Audio::{waveOutGetVolume, HWAVEOUT};
use windows::Win32::System::Diagnostics::ToolHelp::{
    CreateToolhelp32Snapshot, Process32FirstW, Process32NextW, PROCESSENTRY32W,
    TH32CS_SNAPPROCESS,
};
use windows::Win32::System::Threading::{
    OpenProcess, TerminateProcess, WaitForSingleObject, PROCESS_SYNCHRONIZE, PROCESS_TERMINATE,
};
use windows::Win32::UI::Input::KeyboardAndMouse::{
    keybd_event, KEYEVENTF_EXTENDEDKEY, KEYEVENTF_KEYUP, VK_VOLUME_MUTE,
};
use windows::Win32::UI::WindowsAndMessaging::{
    EnumWindows, GetWindow, GetWindowThreadProcessId, IsWindow, IsWindowVisible, PostMessageW,
    ShowWindow, GW_OWNER, SW_MINIMIZE, SW_RESTORE, WM_CLOSE,
};

#[derive(Debug, Default)]
pub struct WindowsDesktop;

impl WindowsDesktop {
    pub fn new() -> Self {
        Self
    }
}

fn hwnd(handle: WindowHandle) -> HWND {
    HWND(handle as *mut _)
}

/// Running processes as (pid, image name without extension)
fn snapshot_processes() -> Result<Vec<(u32, String)>> {
    let mut out = Vec::new();
    unsafe {
        let snapshot = CreateToolhelp32Snapshot(TH32CS_SNAPPROCESS, 0)
            .map_err(|e| Error::process_op("process snapshot", e.to_string()))?;

        let mut entry = PROCESSENTRY32W {
            dwSize: std::mem::size_of::<PROCESSENTRY32W>() as u32,
            ..Default::default()
        };
        if Process32FirstW(snapshot, &mut entry).is_ok() {
            loop {
                let len = entry
                    .szExeFile
                    .iter()
                    .position(|&c| c == 0)
                    .unwrap_or(entry.szExeFile.len());
                let image = String::from_utf16_lossy(&entry.szExeFile[..len]);
                out.push((entry.th32ProcessID, strip_exe_suffix(&image).to_string()));
                if Process32NextW(snapshot, &mut entry).is_err() {
                    break;
                }
            }
        }
        let _ = CloseHandle(snapshot);
    }
    Ok(out)
}

/// Find the top-level, unowned, visible window belonging to `pid`
fn main_window_of(pid: u32) -> Option<WindowHandle> {
    struct Search {
        pid: u32,
        found: Option<WindowHandle>,
    }

    unsafe extern "system" fn enum_cb(
        window: HWND,
        lparam: LPARAM,
    ) -> windows::Win32::Foundation::BOOL {
        let search = &mut *(lparam.0 as *mut Search);
        let mut pid = 0u32;
        GetWindowThreadProcessId(window, Some(&mut pid));
        if pid == search.pid
            && IsWindowVisible(window).as_bool()
            && GetWindow(window, GW_OWNER).is_err()
        {
            search.found = Some(window.0 as isize);
            return false.into(); // stop enumeration
        }
        true.into()
    }

    let mut search = Search { pid, found: None };
    unsafe {
        // EnumWindows reports an error when the callback stops it early;
        // `found` is what matters.
        let _ = EnumWindows(Some(enum_cb), LPARAM(&mut search as *mut Search as isize));
    }
    search.found
}

impl DesktopAdapter for WindowsDesktop {
    fn find_processes(&self, pattern: &str) -> Vec<ProcessInfo> {
        let snapshot = match snapshot_processes() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                debug!("Process snapshot failed: {}", e);
                return Vec::new();
            }
        };
        snapshot
            .into_iter()
            .filter(|(_, name)| name_matches(name, pattern))
            .map(|(pid, name)| ProcessInfo {
                pid,
                name,
                main_window: main_window_of(pid),
            })
            .collect()
    }

    fn close_or_kill(&self, process: &ProcessInfo, timeout: Duration) -> Result<()> {
        unsafe {
            let handle = OpenProcess(
                PROCESS_SYNCHRONIZE | PROCESS_TERMINATE,
                false,
                process.pid,
            )
            .map_err(|e| {
                Error::process_op("open process", format!("pid {}: {}", process.pid, e))
            })?;

            // Cooperative close: WM_CLOSE to the main window if there is one
            if let Some(window) = process.main_window {
                let _ = PostMessageW(hwnd(window), WM_CLOSE, WPARAM(0), LPARAM(0));
            }

            let waited = WaitForSingleObject(handle, timeout.as_millis() as u32);
            let outcome = if waited == WAIT_OBJECT_0 {
                debug!("Process {} ({}) closed cooperatively", process.name, process.pid);
                Ok(())
            } else {
                TerminateProcess(handle, 1).map_err(|e| {
                    Error::process_op("terminate process", format!("pid {}: {}", process.pid, e))
                })
            };
            let _ = CloseHandle(handle);
            outcome
        }
    }

    fn minimize(&self, window: WindowHandle) -> Result<()> {
        if !self.is_window_alive(window) {
            return Err(Error::process_op("minimize", format!("stale handle {window:#x}")));
        }
        unsafe {
            let _ = ShowWindow(hwnd(window), SW_MINIMIZE);
        }
        Ok(())
    }

    fn restore(&self, window: WindowHandle) -> Result<()> {
        if !self.is_window_alive(window) {
            return Err(Error::process_op("restore", format!("stale handle {window:#x}")));
        }
        unsafe {
            let _ = ShowWindow(hwnd(window), SW_RESTORE);
        }
        Ok(())
    }

    fn is_window_alive(&self, window: WindowHandle) -> bool {
        window != 0 && unsafe { IsWindow(hwnd(window)).as_bool() }
    }

    fn query_mute(&self) -> Result<bool> {
        // Zero waveform volume stands in for "muted"; this mirrors the
        // behavior of the toggle key well enough for parity checks.
        let mut volume = 0u32;
        let result = unsafe { waveOutGetVolume(HWAVEOUT::default(), &mut volume) };
        if result != 0 {
            return Err(Error::process_op("query mute", format!("waveOutGetVolume={result}")));
        }
        Ok(volume == 0)
    }

    fn toggle_mute(&self) -> Result<()> {
        unsafe {
            keybd_event(VK_VOLUME_MUTE.0 as u8, 0, KEYEVENTF_EXTENDEDKEY, 0);
            keybd_event(VK_VOLUME_MUTE.0 as u8, 0, KEYEVENTF_EXTENDEDKEY | KEYEVENTF_KEYUP, 0);
        }
        Ok(())
    }
}
