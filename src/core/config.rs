//! Configuration record
//!
//! The single persisted document shared with the disguise payload
//! processes. The controller is the sole writer; the reader/player open it
//! read-only from one directory up. Parse failures on either side fall
//! back to an all-defaults record.

use crate::core::stats::Statistics;
use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::warn;

/// File name of the shared configuration document, placed next to the
/// controller executable so the payloads can find it.
pub const CONFIG_FILE: &str = "deskmask-settings.json";

/// Global key combination that flips camouflage state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotkeyBinding {
    #[serde(default)]
    pub ctrl: bool,
    #[serde(default)]
    pub alt: bool,
    #[serde(default)]
    pub shift: bool,
    /// Key name ("F12", "A", "9"). `None` means the binding is unset.
    #[serde(default)]
    pub key: Option<String>,
}

impl HotkeyBinding {
    /// A binding is usable only with a key code present
    pub fn is_valid(&self) -> bool {
        self.key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}

impl Default for HotkeyBinding {
    fn default() -> Self {
        // Ctrl+Alt+F12 unless the user configured something else
        Self {
            ctrl: true,
            alt: true,
            shift: false,
            key: Some("F12".to_string()),
        }
    }
}

impl fmt::Display for HotkeyBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<&str> = Vec::new();
        if self.ctrl {
            parts.push("Ctrl");
        }
        if self.alt {
            parts.push("Alt");
        }
        if self.shift {
            parts.push("Shift");
        }
        match self.key.as_deref() {
            Some(key) if !key.is_empty() => {
                parts.push(key);
                write!(f, "{}", parts.join(" + "))
            }
            _ => write!(f, "unset"),
        }
    }
}

/// Window dimensions carried for the payload windows.
///
/// Round-trips through `"<width>*<height>"`; parsing also accepts `x`,
/// `X` and `×` as the separator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSize {
    pub width: u32,
    pub height: u32,
}

impl WindowSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for WindowSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}*{}", self.width, self.height)
    }
}

impl FromStr for WindowSize {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s
            .split(['*', 'x', 'X', '×'])
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();
        if parts.len() != 2 {
            return Err(());
        }
        let width = parts[0].parse().map_err(|_| ())?;
        let height = parts[1].parse().map_err(|_| ())?;
        Ok(Self { width, height })
    }
}

/// Ordered side effects for one transition direction.
///
/// Assembled whole by the (out-of-scope) settings UI and handed read-only
/// to the state machine; the machine never mutates these.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionSet {
    /// Application paths launched directly
    #[serde(default)]
    pub open_apps: Vec<String>,
    /// Files/folders opened through the shell handler
    #[serde(default)]
    pub open_files: Vec<String>,
    /// URLs opened through the shell handler
    #[serde(default)]
    pub open_urls: Vec<String>,
    /// Process-name patterns to close gracefully or kill
    #[serde(default)]
    pub close_apps: Vec<String>,
    /// Also close the reader payload during this transition
    #[serde(default)]
    pub close_reader: bool,
    /// Also close the player payload during this transition
    #[serde(default)]
    pub close_player: bool,
    /// Process-name patterns whose main windows get minimized
    #[serde(default)]
    pub minimize_apps: Vec<String>,
    /// Capture mute state and mute the system during this transition
    #[serde(default)]
    pub mute_on_minimize: bool,
    /// Relaunch the reader payload on the reverse transition
    #[serde(default)]
    pub restore_reader: bool,
    /// Relaunch the player payload on the reverse transition
    #[serde(default)]
    pub restore_player: bool,
    /// Restore the windows recorded in the ledger on the reverse transition
    #[serde(default)]
    pub restore_minimized: bool,
}

/// Display preferences consumed by the reader payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReaderPrefs {
    #[serde(default = "default_reader_font_name")]
    pub font_name: String,
    #[serde(default = "default_reader_font_size")]
    pub font_size: f32,
    /// Text color as an HTML hex string
    #[serde(default = "default_reader_text_color")]
    pub text_color: String,
    #[serde(default)]
    pub transparent_window: bool,
    #[serde(default)]
    pub auto_turn_page: bool,
    #[serde(default = "default_turn_page_seconds")]
    pub turn_page_seconds: u32,
    #[serde(default = "default_reader_window_size")]
    pub window_size: WindowSize,
}

fn default_reader_font_name() -> String {
    "Segoe UI".to_string()
}
fn default_reader_font_size() -> f32 {
    12.0
}
fn default_reader_text_color() -> String {
    "#000000".to_string()
}
fn default_turn_page_seconds() -> u32 {
    10
}
fn default_reader_window_size() -> WindowSize {
    WindowSize::new(400, 100)
}

impl Default for ReaderPrefs {
    fn default() -> Self {
        Self {
            font_name: default_reader_font_name(),
            font_size: default_reader_font_size(),
            text_color: default_reader_text_color(),
            transparent_window: false,
            auto_turn_page: false,
            turn_page_seconds: default_turn_page_seconds(),
            window_size: default_reader_window_size(),
        }
    }
}

/// Display preferences consumed by the player payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerPrefs {
    #[serde(default)]
    pub auto_switch: bool,
    #[serde(default)]
    pub full_screen: bool,
    /// Playback volume 0-100
    #[serde(default = "default_player_volume")]
    pub volume: u8,
    #[serde(default = "default_player_window_size")]
    pub window_size: WindowSize,
}

fn default_player_volume() -> u8 {
    50
}
fn default_player_window_size() -> WindowSize {
    WindowSize::new(400, 400)
}

impl Default for PlayerPrefs {
    fn default() -> Self {
        Self {
            auto_switch: false,
            full_screen: false,
            volume: default_player_volume(),
            window_size: default_player_window_size(),
        }
    }
}

/// Main configuration record
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// The boss key
    #[serde(default)]
    pub boss_key: HotkeyBinding,
    /// Content directory handed to the reader payload
    #[serde(default)]
    pub reader_dir: String,
    /// Content directory handed to the player payload
    #[serde(default)]
    pub player_dir: String,
    /// Side effects when the boss arrives (into cover)
    #[serde(default)]
    pub on_boss_coming: ActionSet,
    /// Side effects when the boss leaves (out of cover)
    #[serde(default)]
    pub on_boss_leaving: ActionSet,
    /// Launch the reader right after arming
    #[serde(default)]
    pub open_reader_when_armed: bool,
    /// Launch the player right after arming
    #[serde(default)]
    pub open_player_when_armed: bool,
    /// Reader display preferences (round-tripped for the payload)
    #[serde(default)]
    pub reader: ReaderPrefs,
    /// Player display preferences (round-tripped for the payload)
    #[serde(default)]
    pub player: PlayerPrefs,
    /// Rolling daily statistics
    #[serde(default)]
    pub stats: Statistics,
}

impl Config {
    /// Load the record from `path`.
    ///
    /// A missing file yields defaults; a malformed file is reported and
    /// also yields defaults - loading never fails hard.
    pub fn load(path: &std::path::Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Self::default(),
            Err(e) => {
                warn!("Failed to read config file {:?}: {}", path, e);
                return Self::default();
            }
        };

        match serde_json::from_str(&content) {
            Ok(config) => config,
            Err(source) => {
                let err = Error::ConfigLoad {
                    path: path.to_path_buf(),
                    source,
                };
                warn!("{}, falling back to defaults", err);
                Self::default()
            }
        }
    }

    /// Persist the record to `path`, synchronously.
    pub fn save(&self, path: &std::path::Path) -> Result<(), Error> {
        let content = serde_json::to_string_pretty(self)
            .expect("configuration record serializes infallibly");
        std::fs::write(path, content).map_err(|source| Error::Persistence {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Location of the shared configuration file: next to the controller
    /// executable, so payloads in install sub-folders see it one level up.
    pub fn default_path() -> PathBuf {
        std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|dir| dir.join(CONFIG_FILE)))
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE))
    }
}
