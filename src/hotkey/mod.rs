//! Global boss-key registration and listening
//!
//! One system-wide hotkey, registered for the lifetime of the process and
//! rebindable at runtime. The listener thread blocks on the hotkey event
//! receiver and converts each press into a trigger post plus a wake-up
//! event for the main loop.

use crate::core::config::HotkeyBinding;
use crate::core::events::{AppEvent, EventSender, TriggerSlot};
use crate::error::{Error, Result};
use anyhow::Context;
use global_hotkey::{
    hotkey::{Code, HotKey, Modifiers},
    GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState,
};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Id value meaning "no hotkey registered"
const NO_HOTKEY: u32 = 0;

/// Owns the OS-level hotkey registration.
///
/// The registered id is shared with the listener thread through an atomic
/// so a rebind takes effect without restarting the thread.
pub struct BossKeyListener {
    manager: GlobalHotKeyManager,
    registered: Option<HotKey>,
    active_id: Arc<AtomicU32>,
}

impl BossKeyListener {
    pub fn new() -> anyhow::Result<Self> {
        let manager =
            GlobalHotKeyManager::new().context("Failed to create global hotkey manager")?;
        Ok(Self {
            manager,
            registered: None,
            active_id: Arc::new(AtomicU32::new(NO_HOTKEY)),
        })
    }

    /// Register `binding` as the boss key. An unset or unparsable
    /// binding fails with [`Error::InvalidBinding`]; a combination the
    /// OS rejects (typically because another application holds it) fails
    /// with [`Error::HotkeyConflict`].
    pub fn register(&mut self, binding: &HotkeyBinding) -> Result<()> {
        let hotkey = binding_to_hotkey(binding).ok_or_else(|| Error::InvalidBinding {
            binding: binding.to_string(),
        })?;
        if let Err(e) = self.manager.register(hotkey) {
            warn!("Failed to register boss key {}: {}", binding, e);
            return Err(Error::HotkeyConflict {
                binding: binding.to_string(),
            });
        }
        self.registered = Some(hotkey);
        self.active_id.store(hotkey.id(), Ordering::SeqCst);
        info!("Registered boss key: {}", binding);
        Ok(())
    }

    /// Swap the boss key for `binding`. If the new combination cannot be
    /// registered, the previous one is re-registered and stays in effect.
    pub fn rebind(&mut self, binding: &HotkeyBinding) -> Result<()> {
        let previous = self.registered;
        self.unregister();
        match self.register(binding) {
            Ok(()) => Ok(()),
            Err(e) => {
                if let Some(old) = previous {
                    if self.manager.register(old).is_ok() {
                        self.registered = Some(old);
                        self.active_id.store(old.id(), Ordering::SeqCst);
                        info!("Kept previous boss key after failed rebind");
                    }
                }
                Err(e)
            }
        }
    }

    /// Release the OS registration
    pub fn unregister(&mut self) {
        self.active_id.store(NO_HOTKEY, Ordering::SeqCst);
        if let Some(hotkey) = self.registered.take() {
            if let Err(e) = self.manager.unregister(hotkey) {
                warn!("Failed to unregister boss key: {}", e);
            }
        }
    }

    /// Spawn the listener thread. Each press of the active boss key posts
    /// to `slot` and wakes the main loop; a press arriving while a
    /// trigger is still executing is dropped, not queued.
    pub fn spawn_listener(&self, slot: TriggerSlot, sender: EventSender) {
        let active_id = Arc::clone(&self.active_id);
        std::thread::spawn(move || {
            let receiver = GlobalHotKeyEvent::receiver();
            loop {
                let event = match receiver.recv() {
                    Ok(event) => event,
                    Err(e) => {
                        error!("Hotkey channel closed: {}", e);
                        return;
                    }
                };
                if event.state != HotKeyState::Pressed {
                    continue;
                }
                if event.id != active_id.load(Ordering::SeqCst) {
                    continue;
                }
                if !slot.post() {
                    debug!("Boss key pressed during action execution, dropped");
                    continue;
                }
                if sender.send(AppEvent::BossKey).is_err() {
                    // main loop is gone
                    return;
                }
            }
        });
    }
}

/// Binding to register at startup: a configured binding that is unset or
/// unparsable falls back to the default combination instead of leaving
/// the session without a boss key.
pub fn startup_binding(configured: &HotkeyBinding) -> HotkeyBinding {
    if binding_to_hotkey(configured).is_some() {
        configured.clone()
    } else {
        warn!(
            "Configured boss key {} is unusable, falling back to {}",
            configured,
            HotkeyBinding::default()
        );
        HotkeyBinding::default()
    }
}

/// Convert a configured binding into a registrable hotkey. Returns `None`
/// for an unset binding or an unknown key name.
fn binding_to_hotkey(binding: &HotkeyBinding) -> Option<HotKey> {
    let key = binding.key.as_deref()?;
    let code = parse_key_code(key)?;
    let mut modifiers = Modifiers::empty();
    if binding.ctrl {
        modifiers |= Modifiers::CONTROL;
    }
    if binding.alt {
        modifiers |= Modifiers::ALT;
    }
    if binding.shift {
        modifiers |= Modifiers::SHIFT;
    }
    Some(HotKey::new(Some(modifiers), code))
}

/// Parse a key name ("F12", "A", "9") into a key code
fn parse_key_code(key: &str) -> Option<Code> {
    let key = key.trim().to_uppercase();

    let code = match key.as_str() {
        "F1" => Code::F1,
        "F2" => Code::F2,
        "F3" => Code::F3,
        "F4" => Code::F4,
        "F5" => Code::F5,
        "F6" => Code::F6,
        "F7" => Code::F7,
        "F8" => Code::F8,
        "F9" => Code::F9,
        "F10" => Code::F10,
        "F11" => Code::F11,
        "F12" => Code::F12,
        "F13" => Code::F13,
        "F14" => Code::F14,
        "F15" => Code::F15,
        "F16" => Code::F16,
        "F17" => Code::F17,
        "F18" => Code::F18,
        "F19" => Code::F19,
        "F20" => Code::F20,
        "F21" => Code::F21,
        "F22" => Code::F22,
        "F23" => Code::F23,
        "F24" => Code::F24,
        "A" => Code::KeyA,
        "B" => Code::KeyB,
        "C" => Code::KeyC,
        "D" => Code::KeyD,
        "E" => Code::KeyE,
        "F" => Code::KeyF,
        "G" => Code::KeyG,
        "H" => Code::KeyH,
        "I" => Code::KeyI,
        "J" => Code::KeyJ,
        "K" => Code::KeyK,
        "L" => Code::KeyL,
        "M" => Code::KeyM,
        "N" => Code::KeyN,
        "O" => Code::KeyO,
        "P" => Code::KeyP,
        "Q" => Code::KeyQ,
        "R" => Code::KeyR,
        "S" => Code::KeyS,
        "T" => Code::KeyT,
        "U" => Code::KeyU,
        "V" => Code::KeyV,
        "W" => Code::KeyW,
        "X" => Code::KeyX,
        "Y" => Code::KeyY,
        "Z" => Code::KeyZ,
        "0" => Code::Digit0,
        "1" => Code::Digit1,
        "2" => Code::Digit2,
        "3" => Code::Digit3,
        "4" => Code::Digit4,
        "5" => Code::Digit5,
        "6" => Code::Digit6,
        "7" => Code::Digit7,
        "8" => Code::Digit8,
        "9" => Code::Digit9,
        _ => {
            warn!("Unknown boss key name: {}", key);
            return None;
        }
    };
    Some(code)
}
