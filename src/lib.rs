//! DeskMask
//!
//! A tray-resident desktop camouflage controller. One global boss key
//! flips the desktop between its normal working shape and a disguised
//! shape: configured applications are opened, closed or minimized, system
//! audio is muted, and everything is put back the way it was on the
//! reverse press.
//!
//! # Features
//! - Single rebindable global hotkey (the boss key)
//! - Ordered side-effect sets for boss-coming and boss-leaving
//! - Minimized-window ledger so exactly the touched windows come back
//! - Reader/player disguise payload launch with install-folder fallback
//! - Daily statistics (visit count, covered seconds) in the tray tooltip
//! - Runs as a system tray application

pub mod core;
pub mod error;
pub mod hotkey;
pub mod os;
pub mod payload;
pub mod tray;

pub use crate::core::config::Config;
pub use crate::core::events::{AppEvent, EventSender, TriggerSlot};
pub use crate::core::machine::{Camouflage, ModeState};
pub use crate::error::{Error, PayloadKind};
pub use crate::os::{DesktopAdapter, PlatformDesktop};
