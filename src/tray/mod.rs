//! Tray module - system tray icon and menu

mod icon;
mod menu;

pub use icon::TrayIcons;
pub use menu::{TrayAction, TrayManager};
