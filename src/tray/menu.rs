//! Tray menu management

use super::icon::TrayIcons;
use crate::core::events::{AppEvent, EventSender};
use anyhow::{Context, Result};
use tracing::{debug, error, info};
use tray_icon::{
    menu::{Menu, MenuEvent, MenuId, MenuItem, PredefinedMenuItem},
    MouseButton, TrayIcon as TrayIconHandle, TrayIconBuilder, TrayIconEvent,
};

/// Tray menu actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayAction {
    /// Arm disguise mode and hide the controller window
    StartDisguise,
    /// Disarm and bring the controller window back
    ShowWindow,
    /// Quit application
    Quit,
}

/// Tray manager
pub struct TrayManager {
    tray: TrayIconHandle,
    icons: TrayIcons,
    start_item: MenuItem,
}

impl TrayManager {
    pub fn new(sender: EventSender) -> Result<Self> {
        let icons = TrayIcons::new().context("Failed to render tray icons")?;

        let menu = Menu::new();

        let start_item = MenuItem::new("Start disguise", true, None);
        let start_id = start_item.id().clone();

        let show_item = MenuItem::new("Show window", true, None);
        let show_id = show_item.id().clone();

        let quit_item = MenuItem::new("Quit", true, None);
        let quit_id = quit_item.id().clone();

        menu.append(&start_item)?;
        menu.append(&show_item)?;
        menu.append(&PredefinedMenuItem::separator())?;
        menu.append(&quit_item)?;

        let tray = TrayIconBuilder::new()
            .with_menu(Box::new(menu))
            .with_tooltip("DeskMask")
            .with_icon(icons.idle.clone())
            .build()
            .context("Failed to create tray icon")?;

        info!("Tray icon created");

        let manager = Self {
            tray,
            icons,
            start_item,
        };
        manager.start_menu_handler(sender.clone(), start_id, show_id, quit_id);
        manager.start_icon_handler(sender);
        Ok(manager)
    }

    /// Forward menu clicks to the main loop
    fn start_menu_handler(
        &self,
        sender: EventSender,
        start_id: MenuId,
        show_id: MenuId,
        quit_id: MenuId,
    ) {
        std::thread::spawn(move || {
            let receiver = MenuEvent::receiver();

            loop {
                if let Ok(event) = receiver.recv() {
                    debug!("Menu event: {:?}", event);

                    let action = if event.id == start_id {
                        Some(TrayAction::StartDisguise)
                    } else if event.id == show_id {
                        Some(TrayAction::ShowWindow)
                    } else if event.id == quit_id {
                        Some(TrayAction::Quit)
                    } else {
                        None
                    };

                    if let Some(action) = action {
                        if let Err(e) = sender.send(AppEvent::Tray(action)) {
                            error!("Failed to send tray action: {}", e);
                        }
                    }
                }
            }
        });
    }

    /// A double-click on the icon itself acts like "Show window"
    fn start_icon_handler(&self, sender: EventSender) {
        std::thread::spawn(move || {
            let receiver = TrayIconEvent::receiver();

            loop {
                if let Ok(event) = receiver.recv() {
                    if let TrayIconEvent::DoubleClick {
                        button: MouseButton::Left,
                        ..
                    } = event
                    {
                        debug!("Tray icon double-clicked");
                        if let Err(e) = sender.send(AppEvent::Tray(TrayAction::ShowWindow)) {
                            error!("Failed to send tray action: {}", e);
                        }
                    }
                }
            }
        });
    }

    /// Swap icon and menu to reflect the armed state
    pub fn set_armed(&mut self, armed: bool) {
        let icon = if armed {
            &self.icons.armed
        } else {
            &self.icons.idle
        };
        if let Err(e) = self.tray.set_icon(Some(icon.clone())) {
            error!("Failed to set tray icon: {}", e);
        }
        self.start_item.set_enabled(!armed);
    }

    /// Tooltip with the current statistics line
    pub fn set_status(&mut self, status: &str) {
        if let Err(e) = self.tray.set_tooltip(Some(status)) {
            error!("Failed to set tray tooltip: {}", e);
        }
    }
}
