// Hide console window on Windows release builds
#![cfg_attr(
    all(target_os = "windows", not(debug_assertions)),
    windows_subsystem = "windows"
)]

//! DeskMask - Entry Point
//!
//! Initializes the tray, the boss-key listener and the camouflage state
//! machine, then runs the winit event loop. The controller window itself
//! is a plain shell that hides to the tray; all the interesting work
//! happens in response to channel events.

use anyhow::Result;
use deskmask::{
    core::{
        config::{Config, HotkeyBinding},
        events::{AppEvent, EventSender, TriggerSlot},
        machine::Camouflage,
    },
    hotkey::{startup_binding, BossKeyListener},
    payload,
    tray::{TrayAction, TrayManager},
    Error, PlatformDesktop,
};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

/// Main application handler for the winit event loop
struct App {
    /// Camouflage state machine (owns the configuration record)
    machine: Camouflage,
    /// Platform window/process adapter
    adapter: PlatformDesktop,
    /// Event sender for inter-module communication (wakes event loop)
    event_tx: EventSender,
    /// Event receiver for inter-module communication
    event_rx: Option<mpsc::UnboundedReceiver<AppEvent>>,
    /// Single-slot boss-key trigger channel
    slot: TriggerSlot,
    /// Boss-key registration, kept alive for the process lifetime
    hotkey: Option<BossKeyListener>,
    /// Tray manager for the system tray
    tray_manager: Option<TrayManager>,
    /// Controller window
    window: Option<Window>,
    /// Guards one-time setup against repeated `resumed` calls
    initialized: bool,
}

impl App {
    fn new(
        machine: Camouflage,
        event_tx: EventSender,
        event_rx: mpsc::UnboundedReceiver<AppEvent>,
    ) -> Self {
        Self {
            machine,
            adapter: PlatformDesktop::new(),
            event_tx,
            event_rx: Some(event_rx),
            slot: TriggerSlot::new(),
            hotkey: None,
            tray_manager: None,
            window: None,
            initialized: false,
        }
    }

    /// Register the boss key and start the listener thread.
    ///
    /// An unusable configured binding is replaced by the default before
    /// registration; a registration conflict falls back to the default
    /// combination too. Whatever ends up registered is written back to
    /// the configuration record.
    fn setup_hotkey(&mut self) {
        let mut listener = match BossKeyListener::new() {
            Ok(listener) => listener,
            Err(e) => {
                error!("Failed to initialize hotkey backend: {}", e);
                return;
            }
        };

        let configured = self.machine.config().boss_key.clone();
        let candidate = startup_binding(&configured);
        let registered = match listener.register(&candidate) {
            Ok(()) => Some(candidate),
            Err(e) => {
                warn!("{}", e);
                show_report(&e);
                let default = HotkeyBinding::default();
                if candidate != default && listener.register(&default).is_ok() {
                    info!("Fell back to default boss key {}", default);
                    Some(default)
                } else {
                    None
                }
            }
        };

        if let Some(binding) = registered {
            if binding != configured {
                self.machine.config_mut().boss_key = binding;
                self.machine.persist();
            }
        }

        listener.spawn_listener(self.slot.clone(), self.event_tx.clone());
        self.hotkey = Some(listener);
    }

    /// One-second heartbeat for the statistics tracker
    fn spawn_tick_thread(&self) {
        let sender = self.event_tx.clone();
        std::thread::spawn(move || loop {
            std::thread::sleep(std::time::Duration::from_secs(1));
            if sender.send(AppEvent::Tick).is_err() {
                return;
            }
        });
    }

    fn handle_event(&mut self, event: AppEvent, event_loop: &ActiveEventLoop) {
        match event {
            AppEvent::BossKey => {
                // take/finish brackets the whole action sequence so
                // presses landing mid-execution are dropped by the slot
                if self.slot.take() {
                    self.machine.trigger(&self.adapter);
                    self.slot.finish();
                } else {
                    debug!("Boss key event without pending trigger, ignored");
                }
            }

            AppEvent::Tick => {
                self.machine.tick();
                if let Some(ref mut tray) = self.tray_manager {
                    tray.set_status(&self.machine.status_line());
                }
            }

            AppEvent::Tray(TrayAction::StartDisguise) => {
                let today = chrono::Local::now().date_naive();
                match self.machine.arm(&self.adapter, today) {
                    Ok(()) => {
                        if let Some(ref window) = self.window {
                            window.set_visible(false);
                        }
                        if let Some(ref mut tray) = self.tray_manager {
                            tray.set_armed(true);
                        }
                    }
                    Err(e) => {
                        warn!("Arming refused: {}", e);
                        show_report(&e);
                    }
                }
            }

            AppEvent::Tray(TrayAction::ShowWindow) => {
                self.machine.disarm();
                if let Some(ref mut tray) = self.tray_manager {
                    tray.set_armed(false);
                }
                if let Some(ref window) = self.window {
                    window.set_visible(true);
                    window.focus_window();
                }
            }

            AppEvent::Tray(TrayAction::Quit) => {
                info!("Quit requested from tray");
                event_loop.exit();
            }
        }

        for report in self.machine.take_reports() {
            show_report(&report);
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        event_loop.set_control_flow(ControlFlow::Wait);

        if self.initialized {
            return;
        }
        self.initialized = true;

        let attributes = Window::default_attributes()
            .with_title("DeskMask")
            .with_inner_size(LogicalSize::new(420.0, 240.0));
        match event_loop.create_window(attributes) {
            Ok(window) => self.window = Some(window),
            Err(e) => error!("Failed to create controller window: {}", e),
        }

        match TrayManager::new(self.event_tx.clone()) {
            Ok(tray) => {
                self.tray_manager = Some(tray);
                info!("Tray manager initialized");
            }
            Err(e) => {
                error!("Failed to initialize tray manager: {}", e);
            }
        }

        self.setup_hotkey();
        self.spawn_tick_thread();
    }

    fn window_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        let ours = self
            .window
            .as_ref()
            .is_some_and(|window| window.id() == window_id);
        if !ours {
            return;
        }

        if let WindowEvent::CloseRequested = event {
            // the tray Quit item is the real exit; closing hides
            if let Some(ref window) = self.window {
                window.set_visible(false);
            }
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let events: Vec<AppEvent> = if let Some(ref mut rx) = self.event_rx {
            let mut events = Vec::new();
            while let Ok(event) = rx.try_recv() {
                events.push(event);
            }
            events
        } else {
            Vec::new()
        };

        for event in events {
            self.handle_event(event, event_loop);
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        info!("Application exiting, saving state...");

        if let Some(ref mut hotkey) = self.hotkey {
            hotkey.unregister();
        }
        self.machine.persist();
        // reports accumulated at exit only go to the log
        for report in self.machine.take_reports() {
            warn!("{}", report);
        }
    }
}

/// Surface a best-effort failure to the user
fn show_report(error: &Error) {
    rfd::MessageDialog::new()
        .set_title("DeskMask")
        .set_description(error.to_string())
        .set_buttons(rfd::MessageButtons::Ok)
        .set_level(rfd::MessageLevel::Warning)
        .show();
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting DeskMask");

    // Load the shared configuration record from beside the executable
    let config_path = Config::default_path();
    let config = Config::load(&config_path);
    info!("Configuration loaded from {:?}", config_path);

    let machine = Camouflage::new(config, config_path, payload::install_dir());

    // Create event channel
    let (event_tx, event_rx) = mpsc::unbounded_channel();

    // Create event loop
    let event_loop = EventLoop::new()?;

    // Create EventSender that wraps the channel + event loop proxy for wake-up
    let proxy = event_loop.create_proxy();
    let event_sender = EventSender::new(event_tx, proxy);

    let mut app = App::new(machine, event_sender, event_rx);

    // Run event loop
    event_loop.run_app(&mut app)?;

    Ok(())
}
