//! Camouflage state machine
//!
//! Owns the explicit context (configuration, mode, ledger, captured mute
//! state) and turns each boss-key trigger into the ordered side-effect
//! sequence for one transition direction. Side-effect steps are
//! independent and best-effort: a failing step is logged and later steps
//! still run. Only the arming precondition is a hard-fail point.

use crate::core::config::{ActionSet, Config};
use crate::core::ledger::WindowLedger;
use crate::error::{Error, PayloadKind};
use crate::os::{DesktopAdapter, CLOSE_GRACE};
use crate::payload;
use chrono::NaiveDate;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Where the tool is in its disguise lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeState {
    /// Not armed; the boss key is inert
    Inactive,
    /// Armed, desktop in its normal-work shape
    BossAway,
    /// Armed, desktop disguised
    BossPresent,
}

/// Transition direction for one ActionSet execution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    /// Boss arrived: into cover
    IntoCover,
    /// Boss left: back to normal
    OutOfCover,
}

pub struct Camouflage {
    config: Config,
    config_path: PathBuf,
    install_dir: PathBuf,
    mode: ModeState,
    ledger: WindowLedger,
    /// Mute state captured before the into-cover transition muted the system
    was_muted: bool,
    /// User-facing reports accumulated during best-effort execution
    reports: Vec<Error>,
}

impl Camouflage {
    pub fn new(config: Config, config_path: PathBuf, install_dir: PathBuf) -> Self {
        Self {
            config,
            config_path,
            install_dir,
            mode: ModeState::Inactive,
            ledger: WindowLedger::new(),
            was_muted: false,
            reports: Vec::new(),
        }
    }

    pub fn mode(&self) -> ModeState {
        self.mode
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Mutable access for the shell to write back adjustments made at
    /// startup (the effective boss key); pair with [`Camouflage::persist`].
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// Drain the user-facing reports collected since the last call
    pub fn take_reports(&mut self) -> Vec<Error> {
        std::mem::take(&mut self.reports)
    }

    /// Arm disguise mode.
    ///
    /// Hard precondition: both payload executables must exist. Resets the
    /// statistics on day rollover, persists the record, clears the ledger
    /// and moves to [`ModeState::BossAway`]. The caller hides the
    /// controller window afterwards.
    pub fn arm<A: DesktopAdapter>(&mut self, adapter: &A, today: NaiveDate) -> Result<(), Error> {
        if self.mode != ModeState::Inactive {
            debug!("Already armed, ignoring arm request");
            return Ok(());
        }

        payload::resolve(PayloadKind::Reader, &self.install_dir)?;
        payload::resolve(PayloadKind::Player, &self.install_dir)?;

        self.config.stats.on_armed(today);
        self.persist();
        self.ledger = WindowLedger::new();
        self.mode = ModeState::BossAway;
        info!("Disguise mode armed, boss key is live");

        if self.config.open_reader_when_armed && !self.config.reader_dir.is_empty() {
            self.launch_payload(adapter, PayloadKind::Reader);
        }
        if self.config.open_player_when_armed && !self.config.player_dir.is_empty() {
            self.launch_payload(adapter, PayloadKind::Player);
        }
        Ok(())
    }

    /// Show-window/stop action: the hotkey becomes inert again. No
    /// reverse ActionSet runs; the desktop is left as it stands.
    pub fn disarm(&mut self) {
        if self.mode != ModeState::Inactive {
            info!("Disguise mode disarmed");
        }
        self.mode = ModeState::Inactive;
        self.persist();
    }

    /// One boss-key trigger. Returns the new mode, or `None` when the
    /// trigger was inert (not armed).
    pub fn trigger<A: DesktopAdapter>(&mut self, adapter: &A) -> Option<ModeState> {
        match self.mode {
            ModeState::Inactive => None,
            ModeState::BossAway => {
                info!("Boss arrived, switching into cover");
                let set = self.config.on_boss_coming.clone();
                self.execute(adapter, &set, Direction::IntoCover);
                self.mode = ModeState::BossPresent;
                self.persist();
                Some(self.mode)
            }
            ModeState::BossPresent => {
                info!("Boss left, restoring normal desktop");
                let set = self.config.on_boss_leaving.clone();
                self.execute(adapter, &set, Direction::OutOfCover);
                self.mode = ModeState::BossAway;
                self.persist();
                Some(self.mode)
            }
        }
    }

    /// One elapsed second while armed
    pub fn tick(&mut self) {
        if self.mode != ModeState::Inactive {
            self.config.stats.tick();
        }
    }

    /// Tray tooltip line
    pub fn status_line(&self) -> String {
        self.config.stats.snapshot()
    }

    /// Persist the configuration record; a write failure is reported and
    /// the in-memory record stays authoritative for the session.
    pub fn persist(&mut self) {
        if let Err(e) = self.config.save(&self.config_path) {
            warn!("{}", e);
            self.reports.push(e);
        }
    }

    /// Run one ActionSet in the fixed step order.
    fn execute<A: DesktopAdapter>(&mut self, adapter: &A, set: &ActionSet, direction: Direction) {
        // 1. Launch open targets: apps directly, files/URLs via the shell
        for app in &set.open_apps {
            if app.is_empty() {
                continue;
            }
            if let Err(e) = adapter.spawn(std::path::Path::new(app), None) {
                warn!("Open-app step failed: {}", e);
            }
        }
        for target in set.open_files.iter().chain(&set.open_urls) {
            if target.is_empty() {
                continue;
            }
            if let Err(e) = adapter.open_target(target) {
                warn!("Open-target step failed: {}", e);
            }
        }

        // 2. Close matching processes, payload toggles included
        let mut close_patterns: Vec<&str> = set.close_apps.iter().map(String::as_str).collect();
        if set.close_reader {
            close_patterns.push(payload::process_name(PayloadKind::Reader));
        }
        if set.close_player {
            close_patterns.push(payload::process_name(PayloadKind::Player));
        }
        for pattern in close_patterns {
            if pattern.is_empty() {
                continue;
            }
            for process in adapter.find_processes(pattern) {
                if let Err(e) = adapter.close_or_kill(&process, CLOSE_GRACE) {
                    warn!("Close step failed: {}", e);
                }
            }
        }

        // 3. Minimize matching windows into the ledger
        for pattern in &set.minimize_apps {
            if pattern.is_empty() {
                continue;
            }
            for process in adapter.find_processes(pattern) {
                let Some(window) = process.main_window else {
                    continue;
                };
                match adapter.minimize(window) {
                    Ok(()) => self.ledger.record(window),
                    Err(e) => warn!("Minimize step failed: {}", e),
                }
            }
        }

        // 4. Mute handling. The toggle lives on the into-cover set; the
        // pre-cover mute state is captured going in and reinstated going
        // out. set_muted pre-checks, so a double trigger cannot flip twice.
        if self.config.on_boss_coming.mute_on_minimize {
            match direction {
                Direction::IntoCover => {
                    self.was_muted = adapter.query_mute().unwrap_or(false);
                    if let Err(e) = adapter.set_muted(true) {
                        warn!("Mute step failed: {}", e);
                    }
                }
                Direction::OutOfCover => {
                    if let Err(e) = adapter.set_muted(self.was_muted) {
                        warn!("Unmute step failed: {}", e);
                    }
                }
            }
        }

        // 5. Statistics
        if direction == Direction::IntoCover {
            self.config.stats.record_visit();
        }

        // 6. Restore the ledgered windows; stale handles are skipped
        // silently and the ledger empties unconditionally
        if direction == Direction::OutOfCover && set.restore_minimized {
            for window in self.ledger.drain() {
                if !adapter.is_window_alive(window) {
                    debug!("Skipping stale window handle {window:#x}");
                    continue;
                }
                if let Err(e) = adapter.restore(window) {
                    warn!("Restore step failed: {}", e);
                }
            }
        }

        // 7. Relaunch payloads on the way out
        if direction == Direction::OutOfCover {
            if set.restore_reader && !self.config.reader_dir.is_empty() {
                self.launch_payload(adapter, PayloadKind::Reader);
            }
            if set.restore_player && !self.config.player_dir.is_empty() {
                self.launch_payload(adapter, PayloadKind::Player);
            }
        }
    }

    fn launch_payload<A: DesktopAdapter>(&mut self, adapter: &A, kind: PayloadKind) {
        let content_dir = match kind {
            PayloadKind::Reader => self.config.reader_dir.clone(),
            PayloadKind::Player => self.config.player_dir.clone(),
        };
        if let Err(e) = payload::launch(adapter, kind, &self.install_dir, &content_dir) {
            warn!("{} payload launch failed: {}", kind, e);
            // PayloadMissing is surfaced to the user, not just logged
            if matches!(e, Error::PayloadMissing { .. }) {
                self.reports.push(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::os::{ProcessInfo, WindowHandle};
    use std::cell::RefCell;
    use std::path::Path;
    use std::time::Duration;

    /// Scripted desktop that records every side effect
    #[derive(Default)]
    struct MockDesktop {
        processes: Vec<ProcessInfo>,
        muted: RefCell<bool>,
        dead_windows: Vec<WindowHandle>,
        calls: RefCell<Vec<String>>,
    }

    impl MockDesktop {
        fn with_process(name: &str, pid: u32, window: WindowHandle) -> Self {
            Self {
                processes: vec![ProcessInfo {
                    pid,
                    name: name.to_string(),
                    main_window: Some(window),
                }],
                ..Default::default()
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.borrow().clone()
        }
    }

    impl DesktopAdapter for MockDesktop {
        fn find_processes(&self, pattern: &str) -> Vec<ProcessInfo> {
            self.processes
                .iter()
                .filter(|p| crate::os::name_matches(&p.name, pattern))
                .cloned()
                .collect()
        }

        fn close_or_kill(&self, process: &ProcessInfo, _timeout: Duration) -> Result<()> {
            self.calls.borrow_mut().push(format!("close {}", process.name));
            Ok(())
        }

        fn minimize(&self, window: WindowHandle) -> Result<()> {
            self.calls.borrow_mut().push(format!("minimize {window}"));
            Ok(())
        }

        fn restore(&self, window: WindowHandle) -> Result<()> {
            self.calls.borrow_mut().push(format!("restore {window}"));
            Ok(())
        }

        fn is_window_alive(&self, window: WindowHandle) -> bool {
            !self.dead_windows.contains(&window)
        }

        fn query_mute(&self) -> Result<bool> {
            Ok(*self.muted.borrow())
        }

        fn toggle_mute(&self) -> Result<()> {
            let mut muted = self.muted.borrow_mut();
            *muted = !*muted;
            self.calls.borrow_mut().push("toggle_mute".to_string());
            Ok(())
        }

        fn open_target(&self, target: &str) -> Result<()> {
            self.calls.borrow_mut().push(format!("open {target}"));
            Ok(())
        }

        fn spawn(&self, program: &Path, arg: Option<&str>) -> Result<()> {
            self.calls
                .borrow_mut()
                .push(format!("spawn {} {:?}", program.display(), arg));
            Ok(())
        }
    }

    fn day(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    /// Install dir with both payload executables present
    fn install_dir_with_payloads() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for kind in [PayloadKind::Reader, PayloadKind::Player] {
            std::fs::write(dir.path().join(payload::executable_name(kind)), b"").unwrap();
        }
        dir
    }

    fn machine_in(dir: &tempfile::TempDir, config: Config) -> Camouflage {
        Camouflage::new(
            config,
            dir.path().join("settings.json"),
            dir.path().to_path_buf(),
        )
    }

    #[test]
    fn test_arm_fails_without_payloads() {
        let dir = tempfile::tempdir().unwrap();
        let mut machine = machine_in(&dir, Config::default());
        let err = machine.arm(&MockDesktop::default(), day("2026-08-27")).unwrap_err();
        assert!(matches!(err, Error::PayloadMissing { .. }));
        assert_eq!(machine.mode(), ModeState::Inactive);
    }

    #[test]
    fn test_arm_then_trigger_cycle() {
        let dir = install_dir_with_payloads();
        let mut machine = machine_in(&dir, Config::default());
        let desktop = MockDesktop::default();

        machine.arm(&desktop, day("2026-08-27")).unwrap();
        assert_eq!(machine.mode(), ModeState::BossAway);

        assert_eq!(machine.trigger(&desktop), Some(ModeState::BossPresent));
        assert_eq!(machine.config().stats.boss_visit_count, 1);

        assert_eq!(machine.trigger(&desktop), Some(ModeState::BossAway));
        assert_eq!(machine.config().stats.boss_visit_count, 1);
    }

    #[test]
    fn test_trigger_while_inactive_is_inert() {
        let dir = tempfile::tempdir().unwrap();
        let mut machine = machine_in(&dir, Config::default());
        let desktop = MockDesktop::with_process("notepad", 100, 42);
        assert_eq!(machine.trigger(&desktop), None);
        assert!(desktop.calls().is_empty());
    }

    #[test]
    fn test_minimize_records_and_restore_drains() {
        let dir = install_dir_with_payloads();
        let mut config = Config::default();
        config.on_boss_coming.minimize_apps.push("notepad".to_string());
        config.on_boss_leaving.restore_minimized = true;
        let mut machine = machine_in(&dir, config);
        let desktop = MockDesktop::with_process("notepad", 100, 42);

        machine.arm(&desktop, day("2026-08-27")).unwrap();
        machine.trigger(&desktop);
        assert_eq!(machine.ledger.len(), 1);

        machine.trigger(&desktop);
        assert!(machine.ledger.is_empty());
        let calls = desktop.calls();
        assert!(calls.contains(&"minimize 42".to_string()));
        assert!(calls.contains(&"restore 42".to_string()));
    }

    #[test]
    fn test_stale_handles_skipped_but_ledger_clears() {
        let dir = install_dir_with_payloads();
        let mut config = Config::default();
        config.on_boss_coming.minimize_apps.push("notepad".to_string());
        config.on_boss_leaving.restore_minimized = true;
        let mut machine = machine_in(&dir, config);

        let mut desktop = MockDesktop::with_process("notepad", 100, 42);
        machine.arm(&desktop, day("2026-08-27")).unwrap();
        machine.trigger(&desktop);

        // window dies while the boss is around
        desktop.dead_windows.push(42);
        machine.trigger(&desktop);
        assert!(machine.ledger.is_empty());
        assert!(!desktop.calls().contains(&"restore 42".to_string()));
    }

    #[test]
    fn test_mute_captured_and_reinstated() {
        let dir = install_dir_with_payloads();
        let mut config = Config::default();
        config.on_boss_coming.mute_on_minimize = true;
        let mut machine = machine_in(&dir, config);
        let desktop = MockDesktop::default();

        machine.arm(&desktop, day("2026-08-27")).unwrap();
        machine.trigger(&desktop);
        assert!(*desktop.muted.borrow());

        machine.trigger(&desktop);
        assert!(!*desktop.muted.borrow());
    }

    #[test]
    fn test_mute_already_on_is_not_toggled_off() {
        let dir = install_dir_with_payloads();
        let mut config = Config::default();
        config.on_boss_coming.mute_on_minimize = true;
        let mut machine = machine_in(&dir, config);
        let desktop = MockDesktop::default();
        *desktop.muted.borrow_mut() = true;

        machine.arm(&desktop, day("2026-08-27")).unwrap();
        machine.trigger(&desktop);
        // already muted: no toggle fired
        assert!(desktop.calls().iter().all(|c| c != "toggle_mute"));

        machine.trigger(&desktop);
        // was muted before cover, stays muted after
        assert!(*desktop.muted.borrow());
    }

    #[test]
    fn test_close_payload_toggles() {
        let dir = install_dir_with_payloads();
        let mut config = Config::default();
        config.on_boss_coming.close_reader = true;
        let mut machine = machine_in(&dir, config);
        let desktop = MockDesktop::with_process("deskmask-reader", 7, 9);

        machine.arm(&desktop, day("2026-08-27")).unwrap();
        machine.trigger(&desktop);
        assert!(desktop.calls().contains(&"close deskmask-reader".to_string()));
    }

    #[test]
    fn test_restore_payload_on_leave() {
        let dir = install_dir_with_payloads();
        let mut config = Config::default();
        config.reader_dir = "/tmp/books".to_string();
        config.on_boss_leaving.restore_reader = true;
        let mut machine = machine_in(&dir, config);
        let desktop = MockDesktop::default();

        machine.arm(&desktop, day("2026-08-27")).unwrap();
        machine.trigger(&desktop);
        machine.trigger(&desktop);

        let reader = dir.path().join(payload::executable_name(PayloadKind::Reader));
        assert!(desktop
            .calls()
            .contains(&format!("spawn {} {:?}", reader.display(), Some("/tmp/books"))));
    }

    #[test]
    fn test_arm_resets_stats_on_new_day() {
        let dir = install_dir_with_payloads();
        let mut config = Config::default();
        config.stats.boss_visit_count = 9;
        config.stats.cover_seconds = 1234;
        config.stats.last_active_date = Some(day("2026-08-26"));
        let mut machine = machine_in(&dir, config);

        machine.arm(&MockDesktop::default(), day("2026-08-27")).unwrap();
        assert_eq!(machine.config().stats.boss_visit_count, 0);
        assert_eq!(machine.config().stats.cover_seconds, 0);
    }

    #[test]
    fn test_disarm_goes_inactive_without_side_effects() {
        let dir = install_dir_with_payloads();
        let mut machine = machine_in(&dir, Config::default());
        let desktop = MockDesktop::with_process("notepad", 100, 42);

        machine.arm(&desktop, day("2026-08-27")).unwrap();
        machine.trigger(&desktop);
        let before = desktop.calls().len();
        machine.disarm();
        assert_eq!(machine.mode(), ModeState::Inactive);
        assert_eq!(desktop.calls().len(), before);
    }

    #[test]
    fn test_tick_accumulates_only_while_armed() {
        let dir = install_dir_with_payloads();
        let mut machine = machine_in(&dir, Config::default());
        machine.tick();
        assert_eq!(machine.config().stats.cover_seconds, 0);

        machine.arm(&MockDesktop::default(), day("2026-08-27")).unwrap();
        machine.tick();
        machine.tick();
        assert_eq!(machine.config().stats.cover_seconds, 2);
    }
}
