//! End-to-end camouflage flow tests
//!
//! Drives the state machine through the public API with a scripted
//! desktop adapter standing in for the OS.

use chrono::NaiveDate;
use deskmask::core::config::{Config, CONFIG_FILE};
use deskmask::core::events::TriggerSlot;
use deskmask::core::machine::{Camouflage, ModeState};
use deskmask::os::{name_matches, ProcessInfo, WindowHandle};
use deskmask::{DesktopAdapter, Error, PayloadKind};
use std::cell::RefCell;
use std::path::Path;
use std::time::Duration;

#[derive(Default)]
struct ScriptedDesktop {
    processes: Vec<ProcessInfo>,
    muted: RefCell<bool>,
    ops: RefCell<Vec<String>>,
}

impl ScriptedDesktop {
    fn ops(&self) -> Vec<String> {
        self.ops.borrow().clone()
    }
}

impl DesktopAdapter for ScriptedDesktop {
    fn find_processes(&self, pattern: &str) -> Vec<ProcessInfo> {
        self.processes
            .iter()
            .filter(|p| name_matches(&p.name, pattern))
            .cloned()
            .collect()
    }

    fn close_or_kill(&self, process: &ProcessInfo, _timeout: Duration) -> deskmask::error::Result<()> {
        self.ops.borrow_mut().push(format!("close {}", process.name));
        Ok(())
    }

    fn minimize(&self, window: WindowHandle) -> deskmask::error::Result<()> {
        self.ops.borrow_mut().push(format!("minimize {window}"));
        Ok(())
    }

    fn restore(&self, window: WindowHandle) -> deskmask::error::Result<()> {
        self.ops.borrow_mut().push(format!("restore {window}"));
        Ok(())
    }

    fn is_window_alive(&self, _window: WindowHandle) -> bool {
        true
    }

    fn query_mute(&self) -> deskmask::error::Result<bool> {
        Ok(*self.muted.borrow())
    }

    fn toggle_mute(&self) -> deskmask::error::Result<()> {
        let mut muted = self.muted.borrow_mut();
        *muted = !*muted;
        Ok(())
    }

    fn open_target(&self, target: &str) -> deskmask::error::Result<()> {
        self.ops.borrow_mut().push(format!("open {target}"));
        Ok(())
    }

    fn spawn(&self, program: &Path, _arg: Option<&str>) -> deskmask::error::Result<()> {
        self.ops.borrow_mut().push(format!("spawn {}", program.display()));
        Ok(())
    }
}

fn today() -> NaiveDate {
    "2026-08-27".parse().unwrap()
}

/// Install dir containing both payload executables and nothing else
fn install_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    for name in ["deskmask-reader", "deskmask-player"] {
        let file = format!("{name}{}", std::env::consts::EXE_SUFFIX);
        std::fs::write(dir.path().join(file), b"").unwrap();
    }
    dir
}

fn office_config() -> Config {
    let mut config = Config::default();
    config.on_boss_coming.minimize_apps.push("chatapp".to_string());
    config.on_boss_coming.close_apps.push("game".to_string());
    config.on_boss_coming.mute_on_minimize = true;
    config.on_boss_coming.open_urls.push("https://intranet.example".to_string());
    config.on_boss_leaving.restore_minimized = true;
    config
}

fn desktop_with(windows: &[(&str, u32, WindowHandle)]) -> ScriptedDesktop {
    ScriptedDesktop {
        processes: windows
            .iter()
            .map(|(name, pid, window)| ProcessInfo {
                pid: *pid,
                name: name.to_string(),
                main_window: Some(*window),
            })
            .collect(),
        ..Default::default()
    }
}

#[test]
fn test_full_boss_cycle() {
    let dir = install_dir();
    let mut machine = Camouflage::new(
        office_config(),
        dir.path().join(CONFIG_FILE),
        dir.path().to_path_buf(),
    );
    let desktop = desktop_with(&[("chatapp", 10, 101), ("game", 11, 111)]);

    machine.arm(&desktop, today()).unwrap();
    assert_eq!(machine.mode(), ModeState::BossAway);

    // boss arrives
    assert_eq!(machine.trigger(&desktop), Some(ModeState::BossPresent));
    let ops = desktop.ops();
    assert!(ops.contains(&"open https://intranet.example".to_string()));
    assert!(ops.contains(&"close game".to_string()));
    assert!(ops.contains(&"minimize 101".to_string()));
    assert!(*desktop.muted.borrow());

    // boss leaves
    assert_eq!(machine.trigger(&desktop), Some(ModeState::BossAway));
    assert!(desktop.ops().contains(&"restore 101".to_string()));
    assert!(!*desktop.muted.borrow());
}

#[test]
fn test_statistics_survive_on_disk() {
    let dir = install_dir();
    let config_path = dir.path().join(CONFIG_FILE);
    let mut machine = Camouflage::new(
        office_config(),
        config_path.clone(),
        dir.path().to_path_buf(),
    );
    let desktop = desktop_with(&[("chatapp", 10, 101)]);

    machine.arm(&desktop, today()).unwrap();
    machine.trigger(&desktop);
    machine.trigger(&desktop);
    machine.trigger(&desktop);

    // two visits recorded and persisted
    let reloaded = Config::load(&config_path);
    assert_eq!(reloaded.stats.boss_visit_count, 2);
    assert_eq!(reloaded.stats.last_active_date, Some(today()));
}

#[test]
fn test_arm_refused_when_payloads_missing() {
    let dir = tempfile::tempdir().unwrap();
    let mut machine = Camouflage::new(
        Config::default(),
        dir.path().join(CONFIG_FILE),
        dir.path().to_path_buf(),
    );
    let err = machine.arm(&ScriptedDesktop::default(), today()).unwrap_err();
    assert!(matches!(
        err,
        Error::PayloadMissing {
            kind: PayloadKind::Reader,
            ..
        }
    ));
    assert_eq!(machine.mode(), ModeState::Inactive);
    assert_eq!(machine.trigger(&ScriptedDesktop::default()), None);
}

#[test]
fn test_double_press_is_one_transition() {
    let dir = install_dir();
    let mut machine = Camouflage::new(
        office_config(),
        dir.path().join(CONFIG_FILE),
        dir.path().to_path_buf(),
    );
    let desktop = desktop_with(&[("chatapp", 10, 101)]);
    machine.arm(&desktop, today()).unwrap();

    let slot = TriggerSlot::new();

    // two presses land before the main loop services the first
    assert!(slot.post());
    assert!(!slot.post());

    if slot.take() {
        machine.trigger(&desktop);
        slot.finish();
    }
    assert_eq!(machine.mode(), ModeState::BossPresent);

    // the second press was dropped: nothing left to service
    assert!(!slot.take());
    assert_eq!(machine.mode(), ModeState::BossPresent);
}

#[test]
fn test_trigger_mid_execution_dropped() {
    let slot = TriggerSlot::new();
    assert!(slot.post());
    assert!(slot.take());
    // a press during the action sequence is lost, not queued
    assert!(!slot.post());
    slot.finish();
    assert!(!slot.take());
}
