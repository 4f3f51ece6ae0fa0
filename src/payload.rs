//! Disguise payload resolution and launch
//!
//! The reader and player are separate executables shipped with the
//! controller. The controller only starts them with the content directory
//! as the single argument; they read the shared configuration file on
//! their own.

use crate::error::{Error, PayloadKind, Result};
use crate::os::DesktopAdapter;
use std::path::{Path, PathBuf};
use tracing::info;

/// Executable file name for a payload, platform suffix included
pub fn executable_name(kind: PayloadKind) -> String {
    let stem = process_name(kind);
    format!("{stem}{}", std::env::consts::EXE_SUFFIX)
}

/// Process image name (no extension) for close-pattern matching
pub fn process_name(kind: PayloadKind) -> &'static str {
    match kind {
        PayloadKind::Reader => "deskmask-reader",
        PayloadKind::Player => "deskmask-player",
    }
}

fn install_subdir(kind: PayloadKind) -> &'static str {
    match kind {
        PayloadKind::Reader => "reader",
        PayloadKind::Player => "player",
    }
}

/// Locate a payload executable: primary location is next to the
/// controller, fallback is the payload's install sub-folder.
pub fn resolve(kind: PayloadKind, install_dir: &Path) -> Result<PathBuf> {
    let name = executable_name(kind);
    let primary = install_dir.join(&name);
    if primary.is_file() {
        return Ok(primary);
    }
    let fallback = install_dir.join(install_subdir(kind)).join(&name);
    if fallback.is_file() {
        return Ok(fallback);
    }
    Err(Error::PayloadMissing {
        kind,
        path: fallback,
    })
}

/// Start a payload with the content directory argument
pub fn launch<A: DesktopAdapter + ?Sized>(
    adapter: &A,
    kind: PayloadKind,
    install_dir: &Path,
    content_dir: &str,
) -> Result<()> {
    let exe = resolve(kind, install_dir)?;
    info!("Launching {} payload: {:?} {:?}", kind, exe, content_dir);
    adapter.spawn(&exe, Some(content_dir))
}

/// Directory the controller executable lives in
pub fn install_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_primary_location() {
        let dir = tempfile::tempdir().unwrap();
        let exe = dir.path().join(executable_name(PayloadKind::Reader));
        std::fs::write(&exe, b"").unwrap();
        assert_eq!(resolve(PayloadKind::Reader, dir.path()).unwrap(), exe);
    }

    #[test]
    fn test_resolve_fallback_subfolder() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("player");
        std::fs::create_dir(&sub).unwrap();
        let exe = sub.join(executable_name(PayloadKind::Player));
        std::fs::write(&exe, b"").unwrap();
        assert_eq!(resolve(PayloadKind::Player, dir.path()).unwrap(), exe);
    }

    #[test]
    fn test_resolve_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve(PayloadKind::Reader, dir.path()).unwrap_err();
        assert!(matches!(
            err,
            Error::PayloadMissing {
                kind: PayloadKind::Reader,
                ..
            }
        ));
    }
}
