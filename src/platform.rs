//! Platform capabilities used by the clean engine.
//!
//! Everything that differs per operating system sits behind [`Platform`], and
//! [`SystemPlatform`] is the implementation selected at compile time for the host.

use crate::error::{FailureKind, ToleratedFailure};
use crate::registry::LocationEntry;
use std::fs;
use std::io;
use std::path::Path;
use std::process::Command;

pub trait Platform: Send + Sync {
    /// Whether the current process holds elevated privileges.
    fn is_elevated(&self) -> bool;

    /// Empty the trash store described by `entry` with the platform's dedicated command.
    fn purge_trash(&self, entry: &LocationEntry) -> Result<(), ToleratedFailure>;

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    fn remove_dir(&self, path: &Path) -> io::Result<()> {
        fs::remove_dir(path)
    }
}

/// The host operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemPlatform;

impl SystemPlatform {
    pub fn new() -> Self {
        Self
    }
}

impl Platform for SystemPlatform {
    fn is_elevated(&self) -> bool {
        is_elevated()
    }

    fn purge_trash(&self, entry: &LocationEntry) -> Result<(), ToleratedFailure> {
        purge_trash(entry)
    }

    #[cfg(windows)]
    fn remove_file(&self, path: &Path) -> io::Result<()> {
        match fs::remove_file(path) {
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                // Read-only files refuse deletion until the attribute is cleared.
                clear_readonly(path)?;
                fs::remove_file(path)
            }
            other => other,
        }
    }
}

#[cfg(windows)]
fn clear_readonly(path: &Path) -> io::Result<()> {
    let mut perms = fs::metadata(path)?.permissions();
    if perms.readonly() {
        #[allow(clippy::permissions_set_readonly_false)]
        perms.set_readonly(false);
        fs::set_permissions(path, perms)?;
    }
    Ok(())
}

/// Check whether the current process token is elevated.
#[cfg(windows)]
pub fn is_elevated() -> bool {
    use windows::Win32::Foundation::{CloseHandle, HANDLE};
    use windows::Win32::Security::{
        GetTokenInformation, TokenElevation, TOKEN_ELEVATION, TOKEN_QUERY,
    };
    use windows::Win32::System::Threading::{GetCurrentProcess, OpenProcessToken};

    unsafe {
        let mut token_handle = HANDLE::default();
        if OpenProcessToken(GetCurrentProcess(), TOKEN_QUERY, &mut token_handle).is_err() {
            return false;
        }

        let mut elevation = TOKEN_ELEVATION::default();
        let mut return_length = 0u32;
        let result = GetTokenInformation(
            token_handle,
            TokenElevation,
            Some(&mut elevation as *mut _ as *mut _),
            std::mem::size_of::<TOKEN_ELEVATION>() as u32,
            &mut return_length,
        );

        let _ = CloseHandle(token_handle);
        result.is_ok() && elevation.TokenIsElevated != 0
    }
}

/// Check whether the effective user is root.
#[cfg(unix)]
pub fn is_elevated() -> bool {
    // SAFETY: geteuid has no preconditions and cannot fail.
    unsafe { libc::geteuid() == 0 }
}

#[cfg(windows)]
fn purge_trash(entry: &LocationEntry) -> Result<(), ToleratedFailure> {
    let mut cmd = Command::new("PowerShell.exe");
    cmd.args([
        "-NoProfile",
        "-NonInteractive",
        "-Command",
        "Clear-RecycleBin -Force -ErrorAction SilentlyContinue",
    ]);
    run_purge(entry, cmd).map(|_| ())
}

#[cfg(target_os = "macos")]
fn purge_trash(entry: &LocationEntry) -> Result<(), ToleratedFailure> {
    let mut cmd = Command::new("osascript");
    cmd.args(["-e", "tell application \"Finder\" to empty trash"]);
    run_purge(entry, cmd).map(|_| ())
}

#[cfg(all(unix, not(target_os = "macos")))]
fn purge_trash(entry: &LocationEntry) -> Result<(), ToleratedFailure> {
    let mut cmd = Command::new("gio");
    cmd.args(["trash", "--empty"]);
    match run_purge(entry, cmd) {
        Ok(PurgeOutcome::Done) => Ok(()),
        // No gio on this system: purge through the freedesktop trash directly.
        Ok(PurgeOutcome::CommandMissing) => crate::trash_ops::purge_everything()
            .map(|count| {
                tracing::debug!(count, "purged trash items without gio");
            })
            .map_err(|e| {
                ToleratedFailure::new(trash_path(entry), FailureKind::TrashPurgeFailed, e.to_string())
            }),
        Err(failure) => Err(failure),
    }
}

enum PurgeOutcome {
    Done,
    #[cfg_attr(not(all(unix, not(target_os = "macos"))), allow(dead_code))]
    CommandMissing,
}

fn run_purge(entry: &LocationEntry, mut cmd: Command) -> Result<PurgeOutcome, ToleratedFailure> {
    let program = cmd.get_program().to_string_lossy().into_owned();
    tracing::debug!(%program, label = %entry.label, "running trash purge command");

    match cmd.output() {
        Ok(output) if output.status.success() => Ok(PurgeOutcome::Done),
        Ok(output) => {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(ToleratedFailure::new(
                trash_path(entry),
                FailureKind::TrashPurgeFailed,
                format!("{} exited with {}: {}", program, output.status, stderr.trim()),
            ))
        }
        #[cfg(all(unix, not(target_os = "macos")))]
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(PurgeOutcome::CommandMissing),
        Err(e) => Err(ToleratedFailure::new(
            trash_path(entry),
            FailureKind::TrashPurgeFailed,
            format!("failed to run {}: {}", program, e),
        )),
    }
}

fn trash_path(entry: &LocationEntry) -> std::path::PathBuf {
    entry
        .paths
        .first()
        .cloned()
        .unwrap_or_else(|| std::path::PathBuf::from(&entry.label))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_default_remove_file_and_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let dir = temp_dir.path().join("d");
        let file = dir.join("f.txt");
        fs::create_dir(&dir).unwrap();
        fs::write(&file, "x").unwrap();

        let platform = SystemPlatform::new();
        platform.remove_file(&file).unwrap();
        platform.remove_dir(&dir).unwrap();
        assert!(!dir.exists());
    }

    #[test]
    fn test_remove_missing_file_is_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        let platform = SystemPlatform::new();
        assert!(platform.remove_file(&temp_dir.path().join("nope")).is_err());
    }

    #[test]
    fn test_trash_path_falls_back_to_label() {
        let entry = LocationEntry::trash("Trash", vec![]);
        assert_eq!(trash_path(&entry), PathBuf::from("Trash"));
    }
}
