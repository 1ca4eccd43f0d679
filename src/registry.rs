//! Location registry
//!
//! The fixed, ordered set of cleanable locations for the current machine. It is
//! rebuilt from platform conventions on every scan or clean and never persisted.

use crate::error::RegistryError;
use crate::utils;
use directories::BaseDirs;
use serde::Serialize;
use std::collections::HashSet;
use std::env;
use std::path::{Path, PathBuf};
use tracing::debug;

/// How a location is cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationKind {
    /// Ordinary directory: contents are deleted recursively.
    Directory,
    /// Platform trash store: cleared with the platform's empty-trash command.
    Trash,
}

/// One named cleanable location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocationEntry {
    pub label: String,
    pub paths: Vec<PathBuf>,
    pub kind: LocationKind,
    /// System-owned location; cleaning it needs an elevated process.
    pub requires_elevation: bool,
}

impl LocationEntry {
    pub fn directory(label: impl Into<String>, paths: Vec<PathBuf>) -> Self {
        Self {
            label: label.into(),
            paths,
            kind: LocationKind::Directory,
            requires_elevation: false,
        }
    }

    pub fn trash(label: impl Into<String>, paths: Vec<PathBuf>) -> Self {
        Self {
            label: label.into(),
            paths,
            kind: LocationKind::Trash,
            requires_elevation: false,
        }
    }

    pub fn elevated(mut self) -> Self {
        self.requires_elevation = true;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct Registry {
    entries: Vec<LocationEntry>,
}

impl Registry {
    /// Build the registry for the running platform and user.
    pub fn detect() -> Result<Self, RegistryError> {
        let base = BaseDirs::new().ok_or(RegistryError::NoHomeDirectory)?;
        Self::from_entries(platform_entries(&base, &env::temp_dir()))
    }

    /// Validate and normalise a list of entries.
    ///
    /// Labels must be non-empty and unique. A path equal to, inside, or containing a
    /// path claimed by an earlier entry is dropped from the later entry so that no two
    /// locations ever cover the same files.
    pub fn from_entries(entries: Vec<LocationEntry>) -> Result<Self, RegistryError> {
        let mut labels = HashSet::new();
        let mut claimed: Vec<PathBuf> = Vec::new();
        let mut out = Vec::with_capacity(entries.len());

        for mut entry in entries {
            if entry.label.trim().is_empty() {
                return Err(RegistryError::EmptyLabel);
            }
            if !labels.insert(entry.label.clone()) {
                return Err(RegistryError::DuplicateLabel(entry.label));
            }

            let mut kept = Vec::with_capacity(entry.paths.len());
            for path in entry.paths.drain(..) {
                if claimed.iter().any(|c| utils::paths_overlap(c, &path)) {
                    debug!(
                        label = %entry.label,
                        path = %path.display(),
                        "dropping path already covered by another location"
                    );
                    continue;
                }
                claimed.push(path.clone());
                kept.push(path);
            }
            entry.paths = kept;
            out.push(entry);
        }

        Ok(Self { entries: out })
    }

    pub fn entries(&self) -> &[LocationEntry] {
        &self.entries
    }

    pub fn get(&self, label: &str) -> Option<&LocationEntry> {
        self.entries.iter().find(|e| e.label == label)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.label.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LocationEntry> {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &'a Registry {
    type Item = &'a LocationEntry;
    type IntoIter = std::slice::Iter<'a, LocationEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(windows)]
fn platform_entries(base: &BaseDirs, temp: &Path) -> Vec<LocationEntry> {
    let home = base.home_dir();
    let local = base.data_local_dir();
    let system_root = utils::env_path("SystemRoot");
    let system_drive = utils::env_path("SystemDrive");
    let documents = home.join("Documents");

    vec![
        LocationEntry::directory("System temp files", vec![temp.to_path_buf()]),
        LocationEntry::directory("WeChat files", vec![documents.join("WeChat Files")]),
        LocationEntry::directory("QQ files", vec![documents.join("Tencent Files")]),
        LocationEntry::directory(
            "Browser cache",
            vec![
                local.join(r"Google\Chrome\User Data\Default\Cache"),
                local.join(r"Microsoft\Edge\User Data\Default\Cache"),
                local.join(r"Mozilla\Firefox\Profiles"),
            ],
        ),
        LocationEntry::directory(
            "Windows Update cache",
            vec![system_root.join(r"SoftwareDistribution\Download")],
        )
        .elevated(),
        LocationEntry::directory("System logs", vec![system_root.join("Logs")]).elevated(),
        LocationEntry::directory("Application cache", vec![local.join("Temp")]),
        LocationEntry::directory("Error reports", vec![local.join(r"Microsoft\Windows\WER")]),
        LocationEntry::directory(
            "Thumbnail cache",
            vec![local.join(r"Microsoft\Windows\Explorer")],
        ),
        LocationEntry::trash(
            "Recycle bin",
            vec![PathBuf::from(format!(r"{}\$Recycle.Bin", system_drive.display()))],
        )
        .elevated(),
        LocationEntry::directory("Prefetch", vec![system_root.join("Prefetch")]).elevated(),
        LocationEntry::directory(
            "Font cache",
            vec![system_root.join(r"ServiceProfiles\LocalService\AppData\Local\FontCache")],
        )
        .elevated(),
        LocationEntry::directory("Installer cache", vec![system_root.join("Installer")])
            .elevated(),
    ]
}

#[cfg(target_os = "macos")]
fn platform_entries(base: &BaseDirs, temp: &Path) -> Vec<LocationEntry> {
    let home = base.home_dir();
    let caches = base.cache_dir();

    vec![
        LocationEntry::directory("Temporary files", vec![temp.to_path_buf()]),
        LocationEntry::directory(
            "Browser cache",
            vec![
                caches.join("Google/Chrome"),
                caches.join("com.microsoft.edgemac"),
                caches.join("Firefox"),
            ],
        ),
        LocationEntry::directory("User logs", vec![home.join("Library/Logs")]),
        LocationEntry::directory("System logs", vec![PathBuf::from("/private/var/log")])
            .elevated(),
        LocationEntry::directory(
            "Crash reports",
            vec![PathBuf::from("/Library/Logs/DiagnosticReports")],
        )
        .elevated(),
        LocationEntry::directory("Update cache", vec![PathBuf::from("/Library/Updates")])
            .elevated(),
        LocationEntry::trash("Trash", vec![home.join(".Trash")]),
    ]
}

#[cfg(all(unix, not(target_os = "macos")))]
fn platform_entries(base: &BaseDirs, temp: &Path) -> Vec<LocationEntry> {
    let caches = base.cache_dir();

    vec![
        LocationEntry::directory("Temporary files", vec![temp.to_path_buf()]),
        LocationEntry::directory(
            "Browser cache",
            vec![
                caches.join("google-chrome"),
                caches.join("chromium"),
                caches.join("microsoft-edge"),
                caches.join("mozilla/firefox"),
            ],
        ),
        LocationEntry::directory("Thumbnail cache", vec![caches.join("thumbnails")]),
        LocationEntry::directory("System logs", vec![PathBuf::from("/var/log")]).elevated(),
        LocationEntry::directory("Crash reports", vec![PathBuf::from("/var/crash")]).elevated(),
        LocationEntry::directory(
            "Package cache",
            vec![PathBuf::from("/var/cache/apt/archives")],
        )
        .elevated(),
        LocationEntry::trash("Trash", vec![base.data_dir().join("Trash")]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_is_stable() {
        let first = Registry::detect().unwrap();
        let second = Registry::detect().unwrap();
        assert_eq!(first.entries(), second.entries());
        assert!(!first.is_empty());
    }

    #[test]
    fn test_detect_has_exactly_one_trash_entry() {
        let registry = Registry::detect().unwrap();
        let trash = registry
            .iter()
            .filter(|e| e.kind == LocationKind::Trash)
            .count();
        assert_eq!(trash, 1);
    }

    #[test]
    fn test_duplicate_label_rejected() {
        let result = Registry::from_entries(vec![
            LocationEntry::directory("temp", vec![PathBuf::from("/a")]),
            LocationEntry::directory("temp", vec![PathBuf::from("/b")]),
        ]);
        assert!(matches!(result, Err(RegistryError::DuplicateLabel(l)) if l == "temp"));
    }

    #[test]
    fn test_empty_label_rejected() {
        let result = Registry::from_entries(vec![LocationEntry::directory(
            "  ",
            vec![PathBuf::from("/a")],
        )]);
        assert!(matches!(result, Err(RegistryError::EmptyLabel)));
    }

    #[test]
    fn test_overlapping_paths_are_dropped_from_later_entries() {
        let registry = Registry::from_entries(vec![
            LocationEntry::directory("logs", vec![PathBuf::from("/data/logs")]),
            LocationEntry::directory(
                "nested",
                vec![PathBuf::from("/data/logs/app"), PathBuf::from("/data/cache")],
            ),
            LocationEntry::directory("parent", vec![PathBuf::from("/data")]),
        ])
        .unwrap();

        assert_eq!(registry.len(), 3);
        assert_eq!(
            registry.get("nested").unwrap().paths,
            vec![PathBuf::from("/data/cache")]
        );
        assert!(registry.get("parent").unwrap().paths.is_empty());
    }

    #[test]
    fn test_labels_keep_declaration_order() {
        let registry = Registry::from_entries(vec![
            LocationEntry::directory("b", vec![]),
            LocationEntry::directory("a", vec![]),
            LocationEntry::trash("c", vec![]).elevated(),
        ])
        .unwrap();
        let labels: Vec<&str> = registry.labels().collect();
        assert_eq!(labels, vec!["b", "a", "c"]);
        assert!(registry.get("c").unwrap().requires_elevation);
        assert!(registry.get("missing").is_none());
    }
}
