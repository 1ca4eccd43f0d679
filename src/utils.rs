//! Shared path helpers used by the registry and both engines.

use std::env;
use std::path::{Path, PathBuf};

/// Returns true if this path is a Windows reparse point (junction/symlink/mount point).
///
/// `walkdir`'s `follow_links(false)` prevents following *symlinks*, but junctions and
/// OneDrive placeholders are reparse points that would still be traversed as normal
/// directories, which can escape a location or create cycles.
pub fn is_windows_reparse_point(path: &Path) -> bool {
    #[cfg(windows)]
    {
        use std::os::windows::fs::MetadataExt;
        const FILE_ATTRIBUTE_REPARSE_POINT: u32 = 0x0400;
        if let Ok(meta) = std::fs::symlink_metadata(path) {
            return meta.file_attributes() & FILE_ATTRIBUTE_REPARSE_POINT != 0;
        }
        false
    }
    #[cfg(not(windows))]
    {
        let _ = path;
        false
    }
}

/// Resolve an environment variable to a path.
///
/// An unset variable is left unexpanded (`%NAME%`), which yields a relative path
/// that does not exist: it scans as zero and cleans as nothing.
pub fn env_path(name: &str) -> PathBuf {
    match env::var_os(name) {
        Some(value) if !value.is_empty() => PathBuf::from(value),
        _ => PathBuf::from(format!("%{}%", name)),
    }
}

/// True when one path is equal to, inside, or contains the other.
///
/// Comparison is component-wise and case-insensitive on Windows.
pub fn paths_overlap(a: &Path, b: &Path) -> bool {
    let a = normalize(a);
    let b = normalize(b);
    a.starts_with(&b) || b.starts_with(&a)
}

fn normalize(path: &Path) -> PathBuf {
    #[cfg(windows)]
    {
        PathBuf::from(path.to_string_lossy().to_lowercase().replace('/', "\\"))
    }
    #[cfg(not(windows))]
    {
        path.components().collect()
    }
}
