use crate::types::DirEntry;
use chrono::{DateTime, Local, NaiveDate, Offset, TimeZone};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Traversal {
    Recursive,
    Shallow,
}

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("permission denied: {}", path.display())]
    PermissionDenied { path: PathBuf },

    #[error("{}: {source}", path.display())]
    Io {
        source: std::io::Error,
        path: PathBuf,
    },
}

/// Collects every directory below `root`, either at all depths or only the
/// direct children. The root itself is never part of the result.
///
/// Failing to open `root` aborts the scan. Entries below it that cannot be read,
/// or whose modification time is unavailable, are skipped.
pub fn scan_dirs(root: &Path, traversal: Traversal) -> Result<Vec<DirEntry>, ScanError> {
    if let Err(source) = fs::read_dir(root) {
        return Err(if source.kind() == ErrorKind::PermissionDenied {
            ScanError::PermissionDenied {
                path: root.to_path_buf(),
            }
        } else {
            ScanError::Io {
                source,
                path: root.to_path_buf(),
            }
        });
    }

    let max_depth = match traversal {
        Traversal::Recursive => usize::MAX,
        Traversal::Shallow => 1,
    };

    let dirs: Vec<DirEntry> = WalkDir::new(root)
        .min_depth(1)
        .max_depth(max_depth)
        .into_iter()
        .filter_map(|res| match res {
            Ok(entry) => Some(entry),
            Err(e) => {
                log::debug!("skipping unreadable entry: {e}");
                None
            }
        })
        // Symlinked directories are listed but never descended into.
        .filter(|e| e.file_type().is_dir() || (e.path_is_symlink() && e.path().is_dir()))
        .filter_map(|e| {
            let path = e.path().to_path_buf();
            let Some(modified) = modified_date(&path) else {
                log::debug!("no modification time for {}", path.display());
                return None;
            };
            let entry = DirEntry {
                path,
                name: e.file_name().to_string_lossy().to_string(),
                modified,
            };
            log::trace!("found {} ({})", entry.name, entry.modified);
            Some(entry)
        })
        .collect();

    log::debug!(
        "{} directories under {} ({:?})",
        dirs.len(),
        root.display(),
        traversal
    );
    Ok(dirs)
}

/// Local calendar date of the last modification, following symlinks.
#[must_use]
pub fn modified_date(path: &Path) -> Option<NaiveDate> {
    let modified = fs::metadata(path).ok()?.modified().ok()?;
    local_date(modified)
}

/// `None` when the timestamp falls outside the representable date range.
fn local_date(time: SystemTime) -> Option<NaiveDate> {
    let (secs, nanos) = match time.duration_since(UNIX_EPOCH) {
        Ok(after) => (i64::try_from(after.as_secs()).ok()?, after.subsec_nanos()),
        Err(e) => {
            let before = e.duration();
            let secs = -i64::try_from(before.as_secs()).ok()?;
            match before.subsec_nanos() {
                0 => (secs, 0),
                n => (secs.checked_sub(1)?, 1_000_000_000 - n),
            }
        }
    };

    let utc = DateTime::from_timestamp(secs, nanos)?.naive_utc();
    let offset = Local.offset_from_utc_datetime(&utc).fix();
    Some(utc.checked_add_offset(offset)?.date())
}
