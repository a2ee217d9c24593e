//! Atomic `current/` <-> staging swap.
//!
//! On POSIX, directory rename within the same filesystem is atomic, so the
//! swap is two renames and a delete. Platforms without that guarantee fall
//! back to a deep copy; see `swap_via_copy`.

use std::path::Path;

use super::errors::SnapshotError;

#[cfg(unix)]
pub fn rename_is_atomic() -> bool {
    true
}

#[cfg(not(unix))]
pub fn rename_is_atomic() -> bool {
    false
}

/// Makes `staging` the new `current`. Either the entire new tree becomes
/// visible at `current`, or the previous tree remains visible; a caller
/// never observes a half-swapped directory.
pub fn swap(current: &Path, staging: &Path, backup: &Path) -> Result<(), SnapshotError> {
    if rename_is_atomic() {
        swap_via_rename(current, staging, backup)
    } else {
        swap_via_copy(current, staging, backup)
    }
}

fn swap_via_rename(current: &Path, staging: &Path, backup: &Path) -> Result<(), SnapshotError> {
    let had_current = current.exists();
    if had_current {
        std::fs::rename(current, backup)
            .map_err(|e| SnapshotError::io(format!("renaming {} to backup", current.display()), e))?;
    }

    if let Err(rename_err) = std::fs::rename(staging, current) {
        if had_current {
            if let Err(restore_err) = std::fs::rename(backup, current) {
                return Err(SnapshotError::swap_failed(format!(
                    "swap failed ({rename_err}) and restoring backup also failed ({restore_err})"
                )));
            }
        }
        return Err(SnapshotError::io(
            format!("renaming staging {} to current", staging.display()),
            rename_err,
        ));
    }

    if had_current {
        let _ = std::fs::remove_dir_all(backup);
    }
    Ok(())
}

fn swap_via_copy(current: &Path, staging: &Path, backup: &Path) -> Result<(), SnapshotError> {
    let had_current = current.exists();
    if had_current {
        copy_dir_recursive(current, backup)
            .map_err(|e| SnapshotError::io("copying current to backup", e))?;
        std::fs::remove_dir_all(current)
            .map_err(|e| SnapshotError::io("removing current after backup copy", e))?;
    }

    if let Err(copy_err) = copy_dir_recursive(staging, current) {
        if had_current {
            let _ = std::fs::remove_dir_all(current);
            if let Err(restore_err) = copy_dir_recursive(backup, current) {
                return Err(SnapshotError::swap_failed(format!(
                    "swap failed ({copy_err}) and restoring backup also failed ({restore_err})"
                )));
            }
        }
        return Err(SnapshotError::io("copying staging to current", copy_err));
    }

    let _ = std::fs::remove_dir_all(staging);
    if had_current {
        let _ = std::fs::remove_dir_all(backup);
    }
    Ok(())
}

fn copy_dir_recursive(from: &Path, to: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(to)?;
    for entry in std::fs::read_dir(from)? {
        let entry = entry?;
        let dest = to.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir_recursive(&entry.path(), &dest)?;
        } else {
            std::fs::copy(entry.path(), &dest)?;
        }
    }
    Ok(())
}
