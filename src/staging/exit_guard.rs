//! Process-exit cleanup for staged files
//!
//! Every staged file is recorded here while it exists. Normal release
//! removes the record; whatever is still recorded when the process exits
//! is deleted by an `atexit` hook. Killed processes leave their files behind.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, Once, PoisonError};
use tracing::warn;

static PENDING: Mutex<BTreeSet<PathBuf>> = Mutex::new(BTreeSet::new());
static INSTALL_HOOK: Once = Once::new();

fn pending() -> MutexGuard<'static, BTreeSet<PathBuf>> {
    PENDING.lock().unwrap_or_else(PoisonError::into_inner)
}

extern "C" fn purge_at_exit() {
    purge();
}

/// Record a staged file for deletion at process exit
pub fn register(path: &Path) {
    INSTALL_HOOK.call_once(|| {
        // SAFETY: the hook is a plain function that only touches statics.
        let rc = unsafe { libc::atexit(purge_at_exit) };
        if rc != 0 {
            warn!("Could not install exit hook; staged files may outlive the process");
        }
    });
    pending().insert(path.to_path_buf());
}

/// Forget a staged file that has been deleted
pub fn unregister(path: &Path) {
    pending().remove(path);
}

/// Whether `path` is still awaiting deletion
pub fn is_registered(path: &Path) -> bool {
    pending().contains(path)
}

/// Delete every recorded file now, returning how many were removed
pub fn purge() -> usize {
    let paths = std::mem::take(&mut *pending());
    remove_all(paths)
}

fn remove_all(paths: BTreeSet<PathBuf>) -> usize {
    paths
        .into_iter()
        .filter(|path| fs::remove_file(path).is_ok())
        .count()
}
