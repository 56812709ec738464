/// Scoped working directory for one judging run
///
/// Every run gets its own `leetcoach-<uuid>` directory under the configured root.
/// Source files, harness programs and compiled binaries all live inside it, and the
/// whole directory is removed when the guard drops, on success, compile failure,
/// early return or panic alike.
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub struct ScopedWorkspace {
    dir: PathBuf,
}

impl ScopedWorkspace {
    /// `root` may be relative; it is resolved to an absolute path because child
    /// processes run with the workspace as their working directory.
    pub fn create(root: &Path) -> Result<Self> {
        fs::create_dir_all(root)
            .with_context(|| format!("Failed to create work root {}", root.display()))?;
        let root = fs::canonicalize(root)
            .with_context(|| format!("Failed to resolve work root {}", root.display()))?;
        let dir = root.join(format!("leetcoach-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create workspace {}", dir.display()))?;
        debug!(workspace = %dir.display(), "Workspace created");
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of an artifact inside the workspace
    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    pub fn write(&self, name: &str, contents: &str) -> Result<PathBuf> {
        let path = self.path(name);
        fs::write(&path, contents)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }
}

impl Drop for ScopedWorkspace {
    fn drop(&mut self) {
        // Cannot propagate from Drop; log and move on
        if let Err(e) = fs::remove_dir_all(&self.dir) {
            warn!(workspace = %self.dir.display(), error = %e, "Failed to remove workspace");
        } else {
            debug!(workspace = %self.dir.display(), "Workspace removed");
        }
    }
}
