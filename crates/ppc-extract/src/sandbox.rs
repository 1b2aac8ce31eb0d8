//! Scratch directories for extraction.
//!
//! Layout: `{output_dir}/{prefix}{pid}_{label}{seq}/task-{i}`.
//!
//! Each directory is passed explicitly to the extractor as its working
//! directory; the process-wide current directory is never changed, so
//! concurrent tasks cannot observe each other's workspace. Both `Sandbox`
//! and `TaskDir` remove themselves on drop, which covers error paths; the
//! explicit `close` reports removal failures instead of logging them.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use ppc_core::{PpcError, PpcResult};
use tracing::{debug, warn};

static NEXT_SANDBOX: AtomicU64 = AtomicU64::new(0);

fn create_fresh(path: &Path) -> PpcResult<()> {
    // create_dir (not create_dir_all): an existing directory is an error
    std::fs::create_dir(path).map_err(|source| PpcError::Sandbox {
        path: path.to_path_buf(),
        source,
    })
}

fn remove_tree(path: &Path) -> PpcResult<()> {
    match std::fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(PpcError::Sandbox {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Transient directory owned by one extraction run or batch.
#[derive(Debug)]
pub struct Sandbox {
    path: PathBuf,
    released: bool,
}

impl Sandbox {
    /// Create a new, uniquely named sandbox under `output_dir`.
    pub fn create(output_dir: &Path, prefix: &str, label: &str) -> PpcResult<Self> {
        let seq = NEXT_SANDBOX.fetch_add(1, Ordering::Relaxed);
        let name = format!("{prefix}{}_{label}{seq}", std::process::id());
        let path = output_dir.join(name);
        create_fresh(&path)?;
        debug!(path = %path.display(), "sandbox created");
        Ok(Sandbox {
            path,
            released: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the private working directory for task `index`.
    pub fn task_dir(&self, index: usize) -> PpcResult<TaskDir> {
        let path = self.path.join(format!("task-{index}"));
        create_fresh(&path)?;
        Ok(TaskDir {
            path,
            released: false,
        })
    }

    /// Remove the sandbox and everything in it.
    pub fn close(mut self) -> PpcResult<()> {
        self.released = true;
        remove_tree(&self.path)?;
        debug!(path = %self.path.display(), "sandbox removed");
        Ok(())
    }
}

impl Drop for Sandbox {
    fn drop(&mut self) {
        if !self.released {
            if let Err(e) = remove_tree(&self.path) {
                warn!("failed to remove sandbox on drop: {e}");
            }
        }
    }
}

/// Per-task subdirectory of a `Sandbox`.
#[derive(Debug)]
pub struct TaskDir {
    path: PathBuf,
    released: bool,
}

impl TaskDir {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn close(mut self) -> PpcResult<()> {
        self.released = true;
        remove_tree(&self.path)
    }
}

impl Drop for TaskDir {
    fn drop(&mut self) {
        if !self.released {
            if let Err(e) = remove_tree(&self.path) {
                warn!("failed to remove task dir on drop: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn close_removes_directory() {
        let out = tempfile::tempdir().unwrap();
        let sandbox = Sandbox::create(out.path(), "tmp.test_", "single").unwrap();
        let path = sandbox.path().to_path_buf();
        std::fs::write(path.join("member"), b"data").unwrap();
        assert!(path.is_dir());

        sandbox.close().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn drop_removes_directory() {
        let out = tempfile::tempdir().unwrap();
        let path = {
            let sandbox = Sandbox::create(out.path(), "tmp.test_", "batch").unwrap();
            let task = sandbox.task_dir(3).unwrap();
            std::fs::write(task.path().join("member"), b"data").unwrap();
            std::mem::forget(task);
            sandbox.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn sandboxes_get_unique_names() {
        let out = tempfile::tempdir().unwrap();
        let a = Sandbox::create(out.path(), "tmp.test_", "single").unwrap();
        let b = Sandbox::create(out.path(), "tmp.test_", "single").unwrap();
        assert_ne!(a.path(), b.path());
        assert!(a
            .path()
            .file_name()
            .unwrap()
            .to_string_lossy()
            .contains(&std::process::id().to_string()));
    }

    #[test]
    fn task_dirs_are_private_and_cleaned() {
        let out = tempfile::tempdir().unwrap();
        let sandbox = Sandbox::create(out.path(), "tmp.test_", "batch").unwrap();
        let t0 = sandbox.task_dir(0).unwrap();
        let t1 = sandbox.task_dir(1).unwrap();
        assert_ne!(t0.path(), t1.path());
        assert!(sandbox.task_dir(0).is_err());

        let p0 = t0.path().to_path_buf();
        t0.close().unwrap();
        drop(t1);
        assert!(!p0.exists());
        assert_eq!(std::fs::read_dir(sandbox.path()).unwrap().count(), 0);
    }

    #[test]
    fn create_fails_without_parent() {
        let out = tempfile::tempdir().unwrap();
        let missing = out.path().join("does-not-exist");
        assert!(matches!(
            Sandbox::create(&missing, "tmp.test_", "single"),
            Err(PpcError::Sandbox { .. })
        ));
    }
}
