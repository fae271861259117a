use crate::config::ToolConfig;
use crate::process::{ExecutionOutcome, ProcessRequest, Runner};
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, LazyLock, Mutex, MutexGuard};
use std::time::Duration;
use tempfile::TempDir;

static CWD_LOCK: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

pub(crate) struct DirGuard {
    original: PathBuf,
    _lock: MutexGuard<'static, ()>,
}

impl DirGuard {
    pub(crate) fn new(new_dir: &Path) -> Self {
        // Changing the process current working directory is global and not thread-safe.
        // Lock it so tests don't race even if a #[serial] annotation is missed.
        let lock = CWD_LOCK.lock().unwrap_or_else(|poison| poison.into_inner());
        let original = std::env::current_dir().unwrap();
        std::env::set_current_dir(new_dir).unwrap();
        Self {
            original,
            _lock: lock,
        }
    }
}

impl Drop for DirGuard {
    fn drop(&mut self) {
        let _ = std::env::set_current_dir(&self.original);
    }
}

/// What a [`SpyRunner`] saw for one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RecordedRun {
    pub(crate) argv: Vec<String>,
    pub(crate) working_dir: PathBuf,
    pub(crate) timeout: Duration,
}

/// Runner that records calls and returns a canned outcome.
#[derive(Clone)]
pub(crate) struct SpyRunner {
    calls: Arc<AtomicUsize>,
    recorded: Arc<Mutex<Vec<RecordedRun>>>,
    exit_code: i32,
    stdout: String,
}

impl SpyRunner {
    pub(crate) fn new(exit_code: i32, stdout: &str) -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            recorded: Arc::new(Mutex::new(Vec::new())),
            exit_code,
            stdout: stdout.to_string(),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn last_run(&self) -> Option<RecordedRun> {
        self.recorded.lock().unwrap().last().cloned()
    }
}

impl Runner for SpyRunner {
    fn run(&self, request: &ProcessRequest<'_>) -> ExecutionOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.recorded.lock().unwrap().push(RecordedRun {
            argv: request.argv.to_vec(),
            working_dir: request.working_dir.to_path_buf(),
            timeout: request.timeout,
        });
        ExecutionOutcome {
            command: shell_words::join(request.argv),
            exit_code: self.exit_code,
            stdout: self.stdout.clone(),
            stderr: String::new(),
            elapsed: Duration::from_millis(1),
            timed_out: false,
            started_at: Utc::now(),
        }
    }
}

/// Scratch directory holding executable shell scripts that stand in for the
/// external tools.
pub(crate) struct FakeTools {
    dir: TempDir,
}

impl FakeTools {
    pub(crate) fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub(crate) fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write an executable `/bin/sh` script named `name` and return its path.
    pub(crate) fn script(&self, name: &str, body: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        }
        path
    }

    /// Configuration whose `nix` program is a script printing `stdout` and
    /// exiting with `exit_code`.
    pub(crate) fn nix_config(&self, stdout: &str, exit_code: i32) -> ToolConfig {
        let body = format!(
            "cat <<'NIXKIL_EOF'\n{}\nNIXKIL_EOF\nexit {}",
            stdout, exit_code
        );
        let mut config = ToolConfig::default();
        config.programs.nix = self.script("nix", &body).to_string_lossy().into_owned();
        config
    }
}
