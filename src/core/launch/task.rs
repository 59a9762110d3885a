// ─── Launch Task ───
// Spawns the game process from a `LaunchPlan` and supervises it until exit.

use std::collections::HashMap;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;

#[cfg(target_os = "windows")]
use std::os::windows::process::CommandExt;

use tokio::sync::{watch, Mutex};
use tracing::{debug, error, info, warn};

use super::plan::LaunchPlan;
use crate::core::error::LaunchError;

/// Live game processes keyed by pid, with the version each one runs.
pub type RunningGames = Arc<Mutex<HashMap<u32, String>>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessState {
    Running,
    Exited { code: Option<i32> },
    Failed(String),
}

impl ProcessState {
    pub fn is_finished(&self) -> bool {
        !matches!(self, ProcessState::Running)
    }
}

/// Handle to a spawned game. Dropping it does not stop the game.
#[derive(Debug, Clone)]
pub struct ProcessHandle {
    pid: u32,
    version_id: String,
    state: watch::Receiver<ProcessState>,
}

impl ProcessHandle {
    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn version_id(&self) -> &str {
        &self.version_id
    }

    pub fn state(&self) -> ProcessState {
        self.state.borrow().clone()
    }

    /// Wait until the game exits and return its final state.
    pub async fn wait(&mut self) -> ProcessState {
        loop {
            let current = self.state.borrow_and_update().clone();
            if current.is_finished() {
                return current;
            }
            if self.state.changed().await.is_err() {
                return self.state.borrow().clone();
            }
        }
    }
}

/// Start the process described by `plan`. Returns once the OS has accepted
/// the spawn; stdout/stderr are forwarded to the log and the exit status is
/// published through the returned handle.
pub async fn spawn(
    plan: &LaunchPlan,
    running: RunningGames,
) -> Result<ProcessHandle, LaunchError> {
    let mut cmd = std::process::Command::new(plan.runtime_path());
    cmd.args(plan.arguments());
    cmd.current_dir(plan.working_dir());
    configure_native_library_env(&mut cmd, plan.library_dir());
    configure_platform_spawn(&mut cmd);
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());

    info!("Launching {} with Java: {:?}", plan.version_id(), plan.runtime_path());
    debug!(
        "Command (copy/paste): {}",
        format_command_for_logs(plan.runtime_path(), &plan.redacted_arguments())
    );

    let mut child = cmd.spawn().map_err(|source| LaunchError::SpawnFailed {
        program: plan.runtime_path().to_path_buf(),
        source,
    })?;
    let pid = child.id();
    let version_id = plan.version_id().to_string();
    running.lock().await.insert(pid, version_id.clone());
    info!("Game {} running (PID {})", version_id, pid);

    if let Some(stdout) = child.stdout.take() {
        tokio::task::spawn_blocking(move || {
            for line in BufReader::new(stdout).lines().map_while(Result::ok) {
                info!("[game:{}][stdout] {}", pid, line);
            }
        });
    }
    if let Some(stderr) = child.stderr.take() {
        tokio::task::spawn_blocking(move || {
            for line in BufReader::new(stderr).lines().map_while(Result::ok) {
                warn!("[game:{}][stderr] {}", pid, line);
            }
        });
    }

    let (state_tx, state_rx) = watch::channel(ProcessState::Running);
    tokio::spawn(async move {
        let wait_result = tokio::task::spawn_blocking(move || child.wait())
            .await
            .map_err(|e| std::io::Error::other(e.to_string()))
            .and_then(|result| result);

        running.lock().await.remove(&pid);
        let final_state = match wait_result {
            Ok(status) => {
                if status.success() {
                    info!("Game process {} exited with status: {:?}", pid, status);
                } else {
                    warn!("Game process {} exited with status: {:?}", pid, status);
                }
                ProcessState::Exited {
                    code: status.code(),
                }
            }
            Err(err) => {
                error!("Failed to wait for game process {}: {}", pid, err);
                ProcessState::Failed(err.to_string())
            }
        };
        let _ = state_tx.send(final_state);
    });

    Ok(ProcessHandle {
        pid,
        version_id,
        state: state_rx,
    })
}

fn configure_native_library_env(cmd: &mut std::process::Command, natives_dir: &Path) {
    let native_path = natives_dir.to_string_lossy().to_string();

    if cfg!(target_os = "windows") {
        cmd.env("PATH", append_env_path("PATH", &native_path));
    } else if cfg!(target_os = "linux") {
        cmd.env("LD_LIBRARY_PATH", append_env_path("LD_LIBRARY_PATH", &native_path));
    } else if cfg!(target_os = "macos") {
        cmd.env(
            "DYLD_LIBRARY_PATH",
            append_env_path("DYLD_LIBRARY_PATH", &native_path),
        );
    }
}

fn configure_platform_spawn(cmd: &mut std::process::Command) {
    #[cfg(target_os = "windows")]
    {
        const CREATE_NO_WINDOW: u32 = 0x08000000;
        cmd.creation_flags(CREATE_NO_WINDOW);
    }
    #[cfg(not(target_os = "windows"))]
    let _ = cmd;
}

fn append_env_path(var_name: &str, value: &str) -> String {
    let separator = if cfg!(target_os = "windows") {
        ";"
    } else {
        ":"
    };
    match std::env::var(var_name) {
        Ok(existing) if !existing.trim().is_empty() => {
            format!("{}{}{}", value, separator, existing)
        }
        _ => value.to_string(),
    }
}

fn format_command_for_logs(program: &Path, args: &[String]) -> String {
    let program = shell_escape(&program.to_string_lossy());
    let args = args
        .iter()
        .map(|arg| shell_escape(arg))
        .collect::<Vec<_>>()
        .join(" ");

    if args.is_empty() {
        program
    } else {
        format!("{} {}", program, args)
    }
}

fn shell_escape(raw: &str) -> String {
    if raw.is_empty() {
        return "\"\"".to_string();
    }

    if raw.chars().all(|ch| {
        ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.' | '/' | ':' | '\\' | '=')
    }) {
        return raw.to_string();
    }

    format!("\"{}\"", raw.replace('"', "\\\""))
}
