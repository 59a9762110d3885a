// ─── Runtime Provisioner ───
// Guarantees a usable Java executable: reuse what is on disk, otherwise
// download, unpack into a staging directory and move it into place.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::platform::{self, ensure_executable, is_runtime_executable, locate_java_binary};
use super::source::{resolve_archive, ResolvedArchive, RuntimeSource};
use super::{download, extract};
use crate::core::config::ConfigStore;
use crate::core::error::ProvisionError;

const MIN_FREE_DISK_BYTES: u64 = 256 * 1024 * 1024;
const RUNTIME_MARKER_FILE: &str = "runtime.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeHandle {
    pub executable_path: PathBuf,
    pub available: bool,
}

/// Written next to an installed runtime for diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeMarker {
    pub source_url: String,
    pub archive_sha256: String,
    pub os: String,
    pub arch: String,
    pub installed_at: String,
    pub launcher_version: String,
}

pub struct RuntimeProvisioner {
    client: Client,
    source: RuntimeSource,
    install_dir: PathBuf,
    config: Arc<ConfigStore>,
    install_lock: Mutex<()>,
}

impl RuntimeProvisioner {
    pub fn new(
        client: Client,
        source: RuntimeSource,
        install_dir: PathBuf,
        config: Arc<ConfigStore>,
    ) -> Self {
        Self {
            client,
            source,
            install_dir,
            config,
            install_lock: Mutex::new(()),
        }
    }

    pub fn install_dir(&self) -> &Path {
        &self.install_dir
    }

    /// Offline presence check; never downloads.
    pub async fn status(&self) -> Result<RuntimeHandle, ProvisionError> {
        match self.existing().await? {
            Some(handle) => Ok(handle),
            None => Ok(RuntimeHandle {
                executable_path: locate_java_binary(&self.install_dir),
                available: false,
            }),
        }
    }

    /// Return a usable runtime, provisioning one when none is present.
    #[instrument(skip(self), fields(install_dir = ?self.install_dir))]
    pub async fn ensure(&self) -> Result<RuntimeHandle, ProvisionError> {
        if let Some(handle) = self.existing().await? {
            debug!("Java runtime present at {:?}", handle.executable_path);
            return Ok(handle);
        }

        let _install = self.install_lock.lock().await;
        if let Some(handle) = self.existing().await? {
            return Ok(handle);
        }

        let java_bin = self.install().await?;
        let recorded = java_bin.clone();
        self.config
            .update(move |settings| settings.java_path = Some(recorded))
            .await?;

        info!("Java runtime ready at {:?}", java_bin);
        Ok(RuntimeHandle {
            executable_path: java_bin,
            available: true,
        })
    }

    async fn existing(&self) -> Result<Option<RuntimeHandle>, ProvisionError> {
        let settings = self.config.load().await?;
        if let Some(configured) = settings.java_path {
            if is_runtime_executable(&configured) {
                return Ok(Some(RuntimeHandle {
                    executable_path: configured,
                    available: true,
                }));
            }
            warn!("Configured Java {:?} is not usable, checking default location", configured);
        }

        let default_bin = locate_java_binary(&self.install_dir);
        if is_runtime_executable(&default_bin) {
            return Ok(Some(RuntimeHandle {
                executable_path: default_bin,
                available: true,
            }));
        }
        Ok(None)
    }

    async fn install(&self) -> Result<PathBuf, ProvisionError> {
        let parent = self
            .install_dir
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        tokio::fs::create_dir_all(&parent)
            .await
            .map_err(|source| ProvisionError::PathUnwritable {
                path: parent.clone(),
                source,
            })?;
        ensure_min_disk_space(&parent, MIN_FREE_DISK_BYTES)?;

        let archive = resolve_archive(&self.client, &self.source).await?;

        let staging_id = Uuid::new_v4().simple().to_string();
        let staging_root = parent.join(format!(".java-staging-{staging_id}"));
        let archive_path = parent.join(format!(
            ".java-download-{staging_id}.{}",
            archive.kind.extension()
        ));

        let staged = self.stage(&archive, &archive_path, &staging_root).await;
        let _ = tokio::fs::remove_file(&archive_path).await;
        if let Err(err) = staged {
            let _ = tokio::fs::remove_dir_all(&staging_root).await;
            return Err(err);
        }

        self.swap_into_place(&staging_root).await?;
        Ok(locate_java_binary(&self.install_dir))
    }

    /// Download and unpack into `staging_root`, validating the executable.
    async fn stage(
        &self,
        archive: &ResolvedArchive,
        archive_path: &Path,
        staging_root: &Path,
    ) -> Result<(), ProvisionError> {
        let archive_sha256 = download::download_to_file(
            &self.client,
            &archive.url,
            archive_path,
            archive.sha256.as_deref(),
        )
        .await?;

        let extract_start = Instant::now();
        let kind = archive.kind;
        let from = archive_path.to_path_buf();
        let into = staging_root.to_path_buf();
        tokio::task::spawn_blocking(move || extract::unpack(kind, &from, &into))
            .await
            .map_err(|err| ProvisionError::UnpackFailed {
                archive: archive_path.to_path_buf(),
                reason: format!("unpack task failed: {err}"),
            })??;
        info!("Runtime extraction finished in {:?}", extract_start.elapsed());

        let java_bin = locate_java_binary(staging_root);
        ensure_executable(&java_bin)?;
        if !is_runtime_executable(&java_bin) {
            return Err(ProvisionError::UnpackFailed {
                archive: archive_path.to_path_buf(),
                reason: format!("archive has no {} executable", platform::java_exe()),
            });
        }

        let marker = RuntimeMarker {
            source_url: archive.url.clone(),
            archive_sha256,
            os: platform::platform_os().to_string(),
            arch: platform::platform_arch(),
            installed_at: Utc::now().to_rfc3339(),
            launcher_version: env!("CARGO_PKG_VERSION").to_string(),
        };
        let marker_path = staging_root.join(RUNTIME_MARKER_FILE);
        let payload = serde_json::to_vec_pretty(&marker).map_err(|err| {
            ProvisionError::UnpackFailed {
                archive: archive_path.to_path_buf(),
                reason: err.to_string(),
            }
        })?;
        tokio::fs::write(&marker_path, payload)
            .await
            .map_err(|source| ProvisionError::PathUnwritable {
                path: marker_path,
                source,
            })
    }

    /// Rename the staged tree over the install directory. A leftover,
    /// unusable install is parked as a backup until the rename succeeds.
    async fn swap_into_place(&self, staging_root: &Path) -> Result<(), ProvisionError> {
        let backup_root = self.install_dir.with_extension("backup");
        if backup_root.exists() {
            let _ = tokio::fs::remove_dir_all(&backup_root).await;
        }
        if self.install_dir.exists() {
            tokio::fs::rename(&self.install_dir, &backup_root)
                .await
                .map_err(|source| ProvisionError::PathUnwritable {
                    path: self.install_dir.clone(),
                    source,
                })?;
        }

        if let Err(source) = tokio::fs::rename(staging_root, &self.install_dir).await {
            let _ = tokio::fs::remove_dir_all(staging_root).await;
            if backup_root.exists() {
                let _ = tokio::fs::rename(&backup_root, &self.install_dir).await;
            }
            return Err(ProvisionError::PathUnwritable {
                path: self.install_dir.clone(),
                source,
            });
        }

        let _ = tokio::fs::remove_dir_all(&backup_root).await;
        Ok(())
    }
}

/// Read the diagnostics marker of an installed runtime, if any.
pub async fn read_marker(install_dir: &Path) -> Option<RuntimeMarker> {
    let bytes = tokio::fs::read(install_dir.join(RUNTIME_MARKER_FILE))
        .await
        .ok()?;
    serde_json::from_slice(&bytes).ok()
}

fn ensure_min_disk_space(path: &Path, minimum_bytes: u64) -> Result<(), ProvisionError> {
    let disks = sysinfo::Disks::new_with_refreshed_list();
    let canonical = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    let mut best_len = 0usize;
    let mut available = None;
    for disk in disks.list() {
        let mount = disk.mount_point();
        if canonical.starts_with(mount) {
            let len = mount.as_os_str().len();
            if len >= best_len {
                best_len = len;
                available = Some(disk.available_space());
            }
        }
    }
    match available {
        Some(bytes) if bytes < minimum_bytes => Err(ProvisionError::InsufficientSpace {
            path: canonical,
            available: bytes,
            required: minimum_bytes,
        }),
        _ => Ok(()),
    }
}
