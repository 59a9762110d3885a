// ─── Launch Orchestrator ───
// Composes settings, catalog, session and runtime into one launch.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, instrument};

use super::plan::{EffectiveAccount, LaunchPlan};
use super::task::{self, ProcessHandle, RunningGames};
use crate::core::auth::AuthSession;
use crate::core::config::{AccountMode, ConfigStore, LauncherPaths};
use crate::core::error::LaunchError;
use crate::core::java::RuntimeProvisioner;
use crate::core::version::VersionCatalog;

pub struct LaunchOrchestrator {
    config: Arc<ConfigStore>,
    catalog: Arc<VersionCatalog>,
    auth: Arc<AuthSession>,
    runtime: Arc<RuntimeProvisioner>,
    paths: LauncherPaths,
    running: RunningGames,
}

impl LaunchOrchestrator {
    pub fn new(
        config: Arc<ConfigStore>,
        catalog: Arc<VersionCatalog>,
        auth: Arc<AuthSession>,
        runtime: Arc<RuntimeProvisioner>,
        paths: LauncherPaths,
    ) -> Self {
        Self {
            config,
            catalog,
            auth,
            runtime,
            paths,
            running: RunningGames::default(),
        }
    }

    /// Launch `version_id` and return as soon as the process is running.
    ///
    /// Checks run cheapest first: the account gate and the version lookup
    /// never touch the network, so a refused launch downloads nothing.
    #[instrument(skip(self))]
    pub async fn launch(&self, version_id: &str) -> Result<ProcessHandle, LaunchError> {
        let settings = self.config.load().await?;
        let identity = self.auth.current_identity().await;

        if settings.mode == AccountMode::ThirdPartyAuth && identity.is_none() {
            return Err(LaunchError::AuthRequired);
        }

        let version_id = version_id.trim();
        if version_id.is_empty() || self.catalog.resolve(version_id).await.is_none() {
            return Err(LaunchError::UnknownVersion(version_id.to_string()));
        }

        let runtime = self.runtime.ensure().await?;

        let account = EffectiveAccount::from_identity(identity.as_ref());
        info!(
            "Preparing {} as {} ({})",
            version_id,
            account.player_name,
            if account.offline { "offline" } else { "signed in" }
        );

        tokio::fs::create_dir_all(&self.paths.game_dir)
            .await
            .map_err(|source| LaunchError::SpawnFailed {
                program: runtime.executable_path.clone(),
                source,
            })?;

        let plan = LaunchPlan::new(runtime.executable_path, version_id, account, &self.paths);
        task::spawn(&plan, self.running.clone()).await
    }

    /// Games started by this orchestrator that have not exited yet.
    pub async fn running(&self) -> HashMap<u32, String> {
        self.running.lock().await.clone()
    }
}
