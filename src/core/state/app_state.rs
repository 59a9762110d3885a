use std::sync::Arc;

use tracing::info;

use crate::core::auth::AuthSession;
use crate::core::config::{AccountMode, ConfigStore, LauncherConfig, LauncherPaths};
use crate::core::error::{ConfigError, LauncherResult};
use crate::core::http::{build_download_client, build_http_client};
use crate::core::java::RuntimeProvisioner;
use crate::core::launch::LaunchOrchestrator;
use crate::core::version::VersionCatalog;

/// Every core component, wired once at startup and shared by reference.
pub struct AppState {
    pub paths: LauncherPaths,
    pub config: Arc<ConfigStore>,
    pub catalog: Arc<VersionCatalog>,
    pub auth: Arc<AuthSession>,
    pub runtime: Arc<RuntimeProvisioner>,
    pub launcher: LaunchOrchestrator,
}

impl AppState {
    pub fn new(config: LauncherConfig) -> LauncherResult<Self> {
        let LauncherConfig { paths, endpoints } = config;

        let http_client = build_http_client(endpoints.timeouts)?;
        let download_client = build_download_client(endpoints.timeouts)?;

        let store = Arc::new(ConfigStore::new(paths.settings_file.clone()));
        let catalog = Arc::new(VersionCatalog::new(
            http_client.clone(),
            endpoints.manifest_url,
        ));
        let auth = Arc::new(AuthSession::new(
            http_client.clone(),
            endpoints.auth_url,
            store.clone(),
        ));
        let runtime = Arc::new(RuntimeProvisioner::new(
            download_client,
            endpoints.runtime_source,
            paths.java_dir(),
            store.clone(),
        ));
        let launcher = LaunchOrchestrator::new(
            store.clone(),
            catalog.clone(),
            auth.clone(),
            runtime.clone(),
            paths.clone(),
        );

        info!(
            "Launcher state ready (game dir {:?}, data dir {:?})",
            paths.game_dir, paths.data_dir
        );

        Ok(Self {
            paths,
            config: store,
            catalog,
            auth,
            runtime,
            launcher,
        })
    }

    /// Persist the account mode. Leaving third-party auth drops the identity.
    pub async fn set_mode(&self, mode: AccountMode) -> Result<(), ConfigError> {
        let previous = self.config.load().await?.mode;
        if previous == mode {
            return Ok(());
        }
        self.config.update(move |settings| settings.mode = mode).await?;
        if previous == AccountMode::ThirdPartyAuth {
            self.auth.sign_out().await;
        }
        info!("Account mode changed: {} -> {}", previous.as_str(), mode.as_str());
        Ok(())
    }
}
