use std::path::{Path, PathBuf};

use crate::core::http::HttpTimeouts;
use crate::core::java::RuntimeSource;

const GAME_DIR_NAME: &str = ".minecraft";
const DATA_DIR_NAME: &str = ".catclient";
const SETTINGS_FILE: &str = "catclient_config.json";

pub const DEFAULT_MANIFEST_URL: &str =
    "https://piston-meta.mojang.com/mc/game/version_manifest_v2.json";
pub const DEFAULT_AUTH_URL: &str = "https://auth.tlauncher.org/authenticate";

/// Filesystem layout shared by every component.
#[derive(Debug, Clone)]
pub struct LauncherPaths {
    pub game_dir: PathBuf,
    pub data_dir: PathBuf,
    pub settings_file: PathBuf,
}

impl LauncherPaths {
    /// `~/.minecraft` for the game, `~/.catclient` for launcher-owned data.
    pub fn default_locations() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        let game_dir = home.join(GAME_DIR_NAME);
        let data_dir = home.join(DATA_DIR_NAME);
        Self::new(game_dir, data_dir)
    }

    pub fn new(game_dir: PathBuf, data_dir: PathBuf) -> Self {
        let settings_file = game_dir.join(SETTINGS_FILE);
        Self {
            game_dir,
            data_dir,
            settings_file,
        }
    }

    /// Everything below one root; used by tests and portable installs.
    pub fn under(root: &Path) -> Self {
        Self::new(root.join("minecraft"), root.join("catclient"))
    }

    pub fn versions_dir(&self) -> PathBuf {
        self.game_dir.join("versions")
    }

    pub fn assets_dir(&self) -> PathBuf {
        self.game_dir.join("assets")
    }

    pub fn java_dir(&self) -> PathBuf {
        self.data_dir.join("java")
    }
}

/// Remote services the core talks to.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub manifest_url: String,
    pub auth_url: String,
    pub runtime_source: RuntimeSource,
    pub timeouts: HttpTimeouts,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            manifest_url: DEFAULT_MANIFEST_URL.to_string(),
            auth_url: DEFAULT_AUTH_URL.to_string(),
            runtime_source: RuntimeSource::default(),
            timeouts: HttpTimeouts::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LauncherConfig {
    pub paths: LauncherPaths,
    pub endpoints: Endpoints,
}

impl LauncherConfig {
    pub fn new(paths: LauncherPaths, endpoints: Endpoints) -> Self {
        Self { paths, endpoints }
    }

    /// Defaults overridden by `CATCLIENT_*` environment variables.
    pub fn from_env() -> Self {
        let defaults = LauncherPaths::default_locations();
        let game_dir = env_path("CATCLIENT_GAME_DIR").unwrap_or(defaults.game_dir);
        let data_dir = env_path("CATCLIENT_DATA_DIR").unwrap_or(defaults.data_dir);

        let mut endpoints = Endpoints::default();
        if let Some(url) = env_string("CATCLIENT_MANIFEST_URL") {
            endpoints.manifest_url = url;
        }
        if let Some(url) = env_string("CATCLIENT_AUTH_URL") {
            endpoints.auth_url = url;
        }
        if let Some(url) = env_string("CATCLIENT_RUNTIME_URL") {
            endpoints.runtime_source = RuntimeSource::Direct { url, sha256: None };
        }

        Self::new(LauncherPaths::new(game_dir, data_dir), endpoints)
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn env_path(key: &str) -> Option<PathBuf> {
    env_string(key).map(PathBuf::from)
}
