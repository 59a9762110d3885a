// ─── Launch Plan ───
// Immutable description of one launch and the exact argument vector the
// game expects.

use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::core::auth::Identity;
use crate::core::config::LauncherPaths;

pub const MAIN_CLASS: &str = "net.minecraft.client.main.Main";
pub const OFFLINE_PLAYER_NAME: &str = "Player";
/// Token passed to the game when nobody is signed in.
pub const OFFLINE_ACCESS_TOKEN: &str = "0";

/// Who the game runs as.
#[derive(Clone, PartialEq, Eq)]
pub struct EffectiveAccount {
    pub player_name: String,
    pub player_uuid: String,
    pub access_token: String,
    pub offline: bool,
}

impl EffectiveAccount {
    /// The signed-in identity, or an offline placeholder with a uuid that
    /// is new on every call.
    pub fn from_identity(identity: Option<&Identity>) -> Self {
        match identity {
            Some(identity) => Self {
                player_name: identity.profile_name.clone(),
                player_uuid: identity.profile_id.clone(),
                access_token: identity.access_token.clone(),
                offline: false,
            },
            None => Self::offline(),
        }
    }

    pub fn offline() -> Self {
        Self {
            player_name: OFFLINE_PLAYER_NAME.to_string(),
            player_uuid: Uuid::new_v4().to_string(),
            access_token: OFFLINE_ACCESS_TOKEN.to_string(),
            offline: true,
        }
    }
}

impl std::fmt::Debug for EffectiveAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectiveAccount")
            .field("player_name", &self.player_name)
            .field("player_uuid", &self.player_uuid)
            .field("offline", &self.offline)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct LaunchPlan {
    runtime_path: PathBuf,
    version_id: String,
    account: EffectiveAccount,
    game_dir: PathBuf,
    assets_dir: PathBuf,
    library_dir: PathBuf,
    classpath: String,
}

impl LaunchPlan {
    pub fn new(
        runtime_path: PathBuf,
        version_id: &str,
        account: EffectiveAccount,
        paths: &LauncherPaths,
    ) -> Self {
        Self {
            runtime_path,
            version_id: version_id.to_string(),
            account,
            game_dir: paths.game_dir.clone(),
            assets_dir: paths.assets_dir(),
            library_dir: paths.versions_dir(),
            classpath: path_str(&paths.game_dir),
        }
    }

    pub fn runtime_path(&self) -> &Path {
        &self.runtime_path
    }

    pub fn version_id(&self) -> &str {
        &self.version_id
    }

    pub fn account(&self) -> &EffectiveAccount {
        &self.account
    }

    pub fn working_dir(&self) -> &Path {
        &self.game_dir
    }

    pub fn library_dir(&self) -> &Path {
        &self.library_dir
    }

    pub fn asset_index(&self) -> String {
        asset_index_for(&self.version_id)
    }

    /// Arguments after the program name, in the order the game expects.
    pub fn arguments(&self) -> Vec<String> {
        vec![
            format!("-Djava.library.path={}", path_str(&self.library_dir)),
            "-cp".into(),
            self.classpath.clone(),
            MAIN_CLASS.into(),
            "--username".into(),
            self.account.player_name.clone(),
            "--version".into(),
            self.version_id.clone(),
            "--gameDir".into(),
            path_str(&self.game_dir),
            "--assetsDir".into(),
            path_str(&self.assets_dir),
            "--assetIndex".into(),
            self.asset_index(),
            "--uuid".into(),
            self.account.player_uuid.clone(),
            "--accessToken".into(),
            self.account.access_token.clone(),
        ]
    }

    /// Arguments with the access token masked, for logs.
    pub fn redacted_arguments(&self) -> Vec<String> {
        let mut args = self.arguments();
        if let Some(pos) = args.iter().position(|a| a == "--accessToken") {
            if let Some(value) = args.get_mut(pos + 1) {
                *value = "<redacted>".into();
            }
        }
        args
    }
}

/// Asset index name: the minor component of a release id (`1.20.1` →
/// `20`); ids without one are used whole.
pub fn asset_index_for(version_id: &str) -> String {
    match version_id.split('.').nth(1) {
        Some(minor) if !minor.is_empty() => minor.to_string(),
        _ => version_id.to_string(),
    }
}

fn path_str(path: &Path) -> String {
    path.to_string_lossy().to_string()
}
