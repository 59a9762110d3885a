// ─── Settings Store ───
// Durable key/value settings: account mode, Java path and the stable
// client token presented on every authentication exchange.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::core::error::ConfigError;

const KEY_MODE: &str = "mode";
const KEY_JAVA_PATH: &str = "java_path";
const KEY_CLIENT_TOKEN: &str = "client_token";

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AccountMode {
    #[default]
    Offline,
    ThirdPartyAuth,
}

impl AccountMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountMode::Offline => "offline",
            AccountMode::ThirdPartyAuth => "third_party_auth",
        }
    }

    /// Accepts the canonical names plus the display labels
    /// (`Offline Mode`, `TLauncher Mode`) a user may type when editing the
    /// file by hand.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "offline" | "offline mode" => Some(AccountMode::Offline),
            "third_party_auth" | "tlauncher" | "tlauncher mode" => {
                Some(AccountMode::ThirdPartyAuth)
            }
            _ => None,
        }
    }
}

/// In-memory view of the settings document.
///
/// The client token has no setter: it is fixed for the lifetime of the
/// settings file. Keys this version does not know are carried through
/// saves untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub mode: AccountMode,
    pub java_path: Option<PathBuf>,
    client_token: String,
    extra: Map<String, Value>,
}

impl Settings {
    fn fresh() -> Self {
        Self {
            mode: AccountMode::Offline,
            java_path: None,
            client_token: Uuid::new_v4().to_string(),
            extra: Map::new(),
        }
    }

    pub fn client_token(&self) -> &str {
        &self.client_token
    }

    fn to_document(&self) -> Value {
        let mut doc = self.extra.clone();
        doc.insert(KEY_MODE.into(), Value::String(self.mode.as_str().into()));
        doc.insert(
            KEY_JAVA_PATH.into(),
            Value::String(
                self.java_path
                    .as_ref()
                    .map(|p| p.to_string_lossy().to_string())
                    .unwrap_or_default(),
            ),
        );
        doc.insert(
            KEY_CLIENT_TOKEN.into(),
            Value::String(self.client_token.clone()),
        );
        Value::Object(doc)
    }

    /// Rebuild settings from a parsed document, defaulting only the keys
    /// that are missing or unusable. Returns whether anything was repaired.
    fn from_document(mut doc: Map<String, Value>) -> (Self, bool) {
        let mut repaired = false;

        let mode = match doc.remove(KEY_MODE) {
            Some(Value::String(raw)) => AccountMode::parse(&raw).unwrap_or_else(|| {
                warn!("Unknown account mode {:?} in settings, using offline", raw);
                repaired = true;
                AccountMode::Offline
            }),
            Some(other) => {
                warn!("Settings key `mode` has unexpected value {}, using offline", other);
                repaired = true;
                AccountMode::Offline
            }
            None => {
                repaired = true;
                AccountMode::Offline
            }
        };

        let java_path = match doc.remove(KEY_JAVA_PATH) {
            Some(Value::String(raw)) if raw.trim().is_empty() => None,
            Some(Value::String(raw)) => Some(PathBuf::from(raw.trim())),
            Some(other) => {
                warn!("Settings key `java_path` has unexpected value {}, clearing", other);
                repaired = true;
                None
            }
            None => {
                repaired = true;
                None
            }
        };

        let client_token = match doc.remove(KEY_CLIENT_TOKEN) {
            Some(Value::String(raw)) if !raw.trim().is_empty() => raw.trim().to_string(),
            _ => {
                info!("Settings had no client token, generating a new one");
                repaired = true;
                Uuid::new_v4().to_string()
            }
        };

        (
            Self {
                mode,
                java_path,
                client_token,
                extra: doc,
            },
            repaired,
        )
    }
}

/// Process-wide owner of the settings document.
///
/// Readers get a snapshot copy; writers replace the whole value and the
/// whole file in one step.
pub struct ConfigStore {
    path: PathBuf,
    current: RwLock<Option<Settings>>,
}

impl ConfigStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            current: RwLock::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current settings, reading (or creating) the file on first use.
    pub async fn load(&self) -> Result<Settings, ConfigError> {
        if let Some(settings) = self.current.read().await.as_ref() {
            return Ok(settings.clone());
        }

        let mut guard = self.current.write().await;
        if let Some(settings) = guard.as_ref() {
            return Ok(settings.clone());
        }
        let settings = self.read_or_create().await?;
        *guard = Some(settings.clone());
        Ok(settings)
    }

    /// Persist `settings` as the new document.
    ///
    /// The client token of the loaded document always wins over the one
    /// carried by `settings`.
    pub async fn save(&self, settings: Settings) -> Result<(), ConfigError> {
        let mut guard = self.current.write().await;
        let existing_token = match guard.as_ref() {
            Some(existing) => existing.client_token.clone(),
            None => self.read_or_create().await?.client_token,
        };
        let mut settings = settings;
        if existing_token != settings.client_token {
            warn!("Refusing to replace the client token on save");
            settings.client_token = existing_token;
        }
        write_atomic(&self.path, &settings).await?;
        *guard = Some(settings);
        Ok(())
    }

    /// Apply a batch of changes and write the document once.
    pub async fn update<F>(&self, apply: F) -> Result<Settings, ConfigError>
    where
        F: FnOnce(&mut Settings),
    {
        let mut guard = self.current.write().await;
        let mut settings = match guard.as_ref() {
            Some(settings) => settings.clone(),
            None => self.read_or_create().await?,
        };
        let token = settings.client_token.clone();
        apply(&mut settings);
        settings.client_token = token;

        write_atomic(&self.path, &settings).await?;
        *guard = Some(settings.clone());
        Ok(settings)
    }

    /// Explicit recovery from [`ConfigError::Corrupt`]: the unreadable file
    /// is moved aside and fresh defaults are written.
    pub async fn reset(&self) -> Result<Settings, ConfigError> {
        let mut guard = self.current.write().await;
        if tokio::fs::try_exists(&self.path).await.unwrap_or(false) {
            let aside = sibling_with_suffix(&self.path, "corrupt");
            tokio::fs::rename(&self.path, &aside)
                .await
                .map_err(|source| ConfigError::Io {
                    path: aside.clone(),
                    source,
                })?;
            warn!("Moved unreadable settings to {:?}", aside);
        }

        let settings = Settings::fresh();
        write_atomic(&self.path, &settings).await?;
        *guard = Some(settings.clone());
        Ok(settings)
    }

    async fn read_or_create(&self) -> Result<Settings, ConfigError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                info!("No settings at {:?}, creating defaults", self.path);
                let settings = Settings::fresh();
                write_atomic(&self.path, &settings).await?;
                return Ok(settings);
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let doc = match serde_json::from_slice::<Value>(&bytes) {
            Ok(Value::Object(doc)) => doc,
            Ok(other) => {
                return Err(ConfigError::Corrupt {
                    path: self.path.clone(),
                    reason: format!("expected a JSON object, found {}", json_kind(&other)),
                })
            }
            Err(err) => {
                return Err(ConfigError::Corrupt {
                    path: self.path.clone(),
                    reason: err.to_string(),
                })
            }
        };

        let (settings, repaired) = Settings::from_document(doc);
        if repaired {
            write_atomic(&self.path, &settings).await?;
        }
        debug!("Loaded settings from {:?} (mode={})", self.path, settings.mode.as_str());
        Ok(settings)
    }
}

async fn write_atomic(path: &Path, settings: &Settings) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
    }

    let payload = serde_json::to_vec_pretty(&settings.to_document())?;
    let staging = sibling_with_suffix(path, &format!("{}.tmp", Uuid::new_v4().simple()));
    tokio::fs::write(&staging, payload)
        .await
        .map_err(|source| ConfigError::Io {
            path: staging.clone(),
            source,
        })?;

    if let Err(source) = tokio::fs::rename(&staging, path).await {
        let _ = tokio::fs::remove_file(&staging).await;
        return Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        });
    }
    Ok(())
}

fn sibling_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".");
    name.push(suffix);
    path.with_file_name(name)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
