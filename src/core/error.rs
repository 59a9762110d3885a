use std::path::PathBuf;
use thiserror::Error;

// ── Settings ────────────────────────────────────────────

/// Failures of the persisted settings document.
///
/// `Corrupt` is the one condition the caller must decide on explicitly
/// (reset to defaults or abort); the store never discards user settings
/// on its own.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("settings file {path:?} is corrupt: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    #[error("settings IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("settings serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

// ── Version catalog ─────────────────────────────────────

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("version manifest unreachable at {url}: {source}")]
    Unreachable {
        url: String,
        source: reqwest::Error,
    },

    #[error("version manifest at {url} answered HTTP {status}")]
    BadResponse { url: String, status: u16 },

    #[error("version manifest could not be decoded: {0}")]
    DecodeError(#[from] serde_json::Error),
}

// ── Authentication ──────────────────────────────────────

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("authentication server unreachable: {0}")]
    Unreachable(#[from] reqwest::Error),

    #[error("authentication rejected (HTTP {status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("authentication server sent an unusable response: {0}")]
    MalformedResponse(String),

    #[error("settings unavailable for authentication: {0}")]
    Settings(#[from] ConfigError),

    #[error("authentication cancelled by sign-out")]
    Cancelled,
}

// ── Runtime provisioning ────────────────────────────────

#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("runtime download from {url} failed: {reason}")]
    DownloadFailed { url: String, reason: String },

    #[error("runtime archive {url} failed verification: expected SHA-256 {expected}, got {actual}")]
    ChecksumMismatch {
        url: String,
        expected: String,
        actual: String,
    },

    #[error("runtime archive {archive:?} could not be unpacked: {reason}")]
    UnpackFailed { archive: PathBuf, reason: String },

    #[error("runtime location {path:?} is not writable: {source}")]
    PathUnwritable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("not enough free space at {path:?}: available={available} required={required}")]
    InsufficientSpace {
        path: PathBuf,
        available: u64,
        required: u64,
    },

    #[error("runtime settings could not be recorded: {0}")]
    Settings(#[from] ConfigError),
}

// ── Launch ──────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("this account mode requires signing in before launching")]
    AuthRequired,

    #[error("unknown game version: {0:?}")]
    UnknownVersion(String),

    #[error("Java runtime unavailable: {0}")]
    RuntimeUnavailable(#[from] ProvisionError),

    #[error("could not start {program:?}: {source}")]
    SpawnFailed {
        program: PathBuf,
        source: std::io::Error,
    },

    #[error("launch settings unavailable: {0}")]
    Settings(#[from] ConfigError),
}

/// Umbrella error for callers that drive several components
/// (the command-line shell, IPC layers).
#[derive(Debug, Error)]
pub enum LauncherError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Provision(#[from] ProvisionError),

    #[error(transparent)]
    Launch(#[from] LaunchError),

    #[error("HTTP client setup failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Convenience alias used by callers that mix components.
pub type LauncherResult<T> = Result<T, LauncherError>;

// Presentation layers receive errors as their display string.
impl serde::Serialize for LauncherError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
