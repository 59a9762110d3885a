// ─── Version Manifest ───
// Typed decoding of the remote version manifest.

use serde::Deserialize;

/// Top-level manifest document. Only `versions` is consumed.
#[derive(Debug, Deserialize)]
pub struct VersionManifest {
    pub versions: Vec<VersionEntry>,
}

/// A single entry in the manifest.
#[derive(Debug, Clone, Deserialize)]
pub struct VersionEntry {
    pub id: String,
    pub url: String,
    #[serde(rename = "type", default)]
    pub version_type: Option<String>,
}

impl VersionManifest {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}
