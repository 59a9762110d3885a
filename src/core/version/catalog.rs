// ─── Version Catalog ───
// In-memory index of installable versions, rebuilt wholesale on refresh.

use std::collections::HashMap;
use std::sync::Arc;

use reqwest::Client;
use tokio::sync::RwLock;
use tracing::{info, instrument, warn};

use super::manifest::VersionManifest;
use crate::core::error::CatalogError;

/// Version preselected by the launcher when the manifest offers it.
pub const PREFERRED_DEFAULT_VERSION: &str = "1.20.1";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionDescriptor {
    pub id: String,
    /// Per-version metadata document; not fetched by the core.
    pub metadata_url: String,
    /// `release`, `snapshot`, ... when the manifest says so.
    pub kind: Option<String>,
}

/// One complete fetch worth of versions.
#[derive(Debug, Default)]
pub struct CatalogSnapshot {
    order: Vec<String>,
    by_id: HashMap<String, VersionDescriptor>,
}

impl CatalogSnapshot {
    /// Index a manifest, keeping manifest order. A repeated id stays at its
    /// first position but resolves to its last occurrence.
    pub fn from_manifest(manifest: VersionManifest) -> Self {
        let mut snapshot = Self {
            order: Vec::with_capacity(manifest.versions.len()),
            by_id: HashMap::with_capacity(manifest.versions.len()),
        };

        for entry in manifest.versions {
            if snapshot.by_id.contains_key(&entry.id) {
                warn!("Duplicate version id {:?} in manifest, using the later entry", entry.id);
            } else {
                snapshot.order.push(entry.id.clone());
            }
            snapshot.by_id.insert(
                entry.id.clone(),
                VersionDescriptor {
                    id: entry.id,
                    metadata_url: entry.url,
                    kind: entry.version_type,
                },
            );
        }
        snapshot
    }

    pub fn resolve(&self, id: &str) -> Option<&VersionDescriptor> {
        self.by_id.get(id)
    }

    pub fn ids(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

pub struct VersionCatalog {
    client: Client,
    manifest_url: String,
    snapshot: RwLock<Arc<CatalogSnapshot>>,
}

impl VersionCatalog {
    pub fn new(client: Client, manifest_url: impl Into<String>) -> Self {
        Self {
            client,
            manifest_url: manifest_url.into(),
            snapshot: RwLock::new(Arc::new(CatalogSnapshot::default())),
        }
    }

    /// Fetch the manifest once and replace the whole index.
    ///
    /// On any failure the previous index stays in place.
    #[instrument(skip(self), fields(url = %self.manifest_url))]
    pub async fn refresh(&self) -> Result<(), CatalogError> {
        info!("Fetching version manifest...");

        let response = self
            .client
            .get(&self.manifest_url)
            .send()
            .await
            .map_err(|source| CatalogError::Unreachable {
                url: self.manifest_url.clone(),
                source,
            })?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            warn!("Version manifest answered HTTP {}", status);
            return Err(CatalogError::BadResponse {
                url: self.manifest_url.clone(),
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|source| CatalogError::Unreachable {
                url: self.manifest_url.clone(),
                source,
            })?;
        let manifest = VersionManifest::from_slice(&body)?;
        let fresh = Arc::new(CatalogSnapshot::from_manifest(manifest));

        info!("Loaded {} versions from manifest", fresh.len());
        *self.snapshot.write().await = fresh;
        Ok(())
    }

    /// The index as of the last successful refresh.
    pub async fn snapshot(&self) -> Arc<CatalogSnapshot> {
        self.snapshot.read().await.clone()
    }

    pub async fn resolve(&self, id: &str) -> Option<VersionDescriptor> {
        self.snapshot.read().await.resolve(id).cloned()
    }

    pub async fn list_ids(&self) -> Vec<String> {
        self.snapshot.read().await.ids().to_vec()
    }

    pub async fn is_empty(&self) -> bool {
        self.snapshot.read().await.is_empty()
    }

    /// The version a picker should show first.
    pub async fn default_selection(&self) -> Option<String> {
        let snapshot = self.snapshot().await;
        if snapshot.resolve(PREFERRED_DEFAULT_VERSION).is_some() {
            return Some(PREFERRED_DEFAULT_VERSION.to_string());
        }
        snapshot.ids().first().cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest(json: &str) -> VersionManifest {
        VersionManifest::from_slice(json.as_bytes()).unwrap()
    }

    #[test]
    fn snapshot_keeps_manifest_order() {
        let snapshot = CatalogSnapshot::from_manifest(manifest(
            r#"{"versions":[{"id":"1.20.1","url":"http://x"},{"id":"1.19.4","url":"http://y"}]}"#,
        ));
        assert_eq!(snapshot.ids(), ["1.20.1", "1.19.4"]);
        assert_eq!(snapshot.resolve("1.19.4").unwrap().metadata_url, "http://y");
        assert!(snapshot.resolve("1.18.2").is_none());
    }

    #[test]
    fn duplicate_ids_keep_first_position_and_last_url() {
        let snapshot = CatalogSnapshot::from_manifest(manifest(
            r#"{"versions":[{"id":"a","url":"http://1"},{"id":"b","url":"http://2"},{"id":"a","url":"http://3"}]}"#,
        ));
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.ids(), ["a", "b"]);
        assert_eq!(snapshot.resolve("a").unwrap().metadata_url, "http://3");
    }

    #[tokio::test]
    async fn empty_catalog_before_first_refresh() {
        let catalog = VersionCatalog::new(Client::new(), "http://127.0.0.1:9/manifest");
        assert!(catalog.is_empty().await);
        assert!(catalog.list_ids().await.is_empty());
        assert_eq!(catalog.default_selection().await, None);
    }
}
