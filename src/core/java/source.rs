// ─── Runtime Source ───
// Turns the configured source into one archive URL for this OS/arch.

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use super::platform;
use crate::core::error::ProvisionError;

pub const ADOPTIUM_API_BASE: &str = "https://api.adoptium.net/v3/assets/latest";
pub const DEFAULT_JAVA_MAJOR: u32 = 17;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeSource {
    /// Ask the Adoptium API for the latest build of `major`.
    Adoptium { api_base: String, major: u32 },
    /// A fixed archive URL, optionally with its SHA-256.
    Direct { url: String, sha256: Option<String> },
}

impl Default for RuntimeSource {
    fn default() -> Self {
        RuntimeSource::Adoptium {
            api_base: ADOPTIUM_API_BASE.to_string(),
            major: DEFAULT_JAVA_MAJOR,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    Zip,
    TarGz,
}

impl ArchiveKind {
    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name
            .split(['?', '#'])
            .next()
            .unwrap_or(name)
            .to_ascii_lowercase();
        if lower.ends_with(".zip") {
            Some(ArchiveKind::Zip)
        } else if lower.ends_with(".tar.gz") || lower.ends_with(".tgz") {
            Some(ArchiveKind::TarGz)
        } else {
            None
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ArchiveKind::Zip => "zip",
            ArchiveKind::TarGz => "tar.gz",
        }
    }
}

/// The one archive to download.
#[derive(Debug, Clone)]
pub struct ResolvedArchive {
    pub url: String,
    pub kind: ArchiveKind,
    pub sha256: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AdoptiumRelease {
    binary: AdoptiumBinary,
    #[serde(default)]
    version: Option<AdoptiumVersion>,
}

#[derive(Debug, Deserialize)]
struct AdoptiumBinary {
    package: AdoptiumPackage,
}

#[derive(Debug, Deserialize)]
struct AdoptiumPackage {
    link: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    checksum: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AdoptiumVersion {
    openjdk_version: String,
}

pub async fn resolve_archive(
    client: &Client,
    source: &RuntimeSource,
) -> Result<ResolvedArchive, ProvisionError> {
    match source {
        RuntimeSource::Direct { url, sha256 } => {
            let kind = ArchiveKind::from_name(url).ok_or_else(|| unsupported_archive(url))?;
            Ok(ResolvedArchive {
                url: url.clone(),
                kind,
                sha256: sha256.clone(),
            })
        }
        RuntimeSource::Adoptium { api_base, major } => {
            resolve_adoptium(client, api_base, *major).await
        }
    }
}

async fn resolve_adoptium(
    client: &Client,
    api_base: &str,
    major: u32,
) -> Result<ResolvedArchive, ProvisionError> {
    let mut last_error = None;

    for image_type in ["jre", "jdk"] {
        let api_url = adoptium_query_url(api_base, major, image_type);
        debug!("Resolving runtime via {}", api_url);

        let response = match client.get(&api_url).send().await {
            Ok(response) => response,
            Err(err) => {
                last_error = Some(download_failed(&api_url, err));
                continue;
            }
        };
        let status = response.status();
        if !status.is_success() {
            last_error = Some(ProvisionError::DownloadFailed {
                url: api_url,
                reason: format!("HTTP {}", status.as_u16()),
            });
            continue;
        }

        let releases: Vec<AdoptiumRelease> = match response.json().await {
            Ok(releases) => releases,
            Err(err) => {
                last_error = Some(download_failed(&api_url, err));
                continue;
            }
        };

        let Some(release) = releases.into_iter().next() else {
            continue;
        };
        let package = release.binary.package;
        let name = package.name.as_deref().unwrap_or(&package.link);
        let kind = ArchiveKind::from_name(name).ok_or_else(|| unsupported_archive(name))?;
        info!(
            "Resolved Java {} {} ({}) -> {}",
            major,
            image_type,
            release
                .version
                .map(|v| v.openjdk_version)
                .unwrap_or_else(|| "unknown version".into()),
            package.link
        );
        return Ok(ResolvedArchive {
            url: package.link,
            kind,
            sha256: package.checksum.filter(|c| !c.trim().is_empty()),
        });
    }

    Err(last_error.unwrap_or_else(|| ProvisionError::DownloadFailed {
        url: adoptium_query_url(api_base, major, "jre"),
        reason: format!(
            "no Java {} release for {}/{}",
            major,
            platform::platform_os(),
            platform::platform_arch()
        ),
    }))
}

fn adoptium_query_url(api_base: &str, major: u32, image_type: &str) -> String {
    format!(
        "{}/{}/hotspot?architecture={}&image_type={}&os={}",
        api_base.trim_end_matches('/'),
        major,
        platform::platform_arch(),
        image_type,
        platform::platform_os()
    )
}

fn download_failed(url: &str, err: reqwest::Error) -> ProvisionError {
    ProvisionError::DownloadFailed {
        url: url.to_string(),
        reason: err.to_string(),
    }
}

fn unsupported_archive(name: &str) -> ProvisionError {
    ProvisionError::DownloadFailed {
        url: name.to_string(),
        reason: "unsupported archive format (expected .zip or .tar.gz)".into(),
    }
}
