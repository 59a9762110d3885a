use std::path::Path;
use std::time::Instant;

use futures_util::StreamExt;
use reqwest::Client;
use sha2::{Digest, Sha256};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::core::error::ProvisionError;

/// Stream `url` into `dest`, hashing as it goes. When `expected_sha256`
/// is given the finished file must match it. Returns the hex SHA-256.
pub async fn download_to_file(
    client: &Client,
    url: &str,
    dest: &Path,
    expected_sha256: Option<&str>,
) -> Result<String, ProvisionError> {
    let started = Instant::now();
    info!("Downloading runtime archive from {}", url);

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|err| failed(url, err.to_string()))?;
    let status = response.status();
    if !status.is_success() {
        return Err(failed(url, format!("HTTP {}", status.as_u16())));
    }

    let mut file = tokio::fs::File::create(dest)
        .await
        .map_err(|source| ProvisionError::PathUnwritable {
            path: dest.to_path_buf(),
            source,
        })?;

    let mut hasher = Sha256::new();
    let mut downloaded = 0_u64;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|err| failed(url, err.to_string()))?;
        hasher.update(&chunk);
        file.write_all(&chunk)
            .await
            .map_err(|source| ProvisionError::PathUnwritable {
                path: dest.to_path_buf(),
                source,
            })?;
        downloaded = downloaded.saturating_add(chunk.len() as u64);
    }
    file.flush()
        .await
        .map_err(|source| ProvisionError::PathUnwritable {
            path: dest.to_path_buf(),
            source,
        })?;
    drop(file);

    let actual = format!("{:x}", hasher.finalize());
    if let Some(expected) = expected_sha256 {
        if !actual.eq_ignore_ascii_case(expected.trim()) {
            return Err(ProvisionError::ChecksumMismatch {
                url: url.to_string(),
                expected: expected.trim().to_string(),
                actual,
            });
        }
        debug!("Runtime archive SHA-256 verified");
    }

    info!(
        "Runtime download finished: {} bytes in {:?}",
        downloaded,
        started.elapsed()
    );
    Ok(actual)
}

fn failed(url: &str, reason: String) -> ProvisionError {
    ProvisionError::DownloadFailed {
        url: url.to_string(),
        reason,
    }
}
