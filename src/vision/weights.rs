// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Weight file resolution with download-on-first-run

use anyhow::{Context, Result};
use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

/// Download timeout for a single weight file
const DOWNLOAD_TIMEOUT_SECS: u64 = 600;

/// Where a weight file lives and where to fetch it from if missing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeightSource {
    pub path: PathBuf,
    pub url: Option<String>,
}

impl WeightSource {
    pub fn new(path: impl Into<PathBuf>, url: Option<String>) -> Self {
        Self {
            path: path.into(),
            url,
        }
    }
}

/// Make sure the weight file exists locally
///
/// An existing file is used as is. Otherwise it is downloaded from the
/// configured URL into a `.part` file and renamed on completion, so an
/// interrupted download never leaves a truncated model behind.
pub async fn ensure_weights(source: &WeightSource) -> Result<PathBuf> {
    if tokio::fs::try_exists(&source.path).await.unwrap_or(false) {
        info!("Using cached weights at {}", source.path.display());
        return Ok(source.path.clone());
    }

    let url = source.url.as_deref().ok_or_else(|| {
        anyhow::anyhow!(
            "Weights not found at {} and no download URL configured",
            source.path.display()
        )
    })?;

    download(url, &source.path).await?;
    Ok(source.path.clone())
}

async fn download(url: &str, dest: &Path) -> Result<()> {
    if let Some(parent) = dest.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }

    info!("Downloading weights from {} to {}", url, dest.display());
    let start = Instant::now();

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(DOWNLOAD_TIMEOUT_SECS))
        .build()
        .context("Failed to build HTTP client")?;

    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Failed to request {}", url))?
        .error_for_status()
        .with_context(|| format!("Download of {} was rejected", url))?;

    let partial = partial_path(dest);
    let written = stream_to_file(response.bytes_stream(), &partial)
        .await
        .with_context(|| format!("Weight download from {} interrupted", url))?;

    if written == 0 {
        let _ = tokio::fs::remove_file(&partial).await;
        anyhow::bail!("Downloaded weights from {} are empty", url);
    }

    tokio::fs::rename(&partial, dest)
        .await
        .with_context(|| format!("Failed to move weights into {}", dest.display()))?;

    info!(
        "✅ Downloaded {} bytes in {}s",
        written,
        start.elapsed().as_secs()
    );
    Ok(())
}

/// Write every chunk of `stream` to `partial`
///
/// The partial file is removed on any stream, write or flush error.
async fn stream_to_file<S, E>(stream: S, partial: &Path) -> Result<u64>
where
    S: Stream<Item = std::result::Result<Bytes, E>>,
    E: std::error::Error + Send + Sync + 'static,
{
    let result = write_chunks(stream, partial).await;
    if let Err(e) = &result {
        warn!("Discarding {}: {}", partial.display(), e);
        let _ = tokio::fs::remove_file(partial).await;
    }
    result
}

async fn write_chunks<S, E>(stream: S, partial: &Path) -> Result<u64>
where
    S: Stream<Item = std::result::Result<Bytes, E>>,
    E: std::error::Error + Send + Sync + 'static,
{
    let mut file = tokio::fs::File::create(partial)
        .await
        .with_context(|| format!("Failed to create {}", partial.display()))?;

    let mut stream = std::pin::pin!(stream);
    let mut written: u64 = 0;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.context("Stream error")?;
        file.write_all(&chunk)
            .await
            .with_context(|| format!("Failed to write {}", partial.display()))?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    Ok(written)
}

fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    dest.with_file_name(name)
}
