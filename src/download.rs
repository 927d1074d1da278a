use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::model::Order;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSlot {
    Original,
    Restored,
}

impl ImageSlot {
    fn prefix(&self) -> &'static str {
        match self {
            ImageSlot::Original => "original",
            ImageSlot::Restored => "restored",
        }
    }

    pub fn url<'a>(&self, order: &'a Order) -> Option<&'a str> {
        match self {
            ImageSlot::Original => order.original_image_url(),
            ImageSlot::Restored => order.restored_image_url(),
        }
    }
}

/// `{slot}_{customer}_{id}.jpg`, with characters unsafe in file names replaced.
pub fn file_name(slot: ImageSlot, order: &Order) -> String {
    let raw = format!("{}_{}_{}.jpg", slot.prefix(), order.name.trim(), order.id);
    raw.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() || c.is_whitespace() => '_',
            c => c,
        })
        .collect()
}

/// Fetch one of the order's images and write it under `dir`.
pub async fn download_image(
    http: &Client,
    order: &Order,
    slot: ImageSlot,
    dir: &Path,
) -> Result<PathBuf> {
    let url = slot
        .url(order)
        .ok_or_else(|| anyhow!("order {} has no {} image", order.id, slot.prefix()))?;

    let res = http
        .get(url)
        .send()
        .await
        .with_context(|| format!("failed to fetch {}", url))?;
    if !res.status().is_success() {
        return Err(anyhow!("image request failed {}: {}", res.status(), url));
    }
    let bytes = res.bytes().await.context("failed to read image body")?;

    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("failed to create download dir: {}", dir.display()))?;
    let path = dir.join(file_name(slot, order));
    tokio::fs::write(&path, &bytes)
        .await
        .with_context(|| format!("failed to write {}", path.display()))?;

    info!(id = %order.id, bytes = bytes.len(), path = %path.display(), "downloaded image");
    Ok(path)
}
