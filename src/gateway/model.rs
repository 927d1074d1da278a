use serde::Deserialize;

use crate::model::OrderRow;

/// Error body returned by both the REST and the storage endpoints.
#[derive(Deserialize, Debug, Default)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub hint: Option<String>,
}

impl ErrorBody {
    /// Human readable summary, `None` when the body carried nothing useful.
    pub fn summary(&self) -> Option<String> {
        let head = self
            .message
            .as_deref()
            .or(self.error.as_deref())
            .filter(|s| !s.trim().is_empty())?;
        let mut out = head.to_string();
        if let Some(details) = self.details.as_deref().filter(|s| !s.trim().is_empty()) {
            out.push_str(&format!(" ({})", details));
        }
        if let Some(hint) = self.hint.as_deref().filter(|s| !s.trim().is_empty()) {
            out.push_str(&format!("; hint: {}", hint));
        }
        Some(out)
    }
}

#[derive(Deserialize, Debug)]
pub struct ImagesRow {
    #[serde(default)]
    pub image_url: Option<Vec<Option<String>>>,
}

impl ImagesRow {
    pub fn into_urls(self) -> Vec<String> {
        self.image_url
            .unwrap_or_default()
            .into_iter()
            .flatten()
            .collect()
    }
}

/// Row echoed back by update/delete with `Prefer: return=representation`.
/// Only the number of rows matters.
#[derive(Deserialize, Debug)]
pub struct AffectedRow {
    #[serde(default)]
    pub id: serde_json::Value,
}

#[derive(Deserialize, Debug)]
pub struct RemovedObject {
    #[serde(default)]
    pub name: Option<String>,
}

pub type OrderRows = Vec<OrderRow>;
