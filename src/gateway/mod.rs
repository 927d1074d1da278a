//! Client for the hosted order table and image blob store.
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::fmt;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::gateway::model::{AffectedRow, ErrorBody, ImagesRow, OrderRows, RemovedObject};
use crate::model::{Order, OrderPatch};

pub mod model;
pub mod storage;

pub use storage::{storage_object_from_url, storage_objects, StorageObject};

/// Remote operations the synchronization layer depends on.
#[async_trait]
pub trait OrderGateway: Send + Sync {
    /// All orders, newest first.
    async fn fetch_orders(&self) -> Result<Vec<Order>>;

    /// Current image URL list of one order.
    async fn fetch_image_urls(&self, id: &str) -> Result<Vec<String>>;

    async fn update_order(&self, id: &str, patch: &OrderPatch) -> Result<()>;

    async fn delete_order(&self, id: &str) -> Result<()>;

    /// Remove objects from one bucket, returning how many the store reported removed.
    async fn remove_objects(&self, bucket: &str, paths: &[String]) -> Result<usize>;
}

#[derive(Clone)]
pub struct SupabaseClient {
    http: Client,
    base_url: Url,
    api_key: String,
    table: String,
}

impl fmt::Debug for SupabaseClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SupabaseClient")
            .field("base_url", &self.base_url)
            .field("table", &self.table)
            .finish_non_exhaustive()
    }
}

impl SupabaseClient {
    pub fn new(base_url: Url, api_key: String, table: String) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("restoration-admin/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self::with_http(http, base_url, api_key, table))
    }

    pub fn with_http(http: Client, mut base_url: Url, api_key: String, table: String) -> Self {
        // Url::join drops the last segment unless the path ends with '/'.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self {
            http,
            base_url,
            api_key,
            table,
        }
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        let url = cfg.gateway_url().context("invalid gateway URL")?;
        Self::new(url, cfg.gateway.anon_key.clone(), cfg.gateway.table.clone())
    }

    /// Shared HTTP client, also used for plain image downloads.
    pub fn http(&self) -> &Client {
        &self.http
    }

    fn table_url(&self, query: &[(&str, String)]) -> Result<Url> {
        let mut url = self
            .base_url
            .join(&format!("rest/v1/{}", self.table))
            .context("invalid gateway base URL")?;
        {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in query {
                pairs.append_pair(k, v);
            }
        }
        Ok(url)
    }

    fn bucket_url(&self, bucket: &str) -> Result<Url> {
        self.base_url
            .join(&format!("storage/v1/object/{}", bucket))
            .context("invalid gateway base URL")
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.http
            .request(method, url)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Accept", "application/json")
    }

    pub fn build_select_request(&self) -> Result<reqwest::Request> {
        let url = self.table_url(&[
            ("select", "*".to_string()),
            ("order", "created_at.desc".to_string()),
        ])?;
        self.request(Method::GET, url)
            .build()
            .context("failed to build select request")
    }

    pub fn build_row_request(&self, id: &str) -> Result<reqwest::Request> {
        let url = self.table_url(&[("select", "*".to_string()), ("id", format!("eq.{}", id))])?;
        self.request(Method::GET, url)
            .build()
            .context("failed to build row request")
    }

    pub fn build_images_request(&self, id: &str) -> Result<reqwest::Request> {
        let url = self.table_url(&[
            ("select", "image_url".to_string()),
            ("id", format!("eq.{}", id)),
        ])?;
        self.request(Method::GET, url)
            .build()
            .context("failed to build image list request")
    }

    pub fn build_update_request(&self, id: &str, patch: &OrderPatch) -> Result<reqwest::Request> {
        let url = self.table_url(&[("id", format!("eq.{}", id))])?;
        self.request(Method::PATCH, url)
            .header("Prefer", "return=representation")
            .json(patch)
            .build()
            .context("failed to build update request")
    }

    pub fn build_delete_request(&self, id: &str) -> Result<reqwest::Request> {
        let url = self.table_url(&[("id", format!("eq.{}", id))])?;
        self.request(Method::DELETE, url)
            .header("Prefer", "return=representation")
            .build()
            .context("failed to build delete request")
    }

    pub fn build_remove_request(&self, bucket: &str, paths: &[String]) -> Result<reqwest::Request> {
        let url = self.bucket_url(bucket)?;
        self.request(Method::DELETE, url)
            .json(&json!({ "prefixes": paths }))
            .build()
            .context("failed to build storage remove request")
    }

    async fn execute<T: DeserializeOwned>(&self, request: reqwest::Request) -> Result<T> {
        let method = request.method().clone();
        let path = request.url().path().to_string();
        debug!(%method, url = %request.url(), "gateway request");

        let res = self
            .http
            .execute(request)
            .await
            .with_context(|| format!("failed to reach gateway ({} {})", method, path))?;
        let res = check_status(res).await?;

        let body = res.text().await.context("failed to read gateway response")?;
        debug!(%method, %path, bytes = body.len(), "gateway response");
        serde_json::from_str(&body).context("invalid gateway response JSON")
    }

    /// One row exactly as the table returns it, for diagnostics.
    pub async fn fetch_order_row(&self, id: &str) -> Result<serde_json::Value> {
        let mut rows: Vec<serde_json::Value> = self.execute(self.build_row_request(id)?).await?;
        if rows.is_empty() {
            return Err(anyhow!("order {} not found in table {}", id, self.table));
        }
        Ok(rows.swap_remove(0))
    }
}

async fn check_status(res: Response) -> Result<Response> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    let body = res.text().await.unwrap_or_default();
    warn!(%status, "gateway error response");
    let reason = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|b| b.summary())
        .unwrap_or(body);
    if reason.trim().is_empty() {
        Err(anyhow!("gateway returned {}", status))
    } else {
        Err(anyhow!("gateway returned {}: {}", status, reason))
    }
}

#[async_trait]
impl OrderGateway for SupabaseClient {
    async fn fetch_orders(&self) -> Result<Vec<Order>> {
        let rows: OrderRows = self.execute(self.build_select_request()?).await?;
        info!(count = rows.len(), table = %self.table, "fetched orders");
        Ok(rows.into_iter().map(Order::from).collect())
    }

    async fn fetch_image_urls(&self, id: &str) -> Result<Vec<String>> {
        let mut rows: Vec<ImagesRow> = self.execute(self.build_images_request(id)?).await?;
        if rows.is_empty() {
            return Err(anyhow!("order {} not found", id));
        }
        Ok(rows.swap_remove(0).into_urls())
    }

    async fn update_order(&self, id: &str, patch: &OrderPatch) -> Result<()> {
        let rows: Vec<AffectedRow> = self.execute(self.build_update_request(id, patch)?).await?;
        if rows.is_empty() {
            return Err(anyhow!("order {} not found or not writable", id));
        }
        info!(id, "updated order");
        Ok(())
    }

    async fn delete_order(&self, id: &str) -> Result<()> {
        let rows: Vec<AffectedRow> = self.execute(self.build_delete_request(id)?).await?;
        if rows.is_empty() {
            return Err(anyhow!("order {} not found or not deletable", id));
        }
        info!(id, "deleted order");
        Ok(())
    }

    async fn remove_objects(&self, bucket: &str, paths: &[String]) -> Result<usize> {
        let removed: Vec<RemovedObject> = self
            .execute(self.build_remove_request(bucket, paths)?)
            .await?;
        let names: Vec<&str> = removed.iter().filter_map(|o| o.name.as_deref()).collect();
        info!(
            bucket,
            requested = paths.len(),
            removed = removed.len(),
            ?names,
            "removed stored objects"
        );
        Ok(removed.len())
    }
}
