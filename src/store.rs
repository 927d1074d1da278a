//! Synchronization layer: the only owner of the local order list.
//!
//! Every operation talks to the gateway first and touches local state only
//! after the gateway confirmed the change. Failures never escape as `Err`:
//! they land in the single error slot and mutations report `false`.
//!
//! Concurrent edits from other sessions are last-write-wins; nothing here
//! detects them.
use chrono::Utc;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::error::SyncError;
use crate::gateway::{storage_objects, OrderGateway};
use crate::model::{next_update_timestamp, Order, OrderPatch, OrderStatus};

pub struct OrderStore {
    gateway: Arc<dyn OrderGateway>,
    orders: Vec<Order>,
    loading: bool,
    error: Option<SyncError>,
}

impl OrderStore {
    pub fn new(gateway: Arc<dyn OrderGateway>) -> Self {
        Self {
            gateway,
            orders: Vec::new(),
            loading: false,
            error: None,
        }
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn get(&self, id: &str) -> Option<&Order> {
        self.orders.iter().find(|o| o.id == id)
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&SyncError> {
        self.error.as_ref()
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// Replace the local list with a fresh copy from the gateway.
    /// On failure the list is emptied so no stale data sits next to the error.
    #[instrument(skip_all)]
    pub async fn load(&mut self) {
        self.loading = true;
        self.error = None;
        match self.gateway.fetch_orders().await {
            Ok(orders) => {
                info!(count = orders.len(), "loaded orders");
                self.orders = orders;
            }
            Err(err) => {
                warn!(?err, "failed to load orders");
                self.orders.clear();
                self.error = Some(SyncError::fetch(&err));
            }
        }
        self.loading = false;
    }

    /// Set the workflow status (and notes, when non-blank) of one order.
    #[instrument(skip_all, fields(id = %id, status = %status))]
    pub async fn update_status(
        &mut self,
        id: &str,
        status: OrderStatus,
        notes: Option<&str>,
    ) -> bool {
        let mut patch = OrderPatch::new(self.next_timestamp(id));
        patch.status = Some(status);
        patch.notes = notes
            .filter(|n| !n.trim().is_empty())
            .map(str::to_string);
        self.commit("update", id, patch).await
    }

    /// Store `url` as the restored image (slot 1), keeping the original in slot 0.
    #[instrument(skip_all, fields(id = %id))]
    pub async fn attach_restored_image(&mut self, id: &str, url: &str) -> bool {
        let mut images = match self.gateway.fetch_image_urls(id).await {
            Ok(images) => images,
            Err(err) => {
                self.fail("attach restored image to", id, &err);
                return false;
            }
        };
        if images.is_empty() {
            let err = anyhow::anyhow!("order has no original image");
            self.fail("attach restored image to", id, &err);
            return false;
        }
        if images.len() > 1 {
            images[1] = url.to_string();
        } else {
            images.push(url.to_string());
        }

        let mut patch = OrderPatch::new(self.next_timestamp(id));
        patch.images = Some(images);
        self.commit("attach restored image to", id, patch).await
    }

    /// Delete an order and, best effort, its stored images.
    ///
    /// Storage removal failures are logged and ignored; the record is removed
    /// locally only after the gateway deleted it.
    #[instrument(skip_all, fields(id = %id))]
    pub async fn delete(&mut self, id: &str) -> bool {
        let urls = match self.gateway.fetch_image_urls(id).await {
            Ok(urls) => urls,
            Err(err) => {
                self.fail("delete", id, &err);
                return false;
            }
        };

        let objects = storage_objects(&urls);
        let gateway = &self.gateway;
        let removals = objects.iter().map(|obj| async move {
            let paths = [obj.path.clone()];
            (obj, gateway.remove_objects(&obj.bucket, &paths).await)
        });
        for (obj, res) in join_all(removals).await {
            match res {
                Ok(0) => {
                    warn!(
                        bucket = %obj.bucket,
                        path = %obj.path,
                        "stored object was already gone"
                    )
                }
                Ok(_) => {}
                Err(err) => {
                    let cleanup = SyncError::StorageCleanup {
                        bucket: obj.bucket.clone(),
                        path: obj.path.clone(),
                        message: format!("{err:#}"),
                    };
                    warn!(%cleanup, "continuing with record delete");
                }
            }
        }

        if let Err(err) = self.gateway.delete_order(id).await {
            self.fail("delete", id, &err);
            return false;
        }
        self.orders.retain(|o| o.id != id);
        info!(remaining = self.orders.len(), "order removed from local list");
        true
    }

    async fn commit(&mut self, action: &'static str, id: &str, patch: OrderPatch) -> bool {
        if let Err(err) = self.gateway.update_order(id, &patch).await {
            self.fail(action, id, &err);
            return false;
        }
        if let Some(order) = self.orders.iter_mut().find(|o| o.id == id) {
            order.apply(&patch);
        }
        true
    }

    fn next_timestamp(&self, id: &str) -> chrono::DateTime<Utc> {
        let now = Utc::now();
        match self.get(id) {
            Some(order) => next_update_timestamp(order.updated_at, now),
            None => now,
        }
    }

    fn fail(&mut self, action: &'static str, id: &str, err: &anyhow::Error) {
        warn!(?err, action, id, "order mutation failed");
        self.error = Some(SyncError::mutation(action, id, err));
    }
}
