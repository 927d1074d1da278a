//! Detail view of one order with its editable draft.
use crate::model::{Order, OrderStatus};
use crate::store::OrderStore;

/// Draft fields start blank (status `Pending`, empty notes) rather than
/// mirroring the record; callers fill them before submitting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailView {
    order_id: String,
    pub draft_status: OrderStatus,
    pub draft_notes: String,
    open: bool,
    submitting: bool,
}

impl DetailView {
    pub fn open(order: &Order) -> Self {
        Self {
            order_id: order.id.clone(),
            draft_status: OrderStatus::Pending,
            draft_notes: String::new(),
            open: true,
            submitting: false,
        }
    }

    pub fn order_id(&self) -> &str {
        &self.order_id
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// The bound order as currently held by the store.
    pub fn order<'a>(&self, store: &'a OrderStore) -> Option<&'a Order> {
        store.get(&self.order_id)
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    /// Send the draft through the store. The view closes only on success.
    pub async fn submit(&mut self, store: &mut OrderStore) -> bool {
        if !self.open || self.submitting {
            return false;
        }
        self.submitting = true;
        let ok = store
            .update_status(&self.order_id, self.draft_status, Some(self.draft_notes.as_str()))
            .await;
        self.submitting = false;
        if ok {
            self.close();
        }
        ok
    }
}
