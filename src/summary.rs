//! Dashboard aggregates, derived from the full order list.
use chrono::{DateTime, Datelike, Utc};

use crate::model::{Order, OrderStatus};

pub const RECENT_LIMIT: usize = 5;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusCounts {
    pub pending: usize,
    pub processing: usize,
    pub completed: usize,
    pub cancelled: usize,
}

impl StatusCounts {
    pub fn get(&self, status: OrderStatus) -> usize {
        match status {
            OrderStatus::Pending => self.pending,
            OrderStatus::Processing => self.processing,
            OrderStatus::Completed => self.completed,
            OrderStatus::Cancelled => self.cancelled,
        }
    }

    fn bump(&mut self, status: OrderStatus) {
        match status {
            OrderStatus::Pending => self.pending += 1,
            OrderStatus::Processing => self.processing += 1,
            OrderStatus::Completed => self.completed += 1,
            OrderStatus::Cancelled => self.cancelled += 1,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Summary {
    pub total: usize,
    pub counts: StatusCounts,
    /// Sum of plan prices over every order.
    pub total_revenue: f64,
    /// Plan prices of orders created in the reference month.
    pub monthly_revenue: f64,
    pub completed_revenue: f64,
    pub total_fees: f64,
    /// Sum of the per-order real profit.
    pub net_profit: f64,
}

impl Summary {
    pub fn from_orders(orders: &[Order]) -> Self {
        Self::at(orders, Utc::now())
    }

    /// Aggregate with `now` deciding which month counts as current.
    pub fn at(orders: &[Order], now: DateTime<Utc>) -> Self {
        orders.iter().fold(Summary::default(), |mut acc, o| {
            let price = o.plan.price.unwrap_or(0.0);
            acc.total += 1;
            acc.counts.bump(o.status);
            acc.total_revenue += price;
            if o.created_at.year() == now.year() && o.created_at.month() == now.month() {
                acc.monthly_revenue += price;
            }
            if o.status == OrderStatus::Completed {
                acc.completed_revenue += price;
            }
            acc.total_fees += o.payment_fee;
            acc.net_profit += o.real_profit;
            acc
        })
    }

    /// Completed share in percent, 0 for an empty list.
    pub fn completion_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.counts.completed as f64 / self.total as f64 * 100.0
    }
}

/// The newest orders; the store keeps the list newest first.
pub fn recent(orders: &[Order]) -> &[Order] {
    &orders[..orders.len().min(RECENT_LIMIT)]
}
