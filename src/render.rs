//! Plain-text rendering for the command-line front end.
use std::fmt::Write as _;

use crate::config::{ConfigError, ENV_GATEWAY_KEY, ENV_GATEWAY_URL};
use crate::error::SyncError;
use crate::model::{Order, OrderStatus};
use crate::summary::{recent, Summary};

pub const NO_IMAGE: &str = "(no image)";

pub fn status_label(status: OrderStatus) -> &'static str {
    match status {
        OrderStatus::Pending => "Pending",
        OrderStatus::Processing => "Processing",
        OrderStatus::Completed => "Completed",
        OrderStatus::Cancelled => "Cancelled",
    }
}

/// Brazilian real formatting: `R$ 1.234,50`.
pub fn money(amount: f64) -> String {
    let cents = (amount * 100.0).round() as i64;
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.unsigned_abs();
    let int = (cents / 100).to_string();
    let mut grouped = String::with_capacity(int.len() + int.len() / 3);
    for (i, c) in int.chars().enumerate() {
        if i > 0 && (int.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }
    format!("{}R$ {},{:02}", sign, grouped, cents % 100)
}

pub fn date(order: &Order) -> String {
    order.created_at.format("%d/%m/%Y").to_string()
}

pub fn list_row(order: &Order) -> String {
    let mut line = format!(
        "{:<12} {:<10} {:<11} {:<24} {}",
        order.id,
        date(order),
        status_label(order.status),
        order.name,
        order.email
    );
    if let Some(price) = order.plan.price {
        let _ = write!(line, "  {}", money(price));
    }
    line
}

pub fn list(rows: &[&Order], total: usize) -> String {
    let mut out = format!("{} of {} orders\n", rows.len(), total);
    if rows.is_empty() {
        out.push_str("No orders found\n");
        return out;
    }
    for order in rows {
        out.push_str(&list_row(order));
        out.push('\n');
    }
    out
}

pub fn detail(order: &Order) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Order {} ({})", order.order_number, order.id);
    let _ = writeln!(out, "  Status:      {}", status_label(order.status));
    let _ = writeln!(out, "  Created:     {}", order.created_at.to_rfc3339());
    let _ = writeln!(out, "  Updated:     {}", order.updated_at.to_rfc3339());
    let _ = writeln!(out, "  Customer:    {}", order.name);
    let _ = writeln!(out, "  Email:       {}", order.email);
    if let Some(phone) = &order.phone {
        let _ = writeln!(out, "  Phone:       {}", phone);
    }
    if let Some(name) = &order.plan.name {
        let _ = writeln!(out, "  Plan:        {}", name);
    }
    if let Some(price) = order.plan.price {
        let _ = writeln!(out, "  Price:       {}", money(price));
    }
    let _ = writeln!(out, "  Payment fee: {}", money(order.payment_fee));
    let _ = writeln!(out, "  Real profit: {}", money(order.real_profit));
    if !order.delivery_methods.is_empty() {
        let _ = writeln!(out, "  Delivery:    {}", order.delivery_methods.join(", "));
    }
    let count = order.image_count.unwrap_or(order.images.len() as i64);
    let _ = writeln!(out, "  Images:      {}", count);
    let _ = writeln!(
        out,
        "  Original:    {}",
        order.original_image_url().unwrap_or(NO_IMAGE)
    );
    if let Some(url) = order.restored_image_url() {
        let _ = writeln!(out, "  Restored:    {}", url);
    }
    if let Some(notes) = order.notes.as_deref().filter(|n| !n.is_empty()) {
        let _ = writeln!(out, "  Notes:       {}", notes);
    }
    out
}

pub fn dashboard(summary: &Summary, orders: &[Order]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Dashboard");
    let _ = writeln!(out, "  Completion rate: {:.1}%", summary.completion_rate());
    let _ = writeln!(out, "  Total orders:    {}", summary.total);
    for status in OrderStatus::ALL {
        let _ = writeln!(
            out,
            "  {:<16} {}",
            format!("{}:", status_label(status)),
            summary.counts.get(status)
        );
    }
    let _ = writeln!(out, "  Total revenue:   {}", money(summary.total_revenue));
    let _ = writeln!(out, "  This month:      {}", money(summary.monthly_revenue));
    let _ = writeln!(out, "  Completed:       {}", money(summary.completed_revenue));
    let _ = writeln!(out, "  Fees:            {}", money(summary.total_fees));
    let _ = writeln!(out, "  Net profit:      {}", money(summary.net_profit));
    let _ = writeln!(out);
    let _ = writeln!(out, "Recent orders");
    let latest = recent(orders);
    if latest.is_empty() {
        let _ = writeln!(out, "  No orders found");
    }
    for order in latest {
        let _ = writeln!(out, "  {}", list_row(order));
    }
    out
}

/// Blocking screen shown when required settings are absent or invalid.
pub fn config_error_screen(err: &ConfigError) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Gateway configuration required");
    let _ = writeln!(out);
    let _ = writeln!(out, "  {}", err);
    let _ = writeln!(out);
    let _ = writeln!(out, "To fix it, either export the variables or create a .env file with:");
    let _ = writeln!(out, "  {}=\"https://your-project.supabase.co\"", ENV_GATEWAY_URL);
    let _ = writeln!(out, "  {}=\"your-public-key\"", ENV_GATEWAY_KEY);
    let _ = writeln!(
        out,
        "or put them under `gateway:` in the YAML config (see `example-config`)."
    );
    out
}

/// Blocking screen shown when the initial load failed.
pub fn fetch_error_screen(err: &SyncError, table: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Could not load orders");
    let _ = writeln!(out);
    let _ = writeln!(out, "  {}", err);
    let _ = writeln!(out);
    let _ = writeln!(out, "Things to check:");
    let _ = writeln!(out, "  - the table '{}' exists", table);
    let _ = writeln!(out, "  - the gateway URL and key are correct");
    let _ = writeln!(out, "  - row level security allows this key to read the table");
    let _ = writeln!(out, "Run the command again (or pass --retries) to retry.");
    out
}
