use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use restoration_admin::config;
use restoration_admin::gateway::{storage_object_from_url, SupabaseClient};
use restoration_admin::model::{Order, OrderRow};

/// Dump the raw gateway row of one order, how it is interpreted, and the
/// stored objects a delete would remove.
#[derive(Parser, Debug)]
struct Args {
    /// Path to YAML config
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    /// Order id to inspect
    #[arg(long)]
    id: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let cfg = config::load(Some(&args.config))?;
    let client = SupabaseClient::from_config(&cfg)?;

    let row = client.fetch_order_row(&args.id).await?;
    println!("{}", serde_json::to_string_pretty(&row)?);

    let order = Order::from(
        serde_json::from_value::<OrderRow>(row).context("row does not parse as an order")?,
    );
    println!("Status: {} (payment_status as read)", order.status);
    println!("Images:");
    for (i, url) in order.images.iter().enumerate() {
        match storage_object_from_url(url) {
            Some(obj) => println!("  [{}] {} -> {}/{}", i, url, obj.bucket, obj.path),
            None => println!("  [{}] {} -> not a stored object", i, url),
        }
    }
    Ok(())
}
