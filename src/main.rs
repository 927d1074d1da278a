use anyhow::Result;
use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use restoration_admin::config::{self, Config};
use restoration_admin::detail::DetailView;
use restoration_admin::download::{download_image, ImageSlot};
use restoration_admin::gateway::SupabaseClient;
use restoration_admin::model::OrderStatus;
use restoration_admin::render;
use restoration_admin::store::OrderStore;
use restoration_admin::summary::Summary;
use restoration_admin::view::{ListQuery, SortKey, SortOrder, StatusFilter};

const RETRY_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Parser)]
#[command(author, version, about = "Manage photo-restoration orders")]
struct Args {
    /// Path to YAML config file (optional; environment settings override it)
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    /// Extra attempts when loading the orders fails
    #[arg(long, default_value_t = 0)]
    retries: u32,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Status counts, revenue and the latest orders (default)
    Dashboard,
    /// Filtered and sorted order list
    List {
        /// all, pending, processing, completed or cancelled
        #[arg(long, default_value = "all")]
        status: StatusFilter,
        /// Case-insensitive match on name, email or phone
        #[arg(long, default_value = "")]
        search: String,
        /// date, name or status
        #[arg(long, default_value = "date")]
        sort: SortKey,
        /// asc or desc
        #[arg(long, default_value = "desc")]
        order: SortOrder,
    },
    /// Full detail of one order
    Show { id: String },
    /// Change the workflow status, optionally with notes
    SetStatus {
        id: String,
        status: OrderStatus,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Record the URL of the restored image
    AttachRestored { id: String, url: String },
    /// Delete an order and its stored images
    Delete {
        id: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Save the original (or restored) image locally
    Download {
        id: String,
        #[arg(long)]
        restored: bool,
        /// Target directory (defaults to downloads.dir)
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Print an example YAML config
    ExampleConfig,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let command = args.command.unwrap_or(Command::Dashboard);
    if let Command::ExampleConfig = command {
        print!("{}", config::example());
        return Ok(ExitCode::SUCCESS);
    }

    let cfg = match config::load(Some(&args.config)) {
        Ok(cfg) => cfg,
        Err(err) => {
            eprint!("{}", render::config_error_screen(&err));
            return Ok(ExitCode::from(2));
        }
    };

    let client = SupabaseClient::from_config(&cfg)?;
    let http = client.http().clone();
    let mut store = OrderStore::new(Arc::new(client));

    let mut attempt = 0;
    loop {
        store.load().await;
        if store.error().is_none() || attempt >= args.retries {
            break;
        }
        attempt += 1;
        warn!(attempt, retries = args.retries, "load failed; retrying");
        tokio::time::sleep(RETRY_DELAY).await;
    }
    if let Some(err) = store.error() {
        eprint!("{}", render::fetch_error_screen(err, &cfg.gateway.table));
        return Ok(ExitCode::FAILURE);
    }
    info!(count = store.orders().len(), "orders ready");

    run(command, &cfg, &mut store, &http).await
}

async fn run(
    command: Command,
    cfg: &Config,
    store: &mut OrderStore,
    http: &reqwest::Client,
) -> Result<ExitCode> {
    match command {
        Command::Dashboard | Command::ExampleConfig => {
            let summary = Summary::from_orders(store.orders());
            print!("{}", render::dashboard(&summary, store.orders()));
        }
        Command::List {
            status,
            search,
            sort,
            order,
        } => {
            let query = ListQuery {
                status,
                search,
                sort,
                order,
            };
            let rows = query.apply(store.orders());
            print!("{}", render::list(&rows, store.orders().len()));
        }
        Command::Show { id } => match store.get(&id) {
            Some(order) => print!("{}", render::detail(order)),
            None => return Ok(not_found(&id)),
        },
        Command::SetStatus { id, status, notes } => {
            let Some(order) = store.get(&id) else {
                return Ok(not_found(&id));
            };
            let mut view = DetailView::open(order);
            view.draft_status = status;
            view.draft_notes = notes.unwrap_or_default();
            if !view.submit(store).await {
                return Ok(mutation_failed(store));
            }
            if let Some(order) = store.get(&id) {
                print!("{}", render::detail(order));
            }
        }
        Command::AttachRestored { id, url } => {
            if store.get(&id).is_none() {
                return Ok(not_found(&id));
            }
            if !store.attach_restored_image(&id, &url).await {
                return Ok(mutation_failed(store));
            }
            println!("Restored image recorded for order {}", id);
        }
        Command::Delete { id, yes } => {
            let Some(order) = store.get(&id) else {
                return Ok(not_found(&id));
            };
            if !yes && !confirm_delete(&order.name)? {
                println!("Aborted");
                return Ok(ExitCode::SUCCESS);
            }
            if !store.delete(&id).await {
                return Ok(mutation_failed(store));
            }
            println!("Order {} deleted", id);
        }
        Command::Download { id, restored, dir } => {
            let Some(order) = store.get(&id) else {
                return Ok(not_found(&id));
            };
            let slot = if restored {
                ImageSlot::Restored
            } else {
                ImageSlot::Original
            };
            let dir = dir.unwrap_or_else(|| cfg.downloads_dir());
            match download_image(http, order, slot, &dir).await {
                Ok(path) => println!("Saved {}", path.display()),
                Err(err) => {
                    eprintln!("Download failed: {:#}", err);
                    return Ok(ExitCode::FAILURE);
                }
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn not_found(id: &str) -> ExitCode {
    eprintln!("No order with id {}", id);
    ExitCode::FAILURE
}

fn mutation_failed(store: &OrderStore) -> ExitCode {
    match store.error() {
        Some(err) => eprintln!("Error: {}", err),
        None => eprintln!("Error: operation failed"),
    }
    ExitCode::FAILURE
}

fn confirm_delete(name: &str) -> Result<bool> {
    println!("Delete the order of {}?", name);
    print!("This removes the record and its stored images and cannot be undone. [y/N] ");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}
