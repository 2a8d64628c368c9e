use anyhow::{anyhow, Result};
use chrono::Local;
use clap::Parser;
use tracing::info;

use draftbot::config::Config;
use draftbot::db;
use draftbot::generator::{self, Outcome};
use draftbot::openai::OpenAiClient;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Generate this week's draft batches for active customers"
)]
struct Args {
    /// Purge all pending drafts system-wide, then regenerate every batch
    #[arg(long)]
    regenerate: bool,

    /// Generate for a single customer id instead of the full roster
    #[arg(long)]
    customer: Option<i64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let cfg = Config::from_env()?;

    let pool = db::init_pool(&cfg.database_url).await?;
    db::run_migrations(&pool).await?;

    let source = OpenAiClient::new(cfg.openai.api_key.clone(), cfg.openai.model.clone());
    let today = Local::now().date_naive();

    if let Some(customer_id) = args.customer {
        let customer = db::get_customer(&pool, customer_id)
            .await?
            .ok_or_else(|| anyhow!("customer {customer_id} not found"))?;
        match generator::generate_for_customer(&pool, &source, &customer, today).await? {
            Outcome::Generated(count) => {
                info!(customer = %customer.name, count, "drafts generated")
            }
            Outcome::Skipped => info!(customer = %customer.name, "batch already exists this week"),
        }
    } else if args.regenerate {
        generator::regenerate_all(&pool, &source, today).await?;
    } else {
        generator::generate_for_all(&pool, &source, today).await?;
    }

    Ok(())
}
