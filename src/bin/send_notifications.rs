use anyhow::Result;
use chrono::Local;
use clap::Parser;
use tracing::info;

use draftbot::config::Config;
use draftbot::db;
use draftbot::notify;
use draftbot::sens::SensClient;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Send the weekly drafts-ready notification to active customers"
)]
struct Args {
    /// Send the reminder pass (unconfirmed customers only) instead of the
    /// initial weekly pass
    #[arg(long)]
    reminder: bool,
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

    let sender = SensClient::from_config(&cfg.sens);
    let today = Local::now().date_naive();

    let summary = if args.reminder {
        notify::send_reminder(&pool, &sender, &cfg.service_url, today).await?
    } else {
        notify::send_initial(&pool, &sender, &cfg.service_url, today).await?
    };
    info!(
        sent = summary.sent,
        failed = summary.failed,
        skipped = summary.skipped,
        "notification run finished"
    );

    Ok(())
}
