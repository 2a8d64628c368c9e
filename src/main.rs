use anyhow::Result;
use chrono::Local;
use clap::Parser;
use tracing::{debug, info};

use draftbot::config::Config;
use draftbot::db;
use draftbot::notify;
use draftbot::resolver;
use draftbot::schedule;
use draftbot::sens::SensClient;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Weekly confirmation lifecycle: reminders and fallback auto-confirmation"
)]
struct Args {
    /// Force the reminder pass regardless of weekday
    #[arg(long)]
    reminder: bool,

    /// Force the auto-confirm pass regardless of weekday
    #[arg(long)]
    auto_confirm: bool,

    /// Run the day-based router (the default when no flag is given)
    #[arg(long)]
    check: bool,
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

    if args.reminder {
        let summary = notify::send_reminder(&pool, &sender, &cfg.service_url, today).await?;
        info!(sent = summary.sent, failed = summary.failed, "reminder pass finished");
    } else if args.auto_confirm {
        let summary = resolver::auto_confirm(&pool, today).await?;
        info!(
            confirmed = summary.confirmed,
            skipped = summary.skipped,
            failed = summary.failed,
            "auto-confirm pass finished"
        );
    } else {
        if !args.check {
            debug!("no flag given; defaulting to --check");
        }
        schedule::run_check(&pool, &sender, &cfg.service_url, today).await?;
    }

    Ok(())
}
