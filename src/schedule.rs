//! Day-of-week routing for the daily cron entry. Fixed policy: reminders two
//! days after the Monday batch, fallback confirmation from day three onward.
//! Late-week re-runs stay safe because the resolver is idempotent.

use crate::db::Pool;
use crate::notify;
use crate::resolver;
use crate::sens::AlimtalkService;
use crate::week;
use anyhow::Result;
use chrono::NaiveDate;
use tracing::{info, instrument};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Reminder,
    AutoConfirm,
}

/// Map days-since-Monday to the scheduled action. Monday and Tuesday are
/// quiet: generation and the initial notification run from their own
/// triggers, not this router.
pub fn route(elapsed_days: u32) -> Option<Action> {
    match elapsed_days {
        2 => Some(Action::Reminder),
        d if d >= 3 => Some(Action::AutoConfirm),
        _ => None,
    }
}

#[instrument(skip_all)]
pub async fn run_check(
    pool: &Pool,
    sender: &dyn AlimtalkService,
    service_url: &str,
    today: NaiveDate,
) -> Result<()> {
    let elapsed = week::elapsed_days(today);
    info!(
        today = %today,
        week_start = %week::week_start_key(today),
        elapsed,
        "daily check"
    );

    match route(elapsed) {
        Some(Action::Reminder) => {
            info!("running reminder pass");
            notify::send_reminder(pool, sender, service_url, today).await?;
        }
        Some(Action::AutoConfirm) => {
            info!("running auto-confirm pass");
            resolver::auto_confirm(pool, today).await?;
        }
        None => {
            info!("no action today; reminders go out on day 2, auto-confirm from day 3");
        }
    }
    Ok(())
}
