//! Fallback confirmation. Past the decision deadline the first pending draft
//! wins, deterministically: selection order is the order drafts were created.

use crate::db::{self, Pool};
use crate::model::{DraftStatus, NotificationKind, NotificationStatus};
use crate::tracker::{self, Unconfirmed};
use crate::week;
use anyhow::Result;
use chrono::NaiveDate;
use tracing::{info, instrument, warn};

pub const AUTO_CONFIRM_MEMO: &str = "auto-confirmed";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub confirmed: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Auto-confirm every customer the tracker still reports as undecided.
/// Re-running is a no-op: once a confirmation row exists the tracker stops
/// returning that customer, and the conditional insert closes the window
/// between overlapping runs.
#[instrument(skip_all)]
pub async fn auto_confirm(pool: &Pool, today: NaiveDate) -> Result<Summary> {
    let week_key = week::week_start_key(today);
    let unconfirmed = tracker::unconfirmed_customers(pool, &week_key).await?;
    info!(count = unconfirmed.len(), "customers eligible for auto-confirmation");

    let mut summary = Summary::default();
    for entry in &unconfirmed {
        match confirm_customer(pool, entry, &week_key).await {
            Ok(true) => summary.confirmed += 1,
            Ok(false) => summary.skipped += 1,
            Err(err) => {
                warn!(?err, customer = %entry.customer.name, "auto-confirm failed for customer");
                summary.failed += 1;
            }
        }
    }
    info!(
        confirmed = summary.confirmed,
        skipped = summary.skipped,
        failed = summary.failed,
        "auto-confirm pass complete"
    );
    Ok(summary)
}

async fn confirm_customer(pool: &Pool, entry: &Unconfirmed, week_of: &str) -> Result<bool> {
    let Some(winner) = entry.pending_drafts.first() else {
        return Ok(false);
    };
    info!(
        customer = %entry.customer.name,
        draft = %winner.title,
        "auto-confirming first pending draft"
    );

    if !db::try_insert_confirmation(
        pool,
        entry.customer.id,
        winner.id,
        week_of,
        AUTO_CONFIRM_MEMO,
    )
    .await?
    {
        // Another writer confirmed this week between classification and now;
        // draft statuses belong to that confirmation.
        info!(customer = %entry.customer.name, "confirmation already exists; skipping");
        return Ok(false);
    }

    db::set_draft_status(pool, winner.id, DraftStatus::Selected).await?;
    for draft in &entry.pending_drafts[1..] {
        db::set_draft_status(pool, draft.id, DraftStatus::Rejected).await?;
    }
    db::insert_notification(
        pool,
        entry.customer.id,
        week_of,
        NotificationKind::AutoConfirm,
        NotificationStatus::Sent,
    )
    .await?;
    Ok(true)
}
