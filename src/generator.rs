//! Weekly draft batch generation. One batch per customer per calendar week;
//! re-running is a no-op once any draft row exists in the current week.

use crate::db::{self, Pool};
use crate::model::Customer;
use crate::openai::DraftSource;
use crate::week;
use anyhow::{anyhow, Result};
use chrono::{Duration, NaiveDate};
use tracing::{info, instrument, warn};

pub const DRAFTS_PER_BATCH: usize = 3;

/// Prior topics are excluded from prompts for roughly six months back,
/// capped at the most recent entries.
const TOPIC_WINDOW_DAYS: i64 = 183;
const TOPIC_LIMIT: i64 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Generated(usize),
    /// A batch already exists for this week.
    Skipped,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub generated: usize,
    pub skipped: usize,
    pub failed: usize,
}

#[instrument(skip_all, fields(customer = %customer.name))]
pub async fn generate_for_customer(
    pool: &Pool,
    source: &dyn DraftSource,
    customer: &Customer,
    today: NaiveDate,
) -> Result<Outcome> {
    let week_key = week::week_start_key(today);
    if db::has_drafts_for_week(pool, customer.id, &week_key).await? {
        info!("batch already exists this week; skipping");
        return Ok(Outcome::Skipped);
    }

    let cutoff = (today - Duration::days(TOPIC_WINDOW_DAYS))
        .format("%Y-%m-%d")
        .to_string();
    let used_titles: Vec<String> =
        db::recent_used_topics(pool, customer.id, &cutoff, TOPIC_LIMIT)
            .await?
            .into_iter()
            .map(|t| t.title)
            .collect();

    let drafts = source
        .generate_drafts(customer, &used_titles, DRAFTS_PER_BATCH)
        .await?;
    if drafts.is_empty() {
        return Err(anyhow!("generation returned no usable drafts"));
    }

    // A partially written batch is tolerated: downstream logic only asks
    // whether any pending draft exists, and the customer is retried on the
    // next scheduled run.
    for draft in &drafts {
        db::insert_draft(pool, customer.id, &week_key, draft).await?;
    }
    info!(count = drafts.len(), "draft batch created");
    Ok(Outcome::Generated(drafts.len()))
}

/// Generation pass over every active customer. A customer's failure is
/// logged and never aborts the rest of the batch.
#[instrument(skip_all)]
pub async fn generate_for_all(
    pool: &Pool,
    source: &dyn DraftSource,
    today: NaiveDate,
) -> Result<Summary> {
    let customers = db::list_active_customers(pool).await?;
    info!(count = customers.len(), "starting generation pass");

    let mut summary = Summary::default();
    for customer in &customers {
        match generate_for_customer(pool, source, customer, today).await {
            Ok(Outcome::Generated(_)) => summary.generated += 1,
            Ok(Outcome::Skipped) => summary.skipped += 1,
            Err(err) => {
                warn!(?err, customer = %customer.name, "generation failed for customer");
                summary.failed += 1;
            }
        }
    }
    info!(
        generated = summary.generated,
        skipped = summary.skipped,
        failed = summary.failed,
        "generation pass complete"
    );
    Ok(summary)
}

/// Purge every pending draft system-wide and rebuild all batches. Selected
/// and rejected drafts from settled weeks are untouched.
#[instrument(skip_all)]
pub async fn regenerate_all(
    pool: &Pool,
    source: &dyn DraftSource,
    today: NaiveDate,
) -> Result<Summary> {
    let purged = db::delete_pending_drafts(pool).await?;
    info!(purged, "pending drafts purged before regeneration");
    generate_for_all(pool, source, today).await
}
