//! Confirmation state classification. This is the single gate both the
//! reminder pass and the auto-confirm resolver consult; neither re-derives
//! the classification on its own.

use crate::db::{self, Pool};
use crate::model::{Customer, Draft};
use anyhow::Result;
use tracing::instrument;

/// An active customer still awaiting a decision this week, carrying the
/// pending drafts the decision is about.
#[derive(Debug, Clone)]
pub struct Unconfirmed {
    pub customer: Customer,
    pub pending_drafts: Vec<Draft>,
}

/// Active customers that (a) hold at least one pending draft at or after
/// `week_start` and (b) have no confirmation row in the same window. Both
/// checks share the one boundary value, so the two existence tests can never
/// disagree about where the week begins. Pure read, no side effects.
#[instrument(skip_all)]
pub async fn unconfirmed_customers(pool: &Pool, week_start: &str) -> Result<Vec<Unconfirmed>> {
    let mut unconfirmed = Vec::new();
    for customer in db::list_active_customers(pool).await? {
        let pending_drafts = db::pending_drafts_for_week(pool, customer.id, week_start).await?;
        if pending_drafts.is_empty() {
            continue;
        }
        if db::has_confirmation_for_week(pool, customer.id, week_start).await? {
            continue;
        }
        unconfirmed.push(Unconfirmed {
            customer,
            pending_drafts,
        });
    }
    Ok(unconfirmed)
}
