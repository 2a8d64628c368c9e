//! Notification passes. `send_initial` covers every active customer holding
//! pending drafts this week; `send_reminder` covers only the still-unconfirmed
//! subset. Neither enforces send-once semantics; the daily scheduler calls
//! each path at most once per day.

use crate::db::{self, Pool};
use crate::model::{Customer, NotificationKind, NotificationStatus};
use crate::sens::AlimtalkService;
use crate::tracker;
use crate::week;
use anyhow::Result;
use chrono::NaiveDate;
use tracing::{info, instrument, warn};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub sent: usize,
    pub failed: usize,
    pub skipped: usize,
}

pub fn confirm_link(service_url: &str, token: &str) -> String {
    format!("{}/confirm/{}", service_url.trim_end_matches('/'), token)
}

/// Weekly "drafts ready" pass: every active customer with a pending batch.
/// No confirmation check here: a customer who confirmed within minutes of
/// the Monday send still got the initial message.
#[instrument(skip_all)]
pub async fn send_initial(
    pool: &Pool,
    sender: &dyn AlimtalkService,
    service_url: &str,
    today: NaiveDate,
) -> Result<Summary> {
    let week_key = week::week_start_key(today);
    let customers = db::list_active_customers(pool).await?;
    info!(count = customers.len(), "starting initial notification pass");

    let mut summary = Summary::default();
    for customer in &customers {
        let has_pending = match db::pending_drafts_for_week(pool, customer.id, &week_key).await {
            Ok(drafts) => !drafts.is_empty(),
            Err(err) => {
                warn!(?err, customer = %customer.name, "could not read pending drafts");
                summary.failed += 1;
                continue;
            }
        };
        if !has_pending {
            info!(customer = %customer.name, "no pending drafts; skipping");
            summary.skipped += 1;
            continue;
        }
        tally(
            &mut summary,
            notify_customer(
                pool,
                sender,
                service_url,
                customer,
                NotificationKind::Initial,
                &week_key,
            )
            .await,
            customer,
        );
    }
    info!(
        sent = summary.sent,
        failed = summary.failed,
        skipped = summary.skipped,
        "initial notification pass complete"
    );
    Ok(summary)
}

/// Reminder pass over the tracker's unconfirmed customers.
#[instrument(skip_all)]
pub async fn send_reminder(
    pool: &Pool,
    sender: &dyn AlimtalkService,
    service_url: &str,
    today: NaiveDate,
) -> Result<Summary> {
    let week_key = week::week_start_key(today);
    let unconfirmed = tracker::unconfirmed_customers(pool, &week_key).await?;
    info!(count = unconfirmed.len(), "customers awaiting confirmation");

    let mut summary = Summary::default();
    for entry in &unconfirmed {
        tally(
            &mut summary,
            notify_customer(
                pool,
                sender,
                service_url,
                &entry.customer,
                NotificationKind::Reminder,
                &week_key,
            )
            .await,
            &entry.customer,
        );
    }
    info!(
        sent = summary.sent,
        failed = summary.failed,
        "reminder pass complete"
    );
    Ok(summary)
}

fn tally(summary: &mut Summary, result: Result<bool>, customer: &Customer) {
    match result {
        Ok(true) => summary.sent += 1,
        Ok(false) => summary.failed += 1,
        Err(err) => {
            warn!(?err, customer = %customer.name, "notification bookkeeping failed");
            summary.failed += 1;
        }
    }
}

/// Send one message and append its audit row. Returns whether delivery
/// succeeded; a delivery error is captured in the log row rather than
/// propagated, so one customer's failure never halts the pass.
async fn notify_customer(
    pool: &Pool,
    sender: &dyn AlimtalkService,
    service_url: &str,
    customer: &Customer,
    kind: NotificationKind,
    week_of: &str,
) -> Result<bool> {
    let link = confirm_link(service_url, &customer.confirm_token);
    let delivery = sender.send(&customer.phone, &customer.name, &link).await;
    let status = match &delivery {
        Ok(()) => {
            info!(customer = %customer.name, kind = kind.as_str(), "notification sent");
            NotificationStatus::Sent
        }
        Err(err) => {
            warn!(?err, customer = %customer.name, kind = kind.as_str(), "delivery failed");
            NotificationStatus::Failed
        }
    };
    db::insert_notification(pool, customer.id, week_of, kind, status).await?;
    Ok(delivery.is_ok())
}
