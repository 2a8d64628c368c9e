use super::model::UsedTopic;
use crate::model::{Customer, Draft, DraftStatus, GeneratedDraft, NotificationKind, NotificationStatus};
use anyhow::{anyhow, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::instrument;

pub type Pool = SqlitePool;

pub async fn init_pool(database_url: &str) -> Result<Pool> {
    let normalized = prepare_sqlite_url(database_url);
    let options = SqliteConnectOptions::from_str(&normalized)?.create_if_missing(true);
    let pool = SqlitePool::connect_with(options).await?;
    // WAL plus full synchronous: the batch jobs are write-light and must not
    // lose confirmations on crash.
    sqlx::query("PRAGMA journal_mode=WAL;")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA synchronous=FULL;")
        .execute(&pool)
        .await?;
    Ok(pool)
}

/// For file-backed SQLite URLs, ensure the parent directory exists so a fresh
/// checkout can open its default database. In-memory URLs and other schemes
/// pass through untouched.
fn prepare_sqlite_url(url: &str) -> String {
    if !url.starts_with("sqlite:") || url.starts_with("sqlite::memory") {
        return url.to_string();
    }

    let rest = url["sqlite:".len()..].trim_start_matches("//");
    let (path, query) = match rest.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (rest, None),
    };
    if path.is_empty() {
        return url.to_string();
    }

    if let Some(parent) = std::path::Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            let _ = std::fs::create_dir_all(parent);
        }
    }

    match query {
        Some(q) => format!("sqlite://{path}?{q}"),
        None => format!("sqlite://{path}"),
    }
}

pub async fn run_migrations(pool: &Pool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

fn parse_string_list(raw: &str) -> Vec<String> {
    serde_json::from_str(raw).unwrap_or_default()
}

fn customer_from_row(row: &SqliteRow) -> Customer {
    Customer {
        id: row.get("id"),
        name: row.get("name"),
        phone: row.get("phone"),
        business_type: row.get("business_type"),
        keywords: parse_string_list(&row.get::<String, _>("keywords")),
        tone: row.get("tone"),
        specialty: row.get("specialty"),
        target_audience: row.get("target_audience"),
        brand_concept: row.get("brand_concept"),
        main_services: parse_string_list(&row.get::<String, _>("main_services")),
        price_range: row.get("price_range"),
        location_info: row.get("location_info"),
        preferred_expressions: parse_string_list(&row.get::<String, _>("preferred_expressions")),
        avoided_expressions: parse_string_list(&row.get::<String, _>("avoided_expressions")),
        confirm_token: row.get("confirm_token"),
        is_active: row.get("is_active"),
    }
}

fn draft_from_row(row: &SqliteRow) -> Result<Draft> {
    let status_str: String = row.get("status");
    let status = DraftStatus::parse(&status_str)
        .ok_or_else(|| anyhow!("draft {} has unknown status {}", row.get::<i64, _>("id"), status_str))?;
    Ok(Draft {
        id: row.get("id"),
        customer_id: row.get("customer_id"),
        week_of: row.get("week_of"),
        title: row.get("title"),
        content: row.get("content"),
        main_keyword: row.get("main_keyword"),
        status,
    })
}

#[instrument(skip_all)]
pub async fn list_active_customers(pool: &Pool) -> Result<Vec<Customer>> {
    let rows = sqlx::query("SELECT * FROM customers WHERE is_active = 1 ORDER BY id")
        .fetch_all(pool)
        .await?;
    Ok(rows.iter().map(customer_from_row).collect())
}

#[instrument(skip_all)]
pub async fn get_customer(pool: &Pool, customer_id: i64) -> Result<Option<Customer>> {
    let row = sqlx::query("SELECT * FROM customers WHERE id = ?")
        .bind(customer_id)
        .fetch_optional(pool)
        .await?;
    Ok(row.as_ref().map(customer_from_row))
}

/// True when any draft row (in any status) exists for the customer at or
/// after the given week start. This is the batch-existence test behind the
/// generator's idempotent skip.
#[instrument(skip_all)]
pub async fn has_drafts_for_week(pool: &Pool, customer_id: i64, week_start: &str) -> Result<bool> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM drafts WHERE customer_id = ? AND week_of >= ?")
            .bind(customer_id)
            .bind(week_start)
            .fetch_one(pool)
            .await?;
    Ok(count > 0)
}

/// Pending drafts for the customer's current-week batch, in creation order.
/// Creation order is what makes auto-confirmation deterministic.
#[instrument(skip_all)]
pub async fn pending_drafts_for_week(
    pool: &Pool,
    customer_id: i64,
    week_start: &str,
) -> Result<Vec<Draft>> {
    let rows = sqlx::query(
        "SELECT * FROM drafts WHERE customer_id = ? AND status = 'pending' AND week_of >= ? ORDER BY id",
    )
    .bind(customer_id)
    .bind(week_start)
    .fetch_all(pool)
    .await?;
    rows.iter().map(draft_from_row).collect()
}

#[instrument(skip_all)]
pub async fn insert_draft(
    pool: &Pool,
    customer_id: i64,
    week_of: &str,
    draft: &GeneratedDraft,
) -> Result<i64> {
    let rec = sqlx::query(
        "INSERT INTO drafts (customer_id, week_of, title, content, main_keyword, status) \
         VALUES (?, ?, ?, ?, ?, 'pending') RETURNING id",
    )
    .bind(customer_id)
    .bind(week_of)
    .bind(&draft.title)
    .bind(&draft.content)
    .bind(&draft.main_keyword)
    .fetch_one(pool)
    .await?;
    Ok(rec.get("id"))
}

#[instrument(skip_all)]
pub async fn set_draft_status(pool: &Pool, draft_id: i64, status: DraftStatus) -> Result<()> {
    sqlx::query("UPDATE drafts SET status = ? WHERE id = ?")
        .bind(status.as_str())
        .bind(draft_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// System-wide purge of pending drafts, used by the regenerate-all reset.
/// Selected and rejected drafts are never touched.
#[instrument(skip_all)]
pub async fn delete_pending_drafts(pool: &Pool) -> Result<u64> {
    let res = sqlx::query("DELETE FROM drafts WHERE status = 'pending'")
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

#[instrument(skip_all)]
pub async fn has_confirmation_for_week(
    pool: &Pool,
    customer_id: i64,
    week_start: &str,
) -> Result<bool> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM confirmations WHERE customer_id = ? AND week_of >= ?",
    )
    .bind(customer_id)
    .bind(week_start)
    .fetch_one(pool)
    .await?;
    Ok(count > 0)
}

/// Insert a confirmation unless one already exists for (customer, week).
/// Returns false when another writer got there first; the unique index on
/// (customer_id, week_of) makes this the race-closing conditional write.
#[instrument(skip_all)]
pub async fn try_insert_confirmation(
    pool: &Pool,
    customer_id: i64,
    draft_id: i64,
    week_of: &str,
    memo: &str,
) -> Result<bool> {
    let res = sqlx::query(
        "INSERT OR IGNORE INTO confirmations (customer_id, draft_id, week_of, memo) VALUES (?, ?, ?, ?)",
    )
    .bind(customer_id)
    .bind(draft_id)
    .bind(week_of)
    .bind(memo)
    .execute(pool)
    .await?;
    Ok(res.rows_affected() == 1)
}

#[instrument(skip_all)]
pub async fn insert_notification(
    pool: &Pool,
    customer_id: i64,
    week_of: &str,
    kind: NotificationKind,
    status: NotificationStatus,
) -> Result<i64> {
    let rec = sqlx::query(
        "INSERT INTO notifications (customer_id, week_of, kind, status) VALUES (?, ?, ?, ?) RETURNING id",
    )
    .bind(customer_id)
    .bind(week_of)
    .bind(kind.as_str())
    .bind(status.as_str())
    .fetch_one(pool)
    .await?;
    Ok(rec.get("id"))
}

/// Most recent prior topics for a customer, newest first, bounded by a
/// published-at cutoff.
#[instrument(skip_all)]
pub async fn recent_used_topics(
    pool: &Pool,
    customer_id: i64,
    cutoff: &str,
    limit: i64,
) -> Result<Vec<UsedTopic>> {
    let rows = sqlx::query(
        "SELECT title, summary FROM used_topics \
         WHERE customer_id = ? AND published_at >= ? \
         ORDER BY published_at DESC LIMIT ?",
    )
    .bind(customer_id)
    .bind(cutoff)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows
        .iter()
        .map(|row| UsedTopic {
            title: row.get("title"),
            summary: row.get("summary"),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup_pool() -> Pool {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        pool
    }

    async fn seed_customer(pool: &Pool, name: &str, token: &str) -> i64 {
        sqlx::query(
            "INSERT INTO customers (name, phone, keywords, confirm_token, is_active) \
             VALUES (?, '010-1234-5678', '[\"skincare\"]', ?, 1) RETURNING id",
        )
        .bind(name)
        .bind(token)
        .fetch_one(pool)
        .await
        .unwrap()
        .get("id")
    }

    fn sample_draft(title: &str) -> GeneratedDraft {
        GeneratedDraft {
            title: title.to_string(),
            content: "body".to_string(),
            main_keyword: Some("skincare".to_string()),
        }
    }

    #[tokio::test]
    async fn customer_row_decodes_json_lists() {
        let pool = setup_pool().await;
        let id = seed_customer(&pool, "Clinic A", "tok-a").await;
        let customer = get_customer(&pool, id).await.unwrap().unwrap();
        assert_eq!(customer.keywords, vec!["skincare".to_string()]);
        assert!(customer.main_services.is_empty());
        assert!(customer.is_active);
    }

    #[tokio::test]
    async fn pending_drafts_filter_by_week_and_keep_order() {
        let pool = setup_pool().await;
        let id = seed_customer(&pool, "Clinic A", "tok-a").await;

        insert_draft(&pool, id, "2024-05-27", &sample_draft("last week")).await.unwrap();
        let first = insert_draft(&pool, id, "2024-06-03", &sample_draft("first")).await.unwrap();
        let second = insert_draft(&pool, id, "2024-06-03", &sample_draft("second")).await.unwrap();

        let drafts = pending_drafts_for_week(&pool, id, "2024-06-03").await.unwrap();
        assert_eq!(
            drafts.iter().map(|d| d.id).collect::<Vec<_>>(),
            vec![first, second]
        );

        assert!(has_drafts_for_week(&pool, id, "2024-06-03").await.unwrap());
        assert!(!has_drafts_for_week(&pool, id, "2024-06-10").await.unwrap());
    }

    #[tokio::test]
    async fn confirmation_insert_is_first_writer_wins() {
        let pool = setup_pool().await;
        let id = seed_customer(&pool, "Clinic A", "tok-a").await;
        let draft_id = insert_draft(&pool, id, "2024-06-03", &sample_draft("only")).await.unwrap();

        assert!(try_insert_confirmation(&pool, id, draft_id, "2024-06-03", "auto-confirmed")
            .await
            .unwrap());
        assert!(!try_insert_confirmation(&pool, id, draft_id, "2024-06-03", "manual")
            .await
            .unwrap());

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM confirmations")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
        assert!(has_confirmation_for_week(&pool, id, "2024-06-03").await.unwrap());
    }

    #[tokio::test]
    async fn purge_only_removes_pending() {
        let pool = setup_pool().await;
        let id = seed_customer(&pool, "Clinic A", "tok-a").await;
        let keep = insert_draft(&pool, id, "2024-06-03", &sample_draft("keep")).await.unwrap();
        insert_draft(&pool, id, "2024-06-03", &sample_draft("drop")).await.unwrap();
        set_draft_status(&pool, keep, DraftStatus::Selected).await.unwrap();

        assert_eq!(delete_pending_drafts(&pool).await.unwrap(), 1);
        let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM drafts")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(remaining, 1);
    }

    #[tokio::test]
    async fn used_topics_respect_cutoff_and_limit() {
        let pool = setup_pool().await;
        let id = seed_customer(&pool, "Clinic A", "tok-a").await;
        for (title, published) in [
            ("old", "2023-10-01"),
            ("recent-1", "2024-05-01"),
            ("recent-2", "2024-05-20"),
        ] {
            sqlx::query(
                "INSERT INTO used_topics (customer_id, title, published_at) VALUES (?, ?, ?)",
            )
            .bind(id)
            .bind(title)
            .bind(published)
            .execute(&pool)
            .await
            .unwrap();
        }

        let topics = recent_used_topics(&pool, id, "2024-01-01", 20).await.unwrap();
        assert_eq!(
            topics.iter().map(|t| t.title.as_str()).collect::<Vec<_>>(),
            vec!["recent-2", "recent-1"]
        );

        let capped = recent_used_topics(&pool, id, "2024-01-01", 1).await.unwrap();
        assert_eq!(capped.len(), 1);
    }

    #[tokio::test]
    async fn file_backed_url_creates_parent_dir() {
        let td = tempfile::tempdir().unwrap();
        let db_path = td.path().join("nested").join("bot.db");
        let url = format!("sqlite://{}", db_path.display());
        let pool = init_pool(&url).await.unwrap();
        run_migrations(&pool).await.unwrap();
        assert!(db_path.parent().unwrap().exists());
    }
}
