use chrono::{DateTime, Utc};
use log::*;
use sqlx::{FromRow, QueryBuilder, SqliteConnection};

use crate::{
    db::sqlite::SqliteDatabaseError,
    db_types::{Notification, NotificationTarget, OrderCode, OutboxMessage, OutboxStatus},
    traits::RetryUpdate,
};

#[derive(FromRow)]
struct OutboxRow {
    id: i64,
    order_code: OrderCode,
    target: NotificationTarget,
    payload: String,
    status: OutboxStatus,
    attempts: i64,
    next_attempt_at: DateTime<Utc>,
    last_error: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OutboxRow> for OutboxMessage {
    type Error = SqliteDatabaseError;

    fn try_from(row: OutboxRow) -> Result<Self, Self::Error> {
        let payload = serde_json::from_str(&row.payload)?;
        Ok(Self {
            id: row.id,
            order_code: row.order_code,
            target: row.target,
            payload,
            status: row.status,
            attempts: row.attempts,
            next_attempt_at: row.next_attempt_at,
            last_error: row.last_error,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Records a notification for later delivery. Embed this in the same transaction as the change that caused it.
pub async fn insert_message(
    code: &OrderCode,
    notification: &Notification,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<i64, SqliteDatabaseError> {
    let payload = serde_json::to_string(&notification.payload)?;
    let id: i64 = sqlx::query_scalar(
        r#"
            INSERT INTO outbox_messages (order_code, target, payload, status, next_attempt_at, created_at, updated_at)
            VALUES ($1, $2, $3, 'Pending', $4, $4, $4)
            RETURNING id;
        "#,
    )
    .bind(code)
    .bind(notification.target)
    .bind(payload)
    .bind(now)
    .fetch_one(conn)
    .await?;
    trace!("📮️ {} notification #{id} queued for {code}", notification.target);
    Ok(id)
}

/// Pending messages whose retry time has passed and that have no older undelivered sibling for the same order code.
pub async fn fetch_due(
    order_code: Option<&OrderCode>,
    now: DateTime<Utc>,
    limit: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<OutboxMessage>, SqliteDatabaseError> {
    let mut builder = QueryBuilder::new(
        r#"
    SELECT * FROM outbox_messages m
    WHERE m.status = 'Pending'
      AND NOT EXISTS (
        SELECT 1 FROM outbox_messages p
        WHERE p.order_code = m.order_code AND p.id < m.id AND p.status IN ('Pending', 'Processing')
      )
      AND julianday(m.next_attempt_at) <= julianday("#,
    );
    builder.push_bind(now);
    builder.push(")");
    if let Some(code) = order_code {
        builder.push(" AND m.order_code = ");
        builder.push_bind(code.as_str());
    }
    builder.push(" ORDER BY m.id ASC LIMIT ");
    builder.push_bind(limit);
    let rows = builder.build_query_as::<OutboxRow>().fetch_all(conn).await?;
    rows.into_iter().map(OutboxMessage::try_from).collect()
}

/// Compare-and-swap from `Pending` to `Processing`. Returns false if the message was not `Pending`.
pub async fn claim(id: i64, now: DateTime<Utc>, conn: &mut SqliteConnection) -> Result<bool, SqliteDatabaseError> {
    let result =
        sqlx::query("UPDATE outbox_messages SET status = 'Processing', updated_at = $1 WHERE id = $2 AND status = 'Pending'")
            .bind(now)
            .bind(id)
            .execute(conn)
            .await?;
    Ok(result.rows_affected() == 1)
}

pub async fn mark_delivered(id: i64, now: DateTime<Utc>, conn: &mut SqliteConnection) -> Result<(), SqliteDatabaseError> {
    let result = sqlx::query(
        "UPDATE outbox_messages SET status = 'Delivered', attempts = attempts + 1, last_error = NULL, updated_at = $1 \
         WHERE id = $2",
    )
    .bind(now)
    .bind(id)
    .execute(conn)
    .await?;
    if result.rows_affected() == 0 {
        return Err(SqliteDatabaseError::OutboxMessageNotFound(id));
    }
    Ok(())
}

pub async fn reschedule(
    id: i64,
    update: &RetryUpdate,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<(), SqliteDatabaseError> {
    let status = if update.dead { OutboxStatus::Dead } else { OutboxStatus::Pending };
    let result = sqlx::query(
        r#"
            UPDATE outbox_messages SET
                status = $1,
                attempts = $2,
                next_attempt_at = $3,
                last_error = $4,
                updated_at = $5
            WHERE id = $6
        "#,
    )
    .bind(status)
    .bind(update.attempts)
    .bind(update.next_attempt_at)
    .bind(&update.last_error)
    .bind(now)
    .bind(id)
    .execute(conn)
    .await?;
    if result.rows_affected() == 0 {
        return Err(SqliteDatabaseError::OutboxMessageNotFound(id));
    }
    Ok(())
}

pub async fn reset_processing(now: DateTime<Utc>, conn: &mut SqliteConnection) -> Result<u64, SqliteDatabaseError> {
    let result =
        sqlx::query("UPDATE outbox_messages SET status = 'Pending', updated_at = $1 WHERE status = 'Processing'")
            .bind(now)
            .execute(conn)
            .await?;
    Ok(result.rows_affected())
}

pub async fn fetch_for_order(
    code: &OrderCode,
    conn: &mut SqliteConnection,
) -> Result<Vec<OutboxMessage>, SqliteDatabaseError> {
    let rows = sqlx::query_as::<_, OutboxRow>("SELECT * FROM outbox_messages WHERE order_code = $1 ORDER BY id ASC")
        .bind(code)
        .fetch_all(conn)
        .await?;
    rows.into_iter().map(OutboxMessage::try_from).collect()
}
