use chrono::{DateTime, Utc};
use log::*;
use sqlx::{FromRow, SqliteConnection};

use crate::{
    db::sqlite::SqliteDatabaseError,
    db_types::{OrderCode, PaymentEvent, PaymentEventRecord},
};

#[derive(FromRow)]
struct PaymentEventRow {
    id: i64,
    order_code: OrderCode,
    payload: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<PaymentEventRow> for PaymentEventRecord {
    type Error = SqliteDatabaseError;

    fn try_from(row: PaymentEventRow) -> Result<Self, Self::Error> {
        let event = serde_json::from_str::<PaymentEvent>(&row.payload)?;
        Ok(Self { id: row.id, order_code: row.order_code, event, created_at: row.created_at })
    }
}

/// Appends an entry to the payment history of `code`.
pub async fn insert_event(
    code: &OrderCode,
    event: &PaymentEvent,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<PaymentEventRecord, SqliteDatabaseError> {
    let payload = serde_json::to_string(event)?;
    let row = sqlx::query_as::<_, PaymentEventRow>(
        r#"
            INSERT INTO payment_events (order_code, event_type, payload, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, order_code, payload, created_at;
        "#,
    )
    .bind(code)
    .bind(event.event_type())
    .bind(payload)
    .bind(now)
    .fetch_one(conn)
    .await?;
    trace!("🗃️ {} event #{} recorded for {code}", event.event_type(), row.id);
    row.try_into()
}

/// The payment history of `code`, in insertion order.
pub async fn fetch_events(
    code: &OrderCode,
    conn: &mut SqliteConnection,
) -> Result<Vec<PaymentEventRecord>, SqliteDatabaseError> {
    let rows = sqlx::query_as::<_, PaymentEventRow>(
        "SELECT id, order_code, payload, created_at FROM payment_events WHERE order_code = $1 ORDER BY id ASC",
    )
    .bind(code)
    .fetch_all(conn)
    .await?;
    rows.into_iter().map(PaymentEventRecord::try_from).collect()
}
