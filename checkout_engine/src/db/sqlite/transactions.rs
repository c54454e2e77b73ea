use chrono::{DateTime, Utc};
use log::*;
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db::sqlite::SqliteDatabaseError,
    db_types::{NewPaymentTransaction, OrderCode, PaymentTransaction},
    traits::{StatusChange, TransactionQueryFilter},
};

/// Inserts a new transaction row. This is not atomic on its own. Pass `&mut *tx` to embed it in a larger transaction.
pub async fn insert_transaction(
    tx: &NewPaymentTransaction,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<PaymentTransaction, SqliteDatabaseError> {
    let result = sqlx::query_as::<_, PaymentTransaction>(
        r#"
            INSERT INTO payment_transactions (
                order_code,
                gateway_code,
                user_id,
                amount,
                payment_method,
                status,
                payment_url,
                description,
                customer_name,
                customer_email,
                customer_phone,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, 'PENDING', $6, $7, $8, $9, $10, $11, $11)
            RETURNING *;
        "#,
    )
    .bind(&tx.order_code)
    .bind(tx.gateway_code)
    .bind(tx.user_id)
    .bind(tx.amount)
    .bind(tx.payment_method)
    .bind(&tx.payment_url)
    .bind(&tx.description)
    .bind(&tx.customer.full_name)
    .bind(&tx.customer.email)
    .bind(&tx.customer.phone)
    .bind(now)
    .fetch_one(conn)
    .await;
    match result {
        Ok(row) => {
            trace!("🗃️ Transaction {} stored with id {}", row.order_code, row.id);
            Ok(row)
        },
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            Err(SqliteDatabaseError::DuplicateOrderCode(tx.order_code.clone()))
        },
        Err(e) => Err(e.into()),
    }
}

pub async fn fetch_by_order_code(
    code: &OrderCode,
    conn: &mut SqliteConnection,
) -> Result<Option<PaymentTransaction>, SqliteDatabaseError> {
    let tx = sqlx::query_as::<_, PaymentTransaction>("SELECT * FROM payment_transactions WHERE order_code = $1")
        .bind(code)
        .fetch_optional(conn)
        .await?;
    Ok(tx)
}

pub async fn fetch_by_gateway_code(
    gateway_code: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<PaymentTransaction>, SqliteDatabaseError> {
    let tx = sqlx::query_as::<_, PaymentTransaction>(
        "SELECT * FROM payment_transactions WHERE gateway_code = $1 ORDER BY id DESC LIMIT 1",
    )
    .bind(gateway_code)
    .fetch_optional(conn)
    .await?;
    Ok(tx)
}

/// Writes the new status only if the row still carries `change.expected_version`. The version is bumped on success.
///
/// `payment_date` is only ever filled in once. An existing payment date is never overwritten.
pub async fn update_status_if_version(
    change: &StatusChange,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<PaymentTransaction>, SqliteDatabaseError> {
    let updated = sqlx::query_as::<_, PaymentTransaction>(
        r#"
            UPDATE payment_transactions SET
                status = $1,
                payment_date = COALESCE(payment_date, $2),
                version = version + 1,
                updated_at = $3
            WHERE order_code = $4 AND version = $5
            RETURNING *;
        "#,
    )
    .bind(change.new_status)
    .bind(change.payment_date)
    .bind(now)
    .bind(&change.order_code)
    .bind(change.expected_version)
    .fetch_optional(conn)
    .await?;
    if updated.is_none() {
        debug!("🗃️ Version {} of {} is stale. Status not written.", change.expected_version, change.order_code);
    }
    Ok(updated)
}

/// Fetches transactions according to the filter, newest first.
pub async fn fetch_transactions(
    filter: TransactionQueryFilter,
    conn: &mut SqliteConnection,
) -> Result<Vec<PaymentTransaction>, SqliteDatabaseError> {
    let mut builder = QueryBuilder::new("SELECT * FROM payment_transactions ");
    if !filter.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(user_id) = filter.user_id {
        where_clause.push("user_id = ");
        where_clause.push_bind_unseparated(user_id);
    }
    if let Some(status) = filter.status {
        where_clause.push("status = ");
        where_clause.push_bind_unseparated(status);
    }
    if let Some(method) = filter.payment_method {
        where_clause.push("payment_method = ");
        where_clause.push_bind_unseparated(method);
    }
    builder.push(" ORDER BY created_at DESC, id DESC");
    if let Some(limit) = filter.limit {
        builder.push(" LIMIT ");
        builder.push_bind(limit);
    }
    trace!("🗃️ Executing query: {}", builder.sql());
    let transactions = builder.build_query_as::<PaymentTransaction>().fetch_all(conn).await?;
    trace!("🗃️ Result of fetch_transactions: {}", transactions.len());
    Ok(transactions)
}
