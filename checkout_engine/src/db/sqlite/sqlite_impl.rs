//! `SqliteDatabase` is the SQLite backend of the checkout engine.
//!
//! It implements [`TransactionStore`] and [`OutboxManagement`]. Every write that touches more than one table runs
//! inside a single database transaction.
use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;
use sqlx::{migrate, SqlitePool};

use super::{db_url, new_pool, outbox, payment_events, transactions, SqliteDatabaseError};
use crate::{
    db_types::{NewPaymentTransaction, OrderCode, OutboxMessage, PaymentEvent, PaymentEventRecord, PaymentTransaction},
    traits::{
        OutboxError,
        OutboxManagement,
        RetryUpdate,
        StatusChange,
        TransactionQueryFilter,
        TransactionStore,
        TransactionStoreError,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new database connection pool using the `BPS_DATABASE_URL` environment variable.
    pub async fn new(max_connections: u32) -> Result<Self, SqliteDatabaseError> {
        let url = db_url();
        SqliteDatabase::new_with_url(&url, max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, SqliteDatabaseError> {
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    /// Brings the schema up to date. Safe to call on every start-up.
    pub async fn migrate(&self) -> Result<(), SqliteDatabaseError> {
        migrate!("./src/db/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl TransactionStore for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn insert_transaction(&self, tx: NewPaymentTransaction) -> Result<PaymentTransaction, TransactionStoreError> {
        let now = Utc::now();
        let mut db_tx = self.pool.begin().await?;
        let transaction = transactions::insert_transaction(&tx, now, &mut db_tx).await?;
        for event in &tx.events {
            payment_events::insert_event(&transaction.order_code, event, now, &mut db_tx).await?;
        }
        for notification in &tx.notifications {
            outbox::insert_message(&transaction.order_code, notification, now, &mut db_tx).await?;
        }
        db_tx.commit().await?;
        debug!(
            "🗃️ Transaction {} saved with {} events and {} notifications",
            transaction.order_code,
            tx.events.len(),
            tx.notifications.len()
        );
        Ok(transaction)
    }

    async fn fetch_transaction(&self, code: &OrderCode) -> Result<Option<PaymentTransaction>, TransactionStoreError> {
        let mut conn = self.pool.acquire().await?;
        let tx = transactions::fetch_by_order_code(code, &mut conn).await?;
        Ok(tx)
    }

    async fn fetch_transaction_by_gateway_code(
        &self,
        gateway_code: i64,
    ) -> Result<Option<PaymentTransaction>, TransactionStoreError> {
        let mut conn = self.pool.acquire().await?;
        let tx = transactions::fetch_by_gateway_code(gateway_code, &mut conn).await?;
        Ok(tx)
    }

    async fn fetch_payment_events(&self, code: &OrderCode) -> Result<Vec<PaymentEventRecord>, TransactionStoreError> {
        let mut conn = self.pool.acquire().await?;
        let events = payment_events::fetch_events(code, &mut conn).await?;
        Ok(events)
    }

    async fn apply_status_change(
        &self,
        change: StatusChange,
    ) -> Result<Option<PaymentTransaction>, TransactionStoreError> {
        let now = Utc::now();
        let mut db_tx = self.pool.begin().await?;
        let Some(updated) = transactions::update_status_if_version(&change, now, &mut db_tx).await? else {
            // Dropping the transaction rolls it back
            return Ok(None);
        };
        payment_events::insert_event(&change.order_code, &change.event, now, &mut db_tx).await?;
        for notification in &change.notifications {
            outbox::insert_message(&change.order_code, notification, now, &mut db_tx).await?;
        }
        db_tx.commit().await?;
        debug!("🗃️ {} is now {} (version {})", updated.order_code, updated.status, updated.version);
        Ok(Some(updated))
    }

    async fn append_event(
        &self,
        code: &OrderCode,
        event: PaymentEvent,
    ) -> Result<PaymentEventRecord, TransactionStoreError> {
        let mut db_tx = self.pool.begin().await?;
        let record = match payment_events::insert_event(code, &event, Utc::now(), &mut db_tx).await {
            Ok(record) => record,
            Err(SqliteDatabaseError::DriverError(sqlx::Error::Database(e))) if e.is_foreign_key_violation() => {
                return Err(TransactionStoreError::TransactionNotFound(code.clone()));
            },
            Err(e) => return Err(e.into()),
        };
        db_tx.commit().await?;
        Ok(record)
    }

    async fn fetch_transactions(
        &self,
        filter: TransactionQueryFilter,
    ) -> Result<Vec<PaymentTransaction>, TransactionStoreError> {
        let mut conn = self.pool.acquire().await?;
        let result = transactions::fetch_transactions(filter, &mut conn).await?;
        Ok(result)
    }
}

impl OutboxManagement for SqliteDatabase {
    async fn fetch_due_messages(
        &self,
        order_code: Option<&OrderCode>,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<OutboxMessage>, OutboxError> {
        let mut conn = self.pool.acquire().await?;
        let messages = outbox::fetch_due(order_code, now, limit, &mut conn).await?;
        Ok(messages)
    }

    async fn claim_message(&self, id: i64) -> Result<bool, OutboxError> {
        let mut conn = self.pool.acquire().await?;
        let claimed = outbox::claim(id, Utc::now(), &mut conn).await?;
        Ok(claimed)
    }

    async fn mark_delivered(&self, id: i64) -> Result<(), OutboxError> {
        let mut conn = self.pool.acquire().await?;
        outbox::mark_delivered(id, Utc::now(), &mut conn).await?;
        Ok(())
    }

    async fn reschedule_message(&self, id: i64, update: RetryUpdate) -> Result<(), OutboxError> {
        let mut conn = self.pool.acquire().await?;
        outbox::reschedule(id, &update, Utc::now(), &mut conn).await?;
        Ok(())
    }

    async fn reset_in_flight(&self) -> Result<u64, OutboxError> {
        let mut conn = self.pool.acquire().await?;
        let count = outbox::reset_processing(Utc::now(), &mut conn).await?;
        if count > 0 {
            info!("📮️ {count} in-flight outbox messages were returned to the queue");
        }
        Ok(count)
    }

    async fn fetch_outbox_for_order(&self, code: &OrderCode) -> Result<Vec<OutboxMessage>, OutboxError> {
        let mut conn = self.pool.acquire().await?;
        let messages = outbox::fetch_for_order(code, &mut conn).await?;
        Ok(messages)
    }
}
