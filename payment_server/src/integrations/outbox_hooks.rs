use checkout_engine::{
    db_types::OrderCode,
    events::{EventHandlers, EventHooks},
    OutboxApi,
    SqliteDatabase,
};
use futures::future::BoxFuture;
use log::*;

use crate::integrations::downstream::DownstreamClient;

pub const OUTBOX_EVENT_BUFFER_SIZE: usize = 25;

pub type Outbox = OutboxApi<SqliteDatabase, DownstreamClient>;

/// Creates the event handlers that push notifications out as soon as they are committed.
///
/// 1. TransactionCreatedEvent - a new transaction may carry a `CreateOrder` notification.
/// 2. PaymentStatusChangedEvent - transitions to PAID, FAILED and CANCELLED carry order and cart notifications.
///
/// In both cases only the outbox rows of the affected order are dispatched. Anything that fails here stays in the
/// outbox and is picked up by the outbox worker.
pub fn create_outbox_event_handlers(outbox: Outbox) -> EventHandlers {
    let mut hooks = EventHooks::default();
    let outbox_clone = outbox.clone();
    // --- On TransactionCreated Handler ---
    hooks.on_transaction_created(move |ev| {
        let code = ev.transaction.order_code;
        dispatch_for(outbox_clone.clone(), code)
    });
    // --- On PaymentStatusChanged Handler ---
    hooks.on_status_changed(move |ev| {
        trace!(
            "📮️ {} moved from {} to {}. Flushing its notifications.",
            ev.transaction.order_code,
            ev.old_status,
            ev.new_status()
        );
        let code = ev.transaction.order_code;
        dispatch_for(outbox.clone(), code)
    });
    EventHandlers::new(OUTBOX_EVENT_BUFFER_SIZE, hooks)
}

fn dispatch_for(outbox: Outbox, code: OrderCode) -> BoxFuture<'static, ()> {
    Box::pin(async move {
        match outbox.dispatch_for(&code).await {
            Ok(summary) if summary.is_empty() => trace!("📮️ Nothing to deliver for {code}"),
            Ok(summary) => debug!("📮️ Notifications for {code}: {summary:?}"),
            Err(e) => error!("📮️ Could not dispatch notifications for {code}. The outbox worker will retry. {e}"),
        }
    })
}
