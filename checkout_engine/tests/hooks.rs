mod support;

use std::{
    future::Future,
    pin::Pin,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
        Mutex,
    },
    time::Duration,
};

use checkout_engine::{
    db_types::{OrderCode, PaymentStatus, Vnd},
    events::{EventHandlers, EventHooks, PaymentStatusChangedEvent, TransactionCreatedEvent},
    payment_objects::CheckoutRequest,
    CheckoutApi,
    ReconciliationApi,
};
use support::{books, customer, new_db, unreachable_gateway, MockGateway};

type BoxedFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

#[tokio::test]
async fn hooks_fire_after_commits() {
    let db = new_db().await;
    let created = Arc::new(AtomicUsize::new(0));
    let changes = Arc::new(Mutex::new(Vec::<(PaymentStatus, PaymentStatus)>::new()));

    let mut hooks = EventHooks::default();
    let c = created.clone();
    hooks.on_transaction_created(move |ev: TransactionCreatedEvent| {
        let c = c.clone();
        Box::pin(async move {
            assert_eq!(ev.transaction.status, PaymentStatus::Pending);
            c.fetch_add(1, Ordering::SeqCst);
        }) as BoxedFuture
    });
    let ch = changes.clone();
    hooks.on_status_changed(move |ev: PaymentStatusChangedEvent| {
        let ch = ch.clone();
        Box::pin(async move {
            ch.lock().unwrap().push((ev.old_status, ev.new_status()));
        }) as BoxedFuture
    });
    let handlers = EventHandlers::new(10, hooks);
    let producers = handlers.producers();
    handlers.start_handlers().await;

    let checkout = CheckoutApi::new(db.clone(), MockGateway::new(), producers.clone());
    let request = CheckoutRequest {
        order_code: Some("ORDER-55".into()),
        amount: Some(Vnd::from(150_000)),
        customer_info: Some(customer()),
        items: books(),
        payment_method: Some("COD".into()),
        ..Default::default()
    };
    checkout.checkout(request).await.unwrap();

    let reconciliation = ReconciliationApi::new(db.clone(), unreachable_gateway(), producers);
    let code = OrderCode::from("ORDER-55");
    reconciliation.confirm(&code).await.unwrap();
    // A no-op transition does not publish anything
    reconciliation.confirm(&code).await.unwrap();
    reconciliation.cancel(&code, None).await.unwrap();

    tokio::time::sleep(Duration::from_millis(250)).await;
    assert_eq!(created.load(Ordering::SeqCst), 1);
    assert_eq!(changes.lock().unwrap().clone(), vec![
        (PaymentStatus::Pending, PaymentStatus::Paid),
        (PaymentStatus::Paid, PaymentStatus::Cancelled),
    ]);
}
