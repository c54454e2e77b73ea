use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use checkout_engine::{events::EventProducers, CheckoutApi, OutboxApi, ReconciliationApi, SqliteDatabase};
use log::*;
use payos_tools::PayosApi;

use crate::{
    config::ServerConfig,
    errors::ServerError,
    helpers::{json_config, path_config, query_config},
    integrations::{downstream::DownstreamClient, outbox_hooks::create_outbox_event_handlers, payos::PayosGateway},
    outbox_worker::start_outbox_worker,
    routes::{
        health,
        CancelPaymentRoute,
        CheckoutRoute,
        ConfirmPaymentRoute,
        CreatePaymentRoute,
        PaymentDetailsRoute,
        PaymentResultRoute,
        PaymentStatusRoute,
        PayosWebhookRoute,
        TransactionsRoute,
        UserTransactionsRoute,
    },
};

const MAX_DB_CONNECTIONS: u32 = 25;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    config.warn_about_insecure_settings();
    let db = SqliteDatabase::new_with_url(&config.database_url, MAX_DB_CONNECTIONS)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.migrate().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let payos = PayosApi::new(config.payos.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let gateway = PayosGateway::new(payos);
    let notifier =
        DownstreamClient::new(config.downstream.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let outbox = OutboxApi::new(db.clone(), notifier, config.outbox);
    // Nothing else is running yet, so anything still marked as in flight was abandoned by the previous run
    let recovered = outbox.recover_in_flight().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    if recovered > 0 {
        warn!("📮️ {recovered} notifications were in flight when the server last stopped. They will be resent.");
    }
    let handlers = create_outbox_event_handlers(outbox.clone());
    let producers = handlers.producers();
    handlers.start_handlers().await;
    let _worker = start_outbox_worker(outbox);
    let srv = create_server_instance(config, db, gateway, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    gateway: PayosGateway,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let signature_checks = config.signature_checks;
    let srv = HttpServer::new(move || {
        let checkout_api = CheckoutApi::new(db.clone(), gateway.clone(), producers.clone());
        let reconciliation_api = ReconciliationApi::new(db.clone(), gateway.clone(), producers.clone())
            .with_signature_checks(signature_checks);
        let payments_scope = web::scope("/api/payments")
            .service(CheckoutRoute::<SqliteDatabase, PayosGateway>::new())
            .service(CreatePaymentRoute::<SqliteDatabase, PayosGateway>::new())
            .service(PaymentResultRoute::<SqliteDatabase, PayosGateway>::new())
            .service(PaymentStatusRoute::<SqliteDatabase, PayosGateway>::new())
            .service(PaymentDetailsRoute::<SqliteDatabase, PayosGateway>::new())
            .service(CancelPaymentRoute::<SqliteDatabase, PayosGateway>::new())
            .service(ConfirmPaymentRoute::<SqliteDatabase, PayosGateway>::new())
            .service(PayosWebhookRoute::<SqliteDatabase, PayosGateway>::new())
            .service(TransactionsRoute::<SqliteDatabase, PayosGateway>::new())
            .service(UserTransactionsRoute::<SqliteDatabase, PayosGateway>::new());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("bps::access_log"))
            .app_data(json_config())
            .app_data(query_config())
            .app_data(path_config())
            .app_data(web::Data::new(checkout_api))
            .app_data(web::Data::new(reconciliation_api))
            .service(health)
            .service(payments_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
