//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into the checkout engine. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Every handler here awaits the database or the payment gateway, so
//! they are all async, and none of them may call blocking code.
//!
//! All routes except `/health` are mounted under `/api/payments` by the server.
use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use checkout_engine::{
    db_types::{OrderCode, PaymentMethod},
    payment_objects::{CheckoutRequest, CreatePaymentRequest},
    traits::{PaymentGateway, TransactionQueryFilter, TransactionStore},
    CheckoutApi,
    PaymentFlowError,
    ReconciliationApi,
};
use log::*;
use serde_json::{json, Value};

use crate::{
    data_objects::{
        CancelParams,
        DataResponse,
        JsonResponse,
        OrderActionResponse,
        PaymentResultResponse,
        ResultQuery,
        TransactionListQuery,
        TransactionListResponse,
    },
    errors::ServerError,
    helpers::bearer_token,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Checkout  ----------------------------------------------------
route!(checkout => Post "/checkout" impl TransactionStore, PaymentGateway);
/// Route handler for storefront checkouts.
///
/// The body is a [`CheckoutRequest`]. `paymentMethod` must be `COD` or `BANK`.
/// * COD: the transaction is recorded and the order is created right away. The response has
///   `redirectToOrderDetail: true`.
/// * BANK: a PayOS payment link is opened first. The response carries the `paymentUrl` the buyer must be sent to.
///
/// The shopper's token is read from the `token` field, or from the `Authorization: Bearer` header if the field is
/// absent. It is only used to attribute the payment to a user.
pub async fn checkout<B, G>(
    req: HttpRequest,
    body: web::Json<CheckoutRequest>,
    api: web::Data<CheckoutApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: TransactionStore,
    G: PaymentGateway,
{
    let mut request = body.into_inner();
    if request.token.is_none() {
        request.token = bearer_token(&req);
    }
    debug!("💻️ Received checkout request for {:?} by {:?}", request.order_code, request.payment_method);
    let result = api.checkout(request).await?;
    let message = match result.payment_method {
        PaymentMethod::Cod => "Order placed. Payment will be collected on delivery",
        _ => "Payment link created",
    };
    Ok(HttpResponse::Ok().json(DataResponse::new(message, result)))
}

route!(create_payment => Post "/create" impl TransactionStore, PaymentGateway);
/// Opens a PayOS payment link without creating an order in the order service.
pub async fn create_payment<B, G>(
    req: HttpRequest,
    body: web::Json<CreatePaymentRequest>,
    api: web::Data<CheckoutApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: TransactionStore,
    G: PaymentGateway,
{
    let mut request = body.into_inner();
    if request.token.is_none() {
        request.token = bearer_token(&req);
    }
    debug!("💻️ Received direct payment request for {:?}", request.order_code);
    let result = api.create_payment(request).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Payment request created",
        "paymentUrl": result.payment_url,
        "orderCode": result.order_code,
        "transactionId": result.transaction_id,
    })))
}

//----------------------------------------------   Status  ----------------------------------------------------
route!(payment_result => Get "/result" impl TransactionStore, PaymentGateway);
/// The landing call of the storefront's payment result page: `GET /result?orderCode=..&resultCode=..`
///
/// The gateway is asked for the current status, which is recorded if it changed. If the gateway cannot be reached,
/// the stored status is returned with `fromCache: true`.
pub async fn payment_result<B, G>(
    query: web::Query<ResultQuery>,
    api: web::Data<ReconciliationApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: TransactionStore,
    G: PaymentGateway,
{
    let ResultQuery { order_code, result_code } = query.into_inner();
    let code = order_code
        .filter(|c| !c.trim().is_empty())
        .map(|c| OrderCode::from(c.trim()))
        .ok_or_else(|| PaymentFlowError::Validation("orderCode is required".into()))?;
    debug!("💻️ Payment result for {code}. Result code {result_code:?}");
    let result = api.poll_status(&code).await?;
    Ok(HttpResponse::Ok().json(PaymentResultResponse::from(result)))
}

route!(payment_status => Get "/status/{order_code}" impl TransactionStore, PaymentGateway);
pub async fn payment_status<B, G>(
    path: web::Path<String>,
    api: web::Data<ReconciliationApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: TransactionStore,
    G: PaymentGateway,
{
    let code = OrderCode::from(path.into_inner());
    trace!("💻️ Status check for {code}");
    let result = api.poll_status(&code).await?;
    Ok(HttpResponse::Ok().json(PaymentResultResponse::from(result)))
}

route!(payment_details => Get "/details/{order_code}" impl TransactionStore, PaymentGateway);
/// The transaction and its complete payment history. Read-only; the gateway is not contacted.
pub async fn payment_details<B, G>(
    path: web::Path<String>,
    api: web::Data<ReconciliationApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: TransactionStore,
    G: PaymentGateway,
{
    let code = OrderCode::from(path.into_inner());
    let payment = api.payment_details(&code).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "payment": payment })))
}

//----------------------------------------------   Actions  ----------------------------------------------------
route!(cancel_payment => Post "/cancel/{order_code}" impl TransactionStore, PaymentGateway);
/// Cancels a payment. The body is optional: `{"reason": "..."}` (`cancelReason` is accepted too).
pub async fn cancel_payment<B, G>(
    path: web::Path<String>,
    body: Option<web::Json<CancelParams>>,
    api: web::Data<ReconciliationApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: TransactionStore,
    G: PaymentGateway,
{
    let code = OrderCode::from(path.into_inner());
    let reason = body.and_then(|b| b.into_inner().reason);
    info!("💻️ Cancellation requested for {code}. Reason: {reason:?}");
    let tx = api.cancel(&code, reason).await?;
    Ok(HttpResponse::Ok().json(OrderActionResponse::new("Order cancelled", &tx)))
}

route!(confirm_payment => Post "/confirm/{order_code}" impl TransactionStore, PaymentGateway);
/// Marks a payment as received. Used by admins for COD orders and manual bank reconciliation.
pub async fn confirm_payment<B, G>(
    path: web::Path<String>,
    api: web::Data<ReconciliationApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: TransactionStore,
    G: PaymentGateway,
{
    let code = OrderCode::from(path.into_inner());
    info!("💻️ Manual payment confirmation for {code}");
    let tx = api.confirm(&code).await?;
    Ok(HttpResponse::Ok().json(OrderActionResponse::new("Payment confirmed", &tx)))
}

//----------------------------------------------   Webhook  ----------------------------------------------------
route!(payos_webhook => Post "/payos/webhook" impl TransactionStore, PaymentGateway);
/// Payment notifications pushed by PayOS. The `x-signature` header must match the body.
pub async fn payos_webhook<B, G>(
    req: HttpRequest,
    body: web::Json<Value>,
    api: web::Data<ReconciliationApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: TransactionStore,
    G: PaymentGateway,
{
    trace!("💻️ Received PayOS webhook");
    let signature = req.headers().get("x-signature").and_then(|v| v.to_str().ok());
    let tx = api.process_webhook(body.into_inner(), signature).await?;
    debug!("💻️ Webhook processed. {} is {}", tx.order_code, tx.status);
    Ok(HttpResponse::Ok().json(JsonResponse::success("Webhook processed")))
}

//----------------------------------------------   Transactions  ----------------------------------------------------
route!(transactions => Get "/transactions" impl TransactionStore, PaymentGateway);
/// All transactions, newest first. Accepts optional `status` and `limit` query parameters.
pub async fn transactions<B, G>(
    query: web::Query<TransactionListQuery>,
    api: web::Data<ReconciliationApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: TransactionStore,
    G: PaymentGateway,
{
    let TransactionListQuery { status, limit } = query.into_inner();
    let filter = TransactionQueryFilter { status, limit, ..Default::default() };
    let transactions = api.list_transactions(filter).await?;
    Ok(HttpResponse::Ok().json(TransactionListResponse { success: true, transactions }))
}

route!(user_transactions => Get "/transactions/user/{user_id}" impl TransactionStore, PaymentGateway);
pub async fn user_transactions<B, G>(
    path: web::Path<i64>,
    api: web::Data<ReconciliationApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: TransactionStore,
    G: PaymentGateway,
{
    let user_id = path.into_inner();
    let transactions = api.list_transactions(TransactionQueryFilter::for_user(user_id)).await?;
    Ok(HttpResponse::Ok().json(TransactionListResponse { success: true, transactions }))
}
