use std::fmt::Debug;

use bks_common::{helpers::default_description, read_token};
use log::*;
use serde_json::{json, Value};

use crate::{
    api::{
        errors::PaymentFlowError,
        payment_objects::{CheckoutRequest, CheckoutResult, CreatePaymentRequest, CreatePaymentResult},
    },
    db_types::{
        CustomerInfo,
        LineItem,
        NewPaymentTransaction,
        Notification,
        OrderCode,
        PaymentEvent,
        PaymentMethod,
        PaymentStatus,
        PaymentTransaction,
        Vnd,
    },
    events::{EventProducers, TransactionCreatedEvent},
    helpers::new_order_code,
    traits::{GatewayResponse, PaymentGateway, PaymentLinkRequest, TransactionStore},
};

/// `CheckoutApi` turns storefront checkouts into payment transactions.
///
/// Cash-on-delivery checkouts are stored straight away. Bank checkouts first obtain a payment link from the gateway,
/// and nothing is stored unless the gateway hands one out. In both cases the order service is told about the new
/// order through the outbox, so a slow or failing order service never affects the checkout response.
pub struct CheckoutApi<B, G> {
    db: B,
    gateway: G,
    producers: EventProducers,
}

impl<B, G> Debug for CheckoutApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CheckoutApi")
    }
}

impl<B, G> CheckoutApi<B, G> {
    pub fn new(db: B, gateway: G, producers: EventProducers) -> Self {
        Self { db, gateway, producers }
    }
}

impl<B, G> CheckoutApi<B, G>
where
    B: TransactionStore,
    G: PaymentGateway,
{
    /// Validates and processes a storefront checkout.
    ///
    /// Validation failures have no side effects. A supplied token that cannot be decoded does not fail the checkout;
    /// the transaction is simply not attributed to a user.
    pub async fn checkout(&self, request: CheckoutRequest) -> Result<CheckoutResult, PaymentFlowError> {
        let amount = validate_amount(request.amount)?;
        let customer = request
            .customer_info
            .clone()
            .ok_or_else(|| PaymentFlowError::Validation("Customer information is required".into()))?;
        if request.items.is_empty() {
            return Err(PaymentFlowError::Validation("At least one item is required".into()));
        }
        let method = match request.payment_method.as_deref() {
            Some("COD") => PaymentMethod::Cod,
            Some("BANK") => PaymentMethod::Bank,
            _ => {
                return Err(PaymentFlowError::Validation(
                    "Unsupported payment method. Only COD or BANK are accepted".into(),
                ))
            },
        };
        let user_id = attributed_user(request.token.as_deref());
        let order_code = order_code_or_new(request.order_code.as_deref());
        debug!("💳️ Checkout {order_code}: {amount} by {method}, {} items, user {user_id:?}", request.items.len());
        let snapshot = PaymentEvent::CheckoutSnapshot {
            items: request.items.clone(),
            customer_info: customer.clone(),
            shipping_address: request.shipping_address.clone(),
            note: request.note.clone(),
        };
        let create_order = Notification::create_order(order_service_payload(
            &order_code,
            user_id,
            amount,
            method,
            &customer,
            &request,
        ));
        match method {
            PaymentMethod::Bank => {
                let description = default_description(&order_code);
                let link = PaymentLinkRequest {
                    order_code: order_code.clone(),
                    amount,
                    description: Some(description.clone()),
                    customer: customer.clone(),
                    items: request.items.clone(),
                };
                let (response, url) = self.request_payment_link(link).await?;
                let new_tx = NewPaymentTransaction::new(order_code.clone(), amount, PaymentMethod::Bank)
                    .with_user_id(user_id)
                    .with_gateway_code(self.gateway.gateway_code(&order_code))
                    .with_payment_url(Some(url))
                    .with_description(description)
                    .with_customer(customer)
                    .with_event(snapshot)
                    .with_event(PaymentEvent::GatewayResponse { response: response.raw })
                    .with_notification(create_order);
                let tx = self.store(new_tx).await?;
                info!("💳️ Bank checkout {} created. Awaiting payment of {}", tx.order_code, tx.amount);
                Ok(CheckoutResult::for_payment_link(&tx))
            },
            _ => {
                let new_tx = NewPaymentTransaction::new(order_code.clone(), amount, PaymentMethod::Cod)
                    .with_user_id(user_id)
                    .with_description(format!("Thanh toán khi nhận hàng cho đơn #{order_code}"))
                    .with_customer(customer)
                    .with_event(snapshot)
                    .with_notification(create_order);
                let tx = self.store(new_tx).await?;
                info!("💳️ COD checkout {} created for {}", tx.order_code, tx.amount);
                Ok(CheckoutResult::for_cash_on_delivery(&tx))
            },
        }
    }

    /// Creates a payment link directly, without creating an order in the order service.
    pub async fn create_payment(&self, request: CreatePaymentRequest) -> Result<CreatePaymentResult, PaymentFlowError> {
        let amount = validate_amount(request.amount)?;
        let user_id = attributed_user(request.token.as_deref());
        let order_code = order_code_or_new(request.order_code.as_deref());
        let description = request
            .description
            .clone()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| default_description(&order_code));
        let customer = request.customer();
        debug!("💳️ Direct payment request {order_code} for {amount}");
        let link = PaymentLinkRequest {
            order_code: order_code.clone(),
            amount,
            description: Some(description.clone()),
            customer: customer.clone(),
            items: request.items.clone(),
        };
        let (response, url) = self.request_payment_link(link).await?;
        let new_tx = NewPaymentTransaction::new(order_code.clone(), amount, PaymentMethod::Payos)
            .with_user_id(user_id)
            .with_gateway_code(self.gateway.gateway_code(&order_code))
            .with_payment_url(Some(url))
            .with_description(description)
            .with_customer(customer.clone())
            .with_event(PaymentEvent::CheckoutSnapshot {
                items: request.items,
                customer_info: customer,
                shipping_address: None,
                note: None,
            })
            .with_event(PaymentEvent::GatewayResponse { response: response.raw });
        let tx = self.store(new_tx).await?;
        info!("💳️ Direct payment {} created for {}", tx.order_code, tx.amount);
        Ok(CreatePaymentResult {
            order_code: tx.order_code,
            transaction_id: tx.id,
            payment_url: tx.payment_url,
            amount: tx.amount,
        })
    }

    /// Asks the gateway for a payment link and insists on a usable answer.
    async fn request_payment_link(
        &self,
        link: PaymentLinkRequest,
    ) -> Result<(GatewayResponse, String), PaymentFlowError> {
        let code = link.order_code.clone();
        let response = self.gateway.create_payment_link(link).await.map_err(|e| {
            error!("💳️ Could not request a payment link for {code}. {e}");
            PaymentFlowError::from(e)
        })?;
        if !response.success {
            warn!("💳️ The gateway declined the payment link for {code}: {}", response.message);
            return Err(PaymentFlowError::GatewayRejected { message: response.message, response: response.raw });
        }
        match response.checkout_url.clone().filter(|u| !u.trim().is_empty()) {
            Some(url) => Ok((response, url)),
            None => {
                error!("💳️ The gateway accepted {code} but did not provide a checkout URL");
                Err(PaymentFlowError::MissingCheckoutUrl { response: response.raw })
            },
        }
    }

    async fn store(&self, new_tx: NewPaymentTransaction) -> Result<PaymentTransaction, PaymentFlowError> {
        let tx = self.db.insert_transaction(new_tx).await.map_err(|e| {
            warn!("💳️ Could not save the payment transaction. {e}");
            PaymentFlowError::from(e)
        })?;
        self.producers.publish_transaction_created(TransactionCreatedEvent::new(tx.clone())).await;
        Ok(tx)
    }
}

fn validate_amount(amount: Option<Vnd>) -> Result<Vnd, PaymentFlowError> {
    amount
        .filter(|a| a.is_positive())
        .ok_or_else(|| PaymentFlowError::Validation("The amount must be a positive whole number".into()))
}

fn attributed_user(token: Option<&str>) -> Option<i64> {
    let token = token.filter(|t| !t.trim().is_empty())?;
    match read_token(token) {
        Ok(identity) => {
            trace!("💳️ Checkout attributed to {:?} ({:?})", identity.username, identity.user_id);
            identity.user_id
        },
        Err(e) => {
            debug!("💳️ Ignoring unreadable token. Proceeding anonymously. {e}");
            None
        },
    }
}

fn order_code_or_new(code: Option<&str>) -> OrderCode {
    code.and_then(|c| c.parse::<OrderCode>().ok()).unwrap_or_else(new_order_code)
}

/// The body the order service expects for `POST /api/orders`. Items are forwarded exactly as submitted.
fn order_service_payload(
    code: &OrderCode,
    user_id: Option<i64>,
    amount: Vnd,
    method: PaymentMethod,
    customer: &CustomerInfo,
    request: &CheckoutRequest,
) -> Value {
    let items: &[LineItem] = &request.items;
    json!({
        "orderCode": code,
        "userId": user_id,
        "totalAmount": amount,
        "shippingAddress": request.shipping_address,
        "paymentMethod": method,
        "paymentStatus": PaymentStatus::Pending,
        "customerName": customer.full_name,
        "customerEmail": customer.email,
        "customerPhone": customer.phone,
        "notes": request.note,
        "items": items,
    })
}
