use std::fmt::Debug;

use chrono::Utc;
use log::*;
use serde_json::Value;

use crate::{
    api::{
        errors::PaymentFlowError,
        payment_objects::{PaymentDetails, PaymentStatusResult},
    },
    db_types::{Notification, OrderCode, PaymentEvent, PaymentStatus, PaymentTransaction},
    events::{EventProducers, PaymentStatusChangedEvent},
    traits::{PaymentGateway, StatusChange, TransactionQueryFilter, TransactionStore},
};

/// How many times a status write is retried after losing an optimistic-lock race.
pub const MAX_CAS_ATTEMPTS: usize = 3;
pub const DEFAULT_CANCEL_REASON: &str = "Cancelled by customer";
pub const GATEWAY_CANCEL_REASON: &str = "Cancelled via payment gateway";

/// `ReconciliationApi` brings local payment state in line with what the gateway (or an admin) reports.
///
/// Every entry point funnels into the same state machine: a status *signal* is applied to the stored transaction
/// with a version check, the triggering event is appended to the payment history, and downstream notifications are
/// queued in the outbox, all in one database transaction. Notifications are only queued when the status actually
/// changes, so repeated webhooks and polls are harmless.
pub struct ReconciliationApi<B, G> {
    db: B,
    gateway: G,
    producers: EventProducers,
    signature_checks: bool,
}

impl<B, G> Debug for ReconciliationApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ReconciliationApi (signature checks: {})", self.signature_checks)
    }
}

impl<B, G> ReconciliationApi<B, G> {
    pub fn new(db: B, gateway: G, producers: EventProducers) -> Self {
        Self { db, gateway, producers, signature_checks: true }
    }

    /// Webhook signatures are checked unless this is switched off. Only ever switch it off in development.
    pub fn with_signature_checks(mut self, enabled: bool) -> Self {
        self.signature_checks = enabled;
        self
    }
}

impl<B, G> ReconciliationApi<B, G>
where
    B: TransactionStore,
    G: PaymentGateway,
{
    /// Handles a payment notification pushed by the gateway.
    ///
    /// The notification must carry a valid signature. Its `data.orderCode` may be the order code itself or the numeric
    /// code the gateway knows the order by.
    pub async fn process_webhook(
        &self,
        body: Value,
        signature: Option<&str>,
    ) -> Result<PaymentTransaction, PaymentFlowError> {
        if self.signature_checks && !self.gateway.verify_webhook(&body, signature.unwrap_or_default()) {
            warn!("🔄️ Rejecting webhook with an invalid signature");
            return Err(PaymentFlowError::InvalidSignature);
        }
        let data = body.get("data").unwrap_or(&Value::Null);
        let code = match data.get("orderCode") {
            Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
            Some(Value::Number(n)) => n.to_string(),
            _ => return Err(PaymentFlowError::Validation("The webhook does not contain an order code".into())),
        };
        let status = data
            .get("status")
            .and_then(Value::as_str)
            .ok_or_else(|| PaymentFlowError::Validation("The webhook does not contain a payment status".into()))?;
        let signal = PaymentStatus::from_gateway(status);
        let tx = self.find_for_webhook(&code).await?;
        debug!("🔄️ Webhook for {} reports {status}", tx.order_code);
        let event = PaymentEvent::Webhook { payload: body.clone() };
        self.apply_signal(tx, signal, event, GATEWAY_CANCEL_REASON).await
    }

    async fn find_for_webhook(&self, code: &str) -> Result<PaymentTransaction, PaymentFlowError> {
        let order_code = OrderCode::from(code);
        if let Some(tx) = self.db.fetch_transaction(&order_code).await? {
            return Ok(tx);
        }
        if let Ok(numeric) = code.parse::<i64>() {
            if let Some(tx) = self.db.fetch_transaction_by_gateway_code(numeric).await? {
                trace!("🔄️ Webhook code {code} matched {} via its gateway code", tx.order_code);
                return Ok(tx);
            }
        }
        Err(PaymentFlowError::TransactionNotFound(order_code))
    }

    /// Asks the gateway for the current status of a payment.
    ///
    /// If the gateway cannot be reached, or does not give a usable answer, the stored status is returned with
    /// `from_cache` set, and nothing is written.
    pub async fn poll_status(&self, code: &OrderCode) -> Result<PaymentStatusResult, PaymentFlowError> {
        let tx = self.fetch_existing(code).await?;
        let response = match self.gateway.fetch_payment_status(code).await {
            Ok(r) if r.success => r,
            Ok(r) => {
                warn!("🔄️ The gateway could not report a status for {code}: {}. Using the stored status.", r.message);
                return Ok(PaymentStatusResult { transaction: tx, from_cache: true });
            },
            Err(e) => {
                warn!("🔄️ Status check for {code} failed. Using the stored status. {e}");
                return Ok(PaymentStatusResult { transaction: tx, from_cache: true });
            },
        };
        let Some(remote) = response.remote_status.as_deref() else {
            warn!("🔄️ The gateway reply for {code} carries no status. Using the stored status.");
            return Ok(PaymentStatusResult { transaction: tx, from_cache: true });
        };
        let signal = PaymentStatus::from_gateway(remote);
        if signal == PaymentStatus::Unknown || signal == tx.status {
            trace!("🔄️ {code} is still {}", tx.status);
            return Ok(PaymentStatusResult { transaction: tx, from_cache: false });
        }
        let event = PaymentEvent::StatusCheck { response: response.raw };
        let updated = self.apply_signal(tx, signal, event, GATEWAY_CANCEL_REASON).await?;
        Ok(PaymentStatusResult { transaction: updated, from_cache: false })
    }

    /// Marks a payment as received. Used for cash on delivery and for manual bank reconciliation.
    ///
    /// The gateway is informed, but its answer does not affect the outcome.
    pub async fn confirm(&self, code: &OrderCode) -> Result<PaymentTransaction, PaymentFlowError> {
        let tx = self.fetch_existing(code).await?;
        let gateway_response = match self.gateway.confirm_payment(code).await {
            Ok(r) => {
                if !r.success {
                    warn!("🔄️ The gateway did not accept the confirmation of {code}: {}", r.message);
                }
                Some(r.raw)
            },
            Err(e) => {
                warn!("🔄️ Could not confirm {code} with the gateway. Confirming locally only. {e}");
                None
            },
        };
        let event = PaymentEvent::AdminConfirmed { gateway_response };
        self.apply_signal(tx, PaymentStatus::Paid, event, DEFAULT_CANCEL_REASON).await
    }

    /// Cancels a payment. The gateway is asked to cancel the payment link, but the local cancellation goes ahead
    /// regardless of its answer.
    pub async fn cancel(&self, code: &OrderCode, reason: Option<String>) -> Result<PaymentTransaction, PaymentFlowError> {
        let tx = self.fetch_existing(code).await?;
        let reason = reason.filter(|r| !r.trim().is_empty()).unwrap_or_else(|| DEFAULT_CANCEL_REASON.to_string());
        let gateway_response = match self.gateway.cancel_payment(code, &reason).await {
            Ok(r) => {
                if !r.success {
                    warn!("🔄️ The gateway did not accept the cancellation of {code}: {}", r.message);
                }
                Some(r.raw)
            },
            Err(e) => {
                warn!("🔄️ Could not cancel {code} with the gateway. Cancelling locally only. {e}");
                None
            },
        };
        let event = PaymentEvent::Cancelled { reason: reason.clone(), gateway_response };
        self.apply_signal(tx, PaymentStatus::Cancelled, event, &reason).await
    }

    /// The transaction together with its payment history, oldest event first.
    pub async fn payment_details(&self, code: &OrderCode) -> Result<PaymentDetails, PaymentFlowError> {
        let tx = self.fetch_existing(code).await?;
        let events = self.db.fetch_payment_events(code).await?;
        Ok(PaymentDetails::new(tx, events))
    }

    /// Transactions matching the filter, newest first.
    pub async fn list_transactions(
        &self,
        filter: TransactionQueryFilter,
    ) -> Result<Vec<PaymentTransaction>, PaymentFlowError> {
        let result = self.db.fetch_transactions(filter).await?;
        Ok(result)
    }

    async fn fetch_existing(&self, code: &OrderCode) -> Result<PaymentTransaction, PaymentFlowError> {
        self.db.fetch_transaction(code).await?.ok_or_else(|| PaymentFlowError::TransactionNotFound(code.clone()))
    }

    /// Applies a status signal to a transaction.
    ///
    /// * `Unknown`, or the current status: the event is recorded and nothing else changes.
    /// * Anything else: the status is written with a version check, together with the event and the notifications
    ///   for the transition. A lost race reloads the row and tries again, up to [`MAX_CAS_ATTEMPTS`] times.
    async fn apply_signal(
        &self,
        tx: PaymentTransaction,
        signal: PaymentStatus,
        event: PaymentEvent,
        cancel_reason: &str,
    ) -> Result<PaymentTransaction, PaymentFlowError> {
        let code = tx.order_code.clone();
        let mut current = tx;
        for attempt in 1..=MAX_CAS_ATTEMPTS {
            if signal == PaymentStatus::Unknown || signal == current.status {
                trace!("🔄️ {code} is already {}. Recording the {} event only.", current.status, event.event_type());
                self.db.append_event(&code, event).await?;
                return Ok(current);
            }
            let notifications = self.notifications_for(&current, signal, cancel_reason).await?;
            let payment_date = (signal == PaymentStatus::Paid && current.payment_date.is_none()).then(Utc::now);
            let change = StatusChange {
                order_code: code.clone(),
                expected_version: current.version,
                new_status: signal,
                payment_date,
                event: event.clone(),
                notifications,
            };
            match self.db.apply_status_change(change).await? {
                Some(updated) => {
                    info!("🔄️ {code} moved from {} to {}", current.status, updated.status);
                    let ev = PaymentStatusChangedEvent::new(updated.clone(), current.status);
                    self.producers.publish_status_changed(ev).await;
                    return Ok(updated);
                },
                None => {
                    debug!("🔄️ Lost an update race on {code} (attempt {attempt}/{MAX_CAS_ATTEMPTS}). Reloading.");
                    current = self.fetch_existing(&code).await?;
                },
            }
        }
        warn!("🔄️ Giving up on {code} after {MAX_CAS_ATTEMPTS} conflicting updates");
        Err(PaymentFlowError::ConcurrentModification(code))
    }

    async fn notifications_for(
        &self,
        tx: &PaymentTransaction,
        new_status: PaymentStatus,
        cancel_reason: &str,
    ) -> Result<Vec<Notification>, PaymentFlowError> {
        let code = &tx.order_code;
        let result = match new_status {
            PaymentStatus::Paid => {
                let mut result = vec![Notification::payment_completed(code)];
                if let Some(user_id) = tx.user_id {
                    let product_ids = self.purchased_products(code).await?;
                    if !product_ids.is_empty() {
                        result.push(Notification::cart_checkout(user_id, product_ids));
                    }
                }
                result
            },
            PaymentStatus::Failed => vec![Notification::payment_failed(code)],
            PaymentStatus::Cancelled => vec![Notification::cancel_order(code, cancel_reason)],
            PaymentStatus::Pending | PaymentStatus::Unknown => vec![],
        };
        Ok(result)
    }

    /// Product ids of the items captured at checkout, used to clear them from the shopper's cart.
    async fn purchased_products(&self, code: &OrderCode) -> Result<Vec<Value>, PaymentFlowError> {
        let events = self.db.fetch_payment_events(code).await?;
        let ids = events
            .into_iter()
            .filter_map(|r| match r.event {
                PaymentEvent::CheckoutSnapshot { items, .. } => Some(items),
                _ => None,
            })
            .flatten()
            .filter_map(|item| item.product_id())
            .collect();
        Ok(ids)
    }
}
