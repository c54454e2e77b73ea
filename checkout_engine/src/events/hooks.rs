use std::{future::Future, pin::Pin, sync::Arc};

use log::*;

use crate::events::{EventHandler, EventProducer, Handler, PaymentStatusChangedEvent, TransactionCreatedEvent};

#[derive(Default, Clone)]
pub struct EventProducers {
    pub transaction_created_producer: Vec<EventProducer<TransactionCreatedEvent>>,
    pub status_changed_producer: Vec<EventProducer<PaymentStatusChangedEvent>>,
}

impl EventProducers {
    pub async fn publish_transaction_created(&self, event: TransactionCreatedEvent) {
        for emitter in &self.transaction_created_producer {
            trace!("📬️ Notifying transaction created hook subscribers");
            emitter.publish_event(event.clone()).await;
        }
    }

    pub async fn publish_status_changed(&self, event: PaymentStatusChangedEvent) {
        for emitter in &self.status_changed_producer {
            trace!("📬️ Notifying status changed hook subscribers");
            emitter.publish_event(event.clone()).await;
        }
    }
}

pub struct EventHandlers {
    pub on_transaction_created: Option<EventHandler<TransactionCreatedEvent>>,
    pub on_status_changed: Option<EventHandler<PaymentStatusChangedEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_transaction_created = hooks.on_transaction_created.map(|f| EventHandler::new(buffer_size, f));
        let on_status_changed = hooks.on_status_changed.map(|f| EventHandler::new(buffer_size, f));
        Self { on_transaction_created, on_status_changed }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_transaction_created {
            result.transaction_created_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_status_changed {
            result.status_changed_producer.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_transaction_created {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        if let Some(handler) = self.on_status_changed {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_transaction_created: Option<Handler<TransactionCreatedEvent>>,
    pub on_status_changed: Option<Handler<PaymentStatusChangedEvent>>,
}

impl EventHooks {
    pub fn on_transaction_created<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(TransactionCreatedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_transaction_created = Some(Arc::new(f));
        self
    }

    pub fn on_status_changed<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(PaymentStatusChangedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_status_changed = Some(Arc::new(f));
        self
    }
}
