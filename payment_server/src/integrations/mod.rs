//! Adapters between the checkout engine's backend traits and the outside world.
//!
//! * [`payos::PayosGateway`] implements [`checkout_engine::traits::PaymentGateway`] on top of the PayOS client.
//! * [`downstream::DownstreamClient`] implements [`checkout_engine::traits::Notifier`] for the order and cart services.
//! * [`outbox_hooks`] wires engine events to immediate outbox delivery.
pub mod downstream;
pub mod outbox_hooks;
pub mod payos;
