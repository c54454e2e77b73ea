use chrono::Utc;
use rand::Rng;

use crate::db_types::OrderCode;

pub const ORDER_CODE_PREFIX: &str = "ORDER-";

/// Generates a fresh order code of the form `ORDER-{unix millis}{3 random digits}`.
///
/// Uniqueness is not checked here. Should two checkouts in the same millisecond draw the same suffix, the store's
/// uniqueness constraint rejects the second insert.
pub fn new_order_code() -> OrderCode {
    let millis = Utc::now().timestamp_millis();
    let suffix = rand::thread_rng().gen_range(0..1000);
    OrderCode(format!("{ORDER_CODE_PREFIX}{millis}{suffix:03}"))
}
