use chrono::{DateTime, Duration, Utc};

use crate::PayosApiError;

/// Prefix used for order codes synthesised by the checkout flow.
pub const ORDER_CODE_PREFIX: &str = "ORDER-";

/// How long a payment link stays valid.
pub const PAYMENT_LINK_LIFETIME_HOURS: i64 = 24;

/// The gateway only accepts numeric order codes up to the largest integer a JavaScript client can represent.
pub const MAX_GATEWAY_ORDER_CODE: i64 = 9_007_199_254_740_991;

/// Converts a local order code into the numeric form the gateway expects.
///
/// * An all-digit code is used as-is.
/// * A code carrying the synthesised `ORDER-` prefix is reduced to its digits.
/// * Anything else cannot be represented and is rejected.
pub fn numeric_order_code(order_code: &str) -> Result<i64, PayosApiError> {
    let code = order_code.trim();
    let digits = match code.strip_prefix(ORDER_CODE_PREFIX) {
        Some(rest) => rest.chars().filter(char::is_ascii_digit).collect::<String>(),
        None if !code.is_empty() && code.chars().all(|c| c.is_ascii_digit()) => code.to_string(),
        None => return Err(PayosApiError::InvalidOrderCode(order_code.to_string())),
    };
    let value = digits.parse::<i64>().map_err(|_| PayosApiError::InvalidOrderCode(order_code.to_string()))?;
    if value <= 0 || value > MAX_GATEWAY_ORDER_CODE {
        return Err(PayosApiError::InvalidOrderCode(order_code.to_string()));
    }
    Ok(value)
}

/// Unix timestamp (seconds) at which a payment link created at `now` expires.
pub fn payment_link_expiry(now: DateTime<Utc>) -> i64 {
    (now + Duration::hours(PAYMENT_LINK_LIFETIME_HOURS)).timestamp()
}
