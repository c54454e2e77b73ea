use std::{env, fmt::Display, str::FromStr};

use log::*;

/// Parse a boolean flag from a string value, or return the given default value otherwise.
pub fn parse_boolean_flag(value: Option<String>, default: bool) -> bool {
    let value = match value {
        Some(v) => v,
        None => return default,
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

/// Reads a boolean flag from the environment variable `name`.
pub fn env_flag(name: &str, default: bool) -> bool {
    parse_boolean_flag(env::var(name).ok(), default)
}

/// Reads and parses a numeric environment variable. Unparseable values are logged and replaced by `default`.
pub fn env_number<T>(name: &str, default: T) -> T
where
    T: FromStr + Display + Copy,
    T::Err: Display,
{
    match env::var(name) {
        Ok(s) => s.trim().parse::<T>().unwrap_or_else(|e| {
            error!("🪛️ {s} is not a valid value for {name}. {e} Using the default, {default}, instead.");
            default
        }),
        Err(_) => {
            debug!("🪛️ {name} is not set. Using the default, {default}.");
            default
        },
    }
}

/// Reads a string environment variable, falling back to `default` with a warning.
pub fn env_string_or(name: &str, default: &str) -> String {
    env::var(name).ok().filter(|s| !s.trim().is_empty()).unwrap_or_else(|| {
        warn!("🪛️ {name} is not set. Using the default, {default}.");
        default.to_string()
    })
}

/// The payment description used when the buyer did not supply one. Kept to plain ASCII, which every gateway accepts.
pub fn default_description<S: Display>(order_code: S) -> String {
    format!("Thanh toan don hang {order_code}")
}
