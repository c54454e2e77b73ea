use std::fmt::Display;

use serde::{Deserialize, Deserializer, Serialize};
use sqlx::Type;
use thiserror::Error;

//--------------------------------------        Vnd         ---------------------------------------------------------
/// An amount of Vietnamese đồng. The currency has no minor unit, so amounts are always whole numbers.
///
/// Deserialization is lenient because storefront clients send amounts as numbers, numeric strings or floats.
/// Fractional values are truncated, matching how the gateway expects integer amounts.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, PartialEq, Eq, Hash, Serialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct Vnd(i64);

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented as a VND amount: {0}")]
pub struct VndConversionError(String);

impl From<i64> for Vnd {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl TryFrom<u64> for Vnd {
    type Error = VndConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        i64::try_from(value).map(Self).map_err(|_| VndConversionError(format!("{value} is too large")))
    }
}

impl TryFrom<f64> for Vnd {
    type Error = VndConversionError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if !value.is_finite() || value.abs() >= i64::MAX as f64 {
            return Err(VndConversionError(value.to_string()));
        }
        #[allow(clippy::cast_possible_truncation)]
        Ok(Self(value.trunc() as i64))
    }
}

impl TryFrom<&str> for Vnd {
    type Error = VndConversionError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let s = value.trim();
        if let Ok(v) = s.parse::<i64>() {
            return Ok(Self(v));
        }
        let v = s.parse::<f64>().map_err(|_| VndConversionError(value.to_string()))?;
        Self::try_from(v)
    }
}

impl<'de> Deserialize<'de> for Vnd {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where D: Deserializer<'de> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawAmount {
            Int(i64),
            Float(f64),
            Text(String),
        }
        match RawAmount::deserialize(deserializer)? {
            RawAmount::Int(v) => Ok(Self(v)),
            RawAmount::Float(v) => Self::try_from(v).map_err(serde::de::Error::custom),
            RawAmount::Text(s) => Self::try_from(s.as_str()).map_err(serde::de::Error::custom),
        }
    }
}

impl Display for Vnd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}₫", self.0)
    }
}

impl Vnd {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }
}
