//! Bearer token reader
//!
//! The storefront forwards the token issued by the auth service so that payments can be attributed to a user. The
//! payment service does not hold the signing key, so tokens are decoded **without** verifying the signature and
//! without enforcing expiry. The result must only ever be used for attribution, never for authorization.
//!
//! Tokens from the auth service carry `sub`, `userId` and a role claim. The role claim comes in several shapes
//! depending on which issuer produced the token:
//! * a plain string: `"role": "ROLE_USER"`
//! * an array of strings: `"roles": ["ROLE_USER", "ROLE_ADMIN"]`
//! * Spring-style authorities: `"role": [{"authority": "ROLE_USER"}]`
//! * a single authority object: `"role": {"authority": "ROLE_USER"}`
//!
//! All of them collapse into the [`Identity::roles`] set.
use std::collections::BTreeSet;

use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{decode, DecodingKey, Validation};
use log::*;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum IdentityError {
    #[error("No token was provided")]
    MissingToken,
    #[error("Token is not a well-formed JWT. {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub username: Option<String>,
    pub user_id: Option<i64>,
    pub roles: BTreeSet<String>,
    pub issued_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Identity {
    /// Checks for a role, ignoring the conventional `ROLE_` prefix and letter case.
    pub fn has_role(&self, role: &str) -> bool {
        let wanted = normalise_role_name(role);
        self.roles.iter().any(|r| normalise_role_name(r) == wanted)
    }
}

fn normalise_role_name(role: &str) -> String {
    let upper = role.trim().to_ascii_uppercase();
    upper.strip_prefix("ROLE_").map(str::to_string).unwrap_or(upper)
}

/// Decodes the claims of `token` (optionally prefixed with `Bearer `) into an [`Identity`].
pub fn read_token(token: &str) -> Result<Identity, IdentityError> {
    let token = token.trim();
    let token = match token.split_once(char::is_whitespace) {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") => rest.trim(),
        // A bare scheme carries no token
        None if token.eq_ignore_ascii_case("bearer") => "",
        _ => token,
    };
    if token.is_empty() {
        return Err(IdentityError::MissingToken);
    }
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();
    let data = decode::<Map<String, Value>>(token, &DecodingKey::from_secret(&[]), &validation)
        .map_err(|e| IdentityError::Malformed(e.to_string()))?;
    let identity = identity_from_claims(&data.claims);
    trace!("🔐️ Token decoded for {:?} (user id {:?})", identity.username, identity.user_id);
    Ok(identity)
}

fn identity_from_claims(claims: &Map<String, Value>) -> Identity {
    let username =
        ["sub", "username"].iter().find_map(|k| claims.get(*k).and_then(Value::as_str)).map(str::to_string);
    let user_id = ["userId", "user_id", "id"].iter().find_map(|k| claims.get(*k).and_then(as_user_id));
    let mut roles = BTreeSet::new();
    for key in ["role", "roles", "authorities"] {
        if let Some(v) = claims.get(key) {
            collect_roles(v, &mut roles);
        }
    }
    let issued_at = claims.get("iat").and_then(as_timestamp);
    let expires_at = claims.get("exp").and_then(as_timestamp);
    Identity { username, user_id, roles, issued_at, expires_at }
}

fn as_user_id(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_timestamp(v: &Value) -> Option<DateTime<Utc>> {
    let secs = match v {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }?;
    Utc.timestamp_opt(secs, 0).single()
}

fn collect_roles(v: &Value, roles: &mut BTreeSet<String>) {
    match v {
        Value::String(s) => {
            s.split(',').map(str::trim).filter(|r| !r.is_empty()).for_each(|r| {
                roles.insert(r.to_string());
            });
        },
        Value::Array(items) => items.iter().for_each(|item| collect_roles(item, roles)),
        Value::Object(obj) => {
            if let Some(auth) = ["authority", "role", "name"].iter().find_map(|k| obj.get(*k)) {
                collect_roles(auth, roles);
            }
        },
        _ => {},
    }
}
