use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use serde_json::{Map, Number, Value};

use crate::config::UsernameClaim;
use crate::error::{AuthError, AuthResult};

/// Decoded, unvalidated token payload.
pub type RawClaims = Map<String, Value>;

/// Decode the payload segment. Anything but a JSON object is malformed.
pub fn parse_raw_claims(payload: &[u8]) -> AuthResult<RawClaims> {
    match serde_json::from_slice::<Value>(payload) {
        Ok(Value::Object(claims)) => Ok(claims),
        Ok(_) => Err(AuthError::MalformedToken(
            "payload is not a JSON object".into(),
        )),
        Err(err) => Err(AuthError::MalformedToken(format!(
            "payload is not valid JSON: {err}"
        ))),
    }
}

/// Integer claim that issuers encode either as a JSON number or as a JSON
/// string of decimal digits.
///
/// Numbers with a fractional part truncate toward zero. Strings may carry a
/// single leading `+` or `-` and must otherwise be all ASCII digits. Every
/// other encoding, including an explicit `null`, is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlexibleInt(pub i64);

impl FlexibleInt {
    pub fn decode(claim: &'static str, value: &Value) -> AuthResult<Self> {
        match value {
            Value::Number(number) => from_number(number).map(Self).ok_or_else(|| {
                AuthError::ClaimFormat(claim, "numeric value out of range".into())
            }),
            Value::String(text) => from_digits(claim, text).map(Self),
            other => Err(AuthError::ClaimFormat(
                claim,
                format!("expected number or numeric string, found {}", json_type(other)),
            )),
        }
    }

    pub fn value(self) -> i64 {
        self.0
    }
}

// 2^63 as f64; anything at or beyond it does not fit in an i64.
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

fn from_number(number: &Number) -> Option<i64> {
    if let Some(value) = number.as_i64() {
        return Some(value);
    }
    if number.is_u64() {
        return None;
    }
    let truncated = number.as_f64()?.trunc();
    if truncated >= -I64_BOUND && truncated < I64_BOUND {
        Some(truncated as i64)
    } else {
        None
    }
}

fn from_digits(claim: &'static str, text: &str) -> AuthResult<i64> {
    let digits = text.strip_prefix(['+', '-']).unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err(AuthError::ClaimFormat(
            claim,
            "string value is not a decimal integer".into(),
        ));
    }
    text.parse::<i64>()
        .map_err(|_| AuthError::ClaimFormat(claim, "numeric value out of range".into()))
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Typed view of the claims the authenticator understands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedClaims {
    pub issuer: Option<String>,
    pub subject: Option<String>,
    pub email: Option<String>,
    pub name: Option<String>,
    pub groups: Vec<String>,
    pub roles: Vec<String>,
    pub issued_at: Option<i64>,
    pub expires_at: Option<i64>,
}

impl TryFrom<&RawClaims> for NormalizedClaims {
    type Error = AuthError;

    /// `exp` and `iat` are strict; the descriptive claims degrade to
    /// unset or skip bad entries instead of failing.
    fn try_from(raw: &RawClaims) -> AuthResult<Self> {
        let expires_at = time_claim(raw, "exp")?;
        let issued_at = time_claim(raw, "iat")?;

        Ok(Self {
            issuer: string_claim(raw, "iss"),
            subject: string_claim(raw, "sub"),
            email: string_claim(raw, "email"),
            name: string_claim(raw, "name"),
            groups: string_list_claim(raw, "groups"),
            roles: string_list_claim(raw, "roles"),
            issued_at,
            expires_at,
        })
    }
}

fn time_claim(raw: &RawClaims, claim: &'static str) -> AuthResult<Option<i64>> {
    raw.get(claim)
        .map(|value| FlexibleInt::decode(claim, value).map(FlexibleInt::value))
        .transpose()
}

fn string_claim(raw: &RawClaims, claim: &str) -> Option<String> {
    raw.get(claim).and_then(Value::as_str).map(str::to_owned)
}

fn string_list_claim(raw: &RawClaims, claim: &str) -> Vec<String> {
    match raw.get(claim) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_owned)
            .collect(),
        _ => Vec::new(),
    }
}

/// Authenticated caller, as produced by a successful verification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub issuer: Option<String>,
    pub subject: Option<String>,
    pub email: Option<String>,
    pub name: Option<String>,
    pub groups: Vec<String>,
    pub roles: Vec<String>,
    pub issued_at: Option<i64>,
    pub expires_at: Option<i64>,
}

impl Identity {
    /// Convenience helper for role checks.
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|value| value == role)
    }

    pub fn in_group(&self, group: &str) -> bool {
        self.groups.iter().any(|value| value == group)
    }

    pub fn username(&self, claim: UsernameClaim) -> Option<&str> {
        match claim {
            UsernameClaim::Subject => self.subject.as_deref(),
            UsernameClaim::Email => self.email.as_deref(),
            UsernameClaim::Name => self.name.as_deref(),
        }
    }

    pub fn expires_at_utc(&self) -> Option<DateTime<Utc>> {
        self.expires_at
            .and_then(|seconds| Utc.timestamp_opt(seconds, 0).single())
    }

    pub fn issued_at_utc(&self) -> Option<DateTime<Utc>> {
        self.issued_at
            .and_then(|seconds| Utc.timestamp_opt(seconds, 0).single())
    }
}

impl From<NormalizedClaims> for Identity {
    fn from(claims: NormalizedClaims) -> Self {
        Self {
            issuer: claims.issuer,
            subject: claims.subject,
            email: claims.email,
            name: claims.name,
            groups: claims.groups,
            roles: claims.roles,
            issued_at: claims.issued_at,
            expires_at: claims.expires_at,
        }
    }
}
