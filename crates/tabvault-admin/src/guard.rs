//! Group-membership check on bearer tokens.
//!
//! Token signatures are verified upstream by the gateway; only the payload is
//! decoded here.

use base64::{Engine as _, engine::general_purpose};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{Error, Result};

pub const DEFAULT_GROUP_CLAIM: &str = "cognito:groups";

const BEARER: &str = "Bearer ";

pub type Claims = Map<String, Value>;

/// Admits callers whose token lists a given group.
#[derive(Clone, Debug)]
pub struct AccessGuard {
    group: String,
    claim: String,
}

impl AccessGuard {
    pub fn new(group: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            claim: DEFAULT_GROUP_CLAIM.to_owned(),
        }
    }

    /// Read groups from `claim` instead of [`DEFAULT_GROUP_CLAIM`].
    pub fn claim(mut self, claim: impl Into<String>) -> Self {
        self.claim = claim.into();
        self
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    /// Check an `authorization` header value, returning the decoded claims
    /// on success.
    pub fn authorize(&self, authorization: Option<&str>) -> Result<Claims> {
        let token = bearer_token(authorization.unwrap_or_default())?;
        let claims = decode_claims(token)?;
        if groups(claims.get(&self.claim)).any(|group| group == self.group) {
            Ok(claims)
        } else {
            debug!(group = %self.group, claim = %self.claim, "group not present in token");
            Err(Error::Forbidden {
                group: self.group.clone(),
            })
        }
    }
}

pub fn bearer_token(header: &str) -> Result<&str> {
    header
        .strip_prefix(BEARER)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(Error::MissingBearer)
}

/// Decode the payload segment of a JWT. Padding is tolerated.
pub fn decode_claims(token: &str) -> Result<Claims> {
    let mut segments = token.split('.');
    let payload = match (segments.next(), segments.next(), segments.next()) {
        (Some(_), Some(payload), Some(_)) if segments.next().is_none() => payload,
        _ => return Err(Error::MalformedToken("expected three segments".into())),
    };
    let raw = general_purpose::URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| Error::MalformedToken(format!("payload is not base64url: {e}")))?;
    match serde_json::from_slice(&raw) {
        Ok(Value::Object(claims)) => Ok(claims),
        Ok(_) => Err(Error::MalformedToken("payload is not a JSON object".into())),
        Err(e) => Err(Error::MalformedToken(format!("payload is not JSON: {e}"))),
    }
}

/// A group claim may be a list of strings or a single string.
fn groups(value: Option<&Value>) -> impl Iterator<Item = &str> {
    let (single, list) = match value {
        Some(Value::String(group)) => (Some(group.as_str()), None),
        Some(Value::Array(items)) => (None, Some(items.iter().filter_map(Value::as_str))),
        _ => (None, None),
    };
    single.into_iter().chain(list.into_iter().flatten())
}

#[cfg(test)]
pub(crate) fn token_with(claims: &Value) -> String {
    let encode = |bytes: &[u8]| general_purpose::URL_SAFE_NO_PAD.encode(bytes);
    format!(
        "{}.{}.{}",
        encode(br#"{"alg":"RS256","typ":"JWT"}"#),
        encode(claims.to_string().as_bytes()),
        encode(b"signature")
    )
}
