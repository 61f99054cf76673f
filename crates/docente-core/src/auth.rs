//! Read-side access to the session persisted by the login flow.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::warn;

use crate::session_store::{KeyValueStore, StoreError};

/// Bearer credential with an optional expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthToken {
    pub access_token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl AuthToken {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expiry| expiry <= now)
    }
}

#[derive(Deserialize)]
struct SessionBlob {
    access_token: String,
    #[serde(default)]
    expires_at: Option<i64>,
}

#[derive(Deserialize)]
struct JwtClaims {
    #[serde(default)]
    exp: Option<i64>,
}

/// Parse the persisted session blob.
pub fn parse_session(key: &str, raw: &str) -> Result<AuthToken, StoreError> {
    let blob: SessionBlob = serde_json::from_str(raw).map_err(|err| StoreError::Corrupt {
        key: key.to_string(),
        reason: err.to_string(),
    })?;
    if blob.access_token.trim().is_empty() {
        return Err(StoreError::Corrupt {
            key: key.to_string(),
            reason: "access_token is empty".to_string(),
        });
    }
    let expires_at = blob
        .expires_at
        .or_else(|| jwt_expiry(&blob.access_token))
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0));
    Ok(AuthToken {
        access_token: blob.access_token,
        expires_at,
    })
}

/// `exp` claim of a JWT, when the token is one.
fn jwt_expiry(token: &str) -> Option<i64> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    serde_json::from_slice::<JwtClaims>(&bytes).ok()?.exp
}

/// Hands out the bearer token for outgoing requests.
#[derive(Clone)]
pub struct TokenAccessor {
    store: Arc<dyn KeyValueStore>,
    key: String,
}

impl TokenAccessor {
    pub fn new(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Access token, or an empty string when none can be read.
    ///
    /// Callers must cope with the backend answering 401.
    pub fn get_token(&self) -> String {
        match self.session() {
            Ok(token) => token.access_token,
            Err(err) => {
                warn!(key = %self.key, error = %err, "No usable session token");
                String::new()
            }
        }
    }

    pub fn session(&self) -> Result<AuthToken, StoreError> {
        let raw = self.store.get(&self.key)?;
        parse_session(&self.key, &raw)
    }

    /// Persist a session. Accepts a JSON blob or a bare access token.
    pub fn store_session(&self, value: &str) -> Result<AuthToken, StoreError> {
        let trimmed = value.trim();
        let blob = if trimmed.starts_with('{') {
            trimmed.to_string()
        } else {
            serde_json::json!({ "access_token": trimmed }).to_string()
        };
        let token = parse_session(&self.key, &blob)?;
        self.store.set(&self.key, &blob)?;
        Ok(token)
    }

    pub fn clear(&self) -> Result<(), StoreError> {
        self.store.remove(&self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session_store::MemoryStore;

    const KEY: &str = "sb-auth-token";

    fn accessor(entries: Vec<(&str, &str)>) -> TokenAccessor {
        TokenAccessor::new(Arc::new(MemoryStore::with_entries(entries)), KEY)
    }

    #[test]
    fn reads_access_token_from_blob() {
        let tokens = accessor(vec![(KEY, r#"{"access_token":"abc","expires_at":4102444800}"#)]);
        assert_eq!(tokens.get_token(), "abc");
        let session = tokens.session().unwrap();
        assert!(!session.is_expired(Utc::now()));
    }

    #[test]
    fn empty_string_on_missing_or_corrupt_blob() {
        assert_eq!(accessor(vec![]).get_token(), "");
        assert_eq!(accessor(vec![(KEY, "not json")]).get_token(), "");
        assert_eq!(accessor(vec![(KEY, r#"{"access_token":""}"#)]).get_token(), "");
    }

    #[test]
    fn expiry_falls_back_to_jwt_claim() {
        let payload = URL_SAFE_NO_PAD.encode(r#"{"sub":"1","exp":1000}"#);
        let jwt = format!("eyJhbGciOiJIUzI1NiJ9.{payload}.sig");
        let token = parse_session(KEY, &format!(r#"{{"access_token":"{jwt}"}}"#)).unwrap();
        assert_eq!(token.expires_at.map(|t| t.timestamp()), Some(1000));
        assert!(token.is_expired(Utc::now()));
    }

    #[test]
    fn store_session_wraps_bare_tokens() {
        let tokens = accessor(vec![]);
        tokens.store_session("plain-token").unwrap();
        assert_eq!(tokens.get_token(), "plain-token");
        assert!(tokens.session().unwrap().expires_at.is_none());

        tokens.clear().unwrap();
        assert_eq!(tokens.get_token(), "");
    }
}
