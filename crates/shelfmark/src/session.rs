//! Anonymous per-browser sessions
//!
//! A session is nothing more than a random identifier that partitions the
//! rating store. It travels in a cookie of the form `<id>.<signature>` where
//! the signature is an HMAC-SHA256 tag, so clients cannot forge or
//! enumerate other sessions.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::fmt;
use uuid::Uuid;

use crate::error::{Result, ShelfmarkError};

pub const SESSION_COOKIE: &str = "shelfmark_session";

/// Five years; sessions have no server-side expiry
pub const SESSION_COOKIE_MAX_AGE_SECS: u64 = 5 * 365 * 24 * 60 * 60;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
  pub fn generate() -> Self {
    Self(Uuid::new_v4().to_string())
  }

  /// Accept an externally supplied identifier (CLI, tests)
  pub fn parse(raw: &str) -> Result<Self> {
    let raw = raw.trim();
    if raw.is_empty() {
      return Err(ShelfmarkError::validation("session", "session id must not be empty"));
    }
    if raw.contains(['.', ';', ',', ' ']) {
      return Err(ShelfmarkError::validation("session", format!("'{raw}' contains reserved characters")));
    }
    Ok(Self(raw.to_string()))
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for SessionId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

type HmacSha256 = Hmac<Sha256>;

/// Signs and verifies session cookie values
pub struct SessionSigner {
  key: HmacSha256,
}

impl SessionSigner {
  pub fn new(secret: impl AsRef<[u8]>) -> Result<Self> {
    let key = HmacSha256::new_from_slice(secret.as_ref())
      .map_err(|e| ShelfmarkError::config(format!("unusable session secret: {e}")))?;
    Ok(Self { key })
  }

  /// Signer with a fresh random secret; cookies it issues die with the process
  pub fn ephemeral() -> Result<Self> {
    let mut secret = [0u8; 32];
    rand::rng().fill_bytes(&mut secret);
    Self::new(secret)
  }

  pub fn sign(&self, session: &SessionId) -> String {
    let tag = self.mac(session.as_str()).finalize().into_bytes();
    format!("{}.{}", session.as_str(), URL_SAFE_NO_PAD.encode(tag))
  }

  /// Returns the session for a well-formed, correctly signed cookie value
  pub fn verify(&self, cookie_value: &str) -> Option<SessionId> {
    let (id, signature) = cookie_value.rsplit_once('.')?;
    if id.is_empty() {
      return None;
    }
    let tag = URL_SAFE_NO_PAD.decode(signature).ok()?;
    self.mac(id).verify_slice(&tag).ok()?;
    SessionId::parse(id).ok()
  }

  fn mac(&self, id: &str) -> HmacSha256 {
    let mut mac = self.key.clone();
    mac.update(id.as_bytes());
    mac
  }
}

/// Find a cookie by name in a `Cookie` request header value
pub fn find_cookie<'a>(header: &'a str, name: &str) -> Option<&'a str> {
  header
    .split(';')
    .filter_map(|pair| pair.trim().split_once('='))
    .find(|(key, _)| *key == name)
    .map(|(_, value)| value)
}

/// `Set-Cookie` value for a freshly issued session
pub fn session_cookie_header(signed_value: &str) -> String {
  format!(
    "{SESSION_COOKIE}={signed_value}; Path=/; HttpOnly; SameSite=Lax; Max-Age={SESSION_COOKIE_MAX_AGE_SECS}"
  )
}
