//! HTTP Basic-auth middleware for staff.

use std::sync::Arc;

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use axum::{
  extract::{Request, State},
  http::{HeaderMap, header::AUTHORIZATION},
  middleware::Next,
  response::{IntoResponse, Response},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use rand_core::OsRng;

use crate::error::Error;

/// Credentials accepted as valid for this server instance.
#[derive(Clone)]
pub struct AuthConfig {
  pub username:      String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
}

/// Hash `password` into an argon2 PHC string suitable for `auth_password_hash`.
pub fn hash_password(password: &str) -> Result<String, Error> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|hash| hash.to_string())
    .map_err(|e| Error::PasswordHash(e.to_string()))
}

/// Username and password carried by a `Basic` authorization header.
fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
  let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
  let decoded = B64.decode(value.strip_prefix("Basic ")?).ok()?;
  let (user, pass) = std::str::from_utf8(&decoded).ok()?.split_once(':')?;
  Some((user.to_owned(), pass.to_owned()))
}

/// Verify Basic credentials in `headers` against `config`.
pub fn verify_auth(headers: &HeaderMap, config: &AuthConfig) -> Result<(), Error> {
  let (username, password) = basic_credentials(headers).ok_or(Error::Unauthorized)?;
  if username != config.username {
    return Err(Error::Unauthorized);
  }
  let expected = PasswordHash::new(&config.password_hash).map_err(|e| {
    tracing::warn!(error = %e, "configured password hash is not a PHC string");
    Error::Unauthorized
  })?;
  Argon2::default()
    .verify_password(password.as_bytes(), &expected)
    .map_err(|_| Error::Unauthorized)
}

/// Reject requests without valid staff credentials.
pub async fn require_staff(
  State(config): State<Arc<AuthConfig>>,
  request: Request,
  next: Next,
) -> Response {
  match verify_auth(request.headers(), &config) {
    Ok(()) => next.run(request).await,
    Err(e) => {
      tracing::debug!(path = %request.uri().path(), "rejected unauthenticated request");
      e.into_response()
    }
  }
}

#[cfg(test)]
mod tests {
  use axum::http::HeaderValue;

  use super::*;

  fn config(password: &str) -> AuthConfig {
    AuthConfig {
      username:      "staff".to_string(),
      password_hash: hash_password(password).unwrap(),
    }
  }

  fn basic(user: &str, pass: &str) -> HeaderMap {
    let encoded = B64.encode(format!("{user}:{pass}"));
    let mut headers = HeaderMap::new();
    headers.insert(
      AUTHORIZATION,
      HeaderValue::from_str(&format!("Basic {encoded}")).unwrap(),
    );
    headers
  }

  #[test]
  fn correct_credentials() {
    let config = config("secret");
    assert!(verify_auth(&basic("staff", "secret"), &config).is_ok());
  }

  #[test]
  fn wrong_password() {
    let config = config("secret");
    assert!(matches!(
      verify_auth(&basic("staff", "wrong"), &config),
      Err(Error::Unauthorized)
    ));
  }

  #[test]
  fn wrong_username() {
    let config = config("secret");
    assert!(matches!(
      verify_auth(&basic("intruder", "secret"), &config),
      Err(Error::Unauthorized)
    ));
  }

  #[test]
  fn missing_header() {
    let config = config("secret");
    assert!(matches!(
      verify_auth(&HeaderMap::new(), &config),
      Err(Error::Unauthorized)
    ));
  }

  #[test]
  fn invalid_base64() {
    let config = config("secret");
    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic !!!not-base64!!!"));
    assert!(matches!(verify_auth(&headers, &config), Err(Error::Unauthorized)));
  }

  #[test]
  fn malformed_hash_rejects() {
    let config = AuthConfig {
      username:      "staff".to_string(),
      password_hash: "not-a-phc-string".to_string(),
    };
    assert!(verify_auth(&basic("staff", "secret"), &config).is_err());
  }
}
