// Archivo: identity.rs
// Propósito: extraer la identidad del llamador de la petición. Sólo se lee
// el valor; validarlo contra los usuarios es trabajo de `RoleGate`.
use std::convert::Infallible;

use axum::{
  extract::FromRequestParts,
  http::{header::COOKIE, request::Parts, HeaderMap},
};

pub const USER_ID_HEADER: &str = "x-user-id";
pub const SESSION_COOKIE: &str = "cie_session";

/// Identidad sin validar: header `x-user-id` o, si falta, cookie
/// `cie_session`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity(pub Option<String>);

impl Identity {
  pub fn as_deref(&self) -> Option<&str> {
    self.0.as_deref()
  }

  pub fn from_headers(headers: &HeaderMap) -> Self {
    let header = headers.get(USER_ID_HEADER)
                        .and_then(|v| v.to_str().ok())
                        .map(str::trim)
                        .filter(|v| !v.is_empty())
                        .map(str::to_string);
    Identity(header.or_else(|| session_cookie(headers)))
  }
}

fn session_cookie(headers: &HeaderMap) -> Option<String> {
  headers.get_all(COOKIE)
         .iter()
         .filter_map(|v| v.to_str().ok())
         .flat_map(|v| v.split(';'))
         .filter_map(|pair| pair.trim().split_once('='))
         .find(|(name, _)| *name == SESSION_COOKIE)
         .map(|(_, value)| value.trim().to_string())
         .filter(|v| !v.is_empty())
}

impl<S> FromRequestParts<S> for Identity where S: Send + Sync
{
  type Rejection = Infallible;

  async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
    Ok(Identity::from_headers(&parts.headers))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use axum::http::HeaderValue;

  #[test]
  fn header_wins_over_cookie() {
    let mut headers = HeaderMap::new();
    headers.insert(COOKIE, HeaderValue::from_static("theme=dark; cie_session=from-cookie"));
    assert_eq!(Identity::from_headers(&headers).as_deref(), Some("from-cookie"));
    headers.insert(USER_ID_HEADER, HeaderValue::from_static(" from-header "));
    assert_eq!(Identity::from_headers(&headers).as_deref(), Some("from-header"));
  }

  #[test]
  fn missing_identity_is_none() {
    let mut headers = HeaderMap::new();
    headers.insert(COOKIE, HeaderValue::from_static("cie_session="));
    assert_eq!(Identity::from_headers(&headers), Identity(None));
  }
}
