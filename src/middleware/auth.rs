use std::ops::Deref;

use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use thiserror::Error;
use tracing::{debug, warn};

use crate::auth::{Claims, CredentialCodec, CredentialError};
use crate::error::ApiError;
use crate::middleware::cookie::{parse_cookie, SESSION_COOKIE};
use crate::state::AppState;

/// Header cookie-based clients echo the anti-forgery value in
pub const XSRF_HEADER: &str = "x-xsrf-token";

/// Where the credential came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Cookie,
    Bearer,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Authorization required.")]
    Unauthenticated,

    #[error("Authorization header must be in the form of: Bearer {{token}}")]
    MalformedHeader,

    #[error("{0}")]
    Credential(#[from] CredentialError),

    #[error("XSRF token mismatch!")]
    ForbiddenCsrf,
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        let text = err.to_string();
        match err {
            AuthError::Unauthenticated => ApiError::unauthorized(-1, text),
            AuthError::MalformedHeader => ApiError::unauthorized(-2, text),
            AuthError::Credential(_) => ApiError::unauthorized(-3, text),
            AuthError::ForbiddenCsrf => ApiError::forbidden(-4, text),
        }
    }
}

/// Pull the credential out of the request. The session cookie wins over the
/// `Authorization` header when both are present.
pub fn extract_credential(headers: &HeaderMap) -> Result<(Transport, String), AuthError> {
    if let Some(token) = parse_cookie(headers, SESSION_COOKIE) {
        return Ok((Transport::Cookie, token));
    }

    let value = headers.get(header::AUTHORIZATION).ok_or(AuthError::Unauthenticated)?;
    let value = value.to_str().map_err(|_| AuthError::MalformedHeader)?;

    let parts: Vec<&str> = value.split(' ').collect();
    match parts.as_slice() {
        [scheme, token] if scheme.eq_ignore_ascii_case("bearer") => Ok((Transport::Bearer, (*token).to_string())),
        _ => Err(AuthError::MalformedHeader),
    }
}

/// Authenticate a request from its headers alone.
pub fn authenticate(codec: &CredentialCodec, headers: &HeaderMap) -> Result<Claims, AuthError> {
    let (transport, token) = extract_credential(headers)?;
    let claims = codec.verify(&token)?;

    // Bearer clients are not exposed to ambient browser credentials
    if transport == Transport::Cookie {
        let submitted = headers.get(XSRF_HEADER).and_then(|v| v.to_str().ok());
        if submitted != Some(claims.xsrf_token.as_str()) {
            return Err(AuthError::ForbiddenCsrf);
        }
    }

    Ok(claims)
}

/// Middleware guarding every protected route
pub async fn require_auth(State(state): State<AppState>, mut request: Request, next: Next) -> Result<Response, ApiError> {
    match authenticate(&state.codec, request.headers()) {
        Ok(claims) => {
            debug!("Authenticated user {} (session {})", claims.user_id, claims.session_uuid);
            request.extensions_mut().insert(claims);
            Ok(next.run(request).await)
        }
        Err(err) => {
            warn!("Rejected {} {}: {}", request.method(), request.uri().path(), err);
            Err(err.into())
        }
    }
}

/// The authenticated caller, as established by [`require_auth`]
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl Deref for AuthUser {
    type Target = Claims;

    fn deref(&self) -> &Claims {
        &self.0
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Claims>()
            .cloned()
            .map(AuthUser)
            .ok_or_else(|| AuthError::Unauthenticated.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use chrono::Duration;

    fn codec() -> CredentialCodec {
        CredentialCodec::new("middleware-test-secret", Duration::days(5)).unwrap()
    }

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn missing_credential() {
        assert_eq!(authenticate(&codec(), &HeaderMap::new()), Err(AuthError::Unauthenticated));
    }

    #[test]
    fn malformed_authorization_headers() {
        let codec = codec();
        for value in ["Token abc", "Bearer", "Bearer a b", "Bearer  abc", "abc"] {
            assert_eq!(
                authenticate(&codec, &headers(&[("authorization", value)])),
                Err(AuthError::MalformedHeader),
                "{value}"
            );
        }
    }

    #[test]
    fn bearer_needs_no_xsrf_header() {
        let codec = codec();
        let issued = codec.issue(7, "session").unwrap();
        let auth = format!("bEaReR {}", issued.token);
        let claims = authenticate(&codec, &headers(&[("authorization", &auth)])).unwrap();
        assert_eq!(claims.user_id, 7);
    }

    #[test]
    fn cookie_requires_matching_xsrf_header() {
        let codec = codec();
        let issued = codec.issue(7, "session").unwrap();
        let cookie = format!("bmusession={}", issued.token);

        assert_eq!(
            authenticate(&codec, &headers(&[("cookie", &cookie)])),
            Err(AuthError::ForbiddenCsrf)
        );
        assert_eq!(
            authenticate(&codec, &headers(&[("cookie", &cookie), ("x-xsrf-token", "forged")])),
            Err(AuthError::ForbiddenCsrf)
        );

        let ok = authenticate(
            &codec,
            &headers(&[("cookie", &cookie), ("x-xsrf-token", &issued.claims.xsrf_token)]),
        )
        .unwrap();
        assert_eq!(ok, issued.claims);
    }

    #[test]
    fn cookie_takes_precedence_over_header() {
        let codec = codec();
        let issued = codec.issue(7, "session").unwrap();
        let cookie = format!("bmusession={}", issued.token);
        // A valid bearer header does not lift the XSRF requirement of the cookie
        let auth = format!("Bearer {}", issued.token);
        assert_eq!(
            authenticate(&codec, &headers(&[("cookie", &cookie), ("authorization", &auth)])),
            Err(AuthError::ForbiddenCsrf)
        );
    }

    #[test]
    fn invalid_token_maps_to_401() {
        let codec = codec();
        let err = authenticate(&codec, &headers(&[("authorization", "Bearer not.a.jwt")])).unwrap_err();
        assert_eq!(err, AuthError::Credential(CredentialError::Malformed));

        let api: ApiError = err.into();
        assert_eq!(api.status_code(), axum::http::StatusCode::UNAUTHORIZED);
        assert_eq!(api.code(), -3);
    }

    #[test]
    fn foreign_signature_is_rejected() {
        let other = CredentialCodec::new("someone-else", Duration::days(5)).unwrap();
        let issued = other.issue(7, "session").unwrap();
        let auth = format!("Bearer {}", issued.token);
        assert_eq!(
            authenticate(&codec(), &headers(&[("authorization", &auth)])),
            Err(AuthError::Credential(CredentialError::SignatureInvalid))
        );
    }

    #[test]
    fn csrf_failure_is_403() {
        let api: ApiError = AuthError::ForbiddenCsrf.into();
        assert_eq!(api.status_code(), axum::http::StatusCode::FORBIDDEN);
        assert_eq!(api.message(), "XSRF token mismatch!");
    }
}
