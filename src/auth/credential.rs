use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SecurityConfig;

/// Algorithm every credential is signed with and the only one accepted back.
pub const SIGNING_ALGORITHM: Algorithm = Algorithm::HS256;

/// Default validity window of a freshly issued credential.
pub const DEFAULT_SESSION_LIFETIME_DAYS: i64 = 5;

/// Raw entropy of the anti-forgery token (256 bits).
const XSRF_TOKEN_BYTES: usize = 32;

/// Identity claims carried by every credential.
///
/// The serialized names match the wire format browsers and API clients
/// already hold (`id`, `uuid`, `nbf`, `exp`, `xsrfToken`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "id")]
    pub user_id: i64,
    #[serde(rename = "uuid")]
    pub session_uuid: String,
    pub nbf: i64,
    pub exp: i64,
    #[serde(rename = "xsrfToken")]
    pub xsrf_token: String,
}

impl Claims {
    /// Claims valid from `issued_at` for `lifetime`, with a fresh anti-forgery token.
    pub fn new(user_id: i64, session_uuid: impl Into<String>, issued_at: DateTime<Utc>, lifetime: Duration) -> Self {
        Self {
            user_id,
            session_uuid: session_uuid.into(),
            nbf: issued_at.timestamp(),
            exp: (issued_at + lifetime).timestamp(),
            xsrf_token: anti_forgery_token(),
        }
    }

    pub fn not_before(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.nbf, 0).single().unwrap_or_default()
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0).single().unwrap_or_default()
    }
}

fn anti_forgery_token() -> String {
    let mut bytes = [0u8; XSRF_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CredentialError {
    #[error("signing secret is not configured")]
    MissingSecret,

    #[error("credential signature is invalid")]
    SignatureInvalid,

    #[error("credential is malformed")]
    Malformed,

    #[error("credential has expired")]
    Expired,

    #[error("credential is not valid yet")]
    NotYetValid,

    #[error("credential could not be signed: {0}")]
    Signing(String),
}

impl From<jsonwebtoken::errors::Error> for CredentialError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            // A header naming any other algorithm is treated like a forged signature
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
                CredentialError::SignatureInvalid
            }
            ErrorKind::ExpiredSignature => CredentialError::Expired,
            ErrorKind::ImmatureSignature => CredentialError::NotYetValid,
            _ => CredentialError::Malformed,
        }
    }
}

/// A signed token together with the claims it carries.
#[derive(Debug, Clone)]
pub struct IssuedCredential {
    pub token: String,
    pub claims: Claims,
}

/// Signs and verifies session credentials with a single shared secret.
pub struct CredentialCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    lifetime: Duration,
}

impl std::fmt::Debug for CredentialCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialCodec")
            .field("algorithm", &SIGNING_ALGORITHM)
            .field("lifetime", &self.lifetime)
            .finish_non_exhaustive()
    }
}

impl CredentialCodec {
    pub fn new(secret: &str, lifetime: Duration) -> Result<Self, CredentialError> {
        if secret.trim().is_empty() {
            return Err(CredentialError::MissingSecret);
        }

        let mut validation = Validation::new(SIGNING_ALGORITHM);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.set_required_spec_claims(&["exp", "nbf"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            lifetime,
        })
    }

    pub fn from_config(security: &SecurityConfig) -> Result<Self, CredentialError> {
        Self::new(&security.jwt_secret, Duration::days(security.session_lifetime_days))
    }

    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Issue a credential valid from now for the configured lifetime.
    pub fn issue(&self, user_id: i64, session_uuid: &str) -> Result<IssuedCredential, CredentialError> {
        self.issue_at(user_id, session_uuid, Utc::now())
    }

    pub fn issue_at(
        &self,
        user_id: i64,
        session_uuid: &str,
        issued_at: DateTime<Utc>,
    ) -> Result<IssuedCredential, CredentialError> {
        let claims = Claims::new(user_id, session_uuid, issued_at, self.lifetime);
        let token = self.sign(&claims)?;
        Ok(IssuedCredential { token, claims })
    }

    pub fn sign(&self, claims: &Claims) -> Result<String, CredentialError> {
        encode(&Header::new(SIGNING_ALGORITHM), claims, &self.encoding_key)
            .map_err(|e| CredentialError::Signing(e.to_string()))
    }

    /// Verify signature, algorithm and validity window, returning the claims.
    ///
    /// A token past its expiry reports `Expired` whether or not its signature
    /// holds.
    pub fn verify(&self, token: &str) -> Result<Claims, CredentialError> {
        match decode::<Claims>(token, &self.decoding_key, &self.validation) {
            Ok(data) => Ok(data.claims),
            Err(e) if matches!(e.kind(), ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm) && self.is_expired(token) => {
                Err(CredentialError::Expired)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Expiry check on a token whose signature already failed. Never used to accept.
    fn is_expired(&self, token: &str) -> bool {
        let mut unchecked = self.validation.clone();
        unchecked.insecure_disable_signature_validation();
        matches!(
            decode::<Claims>(token, &self.decoding_key, &unchecked),
            Err(e) if matches!(e.kind(), ErrorKind::ExpiredSignature)
        )
    }
}
