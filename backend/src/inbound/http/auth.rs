//! Bearer authentication for provisioning routes.
//!
//! Handlers that take [`ProvisioningAuth`] as their first argument refuse the
//! request before any body is parsed or any remote call is issued.

use actix_web::dev::Payload;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{FromRequest, HttpRequest, web};
use futures_util::future::LocalBoxFuture;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use tracing::warn;

use crate::domain::Error;
use crate::inbound::http::state::HttpState;

const UNAUTHORIZED_DETAIL: &str = "authentication required";

/// Provisioning secret held as a SHA-256 digest.
///
/// Presented tokens are hashed before comparison so the check never
/// short-circuits on a shared prefix of the raw secret.
#[derive(Clone)]
pub struct SharedSecret {
    digest: [u8; 32],
}

impl SharedSecret {
    /// Digest `secret` once at startup.
    pub fn new(secret: &str) -> Self {
        Self {
            digest: Sha256::digest(secret.as_bytes()).into(),
        }
    }

    /// Compare the digest of `presented` in constant time.
    pub fn matches(&self, presented: &str) -> bool {
        let digest: [u8; 32] = Sha256::digest(presented.as_bytes()).into();
        digest.as_slice().ct_eq(self.digest.as_slice()).into()
    }
}

impl std::fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SharedSecret(<redacted>)")
    }
}

/// Token following a case-insensitive `Bearer` scheme.
fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Proof that the request presented the provisioning secret.
#[derive(Debug, Clone, Copy)]
pub struct ProvisioningAuth;

impl FromRequest for ProvisioningAuth {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let state = req.app_data::<web::Data<HttpState>>().cloned();
        let header = req
            .headers()
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let path = req.path().to_owned();

        Box::pin(async move {
            let Some(state) = state else {
                return Err(Error::internal("provisioning state is not configured").into());
            };
            match header.as_deref().and_then(bearer_token) {
                Some(token) if state.secret.matches(token) => Ok(Self),
                _ => {
                    warn!(%path, "rejected unauthenticated provisioning request");
                    Err(Error::unauthorized(UNAUTHORIZED_DETAIL).into())
                }
            }
        })
    }
}
