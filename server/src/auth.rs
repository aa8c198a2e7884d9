//! Session-cookie authentication.
//!
//! Login itself is handled by the identity provider, which writes the
//! `sessions` table and sets the session cookie. This middleware only
//! resolves that cookie to a user id.
//!
//! With a session secret configured, cookies must carry the signed form
//! `s:<sid>.<signature>` (percent-encoded), where the signature is the
//! unpadded base64 HMAC-SHA256 of `<sid>` under the secret. Without one the
//! cookie value is taken as the bare session id.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{header, HeaderMap};
use axum::middleware::Next;
use axum::response::Response;
use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use percent_encoding::percent_decode_str;
use sha2::Sha256;
use takehome_common::{TakeHomeError, UserId};
use tracing::debug;

use crate::error::ApiError;
use crate::state::AppState;

type HmacSha256 = Hmac<Sha256>;

const SIGNED_PREFIX: &str = "s:";

/// Identity of the caller, injected into request extensions for protected routes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser(pub UserId);

/// Axum middleware: reject requests without a live session.
pub async fn require_session(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let session = &state.config.session;
    let sid = cookie_value(request.headers(), &session.cookie_name)
        .and_then(|raw| session_id(&raw, session.secret.as_deref()));

    let Some(sid) = sid else {
        state.metrics.auth_rejected();
        return Err(TakeHomeError::Unauthorized.into());
    };

    let user_id = state
        .storage
        .resolve_session(&sid)
        .await?
        .filter(UserId::is_valid);

    let Some(user_id) = user_id else {
        debug!("Unknown or expired session");
        state.metrics.auth_rejected();
        return Err(TakeHomeError::Unauthorized.into());
    };

    request.extensions_mut().insert(AuthenticatedUser(user_id));
    Ok(next.run(request).await)
}

/// Value of cookie `name` across all `Cookie` headers, if present and non-empty.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim().trim_matches('"').to_string())
        .filter(|value| !value.is_empty())
}

/// Session id carried by a raw cookie value.
///
/// With a `secret`, only a correctly signed value yields an id; unsigned and
/// tampered values yield `None`.
pub fn session_id(raw: &str, secret: Option<&str>) -> Option<String> {
    let value = percent_decode_str(raw).decode_utf8().ok()?;

    let sid = match secret {
        Some(secret) => {
            let (sid, signature) = value.strip_prefix(SIGNED_PREFIX)?.rsplit_once('.')?;
            let signature = STANDARD_NO_PAD.decode(signature).ok()?;

            let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
            mac.update(sid.as_bytes());
            if mac.verify_slice(&signature).is_err() {
                debug!("Session cookie signature mismatch");
                return None;
            }
            sid.to_string()
        }
        None => value.into_owned(),
    };

    Some(sid).filter(|sid| !sid.is_empty())
}
