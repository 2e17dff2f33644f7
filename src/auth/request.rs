//! Per-request checks on authenticated callers.

use crate::auth::types::SessionKey;
use std::collections::BTreeMap;

/// The parts of an incoming request a [`RequestVerifier`] may inspect.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    pub method: String,
    pub path: String,
    /// Header names are stored lowercased.
    headers: BTreeMap<String, String>,
}

impl RequestContext {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            headers: BTreeMap::new(),
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }
}

/// Extra verification of a request made with a valid session key,
/// e.g. a per-request signature by [`SessionKey::signing_key`].
pub trait RequestVerifier: Send + Sync {
    fn verify_request(&self, request: &RequestContext, key: &SessionKey) -> bool;
}

/// Accepts every request.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRequestVerifier;

impl RequestVerifier for NoRequestVerifier {
    fn verify_request(&self, _request: &RequestContext, _key: &SessionKey) -> bool {
        true
    }
}

/// Pick the bearer token out of a request.
///
/// An `Authorization: Bearer <token>` header wins over the `token` parameter.
/// Headers with another scheme or no token part are ignored.
pub fn bearer_token(authorization: Option<&str>, token_param: Option<&str>) -> Option<String> {
    let from_header = authorization.and_then(|value| {
        let (scheme, token) = value.trim().split_once(' ')?;
        let token = token.trim();
        (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
    });

    from_header
        .or_else(|| token_param.map(str::trim).filter(|t| !t.is_empty()))
        .map(str::to_string)
}
