//! HTTP routes for sign-in and key management.

use crate::auth::{
    bearer_token, AnonymousSignInInput, AuthError, IssuanceEngine, RequestContext,
    RequestVerifier, RevocationAuthority, SessionKey, SignInInput, SignInOutput, TokenValidator,
};
use axum::{
    extract::{Query, State},
    http::{header::AUTHORIZATION, HeaderMap, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Json, Router,
};
use log::{error, info};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Shared state for the auth routes.
pub struct AppState {
    pub engine: Arc<IssuanceEngine>,
    pub validator: Arc<TokenValidator>,
    pub authority: Arc<RevocationAuthority>,
    pub verifier: Arc<dyn RequestVerifier>,
    pub apple_redirect_uri: Option<String>,
}

/// Build the router. The Apple callback route is only mounted when a path is given.
pub fn router(state: Arc<AppState>, apple_callback_path: Option<&str>) -> Router {
    let mut router = Router::new()
        .route("/auth/sign-in", post(sign_in_handler))
        .route("/auth/sign-in/anonymous", post(anonymous_sign_in_handler))
        .route("/auth/keys", get(list_keys_handler).delete(revoke_key_handler));

    if let Some(path) = apple_callback_path {
        router = router.route(path, post(apple_id_token_redirect_handler));
    }

    router.with_state(state)
}

/// Error body returned by every route.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    fn new(error: &str, message: impl Into<String>) -> Self {
        Self {
            error: error.to_string(),
            message: message.into(),
        }
    }

    fn status(&self) -> StatusCode {
        match self.error.as_str() {
            "authentication_failed" => StatusCode::UNAUTHORIZED,
            "permission_denied" => StatusCode::FORBIDDEN,
            "not_found" => StatusCode::NOT_FOUND,
            "invalid_request" => StatusCode::BAD_REQUEST,
            "upstream_error" => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

impl From<AuthError> for ErrorResponse {
    fn from(e: AuthError) -> Self {
        if e.is_authentication_failure() {
            return ErrorResponse::new("authentication_failed", "Authentication failed");
        }
        match e {
            AuthError::PermissionDenied => {
                ErrorResponse::new("permission_denied", AuthError::PermissionDenied.to_string())
            }
            AuthError::NotFound { id } => {
                ErrorResponse::new("not_found", format!("Session key not found: {}", id))
            }
            AuthError::UpstreamResolution(message) => ErrorResponse::new("upstream_error", message),
            e => {
                error!("Internal error: {}", e);
                ErrorResponse::new("internal_error", "Internal server error")
            }
        }
    }
}

/// Sign-in request body.
#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub id_token: String,
    pub public_key: String,
    pub blinder: String,
    pub expires_at: f64,
    pub device_id: String,
    pub uid_key: String,
}

impl From<SignInRequest> for SignInInput {
    fn from(request: SignInRequest) -> Self {
        SignInInput {
            id_token: request.id_token,
            public_key: request.public_key,
            blinder: request.blinder,
            expires_at: request.expires_at as i64,
            uid_key: request.uid_key,
            device_id: request.device_id,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct KeysQuery {
    pub token: Option<String>,
    pub key: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AppleCallbackForm {
    pub id_token: String,
}

#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub ok: u8,
}

/// POST /auth/sign-in
pub async fn sign_in_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SignInRequest>,
) -> Result<Json<SignInOutput>, ErrorResponse> {
    info!("Received sign-in request for device {}", request.device_id);
    let output = state.engine.sign_in(&request.into()).await?;
    Ok(Json(output))
}

/// POST /auth/sign-in/anonymous
pub async fn anonymous_sign_in_handler(
    State(state): State<Arc<AppState>>,
    Json(input): Json<AnonymousSignInInput>,
) -> Result<Json<SignInOutput>, ErrorResponse> {
    info!("Received anonymous sign-in request for device {}", input.device_id);
    let output = state.engine.issue_anonymous(&input).await?;
    Ok(Json(output))
}

/// GET /auth/keys
pub async fn list_keys_handler(
    State(state): State<Arc<AppState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Query(query): Query<KeysQuery>,
) -> Result<Json<Vec<SessionKey>>, ErrorResponse> {
    let caller = current_key(&state, &method, &uri, &headers, query.token.as_deref()).await?;
    let keys = state.authority.list_associated(&caller).await?;
    Ok(Json(keys))
}

/// DELETE /auth/keys?key=<id>. Without `key`, the caller's own key is revoked.
pub async fn revoke_key_handler(
    State(state): State<Arc<AppState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Query(query): Query<KeysQuery>,
) -> Result<Json<OkResponse>, ErrorResponse> {
    let caller = current_key(&state, &method, &uri, &headers, query.token.as_deref()).await?;
    let target = query
        .key
        .filter(|k| !k.is_empty())
        .unwrap_or_else(|| caller.id.clone());

    state.authority.revoke(&caller, &target).await?;
    Ok(Json(OkResponse { ok: 1 }))
}

/// Apple posts the id token as a form; bounce it to the client in the query string.
pub async fn apple_id_token_redirect_handler(
    State(state): State<Arc<AppState>>,
    Form(form): Form<AppleCallbackForm>,
) -> Result<Redirect, ErrorResponse> {
    let redirect_uri = state
        .apple_redirect_uri
        .as_deref()
        .ok_or_else(|| ErrorResponse::new("not_configured", "Apple redirect URI not configured"))?;
    let location = apple_redirect_location(redirect_uri, &form.id_token);
    if HeaderValue::from_str(&location).is_err() {
        error!("Apple redirect URI is not a valid Location header: {}", redirect_uri);
        return Err(ErrorResponse::new("internal_error", "Internal server error"));
    }
    Ok(Redirect::temporary(&location))
}

/// Redirect target carrying the percent-encoded id token as its only query parameter.
pub fn apple_redirect_location(redirect_uri: &str, id_token: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(id_token.as_bytes()).collect();
    format!("{}?id_token={}", redirect_uri, encoded)
}

async fn current_key(
    state: &AppState,
    method: &Method,
    uri: &Uri,
    headers: &HeaderMap,
    token_param: Option<&str>,
) -> Result<SessionKey, ErrorResponse> {
    let authorization = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
    let token = bearer_token(authorization, token_param).unwrap_or_default();

    let mut request = RequestContext::new(method.as_str(), uri.path());
    for (name, value) in headers {
        if let Ok(value) = value.to_str() {
            request = request.with_header(name.as_str(), value);
        }
    }

    Ok(state
        .validator
        .authenticate(&token, &request, state.verifier.as_ref())
        .await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::RepositoryError;

    #[test]
    fn test_error_mapping() {
        let cases = [
            (AuthError::SignatureInvalid, StatusCode::UNAUTHORIZED),
            (AuthError::DelegationInvalid, StatusCode::UNAUTHORIZED),
            (AuthError::Decode { field: "signature" }, StatusCode::UNAUTHORIZED),
            (AuthError::TokenInvalid("bad".into()), StatusCode::UNAUTHORIZED),
            (AuthError::Unauthenticated("expired".into()), StatusCode::UNAUTHORIZED),
            (AuthError::PermissionDenied, StatusCode::FORBIDDEN),
            (AuthError::NotFound { id: "k".into() }, StatusCode::NOT_FOUND),
            (AuthError::UpstreamResolution("down".into()), StatusCode::BAD_GATEWAY),
            (
                AuthError::Persistence(RepositoryError::Unavailable("down".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (error, status) in cases {
            assert_eq!(ErrorResponse::from(error).status(), status);
        }
    }

    #[test]
    fn test_auth_failures_do_not_leak_detail() {
        let response = ErrorResponse::from(AuthError::TokenInvalid("InvalidSignature".into()));
        assert_eq!(response.message, "Authentication failed");

        let response = ErrorResponse::from(AuthError::Persistence(RepositoryError::Unavailable(
            "redis at 10.0.0.5 refused".into(),
        )));
        assert_eq!(response.message, "Internal server error");
    }

    #[test]
    fn test_apple_redirect_location_encodes_token() {
        assert_eq!(
            apple_redirect_location("app://signin", "abc.def-ghi_jk"),
            "app://signin?id_token=abc.def-ghi_jk"
        );
        assert_eq!(
            apple_redirect_location("app://signin", "abc&admin=1#frag"),
            "app://signin?id_token=abc%26admin%3D1%23frag"
        );

        let location = apple_redirect_location("app://signin", "abc\r\nSet-Cookie: x=1");
        assert!(HeaderValue::from_str(&location).is_ok());
        assert!(!location.contains('\r') && !location.contains('\n'));
    }

    #[test]
    fn test_upstream_message_is_preserved() {
        let response = ErrorResponse::from(AuthError::UpstreamResolution("JWT expired".into()));
        assert_eq!(response.message, "JWT expired");
    }
}
