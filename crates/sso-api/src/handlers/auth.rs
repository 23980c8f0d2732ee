//! Auth handlers: register, login, logout, validate, refresh, me.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::CookieJar;
use tracing::info;

use sso_auth::session::ValidationOutcome;
use sso_core::error::AppError;

use crate::cookies::{clear_session_cookies, set_session_cookies};
use crate::dto::request::{LoginRequest, RegisterRequest};
use crate::dto::response::{
    LoginResponse, LogoutResponse, MeResponse, MessageResponse, ValidateResponse,
};
use crate::error::ApiError;
use crate::extractors::{AuthUser, SessionCredentials, ValidatedJson};
use crate::state::AppState;

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    state
        .authority
        .register(&req.username, &req.email, &req.password)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("User registered successfully")),
    ))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), ApiError> {
    let result = state.authority.login(&req.email, &req.password).await?;
    let jar = set_session_cookies(jar, &result.tokens, &state.config.auth)?;

    Ok((
        jar,
        Json(LoginResponse {
            message: "Login successful".to_string(),
            user: result.user,
        }),
    ))
}

/// POST /api/auth/logout
///
/// Always succeeds: ends every session of the caller's identity, notifies
/// their live connections, and expires the credential cookies.
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
    credentials: SessionCredentials,
) -> (CookieJar, Json<LogoutResponse>) {
    let result = state
        .authority
        .logout_everywhere(credentials.refresh(), credentials.access())
        .await;

    (
        clear_session_cookies(jar),
        Json(LogoutResponse {
            message: "Logout successful".to_string(),
            logged_out_connections: result.logged_out_connections,
        }),
    )
}

/// GET /api/auth/validate
pub async fn validate(
    State(state): State<AppState>,
    credentials: SessionCredentials,
) -> Result<Response, ApiError> {
    let outcome = state
        .authority
        .validate(credentials.access(), credentials.refresh())
        .await?;

    let response = match outcome {
        ValidationOutcome::Valid { user } => Json(ValidateResponse {
            valid: true,
            user: Some(user),
            reason: None,
            message: None,
        })
        .into_response(),
        ValidationOutcome::Invalid { reason } => (
            StatusCode::UNAUTHORIZED,
            Json(ValidateResponse {
                valid: false,
                user: None,
                reason: Some(reason.as_str().to_string()),
                message: Some(reason.message().to_string()),
            }),
        )
            .into_response(),
    };

    Ok(response)
}

/// POST /api/auth/refresh
///
/// Rotates the refresh cookie. Any failure expires both cookies.
pub async fn refresh(
    State(state): State<AppState>,
    jar: CookieJar,
    credentials: SessionCredentials,
) -> Result<(CookieJar, Json<MessageResponse>), (CookieJar, ApiError)> {
    let Some(refresh_token) = credentials.refresh() else {
        return Err((
            clear_session_cookies(jar),
            AppError::token_invalid("Refresh token not found").into(),
        ));
    };

    let tokens = match state.authority.refresh(refresh_token).await {
        Ok(tokens) => tokens,
        Err(e) => {
            info!(kind = %e.kind, "Refresh rejected");
            return Err((clear_session_cookies(jar), e.into()));
        }
    };

    match set_session_cookies(jar.clone(), &tokens, &state.config.auth) {
        Ok(jar) => Ok((jar, Json(MessageResponse::new("Token refreshed successfully")))),
        Err(e) => Err((jar, e.into())),
    }
}

/// GET /api/auth/me
pub async fn me(AuthUser(user): AuthUser) -> Json<MeResponse> {
    Json(MeResponse { user })
}
