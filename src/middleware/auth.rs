//! Session cookie authentication middleware.
//!
//! Two layers cooperate:
//! 1. [`session_context`] runs on every request, verifies the session cookie
//!    once and stores the outcome as a request extension
//! 2. [`require_admin`] guards admin-only routes and rejects requests whose
//!    context carries no valid session

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::{
    AppState,
    error::AppError,
    services::{
        auth_service,
        credentials::{SESSION_TTL_SECS, SessionClaims},
    },
};

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "vendor_session";

/// Verified session of the current request, if any.
///
/// Inserted by [`session_context`]; handlers extract it with
/// `Extension<SessionContext>`.
#[derive(Debug, Clone, Default)]
pub struct SessionContext(pub Option<SessionClaims>);

impl SessionContext {
    pub fn claims(&self) -> Option<&SessionClaims> {
        self.0.as_ref()
    }
}

/// Verify the session cookie and attach a [`SessionContext`].
///
/// Never rejects: a missing, forged or expired token simply yields an
/// empty context.
pub async fn session_context(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let claims = CookieJar::from_headers(request.headers())
        .get(SESSION_COOKIE)
        .and_then(|cookie| state.sessions.verify(cookie.value()));

    request.extensions_mut().insert(SessionContext(claims));
    next.run(request).await
}

/// Reject requests without a valid admin session.
///
/// # Errors
///
/// - `SetupRequired` (403) when no admin account exists yet
/// - `Unauthorized` (401) otherwise
///
/// On success the claims are also inserted as `Extension<SessionClaims>`.
pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let claims = request
        .extensions()
        .get::<SessionContext>()
        .and_then(|context| context.claims().cloned());

    let Some(claims) = claims else {
        if auth_service::is_setup_required(state.admins.as_ref()).await? {
            return Err(AppError::SetupRequired);
        }
        return Err(AppError::Unauthorized);
    };

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

/// Session cookie: HttpOnly, SameSite=Lax, whole site, seven days.
pub fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(time::Duration::seconds(SESSION_TTL_SECS))
        .secure(secure)
        .build()
}

/// Cookie shape used to expire the session on logout.
pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE).path("/").build()
}
