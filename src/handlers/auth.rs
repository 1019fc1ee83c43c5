//! HTTP handlers for admin bootstrap, login and session inspection.

use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
};
use axum_extra::extract::cookie::CookieJar;

use crate::{
    AppState,
    error::AppError,
    middleware::auth::{SessionContext, removal_cookie, session_cookie},
    models::{
        ApiResponse,
        admin::{Admin, AdminProfile, SetupStatus},
    },
    services::auth_service,
    validation::{LoginRequest, SetupRequest},
};

/// Attach a fresh session cookie for `admin`.
fn sign_in(state: &AppState, jar: CookieJar, admin: &Admin) -> Result<CookieJar, AppError> {
    let token = state.sessions.issue(admin.id, &admin.username)?;
    Ok(jar.add(session_cookie(token, state.config.is_production())))
}

/// Report whether the bootstrap flow still has to run.
///
/// # Response
///
/// ```json
/// { "success": true, "data": { "setupRequired": true } }
/// ```
pub async fn setup_status(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<SetupStatus>>, AppError> {
    let setup_required = auth_service::is_setup_required(state.admins.as_ref()).await?;
    Ok(Json(ApiResponse::ok(SetupStatus { setup_required })))
}

/// Create the first admin and sign them in.
///
/// # Request Body
///
/// ```json
/// { "username": "admin", "password": "Abcd1234", "confirmPassword": "Abcd1234" }
/// ```
///
/// # Errors
///
/// - 400 `admin_exists` once an admin account exists
/// - 400 `validation_error` for bad fields
pub async fn setup(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<SetupRequest>, JsonRejection>,
) -> Result<(CookieJar, Json<ApiResponse<AdminProfile>>), AppError> {
    // Closed setup wins over a malformed body
    if !auth_service::is_setup_required(state.admins.as_ref()).await? {
        return Err(AppError::AdminExists);
    }

    let Json(request) = payload.map_err(|e| AppError::InvalidRequest(e.body_text()))?;

    let admin =
        auth_service::setup_admin(state.admins.as_ref(), request, state.config.bcrypt_cost)
            .await?;

    let jar = sign_in(&state, jar, &admin)?;
    Ok((
        jar,
        Json(ApiResponse::ok(AdminProfile::from(admin)).with_message("Admin account created")),
    ))
}

/// Exchange username and password for a session cookie.
///
/// # Errors
///
/// - 400 `validation_error` for malformed credentials
/// - 401 `invalid_credentials` for unknown users or wrong passwords
/// - 403 `setup_required` while no admin exists
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<(CookieJar, Json<ApiResponse<AdminProfile>>), AppError> {
    let Json(request) = payload.map_err(|e| AppError::InvalidRequest(e.body_text()))?;

    let admin = auth_service::login(state.admins.as_ref(), request).await?;
    tracing::info!(admin_id = %admin.id, "admin logged in");

    let jar = sign_in(&state, jar, &admin)?;
    Ok((
        jar,
        Json(ApiResponse::ok(AdminProfile::from(admin)).with_message("Logged in successfully")),
    ))
}

/// The signed-in admin.
///
/// The account is re-read, so a session for a vanished admin is rejected.
pub async fn me(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
) -> Result<Json<ApiResponse<AdminProfile>>, AppError> {
    let claims = session.claims().ok_or(AppError::Unauthorized)?;

    let admin = state
        .admins
        .find_by_id(claims.sub)
        .await?
        .ok_or(AppError::Unauthorized)?;

    Ok(Json(ApiResponse::ok(AdminProfile::from(admin))))
}

/// Expire the session cookie. Always succeeds.
pub async fn logout(jar: CookieJar) -> (CookieJar, Json<ApiResponse<()>>) {
    (
        jar.remove(removal_cookie()),
        Json(ApiResponse::<()>::message("Logged out successfully")),
    )
}
