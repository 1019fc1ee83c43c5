//! Admin bootstrap and login.
//!
//! The first admin is created through the one-shot setup flow. After that,
//! setup is closed and login is the only way in.

use crate::{
    error::AppError,
    models::admin::Admin,
    repository::AdminStore,
    services::credentials::{hash_password_async, verify_password_async},
    validation::{LoginRequest, SetupRequest, validate_login, validate_setup},
};

/// True while no admin account exists.
pub async fn is_setup_required(admins: &dyn AdminStore) -> Result<bool, AppError> {
    Ok(admins.count().await? == 0)
}

/// Create the bootstrap admin.
///
/// # Errors
///
/// - `AdminExists` when an admin already exists, checked before the fields
/// - `Validation` for bad username, weak password or mismatched confirmation
/// - `AdminExists` when a concurrent setup won the race
pub async fn setup_admin(
    admins: &dyn AdminStore,
    request: SetupRequest,
    bcrypt_cost: u32,
) -> Result<Admin, AppError> {
    if !is_setup_required(admins).await? {
        return Err(AppError::AdminExists);
    }

    let request = SetupRequest {
        username: request.username.trim().to_string(),
        ..request
    };
    validate_setup(&request)?;

    let password_hash = hash_password_async(request.password, bcrypt_cost).await?;

    let admin = admins
        .create_first(&request.username, &password_hash)
        .await?
        .ok_or(AppError::AdminExists)?;

    tracing::info!(admin_id = %admin.id, username = %admin.username, "admin account created");
    Ok(admin)
}

/// Check credentials and return the matching admin.
///
/// Unknown usernames and wrong passwords produce the same error.
pub async fn login(admins: &dyn AdminStore, request: LoginRequest) -> Result<Admin, AppError> {
    let request = LoginRequest {
        username: request.username.trim().to_string(),
        ..request
    };
    validate_login(&request)?;

    if is_setup_required(admins).await? {
        return Err(AppError::SetupRequired);
    }

    let Some(admin) = admins.find_by_username(&request.username).await? else {
        tracing::info!(username = %request.username, "login rejected: unknown username");
        return Err(AppError::InvalidCredentials);
    };

    if !verify_password_async(request.password, admin.password_hash.clone()).await? {
        tracing::info!(admin_id = %admin.id, "login rejected: wrong password");
        return Err(AppError::InvalidCredentials);
    }

    Ok(admin)
}
