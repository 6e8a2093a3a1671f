use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use tracing::{error, info, warn};

use crate::api::{response::ApiError, AppState};
use crate::models::user::{LoginRequest, RegisterRequest, User};
use crate::repositories::{is_unique_violation, UserRepository};
use crate::services::{password, token};

const MIN_PASSWORD_LENGTH: usize = 8;

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let raw_password = match payload.password.as_deref() {
        Some(raw) if raw.len() >= MIN_PASSWORD_LENGTH => raw.to_string(),
        Some(_) => {
            return Ok((
                StatusCode::BAD_REQUEST,
                Json(json!({"message": "Password must be at least 8 characters"})),
            ))
        }
        None => {
            return Ok((
                StatusCode::BAD_REQUEST,
                Json(json!({"message": "Password is required"})),
            ))
        }
    };

    let password_hash = match password::hash_password(&raw_password) {
        Ok(hash) => hash,
        Err(err) => {
            error!("Failed to hash password: {:#}", err);
            return Err(ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to register",
            ));
        }
    };

    let user = match User::new(payload, password_hash) {
        Ok(user) => user,
        Err(err) => return Ok((StatusCode::BAD_REQUEST, Json(json!({"message": err})))),
    };

    let repo = UserRepository::new(&state.pool);

    match repo.find_by_email(&user.email).await {
        Ok(Some(_)) => {
            return Ok((
                StatusCode::BAD_REQUEST,
                Json(json!({"message": "Email is already in use"})),
            ))
        }
        Ok(None) => {}
        Err(err) => return Err(ApiError::storage(&err, "Failed to register")),
    }

    if let Err(err) = repo.create(&user).await {
        // Two concurrent registrations can both pass the pre-check, the
        // unique index settles it.
        if is_unique_violation(&err, "bilet_users_email_key") {
            warn!("Concurrent registration for {}", user.email);
            return Ok((
                StatusCode::BAD_REQUEST,
                Json(json!({"message": "Email is already in use"})),
            ));
        }
        return Err(ApiError::storage(&err, "Failed to register"));
    }

    let token = match token::issue_token(&user.email, &user.role, &state.jwt) {
        Ok(token) => token,
        Err(err) => {
            error!("Failed to issue token: {:#}", err);
            return Err(ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to register",
            ));
        }
    };

    info!("Registered organizer {}", user.email);

    Ok((StatusCode::CREATED, Json(json!({"token": token}))))
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = payload
        .email
        .as_deref()
        .map(str::trim)
        .unwrap_or_default()
        .to_lowercase();
    let raw_password = payload.password.unwrap_or_default();

    // One undisclosing answer for every failure mode, so responses do not
    // reveal which emails are registered.
    let invalid = || {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"message": "Invalid email or password"})),
        )
    };

    if email.is_empty() || raw_password.is_empty() {
        return Ok(invalid());
    }

    let repo = UserRepository::new(&state.pool);
    let user = match repo.find_by_email(&email).await {
        Ok(Some(user)) => user,
        Ok(None) => return Ok(invalid()),
        Err(err) => return Err(ApiError::storage(&err, "Failed to log in")),
    };

    match password::verify_password(&raw_password, &user.password_hash) {
        Ok(true) => {}
        Ok(false) => return Ok(invalid()),
        Err(err) => {
            error!("Password verification failed for {}: {:#}", email, err);
            return Ok(invalid());
        }
    }

    let token = match token::issue_token(&user.email, &user.role, &state.jwt) {
        Ok(token) => token,
        Err(err) => {
            error!("Failed to issue token: {:#}", err);
            return Err(ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to log in",
            ));
        }
    };

    info!("Organizer {} logged in", email);

    Ok((StatusCode::OK, Json(json!({"token": token}))))
}
