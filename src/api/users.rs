use axum::{extract::State, http::StatusCode, Json};

use crate::api::response::{ApiError, ApiResult};
use crate::api::AppState;
use crate::middleware::AuthUser;
use crate::models::user::UserMeResponse;
use crate::repositories::UserRepository;

pub async fn me(State(state): State<AppState>, user: AuthUser) -> ApiResult<UserMeResponse> {
    let repo = UserRepository::new(&state.pool);

    match repo.find_by_email(&user.email).await {
        Ok(Some(account)) => Ok(Json(UserMeResponse {
            full_name: account.full_name,
            email: account.email,
            phone: account.phone,
        })),
        // A valid token whose account no longer exists.
        Ok(None) => Err(ApiError::new(
            StatusCode::UNAUTHORIZED,
            "Authentication required",
        )),
        Err(err) => Err(ApiError::storage(&err, "Failed to load profile")),
    }
}
