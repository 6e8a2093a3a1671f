use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use tracing::{error, info};

use crate::api::{response::ApiError, AppState};
use crate::middleware::AuthUser;

pub async fn upload_image(
    State(state): State<AppState>,
    _user: AuthUser,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => {
                return Ok((
                    StatusCode::BAD_REQUEST,
                    Json(json!({"message": format!("Malformed multipart body: {}", err)})),
                ))
            }
        };

        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or("upload").to_string();
        let bytes = match field.bytes().await {
            Ok(bytes) => bytes,
            Err(err) => {
                return Ok((
                    StatusCode::BAD_REQUEST,
                    Json(json!({"message": format!("Failed to read upload: {}", err)})),
                ))
            }
        };

        if bytes.is_empty() {
            return Ok((
                StatusCode::BAD_REQUEST,
                Json(json!({"message": "Uploaded file is empty"})),
            ));
        }

        return match state.images.save(&file_name, &bytes).await {
            Ok(url) => {
                info!("Stored upload {} as {}", file_name, url);
                Ok((StatusCode::OK, Json(json!({"url": url}))))
            }
            Err(err) => {
                error!("Failed to store upload: {:#}", err);
                Err(ApiError::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to store upload",
                ))
            }
        };
    }

    Ok((
        StatusCode::BAD_REQUEST,
        Json(json!({"message": "Multipart field 'file' is required"})),
    ))
}
