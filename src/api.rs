use axum::{
    extract::{State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};

use crate::processor::WatermarkRequest;
use crate::watermark::Position;

pub const MISSING_FIELDS_MESSAGE: &str = "Missing required fields: image_url and text";
pub const PROCESSING_FAILED_MESSAGE: &str = "Failed to process image";

/// Body of `POST /process-image`. Every field is optional at the serde level
/// so that missing required fields get the dedicated 400 message.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct WatermarkPayload {
    pub image_url: Option<String>,
    pub text: Option<String>,
    pub position: Option<String>,
    pub font_size: Option<u32>,
    pub text_color: Option<String>,
}

impl WatermarkPayload {
    /// `None` when `image_url` or `text` is absent. An empty `text` is allowed.
    pub fn into_request(self) -> Option<WatermarkRequest> {
        Some(WatermarkRequest {
            image_url: self.image_url?,
            text: self.text?,
            position: self
                .position
                .as_deref()
                .map(Position::from_name)
                .unwrap_or_default(),
            font_size: self.font_size,
            text_color: self.text_color,
        })
    }
}

#[derive(Serialize)]
pub struct ErrorResponse {
    error: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

pub async fn process_image_handler(
    State(app_state): State<crate::AppState>,
    payload: Result<Json<WatermarkPayload>, JsonRejection>,
) -> Response {
    let payload = match payload {
        Ok(Json(payload)) => payload,
        Err(rejection) => {
            tracing::warn!("Rejected process-image body: {}", rejection.body_text());
            return error_response(StatusCode::BAD_REQUEST, rejection.body_text());
        }
    };

    let Some(request) = payload.into_request() else {
        tracing::warn!("Process-image request missing required fields");
        return error_response(StatusCode::BAD_REQUEST, MISSING_FIELDS_MESSAGE);
    };

    tracing::info!(
        "Processing image {} at {}",
        request.image_url,
        request.position.name()
    );

    match app_state.processor.process_image_url(&request).await {
        Ok(png_data) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "image/png"),
                (header::CACHE_CONTROL, "no-store"),
            ],
            png_data,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Failed to process image {}: {}", request.image_url, e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, PROCESSING_FAILED_MESSAGE)
        }
    }
}

pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse { status: "healthy" })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_requires_url_and_text() {
        let payload: WatermarkPayload =
            serde_json::from_str(r#"{"image_url": "https://example.com/a.png"}"#).unwrap();
        assert!(payload.into_request().is_none());

        let payload: WatermarkPayload = serde_json::from_str(r#"{"text": "hello"}"#).unwrap();
        assert!(payload.into_request().is_none());

        let payload: WatermarkPayload =
            serde_json::from_str(r#"{"image_url": "https://example.com/a.png", "text": null}"#)
                .unwrap();
        assert!(payload.into_request().is_none());
    }

    #[test]
    fn test_payload_defaults() {
        let payload: WatermarkPayload =
            serde_json::from_str(r#"{"image_url": "https://example.com/a.png", "text": ""}"#)
                .unwrap();
        let request = payload.into_request().unwrap();

        assert_eq!(request.text, "");
        assert_eq!(request.position, Position::BottomRight);
        assert_eq!(request.font_size, None);
        assert_eq!(request.text_color, None);
    }

    #[test]
    fn test_payload_overrides() {
        let payload: WatermarkPayload = serde_json::from_str(
            r##"{
                "image_url": "https://example.com/a.png",
                "text": "hi",
                "position": "top_center",
                "font_size": 40,
                "text_color": "#ff0000"
            }"##,
        )
        .unwrap();
        let request = payload.into_request().unwrap();

        assert_eq!(request.position, Position::TopCenter);
        assert_eq!(request.font_size, Some(40));
        assert_eq!(request.text_color.as_deref(), Some("#ff0000"));
    }

    #[test]
    fn test_unknown_position_maps_to_bottom_right() {
        let payload = WatermarkPayload {
            image_url: Some("https://example.com/a.png".to_string()),
            text: Some("hi".to_string()),
            position: Some("somewhere".to_string()),
            ..Default::default()
        };
        assert_eq!(
            payload.into_request().unwrap().position,
            Position::BottomRight
        );
    }

    #[test]
    fn test_negative_font_size_is_rejected() {
        let result = serde_json::from_str::<WatermarkPayload>(
            r#"{"image_url": "https://example.com/a.png", "text": "hi", "font_size": -3}"#,
        );
        assert!(result.is_err());
    }
}
