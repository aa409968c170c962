// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mapping of [`SwitchboardError`] onto HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use switchboard_core::SwitchboardError;

/// Error body: `{ ok: false, error, code?, type?, status?, traceId? }`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub ok: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<i64>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
}

/// Handler error wrapper.
#[derive(Debug)]
pub struct ApiError(pub SwitchboardError);

impl From<SwitchboardError> for ApiError {
    fn from(e: SwitchboardError) -> Self {
        Self(e)
    }
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match &self.0 {
            SwitchboardError::InvalidAddress(_) => StatusCode::BAD_REQUEST,
            SwitchboardError::NotFound(_) => StatusCode::NOT_FOUND,
            SwitchboardError::Conflict(_) => StatusCode::CONFLICT,
            SwitchboardError::Gateway { .. } => StatusCode::BAD_GATEWAY,
            SwitchboardError::Config(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match self.0 {
            SwitchboardError::Gateway {
                message,
                status,
                code,
                error_type,
                trace_id,
            } => ErrorBody {
                ok: false,
                error: message,
                code,
                error_type,
                status,
                trace_id,
            },
            other => ErrorBody {
                ok: false,
                error: other.to_string(),
                code: None,
                error_type: None,
                status: None,
                trace_id: None,
            },
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes() {
        let cases = [
            (SwitchboardError::InvalidAddress("x".into()), StatusCode::BAD_REQUEST),
            (SwitchboardError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (SwitchboardError::Conflict("x".into()), StatusCode::CONFLICT),
            (SwitchboardError::gateway("x"), StatusCode::BAD_GATEWAY),
            (SwitchboardError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError(err).status_code(), expected);
        }
    }

    #[test]
    fn gateway_body_carries_provider_details() {
        let body = ErrorBody {
            ok: false,
            error: "boom".into(),
            code: Some(131030),
            error_type: Some("OAuthException".into()),
            status: Some(400),
            trace_id: None,
        };
        let json = serde_json::to_value(body).unwrap();
        assert_eq!(json["type"], "OAuthException");
        assert_eq!(json["code"], 131030);
        assert!(json.get("traceId").is_none());
    }
}
