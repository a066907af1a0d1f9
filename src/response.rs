/// Success envelope: `{error: false, status, body}`.
///
/// Failures use the mirror shape built in `error::ErrorResponse`.

use actix_web::{http::StatusCode, HttpResponse};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub error: bool,
    pub status: u16,
    pub body: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(status: StatusCode, body: T) -> Self {
        Self {
            error: false,
            status: status.as_u16(),
            body,
        }
    }
}

/// `{message}` body used by endpoints that only acknowledge
#[derive(Debug, Serialize)]
pub struct Message {
    pub message: String,
}

impl Message {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// `{data, message?}` body used by endpoints returning a record
#[derive(Debug, Serialize)]
pub struct Data<T: Serialize> {
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T: Serialize> Data<T> {
    pub fn new(data: T) -> Self {
        Self { data, message: None }
    }

    pub fn with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            data,
            message: Some(message.into()),
        }
    }
}

pub fn respond<T: Serialize>(status: StatusCode, body: T) -> HttpResponse {
    HttpResponse::build(status).json(ApiResponse::new(status, body))
}

pub fn ok<T: Serialize>(body: T) -> HttpResponse {
    respond(StatusCode::OK, body)
}
