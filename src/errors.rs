// Copyright (c) 2022 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Custom application error with conversions from common Rust and 3rd-party errors.

use actix::MailboxError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use derive_more::Display;
use log::error;

use crate::server::web_model::ApiResponse;

#[derive(Debug, Clone, Display, PartialEq)]
pub enum ServiceError {
    #[display("Internal server error: {_0}")]
    InternalServerError(String),

    #[display("Internal serialization error: {_0}")]
    SerializationError(String),

    #[display("BadRequest: {_0}")]
    BadRequest(String),

    #[display("Not found: {_0}")]
    NotFound(String),

    /// Missing or invalid access token of a REST request.
    #[display("Authentication failed")]
    AuthenticationFailed,

    /// The Kraken API rejected the credentials.
    #[display("Not authorized: {_0}")]
    Unauthorized(String),

    /// The Kraken API returned GraphQL errors.
    #[display("API error: {_0}")]
    ApiError(String),

    #[display("Service unavailable: {_0}")]
    ServiceUnavailable(String),
}

impl ServiceError {
    fn code(&self) -> &'static str {
        match self {
            ServiceError::InternalServerError(_) => "INTERNAL_ERROR",
            ServiceError::SerializationError(_) => "SERIALIZATION_ERROR",
            ServiceError::BadRequest(_) => "BAD_REQUEST",
            ServiceError::NotFound(_) => "NOT_FOUND",
            ServiceError::AuthenticationFailed => "AUTHENTICATION_FAILED",
            ServiceError::Unauthorized(_) => "UNAUTHORIZED",
            ServiceError::ApiError(_) => "API_ERROR",
            ServiceError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::AuthenticationFailed => StatusCode::UNAUTHORIZED,
            // upstream problems of the supplier API
            ServiceError::Unauthorized(_) | ServiceError::ApiError(_) => StatusCode::BAD_GATEWAY,
            ServiceError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ServiceError::InternalServerError(_) | ServiceError::SerializationError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = self.to_string();
        HttpResponse::build(self.status_code()).json(ApiResponse::new(self.code(), &message))
    }
}

impl std::error::Error for ServiceError {}

impl From<std::io::Error> for ServiceError {
    fn from(e: std::io::Error) -> Self {
        ServiceError::InternalServerError(format!("{e:?}"))
    }
}

impl From<MailboxError> for ServiceError {
    fn from(e: MailboxError) -> Self {
        ServiceError::InternalServerError(format!("Internal message error: {e:?}"))
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(e: serde_json::Error) -> Self {
        error!("{e:?}");
        ServiceError::SerializationError(e.to_string())
    }
}

impl From<strum::ParseError> for ServiceError {
    fn from(e: strum::ParseError) -> Self {
        ServiceError::BadRequest(e.to_string())
    }
}

impl From<awc::error::SendRequestError> for ServiceError {
    fn from(e: awc::error::SendRequestError) -> Self {
        ServiceError::ServiceUnavailable(format!("Request failed: {e}"))
    }
}

impl From<awc::error::JsonPayloadError> for ServiceError {
    fn from(e: awc::error::JsonPayloadError) -> Self {
        ServiceError::SerializationError(format!("Invalid response payload: {e}"))
    }
}
