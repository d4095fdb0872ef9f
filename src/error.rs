//! Error handler for xpressboat.

use axum::extract::rejection::BytesRejection;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use mongodb::bson::oid;
use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ServerError>;

/// Enum representing server-side errors.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("document store is not connected")]
    StoreUnavailable,

    #[error("invalid identifier, {0}")]
    InvalidId(#[from] oid::Error),

    #[error("cannot read request body: {0}")]
    ReadingBody(#[from] BytesRejection),

    #[error("error parsing request body: {0}")]
    ParsingBody(Box<dyn std::error::Error + Send + Sync>),

    #[error("document store request failed: {0}")]
    Store(#[from] mongodb::error::Error),

    #[error("no route matches this path")]
    NotFound,

    #[error("internal server error, {details}")]
    Internal {
        details: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl ServerError {
    /// Build an [`ServerError::Internal`] without an underlying cause.
    pub fn internal(details: impl Into<String>) -> Self {
        Self::Internal {
            details: details.into(),
            source: None,
        }
    }
}

/// Structure for detailed error responses.
#[derive(Debug, Serialize)]
pub struct ResponseError {
    r#type: Option<String>,
    title: String,
    status: u16,
    detail: String,
    instance: Option<String>,
}

impl ResponseError {
    /// Update error status code.
    pub fn status(mut self, code: StatusCode) -> Self {
        self.status = code.as_u16();
        self
    }

    /// Update `title` field.
    pub fn title(mut self, title: &str) -> Self {
        self.title = title.into();
        self
    }

    /// Add detailed error.
    pub fn details(mut self, description: &str) -> Self {
        self.detail = description.into();
        self
    }

    /// Transform [`ResponseError`] into axum [`Response`].
    pub fn into_response(self) -> std::result::Result<Response, axum::http::Error> {
        if let Ok(body) = serde_json::to_string(&self) {
            Response::builder()
                .status(self.status)
                .header(header::CONTENT_TYPE, "application/json")
                .body(body.into())
        } else {
            Ok(internal_server_error())
        }
    }
}

impl Default for ResponseError {
    fn default() -> Self {
        Self {
            r#type: None,
            title: "Internal server error.".to_owned(),
            status: StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
            detail: String::default(),
            instance: None,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let response = ResponseError::default().details(&self.to_string());

        let response = match &self {
            ServerError::StoreUnavailable => response
                .title("Document store is unavailable, try again later.")
                .status(StatusCode::SERVICE_UNAVAILABLE),

            ServerError::InvalidId(_) => response
                .title("Identifier must be a 24 characters hexadecimal string.")
                .status(StatusCode::BAD_REQUEST),

            ServerError::ReadingBody(rejection) => response
                .title("Request body could not be read.")
                .status(rejection.status()),

            ServerError::ParsingBody(_) => response
                .title("Request body must be a JSON object.")
                .status(StatusCode::BAD_REQUEST),

            ServerError::NotFound => response
                .title("Not found.")
                .status(StatusCode::NOT_FOUND),

            ServerError::Store(err) => {
                tracing::error!(error = %err, "document store returned an error");

                response
            },

            ServerError::Internal { details, source } => {
                tracing::error!(err = ?source, %details, "server returned 500 status");

                ResponseError::default()
            },
        };

        response
            .into_response()
            .unwrap_or_else(|_| internal_server_error())
    }
}

fn internal_server_error() -> Response {
    Response::builder()
        .status(StatusCode::INTERNAL_SERVER_ERROR)
        .header(header::CONTENT_TYPE, "application/json")
        .body(
            serde_json::json!({
                "type": null,
                "title": "Internal server error.",
                "status": StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
                "detail": null,
                "instance": null,
            })
            .to_string()
            .into(),
        )
        .unwrap_or_else(|_| Response::new("Internal server error".into()))
}
