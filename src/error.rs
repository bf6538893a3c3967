use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Failures surfaced by the delivery API or while talking to it.
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("account id and auth token are required")]
    MissingCredentials,

    #[error("request to delivery API failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("delivery API rejected message ({status}): {message}{}", code_suffix(.code))]
    Api {
        status: u16,
        code: Option<u32>,
        message: String,
    },

    #[error("unexpected delivery API response: {0}")]
    Decode(String),
}

fn code_suffix(code: &Option<u32>) -> String {
    code.map(|c| format!(" [code {}]", c)).unwrap_or_default()
}

#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": self.0.to_string()
        });

        (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
