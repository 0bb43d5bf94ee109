// HTTP handlers - one per route. Each either renders a JSON context (the
// data a template would receive) or redirects.

pub mod comments;
pub mod follow;
pub mod listing;
pub mod posts;
pub mod submission;

use axum::{
    extract::OriginalUri,
    http::StatusCode,
    response::{IntoResponse, Json, Redirect, Response},
};
use serde_json::Value;

use crate::error::{AppError, AppResult};

pub use submission::FormSubmission;

/// What a handler decided to do with the request
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Render(Value),
    Redirect(String),
}

impl IntoResponse for Outcome {
    fn into_response(self) -> Response {
        match self {
            Outcome::Render(context) => (StatusCode::OK, Json(context)).into_response(),
            Outcome::Redirect(target) => Redirect::to(&target).into_response(),
        }
    }
}

pub type HandlerResult = AppResult<Outcome>;

/// Post ids in paths are integers; anything else is an unknown page
pub(crate) fn parse_post_id(raw: &str) -> AppResult<i64> {
    raw.parse::<i64>()
        .map_err(|_| AppError::NotFound(format!("Post {} not found", raw)))
}

pub async fn not_found(OriginalUri(uri): OriginalUri) -> AppError {
    AppError::NotFound(format!("No page at {}", uri.path()))
}
