use axum::extract::{Path, State};
use tracing::debug;

use crate::{
    app_state::AppState,
    error::AppError,
    framework::{forms::validate_comment_form, routes},
    handlers::{parse_post_id, FormSubmission, HandlerResult, Outcome},
    infrastructure::middleware::AuthenticatedUser,
};

/// `POST /posts/{post_id}/comment/` - always returns to the post, even when
/// the comment was rejected
pub async fn add_comment(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(raw_id): Path<String>,
    FormSubmission(data): FormSubmission,
) -> HandlerResult {
    let post_id = parse_post_id(&raw_id)?;
    let post = state
        .store
        .post_by_id(post_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Post {} not found", post_id)))?;

    match validate_comment_form(&data) {
        Ok(form) => {
            state.store.create_comment(post.id, user.id, &form.text).await?;
        }
        Err(errors) => {
            debug!(post_id = post.id, ?errors, "Discarded invalid comment");
        }
    }

    Ok(Outcome::Redirect(routes::post_detail(post.id)))
}
