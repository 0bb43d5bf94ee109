// Follow handlers - both idempotent, both land on the author's profile

use axum::extract::{Path, State};
use tracing::info;

use crate::{
    app_state::AppState,
    error::AppError,
    framework::{privacy, routes},
    handlers::{HandlerResult, Outcome},
    infrastructure::middleware::AuthenticatedUser,
};

/// `GET /profile/{username}/follow/`
pub async fn profile_follow(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(username): Path<String>,
) -> HandlerResult {
    let author = state
        .store
        .user_by_username(&username)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", username)))?;

    // Self-follows and repeat follows are silent no-ops
    if privacy::can_follow(&user, &author) && !state.store.follow_exists(user.id, author.id).await? {
        if state.store.create_follow(user.id, author.id).await? {
            info!("{} now follows {}", user.username, author.username);
        }
    }

    Ok(Outcome::Redirect(routes::profile(&username)))
}

/// `GET /profile/{username}/unfollow/`
pub async fn profile_unfollow(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(username): Path<String>,
) -> HandlerResult {
    let author = state
        .store
        .user_by_username(&username)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", username)))?;

    if state.store.delete_follow(user.id, author.id).await? > 0 {
        info!("{} unfollowed {}", user.username, author.username);
    }

    Ok(Outcome::Redirect(routes::profile(&username)))
}
