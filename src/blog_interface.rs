// Blog Interface - the HTTP surface of the platform
// Every route goes through the viewer context middleware; uploaded media is
// served straight from the media root.

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::get,
    Router,
};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::{
    app_state::AppState,
    handlers::{self, comments, follow, listing, posts},
    infrastructure::middleware::viewer_context_middleware,
};

/// Largest accepted request body (post images included)
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

pub fn create_blog_router(state: AppState) -> Router {
    let media = ServeDir::new(state.media.root().to_path_buf());

    Router::new()
        // Listings
        .route("/", get(listing::index))
        .route("/group/{slug}/", get(listing::group_posts))
        .route("/profile/{username}/", get(listing::profile))
        .route("/follow/", get(listing::follow_index))

        // Posts
        .route("/create/", get(posts::post_create_form).post(posts::post_create))
        .route("/posts/{post_id}/", get(posts::post_detail))
        .route(
            "/posts/{post_id}/edit/",
            get(posts::post_edit_form).post(posts::post_edit),
        )
        .route(
            "/posts/{post_id}/comment/",
            get(comments::add_comment).post(comments::add_comment),
        )

        // Follow edges
        .route("/profile/{username}/follow/", get(follow::profile_follow))
        .route("/profile/{username}/unfollow/", get(follow::profile_unfollow))

        .nest_service("/media", media)
        .fallback(handlers::not_found)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            viewer_context_middleware::<AppState>,
        ))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
