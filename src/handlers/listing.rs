// Listing handlers - index, group, profile and follow feed, newest first

use axum::extract::{Path, Query, State};
use serde_json::json;
use tracing::debug;

use crate::{
    app_state::AppState,
    error::{AppError, AppResult},
    framework::pagination::{Page, PageQuery, Paginator},
    handlers::{HandlerResult, Outcome},
    infrastructure::{
        cache_layer::PageCache,
        database::PostFilter,
        middleware::{AuthenticatedUser, Vc},
    },
    models::Post,
};

/// Count, clamp the requested page and fetch its window
async fn load_page(state: &AppState, filter: PostFilter, requested: i64) -> AppResult<Page<Post>> {
    let paginator = Paginator::new(state.store.count_posts(filter).await?);
    let number = paginator.page_number(requested);
    let posts = state
        .store
        .list_posts(filter, paginator.offset(number), paginator.limit())
        .await?;
    Ok(Page::new(posts, number, &paginator))
}

/// `GET /` - every post, served from the page cache while fresh
pub async fn index(State(state): State<AppState>, Query(query): Query<PageQuery>) -> HandlerResult {
    let requested = query.requested();
    let cache_key = PageCache::index_key(requested);

    if let Some(cached) = state.page_cache.get(&cache_key).await {
        return Ok(Outcome::Render(cached));
    }

    let page_obj = load_page(&state, PostFilter::All, requested).await?;
    let context = json!({ "page_obj": page_obj });

    state.page_cache.put(&cache_key, context.clone()).await;
    let metrics = state.page_cache.metrics();
    debug!(hits = metrics.hits(), misses = metrics.misses(), "Cached index page {}", cache_key);

    Ok(Outcome::Render(context))
}

/// `GET /group/{slug}/`
pub async fn group_posts(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> HandlerResult {
    let group = state
        .store
        .group_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Group {} not found", slug)))?;

    let page_obj = load_page(&state, PostFilter::Group(group.id), query.requested()).await?;

    Ok(Outcome::Render(json!({
        "group": group,
        "page_obj": page_obj,
    })))
}

/// `GET /profile/{username}/`
pub async fn profile(
    State(state): State<AppState>,
    vc: Vc,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
) -> HandlerResult {
    let author = state
        .store
        .user_by_username(&username)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", username)))?;

    let following = match vc.user_id() {
        Some(user_id) => state.store.follow_exists(user_id, author.id).await?,
        None => false,
    };

    let page_obj = load_page(&state, PostFilter::Author(author.id), query.requested()).await?;

    Ok(Outcome::Render(json!({
        "author": author,
        "posts_count": page_obj.count,
        "following": following,
        "my_page": !vc.is(author.id),
        "page_obj": page_obj,
    })))
}

/// `GET /follow/` - posts by everyone the viewer follows
pub async fn follow_index(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Query(query): Query<PageQuery>,
) -> HandlerResult {
    let page_obj = load_page(&state, PostFilter::FollowedBy(user.id), query.requested()).await?;
    let following: Vec<_> = state
        .store
        .follows_of(user.id)
        .await?
        .into_iter()
        .map(|follow| follow.author)
        .collect();

    Ok(Outcome::Render(json!({
        "following": following,
        "page_obj": page_obj,
    })))
}
