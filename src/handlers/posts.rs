// Post handlers - detail page, creation and author-only editing

use axum::extract::{Path, State};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::{
    app_state::AppState,
    error::{AppError, AppResult},
    framework::{
        forms::{validate_post_form, FormData, FormErrors, PostForm},
        privacy::{self, Authorization},
        routes,
    },
    handlers::{parse_post_id, FormSubmission, HandlerResult, Outcome},
    infrastructure::{
        database::{NewPost, PostChanges, PostFilter},
        middleware::{AuthenticatedUser, Vc},
    },
    models::{Post, User},
};

/// Values a post form is shown with, plus any per-field errors
fn form_context(text: &str, group: Option<i64>, errors: &FormErrors) -> Value {
    json!({
        "text": text,
        "group": group,
        "errors": errors,
    })
}

/// Echo a rejected submission back to the form
fn submitted_form(data: &FormData, errors: &FormErrors) -> Value {
    let group = data
        .field("group")
        .and_then(|raw| raw.trim().parse::<i64>().ok());
    form_context(data.field("text").unwrap_or_default(), group, errors)
}

async fn render_post_form(state: &AppState, form: Value, editing: Option<i64>) -> HandlerResult {
    let groups = state.store.list_groups().await?;
    let mut context = json!({
        "form": form,
        "groups": groups,
        "is_edit": editing.is_some(),
    });
    if let Some(post_id) = editing {
        context["post_id"] = json!(post_id);
    }
    Ok(Outcome::Render(context))
}

async fn find_post(state: &AppState, raw_id: &str) -> AppResult<Post> {
    let post_id = parse_post_id(raw_id)?;
    state
        .store
        .post_by_id(post_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Post {} not found", post_id)))
}

/// Store the uploaded image, if the form carries one
async fn store_image(state: &AppState, form: &PostForm) -> AppResult<Option<String>> {
    match &form.image {
        Some(upload) => state.media.save_post_image(upload).await.map(Some),
        None => Ok(None),
    }
}

/// `GET /posts/{post_id}/`
pub async fn post_detail(
    State(state): State<AppState>,
    vc: Vc,
    Path(raw_id): Path<String>,
) -> HandlerResult {
    let post = find_post(&state, &raw_id).await?;
    let posts_count = state
        .store
        .count_posts(PostFilter::Author(post.author.id))
        .await?;
    let comments = state.store.comments_for_post(post.id).await?;

    Ok(Outcome::Render(json!({
        "post": post,
        "posts_count": posts_count,
        "edit_visible": vc.is(post.author.id),
        "comments": comments,
        "form": { "text": "", "errors": {} },
    })))
}

/// `GET /create/`
pub async fn post_create_form(
    State(state): State<AppState>,
    AuthenticatedUser(_user): AuthenticatedUser,
) -> HandlerResult {
    render_post_form(&state, form_context("", None, &FormErrors::new()), None).await
}

/// `POST /create/`
pub async fn post_create(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    FormSubmission(data): FormSubmission,
) -> HandlerResult {
    let form = match validate_post_form(&data, state.store.as_ref()).await? {
        Ok(form) => form,
        Err(errors) => {
            debug!(?errors, "Rejected new post from {}", user.username);
            return render_post_form(&state, submitted_form(&data, &errors), None).await;
        }
    };

    let image = store_image(&state, &form).await?;
    let post = state
        .store
        .create_post(NewPost {
            author_id: user.id,
            text: form.text,
            group_id: form.group_id,
            image,
        })
        .await?;
    info!("{} published post {}", user.username, post.id);

    Ok(Outcome::Redirect(routes::profile(&user.username)))
}

/// Load the post and check the viewer may edit it
async fn editable_post(state: &AppState, user: &User, raw_id: &str) -> AppResult<Result<Post, String>> {
    let post = find_post(state, raw_id).await?;
    Ok(match privacy::authorize_post_edit(user, &post) {
        Authorization::Allowed => Ok(post),
        Authorization::DeniedRedirect(target) => Err(target),
    })
}

/// `GET /posts/{post_id}/edit/`
pub async fn post_edit_form(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(raw_id): Path<String>,
) -> HandlerResult {
    let post = match editable_post(&state, &user, &raw_id).await? {
        Ok(post) => post,
        Err(target) => return Ok(Outcome::Redirect(target)),
    };

    let form = form_context(&post.text, post.group.as_ref().map(|g| g.id), &FormErrors::new());
    render_post_form(&state, form, Some(post.id)).await
}

/// `POST /posts/{post_id}/edit/`
pub async fn post_edit(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(raw_id): Path<String>,
    FormSubmission(data): FormSubmission,
) -> HandlerResult {
    let post = match editable_post(&state, &user, &raw_id).await? {
        Ok(post) => post,
        Err(target) => {
            debug!(post_id = %raw_id, "{} may not edit this post", user.username);
            return Ok(Outcome::Redirect(target));
        }
    };

    let form = match validate_post_form(&data, state.store.as_ref()).await? {
        Ok(form) => form,
        Err(errors) => {
            return render_post_form(&state, submitted_form(&data, &errors), Some(post.id)).await;
        }
    };

    let image = store_image(&state, &form).await?;
    state
        .store
        .update_post(
            post.id,
            PostChanges {
                text: form.text,
                group_id: form.group_id,
                image,
            },
        )
        .await?;
    info!("{} edited post {}", user.username, post.id);

    Ok(Outcome::Redirect(routes::post_detail(post.id)))
}
