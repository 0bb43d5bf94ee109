// ViewerContext Middleware - turns the session token into a ViewerContext
// Credentials themselves belong to the external login flow

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;
use tracing::{debug, error};
use uuid::Uuid;

use crate::infrastructure::{database::BlogStore, viewer::ViewerContext};

/// Name of the cookie carrying the session token
pub const SESSION_COOKIE: &str = "session";

/// Trait for application state that can resolve sessions
pub trait HasBlogStore {
    fn blog_store(&self) -> &Arc<dyn BlogStore>;
}

/// Creates the request-scoped ViewerContext and stores it in request extensions
pub async fn viewer_context_middleware<T>(
    State(app_state): State<T>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode>
where
    T: HasBlogStore + Clone + Send + Sync + 'static,
{
    let token = extract_session_token(request.headers())?;

    let viewer_context = create_viewer_context(token, app_state.blog_store().as_ref()).await?;

    request.extensions_mut().insert(viewer_context);

    Ok(next.run(request).await)
}

/// Session token from `Authorization: Bearer <token>` or the session cookie
fn extract_session_token(headers: &HeaderMap) -> Result<Option<String>, StatusCode> {
    if let Some(auth_header) = headers.get(header::AUTHORIZATION) {
        let auth_str = auth_header
            .to_str()
            .map_err(|_| StatusCode::BAD_REQUEST)?;

        if let Some(token) = auth_str.strip_prefix("Bearer ") {
            let token = token.trim();
            if !token.is_empty() {
                return Ok(Some(token.to_string()));
            }
        }
    }

    // Quoted cookie values carry the token between the quotes
    let token = CookieJar::from_headers(headers)
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value_trimmed().to_string())
        .filter(|token| !token.is_empty());

    Ok(token)
}

async fn create_viewer_context(
    token: Option<String>,
    store: &dyn BlogStore,
) -> Result<Arc<ViewerContext>, StatusCode> {
    let request_id = format!("req-{}", Uuid::new_v4());

    let viewer_context = match token {
        Some(token) => match store.user_for_session(&token).await {
            Ok(Some(user)) => {
                debug!(request_id = %request_id, user = %user.username, "Authenticated viewer");
                ViewerContext::authenticated(user, request_id)
            }
            // Stale or unknown tokens browse anonymously
            Ok(None) => {
                debug!(request_id = %request_id, "Unknown session token");
                ViewerContext::anonymous(request_id)
            }
            Err(e) => {
                error!("Failed to resolve session: {}", e);
                return Err(StatusCode::INTERNAL_SERVER_ERROR);
            }
        },
        None => ViewerContext::anonymous(request_id),
    };

    Ok(Arc::new(viewer_context))
}
