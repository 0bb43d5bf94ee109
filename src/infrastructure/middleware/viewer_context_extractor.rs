// ViewerContext Extractors - hand handlers the context built by the middleware

use std::sync::Arc;
use crate::{
    framework::privacy,
    infrastructure::viewer::ViewerContext,
    models::User,
};
use axum::{
    extract::{FromRequestParts, OriginalUri},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Redirect, Response},
};

/// Cheaply clonable handle to the request's ViewerContext.
///
/// Derefs to [`ViewerContext`], so handlers read `vc.user()` or
/// `vc.user_id()` directly.
#[derive(Debug, Clone)]
pub struct Vc(Arc<ViewerContext>);

impl std::ops::Deref for Vc {
    type Target = ViewerContext;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<ViewerContext> for Vc {
    fn as_ref(&self) -> &ViewerContext {
        &self.0
    }
}

// Missing context means the middleware was not installed on this route
impl<S> FromRequestParts<S> for Vc
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let vc = parts
            .extensions
            .get::<Arc<ViewerContext>>()
            .map(|vc| Vc(vc.clone()))
            .ok_or(StatusCode::INTERNAL_SERVER_ERROR);

        async move { vc }
    }
}

/// Application state that knows where the external login page lives
pub trait HasLoginUrl {
    fn login_url(&self) -> &str;
}

/// The signed-in user. Anonymous requests are rejected with a redirect to
/// the login page whose `next` parameter is the requested path.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: HasLoginUrl + Send + Sync,
{
    type Rejection = Response;

    fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let result = match parts.extensions.get::<Arc<ViewerContext>>() {
            None => Err(StatusCode::INTERNAL_SERVER_ERROR.into_response()),
            Some(vc) => {
                let next = parts
                    .extensions
                    .get::<OriginalUri>()
                    .map(|uri| uri.path().to_string())
                    .unwrap_or_else(|| parts.uri.path().to_string());

                privacy::require_authenticated(vc, state.login_url(), &next)
                    .map(|user| AuthenticatedUser(user.clone()))
                    .map_err(|target| Redirect::to(&target).into_response())
            }
        };

        async move { result }
    }
}
