// Privacy - authorization predicates evaluated before any mutation
//
// Denials are not errors: callers turn them into redirects to a safe view
// (the login page, or the post the viewer may only read).

use crate::framework::routes;
use crate::infrastructure::viewer::ViewerContext;
use crate::models::{Post, User};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authorization {
    Allowed,
    DeniedRedirect(String),
}

/// The signed-in user, or the login URL that returns the viewer to `next`
pub fn require_authenticated<'a>(
    viewer: &'a ViewerContext,
    login_url: &str,
    next: &str,
) -> Result<&'a User, String> {
    viewer.user().ok_or_else(|| routes::login(login_url, next))
}

/// Only the author may edit a post; everyone else lands on its detail page
pub fn authorize_post_edit(user: &User, post: &Post) -> Authorization {
    if post.is_authored_by(user.id) {
        Authorization::Allowed
    } else {
        Authorization::DeniedRedirect(routes::post_detail(post.id))
    }
}

/// A follow edge may only point at somebody else
pub fn can_follow(user: &User, author: &User) -> bool {
    user.id != author.id
}
