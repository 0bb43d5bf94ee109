use crate::models::User;

/// Who is making the current request
#[derive(Debug, Clone)]
pub struct ViewerContext {
    pub request_id: String,
    user: Option<User>,
}

impl ViewerContext {
    pub fn anonymous(request_id: String) -> Self {
        ViewerContext {
            request_id,
            user: None,
        }
    }

    pub fn authenticated(user: User, request_id: String) -> Self {
        ViewerContext {
            request_id,
            user: Some(user),
        }
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn user_id(&self) -> Option<i64> {
        self.user.as_ref().map(|user| user.id)
    }

    /// True when the viewer is the given user
    pub fn is(&self, user_id: i64) -> bool {
        self.user_id() == Some(user_id)
    }
}
