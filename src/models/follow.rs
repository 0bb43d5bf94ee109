use serde::{Deserialize, Serialize};
use std::fmt;

use super::UserSummary;

/// Directed edge: `user` wants `author`'s posts in their feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Follow {
    pub user: UserSummary,
    pub author: UserSummary,
}

impl fmt::Display for Follow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.user.username, self.author.username)
    }
}
