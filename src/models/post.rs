use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{GroupSummary, UserSummary};

/// Number of characters a post shows when displayed as a label
pub const POST_LABEL_LENGTH: usize = 15;

/// A post joined with its author and (optional) group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    /// Path relative to the media root, e.g. `posts/small.gif`
    pub image: Option<String>,
    pub author: UserSummary,
    pub group: Option<GroupSummary>,
}

impl Post {
    pub fn is_authored_by(&self, user_id: i64) -> bool {
        self.author.id == user_id
    }
}

impl fmt::Display for Post {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label: String = self.text.chars().take(POST_LABEL_LENGTH).collect();
        write!(f, "{}", label)
    }
}
