// Blog entities - users, groups, posts, comments and follow edges

pub mod comment;
pub mod follow;
pub mod group;
pub mod post;
pub mod user;

pub use comment::Comment;
pub use follow::Follow;
pub use group::{Group, GroupSummary};
pub use post::Post;
pub use user::{User, UserSummary};

use chrono::{DateTime, Utc};

/// Current time in milliseconds since the Unix epoch
pub fn current_time_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Convert a stored millisecond timestamp back into a UTC datetime
pub fn datetime_from_millis(millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(millis).unwrap_or_default()
}
