// Database Interface - relational storage seam for the blog entities
// Handlers only see this trait; SqliteStore is the production implementation

use async_trait::async_trait;

use crate::error::AppResult;
use crate::models::{Comment, Follow, Group, Post, User};

/// Which posts a listing covers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostFilter {
    All,
    Group(i64),
    Author(i64),
    /// Posts by every author the given user follows
    FollowedBy(i64),
}

/// Fields of a post about to be created
#[derive(Debug, Clone)]
pub struct NewPost {
    pub author_id: i64,
    pub text: String,
    pub group_id: Option<i64>,
    pub image: Option<String>,
}

/// Replacement values for an edited post. `image: None` keeps the current image.
#[derive(Debug, Clone)]
pub struct PostChanges {
    pub text: String,
    pub group_id: Option<i64>,
    pub image: Option<String>,
}

#[async_trait]
pub trait BlogStore: Send + Sync {
    // Users and sessions
    async fn create_user(&self, username: &str) -> AppResult<User>;
    async fn user_by_username(&self, username: &str) -> AppResult<Option<User>>;
    /// Issue an opaque session token for the user
    async fn create_session(&self, user_id: i64) -> AppResult<String>;
    async fn user_for_session(&self, token: &str) -> AppResult<Option<User>>;

    // Groups
    async fn create_group(&self, title: &str, slug: &str, description: &str) -> AppResult<Group>;
    async fn group_by_slug(&self, slug: &str) -> AppResult<Option<Group>>;
    async fn group_by_id(&self, id: i64) -> AppResult<Option<Group>>;
    async fn list_groups(&self) -> AppResult<Vec<Group>>;
    /// Posts of a deleted group lose their group reference
    async fn delete_group(&self, id: i64) -> AppResult<bool>;

    // Posts, newest first
    async fn create_post(&self, post: NewPost) -> AppResult<Post>;
    async fn update_post(&self, id: i64, changes: PostChanges) -> AppResult<Post>;
    async fn post_by_id(&self, id: i64) -> AppResult<Option<Post>>;
    async fn delete_post(&self, id: i64) -> AppResult<bool>;
    async fn count_posts(&self, filter: PostFilter) -> AppResult<u64>;
    async fn list_posts(&self, filter: PostFilter, offset: u64, limit: u64) -> AppResult<Vec<Post>>;

    // Comments, oldest first
    async fn create_comment(&self, post_id: i64, author_id: i64, text: &str) -> AppResult<Comment>;
    async fn comments_for_post(&self, post_id: i64) -> AppResult<Vec<Comment>>;

    // Follow edges
    async fn follow_exists(&self, user_id: i64, author_id: i64) -> AppResult<bool>;
    /// Returns false when the edge already existed
    async fn create_follow(&self, user_id: i64, author_id: i64) -> AppResult<bool>;
    /// Returns the number of removed edges
    async fn delete_follow(&self, user_id: i64, author_id: i64) -> AppResult<u64>;
    async fn follows_of(&self, user_id: i64) -> AppResult<Vec<Follow>>;
    async fn count_follows(&self) -> AppResult<u64>;
}
