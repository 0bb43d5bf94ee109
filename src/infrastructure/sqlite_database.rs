use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite};
use std::str::FromStr;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::framework::forms::{is_valid_slug, is_valid_username};
use crate::infrastructure::database::{BlogStore, NewPost, PostChanges, PostFilter};
use crate::infrastructure::id_generator::IdGenerator;
use crate::models::{
    current_time_millis, datetime_from_millis, Comment, Follow, Group, GroupSummary, Post, User,
    UserSummary,
};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY,
        username TEXT NOT NULL UNIQUE,
        created_at INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS sessions (
        token TEXT PRIMARY KEY,
        user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        created_at INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS post_groups (
        id INTEGER PRIMARY KEY,
        title TEXT NOT NULL,
        slug TEXT NOT NULL UNIQUE,
        description TEXT NOT NULL DEFAULT ''
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS posts (
        id INTEGER PRIMARY KEY,
        text TEXT NOT NULL,
        pub_date INTEGER NOT NULL,
        image TEXT,
        author_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        group_id INTEGER REFERENCES post_groups(id) ON DELETE SET NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS comments (
        id INTEGER PRIMARY KEY,
        post_id INTEGER NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
        author_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        text TEXT NOT NULL,
        created INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS follows (
        user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        author_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        created_at INTEGER NOT NULL,
        PRIMARY KEY (user_id, author_id),
        CHECK (user_id <> author_id)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_posts_pub_date ON posts(pub_date DESC, id DESC)",
    "CREATE INDEX IF NOT EXISTS idx_posts_author ON posts(author_id, pub_date DESC)",
    "CREATE INDEX IF NOT EXISTS idx_posts_group ON posts(group_id, pub_date DESC)",
    "CREATE INDEX IF NOT EXISTS idx_comments_post ON comments(post_id, created)",
    "CREATE INDEX IF NOT EXISTS idx_follows_author ON follows(author_id)",
];

const POST_COLUMNS: &str = r#"
    SELECT p.id, p.text, p.pub_date, p.image,
           p.author_id, u.username AS author_username,
           p.group_id, g.slug AS group_slug, g.title AS group_title
    FROM posts p
    JOIN users u ON u.id = p.author_id
    LEFT JOIN post_groups g ON g.id = p.group_id
"#;

const COMMENT_COLUMNS: &str = r#"
    SELECT c.id, c.post_id, c.text, c.created, c.author_id, u.username AS author_username
    FROM comments c
    JOIN users u ON u.id = c.author_id
"#;

/// SQLite implementation of the blog store
pub struct SqliteStore {
    pool: SqlitePool,
    ids: IdGenerator,
}

impl SqliteStore {
    /// Open (creating if missing) the database at `url`, e.g. `sqlite:data/blog.db`
    pub async fn connect(url: &str, node_id: u16) -> AppResult<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| AppError::ConfigurationError(format!("Invalid database url {}: {}", url, e)))?
            .create_if_missing(true)
            .foreign_keys(true);

        let filename = options.clone().get_filename();
        if let Some(parent) = filename.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    AppError::ConfigurationError(format!(
                        "Failed to create database directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to connect to {}: {}", url, e)))?;

        let store = Self {
            pool,
            ids: IdGenerator::new(node_id)?,
        };
        store.initialize().await?;
        info!(node_id = store.ids.node_id(), "Connected to database {}", url);
        Ok(store)
    }

    /// Private in-memory database, used by tests and demos
    pub async fn new_in_memory() -> AppResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| AppError::ConfigurationError(format!("Invalid in-memory url: {}", e)))?
            .foreign_keys(true);

        // A single connection that never expires keeps the memory database alive
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to connect to in-memory SQLite: {}", e))
            })?;

        let store = Self {
            pool,
            ids: IdGenerator::new(0)?,
        };
        store.initialize().await?;
        Ok(store)
    }

    /// Create the blog tables and indexes
    pub async fn initialize(&self) -> AppResult<()> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| AppError::DatabaseError(format!("Failed to initialize schema: {}", e)))?;
        }
        Ok(())
    }
}

fn push_filter(qb: &mut QueryBuilder<'_, Sqlite>, filter: PostFilter) {
    match filter {
        PostFilter::All => {}
        PostFilter::Group(group_id) => {
            qb.push(" WHERE p.group_id = ");
            qb.push_bind(group_id);
        }
        PostFilter::Author(author_id) => {
            qb.push(" WHERE p.author_id = ");
            qb.push_bind(author_id);
        }
        PostFilter::FollowedBy(user_id) => {
            qb.push(" WHERE p.author_id IN (SELECT author_id FROM follows WHERE user_id = ");
            qb.push_bind(user_id);
            qb.push(")");
        }
    }
}

fn user_from_row(row: &SqliteRow) -> Result<User, sqlx::Error> {
    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        created_at: datetime_from_millis(row.try_get("created_at")?),
    })
}

fn group_from_row(row: &SqliteRow) -> Result<Group, sqlx::Error> {
    Ok(Group {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        slug: row.try_get("slug")?,
        description: row.try_get("description")?,
    })
}

fn post_from_row(row: &SqliteRow) -> Result<Post, sqlx::Error> {
    let group_id: Option<i64> = row.try_get("group_id")?;
    let group = match group_id {
        Some(id) => Some(GroupSummary {
            id,
            slug: row.try_get("group_slug")?,
            title: row.try_get("group_title")?,
        }),
        None => None,
    };

    Ok(Post {
        id: row.try_get("id")?,
        text: row.try_get("text")?,
        pub_date: datetime_from_millis(row.try_get("pub_date")?),
        image: row.try_get("image")?,
        author: UserSummary {
            id: row.try_get("author_id")?,
            username: row.try_get("author_username")?,
        },
        group,
    })
}

fn comment_from_row(row: &SqliteRow) -> Result<Comment, sqlx::Error> {
    Ok(Comment {
        id: row.try_get("id")?,
        post_id: row.try_get("post_id")?,
        text: row.try_get("text")?,
        created: datetime_from_millis(row.try_get("created")?),
        author: UserSummary {
            id: row.try_get("author_id")?,
            username: row.try_get("author_username")?,
        },
    })
}

fn decode_error(what: &str, e: sqlx::Error) -> AppError {
    AppError::DatabaseError(format!("Failed to decode {}: {}", what, e))
}

#[async_trait]
impl BlogStore for SqliteStore {
    #[instrument(skip(self))]
    async fn create_user(&self, username: &str) -> AppResult<User> {
        if !is_valid_username(username) {
            return Err(AppError::BadRequest(format!("Invalid username: {:?}", username)));
        }

        let id = self.ids.next_id();
        let now = current_time_millis();
        sqlx::query("INSERT INTO users (id, username, created_at) VALUES (?, ?, ?)")
            .bind(id)
            .bind(username)
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to create user {}: {}", username, e)))?;

        Ok(User {
            id,
            username: username.to_string(),
            created_at: datetime_from_millis(now),
        })
    }

    async fn user_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let row = sqlx::query("SELECT id, username, created_at FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to get user {}: {}", username, e)))?;

        row.map(|row| user_from_row(&row))
            .transpose()
            .map_err(|e| decode_error("user", e))
    }

    #[instrument(skip(self))]
    async fn create_session(&self, user_id: i64) -> AppResult<String> {
        let token = Uuid::new_v4().simple().to_string();
        sqlx::query("INSERT INTO sessions (token, user_id, created_at) VALUES (?, ?, ?)")
            .bind(&token)
            .bind(user_id)
            .bind(current_time_millis())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to create session for user {}: {}", user_id, e))
            })?;
        Ok(token)
    }

    async fn user_for_session(&self, token: &str) -> AppResult<Option<User>> {
        let row = sqlx::query(
            "SELECT u.id, u.username, u.created_at FROM sessions s JOIN users u ON u.id = s.user_id WHERE s.token = ?",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to resolve session: {}", e)))?;

        row.map(|row| user_from_row(&row))
            .transpose()
            .map_err(|e| decode_error("session user", e))
    }

    #[instrument(skip(self, description))]
    async fn create_group(&self, title: &str, slug: &str, description: &str) -> AppResult<Group> {
        if !is_valid_slug(slug) {
            return Err(AppError::BadRequest(format!("Invalid group slug: {:?}", slug)));
        }

        let id = self.ids.next_id();
        sqlx::query("INSERT INTO post_groups (id, title, slug, description) VALUES (?, ?, ?, ?)")
            .bind(id)
            .bind(title)
            .bind(slug)
            .bind(description)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to create group {}: {}", slug, e)))?;

        Ok(Group {
            id,
            title: title.to_string(),
            slug: slug.to_string(),
            description: description.to_string(),
        })
    }

    async fn group_by_slug(&self, slug: &str) -> AppResult<Option<Group>> {
        let row = sqlx::query("SELECT id, title, slug, description FROM post_groups WHERE slug = ?")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to get group {}: {}", slug, e)))?;

        row.map(|row| group_from_row(&row))
            .transpose()
            .map_err(|e| decode_error("group", e))
    }

    async fn group_by_id(&self, id: i64) -> AppResult<Option<Group>> {
        let row = sqlx::query("SELECT id, title, slug, description FROM post_groups WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to get group {}: {}", id, e)))?;

        row.map(|row| group_from_row(&row))
            .transpose()
            .map_err(|e| decode_error("group", e))
    }

    async fn list_groups(&self) -> AppResult<Vec<Group>> {
        let rows = sqlx::query("SELECT id, title, slug, description FROM post_groups ORDER BY title, id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to list groups: {}", e)))?;

        rows.iter()
            .map(group_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| decode_error("group", e))
    }

    #[instrument(skip(self))]
    async fn delete_group(&self, id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM post_groups WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to delete group {}: {}", id, e)))?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, post), fields(author_id = post.author_id))]
    async fn create_post(&self, post: NewPost) -> AppResult<Post> {
        let id = self.ids.next_id();
        sqlx::query(
            "INSERT INTO posts (id, text, pub_date, image, author_id, group_id) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(&post.text)
        .bind(current_time_millis())
        .bind(&post.image)
        .bind(post.author_id)
        .bind(post.group_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to create post: {}", e)))?;

        debug!("Created post {}", id);
        self.post_by_id(id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("Post {} vanished after insert", id)))
    }

    #[instrument(skip(self, changes))]
    async fn update_post(&self, id: i64, changes: PostChanges) -> AppResult<Post> {
        let result = sqlx::query(
            "UPDATE posts SET text = ?, group_id = ?, image = COALESCE(?, image) WHERE id = ?",
        )
        .bind(&changes.text)
        .bind(changes.group_id)
        .bind(&changes.image)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to update post {}: {}", id, e)))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Post {} not found", id)));
        }

        self.post_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Post {} not found", id)))
    }

    async fn post_by_id(&self, id: i64) -> AppResult<Option<Post>> {
        let mut qb = QueryBuilder::<Sqlite>::new(POST_COLUMNS);
        qb.push(" WHERE p.id = ");
        qb.push_bind(id);

        let row = qb
            .build()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to get post {}: {}", id, e)))?;

        row.map(|row| post_from_row(&row))
            .transpose()
            .map_err(|e| decode_error("post", e))
    }

    #[instrument(skip(self))]
    async fn delete_post(&self, id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to delete post {}: {}", id, e)))?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_posts(&self, filter: PostFilter) -> AppResult<u64> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM posts p");
        push_filter(&mut qb, filter);

        let count: i64 = qb
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to count posts ({:?}): {}", filter, e)))?;
        Ok(count.max(0) as u64)
    }

    #[instrument(skip(self))]
    async fn list_posts(&self, filter: PostFilter, offset: u64, limit: u64) -> AppResult<Vec<Post>> {
        let mut qb = QueryBuilder::<Sqlite>::new(POST_COLUMNS);
        push_filter(&mut qb, filter);
        qb.push(" ORDER BY p.pub_date DESC, p.id DESC LIMIT ");
        qb.push_bind(limit as i64);
        qb.push(" OFFSET ");
        qb.push_bind(offset as i64);

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to list posts ({:?}): {}", filter, e)))?;

        rows.iter()
            .map(post_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| decode_error("post", e))
    }

    #[instrument(skip(self, text))]
    async fn create_comment(&self, post_id: i64, author_id: i64, text: &str) -> AppResult<Comment> {
        let id = self.ids.next_id();
        let now = current_time_millis();
        sqlx::query("INSERT INTO comments (id, post_id, author_id, text, created) VALUES (?, ?, ?, ?, ?)")
            .bind(id)
            .bind(post_id)
            .bind(author_id)
            .bind(text)
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to create comment on post {}: {}", post_id, e))
            })?;

        let mut qb = QueryBuilder::<Sqlite>::new(COMMENT_COLUMNS);
        qb.push(" WHERE c.id = ");
        qb.push_bind(id);
        let row = qb
            .build()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to reload comment {}: {}", id, e)))?;

        comment_from_row(&row).map_err(|e| decode_error("comment", e))
    }

    async fn comments_for_post(&self, post_id: i64) -> AppResult<Vec<Comment>> {
        let mut qb = QueryBuilder::<Sqlite>::new(COMMENT_COLUMNS);
        qb.push(" WHERE c.post_id = ");
        qb.push_bind(post_id);
        qb.push(" ORDER BY c.created, c.id");

        let rows = qb.build().fetch_all(&self.pool).await.map_err(|e| {
            AppError::DatabaseError(format!("Failed to get comments for post {}: {}", post_id, e))
        })?;

        rows.iter()
            .map(comment_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| decode_error("comment", e))
    }

    async fn follow_exists(&self, user_id: i64, author_id: i64) -> AppResult<bool> {
        let row = sqlx::query("SELECT 1 FROM follows WHERE user_id = ? AND author_id = ?")
            .bind(user_id)
            .bind(author_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!(
                    "Failed to check follow {} -> {}: {}",
                    user_id, author_id, e
                ))
            })?;
        Ok(row.is_some())
    }

    #[instrument(skip(self))]
    async fn create_follow(&self, user_id: i64, author_id: i64) -> AppResult<bool> {
        // The primary key and CHECK constraint turn duplicates and self-follows into no-ops
        let result = sqlx::query(
            "INSERT OR IGNORE INTO follows (user_id, author_id, created_at) VALUES (?, ?, ?)",
        )
        .bind(user_id)
        .bind(author_id)
        .bind(current_time_millis())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(format!(
                "Failed to create follow {} -> {}: {}",
                user_id, author_id, e
            ))
        })?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self))]
    async fn delete_follow(&self, user_id: i64, author_id: i64) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM follows WHERE user_id = ? AND author_id = ?")
            .bind(user_id)
            .bind(author_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!(
                    "Failed to delete follow {} -> {}: {}",
                    user_id, author_id, e
                ))
            })?;
        Ok(result.rows_affected())
    }

    async fn follows_of(&self, user_id: i64) -> AppResult<Vec<Follow>> {
        let rows = sqlx::query(
            r#"
            SELECT f.user_id, fu.username AS user_username, f.author_id, au.username AS author_username
            FROM follows f
            JOIN users fu ON fu.id = f.user_id
            JOIN users au ON au.id = f.author_id
            WHERE f.user_id = ?
            ORDER BY f.created_at, au.username
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to list follows of {}: {}", user_id, e)))?;

        rows.iter()
            .map(|row| -> Result<Follow, sqlx::Error> {
                Ok(Follow {
                    user: UserSummary {
                        id: row.try_get("user_id")?,
                        username: row.try_get("user_username")?,
                    },
                    author: UserSummary {
                        id: row.try_get("author_id")?,
                        username: row.try_get("author_username")?,
                    },
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| decode_error("follow", e))
    }

    async fn count_follows(&self) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM follows")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to count follows: {}", e)))?;
        Ok(count.max(0) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store_with_author() -> (SqliteStore, User) {
        let store = SqliteStore::new_in_memory().await.unwrap();
        let author = store.create_user("PostAuthor").await.unwrap();
        (store, author)
    }

    fn new_post(author_id: i64, text: &str, group_id: Option<i64>) -> NewPost {
        NewPost {
            author_id,
            text: text.to_string(),
            group_id,
            image: None,
        }
    }

    #[tokio::test]
    async fn test_connect_creates_and_reopens_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("blog.db");
        let url = format!("sqlite:{}", path.display());

        let store = SqliteStore::connect(&url, 3).await.unwrap();
        let author = store.create_user("PostAuthor").await.unwrap();
        store.pool.close().await;
        assert!(path.exists());

        let reopened = SqliteStore::connect(&url, 3).await.unwrap();
        let found = reopened.user_by_username("PostAuthor").await.unwrap().unwrap();
        assert_eq!(found.id, author.id);
    }

    #[tokio::test]
    async fn test_posts_listed_newest_first() {
        let (store, author) = store_with_author().await;
        for i in 0..3 {
            store.create_post(new_post(author.id, &format!("post {}", i), None)).await.unwrap();
        }

        let posts = store.list_posts(PostFilter::All, 0, 10).await.unwrap();
        let texts: Vec<_> = posts.iter().map(|p| p.text.as_str()).collect();
        assert_eq!(texts, vec!["post 2", "post 1", "post 0"]);
        assert_eq!(store.count_posts(PostFilter::Author(author.id)).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_deleting_group_keeps_posts() {
        let (store, author) = store_with_author().await;
        let group = store.create_group("Test title", "test_slug", "").await.unwrap();
        let post = store
            .create_post(new_post(author.id, "grouped", Some(group.id)))
            .await
            .unwrap();
        assert_eq!(post.group.as_ref().map(|g| g.slug.as_str()), Some("test_slug"));

        assert!(store.delete_group(group.id).await.unwrap());

        let post = store.post_by_id(post.id).await.unwrap().unwrap();
        assert!(post.group.is_none());
        assert_eq!(store.count_posts(PostFilter::All).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_update_keeps_image_when_none_given() {
        let (store, author) = store_with_author().await;
        let mut draft = new_post(author.id, "with image", None);
        draft.image = Some("posts/small.gif".to_string());
        let post = store.create_post(draft).await.unwrap();

        let updated = store
            .update_post(
                post.id,
                PostChanges {
                    text: "edited".to_string(),
                    group_id: None,
                    image: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.text, "edited");
        assert_eq!(updated.image.as_deref(), Some("posts/small.gif"));
    }

    #[tokio::test]
    async fn test_update_missing_post_is_not_found() {
        let (store, _) = store_with_author().await;
        let result = store
            .update_post(
                42,
                PostChanges {
                    text: "nothing".to_string(),
                    group_id: None,
                    image: None,
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_follow_edges_are_unique_and_never_reflexive() {
        let (store, author) = store_with_author().await;
        let reader = store.create_user("Reader").await.unwrap();

        assert!(store.create_follow(reader.id, author.id).await.unwrap());
        assert!(!store.create_follow(reader.id, author.id).await.unwrap());
        assert!(!store.create_follow(reader.id, reader.id).await.unwrap());
        assert_eq!(store.count_follows().await.unwrap(), 1);

        let follows = store.follows_of(reader.id).await.unwrap();
        assert_eq!(follows.len(), 1);
        assert_eq!(follows[0].to_string(), "Reader -> PostAuthor");

        assert_eq!(store.delete_follow(reader.id, author.id).await.unwrap(), 1);
        assert_eq!(store.delete_follow(reader.id, author.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_followed_by_filter() {
        let (store, author) = store_with_author().await;
        let reader = store.create_user("Reader").await.unwrap();
        let stranger = store.create_user("Stranger").await.unwrap();
        store.create_post(new_post(author.id, "followed", None)).await.unwrap();
        store.create_post(new_post(stranger.id, "unfollowed", None)).await.unwrap();
        store.create_follow(reader.id, author.id).await.unwrap();

        let feed = store.list_posts(PostFilter::FollowedBy(reader.id), 0, 10).await.unwrap();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].text, "followed");
        assert_eq!(store.count_posts(PostFilter::FollowedBy(stranger.id)).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_comments_in_creation_order() {
        let (store, author) = store_with_author().await;
        let post = store.create_post(new_post(author.id, "post", None)).await.unwrap();
        store.create_comment(post.id, author.id, "first").await.unwrap();
        store.create_comment(post.id, author.id, "second").await.unwrap();

        let comments = store.comments_for_post(post.id).await.unwrap();
        let texts: Vec<_> = comments.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second"]);
        assert_eq!(comments[0].author.username, "PostAuthor");
    }

    #[tokio::test]
    async fn test_sessions_resolve_to_users() {
        let (store, author) = store_with_author().await;
        let token = store.create_session(author.id).await.unwrap();

        let user = store.user_for_session(&token).await.unwrap().unwrap();
        assert_eq!(user.username, "PostAuthor");
        assert!(store.user_for_session("bogus").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rejects_invalid_username_and_slug() {
        let (store, _) = store_with_author().await;
        assert!(matches!(store.create_user("has space").await, Err(AppError::BadRequest(_))));
        assert!(matches!(
            store.create_group("Bad", "bad/slug", "").await,
            Err(AppError::BadRequest(_))
        ));
    }
}
