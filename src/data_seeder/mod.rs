// Sample data - a small, browsable blog for local development

use tracing::{info, warn};

use crate::{
    error::{AppError, AppResult},
    infrastructure::database::{BlogStore, NewPost},
};

/// What a seeding run created
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub users: usize,
    pub groups: usize,
    pub posts: usize,
    pub follows: usize,
    /// (username, session token) for every demo user
    pub sessions: Vec<(String, String)>,
}

const USERS: &[&str] = &["leo", "anna", "boris"];

const GROUPS: &[(&str, &str, &str)] = &[
    ("Cats", "cats", "Everything about cats"),
    ("Travel", "travel", "Notes from the road"),
];

// (author, group slug, text)
const POSTS: &[(&str, Option<&str>, &str)] = &[
    ("leo", Some("cats"), "My cat learned to open the fridge today."),
    ("leo", None, "First post on the new platform."),
    ("anna", Some("travel"), "Three days in the mountains without a phone."),
    ("anna", Some("cats"), "Adopted a second cat, they are already friends."),
    ("boris", None, "Reading list for the winter."),
    ("boris", Some("travel"), "Night trains are underrated."),
];

// (follower, author)
const FOLLOWS: &[(&str, &str)] = &[("anna", "leo"), ("boris", "anna")];

/// Seed users, groups, posts and follows. Safe to run once per database:
/// a second run fails on the first duplicate username.
pub async fn seed_sample_data(store: &dyn BlogStore) -> AppResult<SeedSummary> {
    info!("Seeding sample data");
    let mut summary = SeedSummary::default();

    let mut users = Vec::with_capacity(USERS.len());
    for username in USERS {
        let user = store.create_user(username).await?;
        let token = store.create_session(user.id).await?;
        info!("Demo user {} signs in with session token {}", user.username, token);
        summary.sessions.push((user.username.clone(), token));
        users.push(user);
    }
    summary.users = users.len();

    let mut groups = Vec::with_capacity(GROUPS.len());
    for (title, slug, description) in GROUPS {
        groups.push(store.create_group(title, slug, description).await?);
    }
    summary.groups = groups.len();

    let user_id = |username: &str| {
        users
            .iter()
            .find(|user| user.username == username)
            .map(|user| user.id)
            .ok_or_else(|| AppError::Internal(format!("Unknown demo user {}", username)))
    };

    for (author, slug, text) in POSTS {
        let group_id = slug.and_then(|slug| groups.iter().find(|g| g.slug == slug).map(|g| g.id));
        store
            .create_post(NewPost {
                author_id: user_id(*author)?,
                text: text.to_string(),
                group_id,
                image: None,
            })
            .await?;
        summary.posts += 1;
    }

    for (follower, author) in FOLLOWS {
        if store.create_follow(user_id(*follower)?, user_id(*author)?).await? {
            summary.follows += 1;
        } else {
            warn!("{} already followed {}", follower, author);
        }
    }

    info!(
        users = summary.users,
        groups = summary.groups,
        posts = summary.posts,
        follows = summary.follows,
        "Sample data seeded"
    );
    Ok(summary)
}
