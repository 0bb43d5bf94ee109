// Blog platform - posts, groups, comments and follow feeds over HTTP

pub mod app_state;
pub mod blog_interface;
pub mod config;
pub mod data_seeder;
pub mod error;
pub mod framework;
pub mod handlers;
pub mod infrastructure;
pub mod models;

// Re-exports for convenience
pub use error::{AppError, AppResult};
