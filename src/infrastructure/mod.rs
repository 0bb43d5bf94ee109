// Core infrastructure modules
pub mod cache_layer;           // TTL page cache for listings
pub mod database;              // Storage trait and query types
pub mod id_generator;          // Time-ordered id generation
pub mod media;                 // Uploaded image verification and storage
pub mod middleware;            // ViewerContext middleware and extractor
pub mod sqlite_database;       // SQLite implementation of the storage trait
pub mod viewer;                // Viewer context

pub use cache_layer::{CacheEntry, PageCache};
pub use database::{BlogStore, NewPost, PostChanges, PostFilter};
pub use id_generator::IdGenerator;
pub use media::MediaStore;
pub use sqlite_database::SqliteStore;
pub use viewer::ViewerContext;
