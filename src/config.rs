use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub cache: CacheConfig,
    pub media: MediaConfig,
    pub auth: AuthConfig,
    pub seed_sample_data: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    /// Node component embedded in generated ids (0..1024)
    pub node_id: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub capacity: usize,
    /// Lifetime of a cached index page; zero disables the cache
    pub index_ttl_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    pub root: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub login_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite:data/blog.db".to_string(),
                node_id: 0,
            },
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            cache: CacheConfig {
                capacity: 1000,
                index_ttl_secs: 20,
            },
            media: MediaConfig {
                root: PathBuf::from("media"),
            },
            auth: AuthConfig {
                login_url: "/auth/login/".to_string(),
            },
            seed_sample_data: false,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();

        Ok(Self {
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").unwrap_or(defaults.database.url),
                node_id: parse_var("NODE_ID", defaults.database.node_id),
            },
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or(defaults.server.host),
                port: parse_var("SERVER_PORT", defaults.server.port),
            },
            cache: CacheConfig {
                capacity: parse_var("CACHE_CAPACITY", defaults.cache.capacity),
                index_ttl_secs: parse_var("INDEX_CACHE_TTL_SECS", defaults.cache.index_ttl_secs),
            },
            media: MediaConfig {
                root: env::var("MEDIA_ROOT")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.media.root),
            },
            auth: AuthConfig {
                login_url: env::var("LOGIN_URL").unwrap_or(defaults.auth.login_url),
            },
            seed_sample_data: parse_var("SEED_SAMPLE_DATA", defaults.seed_sample_data),
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn index_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.index_ttl_secs)
    }
}

// Unset or unparsable values fall back to the default
fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}
