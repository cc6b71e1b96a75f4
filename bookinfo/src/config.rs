//! Startup configuration, resolved once from the environment.

use std::net::SocketAddr;
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};

/// Which components this process serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    All,
    ProductPage,
    Details,
    Reviews,
    Ratings,
}

impl FromStr for Role {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "all" => Ok(Role::All),
            "productpage" => Ok(Role::ProductPage),
            "details" => Ok(Role::Details),
            "reviews" => Ok(Role::Reviews),
            "ratings" => Ok(Role::Ratings),
            other => Err(anyhow!("unknown BOOKINFO_ROLE {other:?}")),
        }
    }
}

/// Ratings behaviour selected by `SERVICE_VERSION`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingsMode {
    /// In-memory table with user overrides.
    Local,
    /// Reads from the configured database backend.
    Database,
    /// Flips between available and unavailable every 60 seconds.
    SimulateUnavailable,
    /// Flips health and availability every 15 minutes.
    SimulateUnhealthy,
}

impl FromStr for RatingsMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "" | "v1" | "default" => Ok(RatingsMode::Local),
            "v2" => Ok(RatingsMode::Database),
            "v-unavailable" => Ok(RatingsMode::SimulateUnavailable),
            "v-unhealthy" => Ok(RatingsMode::SimulateUnhealthy),
            other => Err(anyhow!("unknown SERVICE_VERSION {other:?}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseConfig {
    MySql {
        host: String,
        port: u16,
        user: String,
        password: String,
    },
    Mongo {
        url: String,
    },
}

impl DatabaseConfig {
    /// Connection string for the `ratingsdb` schema.
    pub fn mysql_url(&self) -> Option<String> {
        match self {
            DatabaseConfig::MySql {
                host,
                port,
                user,
                password,
            } => Some(format!("mysql://{user}:{password}@{host}:{port}/ratingsdb")),
            DatabaseConfig::Mongo { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RatingsConfig {
    pub mode: RatingsMode,
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewsConfig {
    pub ratings_enabled: bool,
    pub star_color: String,
    pub pod_name: String,
    pub cluster_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailsConfig {
    pub external_enabled: bool,
    pub external_url: String,
    pub isbn: String,
}

/// Base urls of components living in other processes. `None` means in-process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteConfig {
    pub details_url: Option<String>,
    pub reviews_url: Option<String>,
    pub ratings_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub role: Role,
    pub bind_addr: SocketAddr,
    pub ratings: RatingsConfig,
    pub reviews: ReviewsConfig,
    pub details: DetailsConfig,
    pub remote: RemoteConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves the configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let flag = |key: &str, default: bool| lookup(key).map(|v| v == "true").unwrap_or(default);
        let url = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let role = var("BOOKINFO_ROLE", "all").parse()?;
        let bind_addr = var("BIND_ADDR", "0.0.0.0:9080")
            .parse()
            .context("BIND_ADDR must be a socket address")?;

        let database = if var("DB_TYPE", "mongodb") == "mysql" {
            DatabaseConfig::MySql {
                host: var("MYSQL_DB_HOST", "localhost"),
                port: var("MYSQL_DB_PORT", "3306")
                    .parse()
                    .context("MYSQL_DB_PORT must be a port number")?,
                user: var("MYSQL_DB_USER", "root"),
                password: var("MYSQL_DB_PASSWORD", ""),
            }
        } else {
            DatabaseConfig::Mongo {
                url: var("MONGO_DB_URL", "mongodb://localhost:27017"),
            }
        };

        let pod_name = lookup("HOSTNAME").unwrap_or_else(|| {
            hostname::get()
                .ok()
                .and_then(|h| h.into_string().ok())
                .unwrap_or_else(|| "unknown".to_string())
        });

        Ok(Config {
            role,
            bind_addr,
            ratings: RatingsConfig {
                mode: var("SERVICE_VERSION", "v1").parse()?,
                database,
            },
            reviews: ReviewsConfig {
                ratings_enabled: flag("ENABLE_RATINGS", true),
                star_color: var("STAR_COLOR", "black"),
                pod_name,
                cluster_name: var("CLUSTER_NAME", "unknown"),
            },
            details: DetailsConfig {
                external_enabled: flag("ENABLE_EXTERNAL_BOOK_SERVICE", false),
                external_url: var("EXTERNAL_BOOK_SERVICE_URL", "https://www.googleapis.com"),
                isbn: var("EXTERNAL_BOOK_ISBN", "0486424618"),
            },
            remote: RemoteConfig {
                details_url: url("DETAILS_URL"),
                reviews_url: url("REVIEWS_URL"),
                ratings_url: url("RATINGS_URL"),
            },
        })
    }
}
