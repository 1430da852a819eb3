//! Bot configuration.
//!
//! Read from a TOML file, either on disk or in a bucket (`s3://bucket/key`):
//!
//! ```toml
//! [reddit]
//! client_id = "..."
//! client_secret = "..."
//! username = "epubBot"
//! password = "..."
//!
//! [bot]
//! invocation = "u/epubBot"
//! poll_interval_secs = 60
//!
//! [storage]
//! kind = "s3"
//! bucket = "epub-bot-output"
//! region = "eu-central-1"
//! ```
//!
//! Secrets can be left out of the file and supplied through
//! `EPUBBOT_REDDIT_CLIENT_SECRET`, `EPUBBOT_REDDIT_PASSWORD`,
//! `AWS_ACCESS_KEY_ID` and `AWS_SECRET_ACCESS_KEY`.

use std::path::PathBuf;

use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::storage::{Credentials, LocalDirectory, Publisher, S3Bucket};

const DEFAULT_REGION: &str = "us-east-1";

#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    pub reddit: RedditConfig,
    #[serde(default)]
    pub bot: BotSettings,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedditConfig {
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    pub username: String,
    #[serde(default)]
    pub password: String,
    pub user_agent: Option<String>,
}

impl RedditConfig {
    pub fn user_agent(&self) -> String {
        self.user_agent.clone().unwrap_or_else(|| {
            format!(
                "linux:epubbot:{} (by /u/{})",
                env!("CARGO_PKG_VERSION"),
                self.username
            )
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BotSettings {
    /// First word of a comment that addresses the bot.
    pub invocation: String,
    pub poll_interval_secs: u64,
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            invocation: "u/epubBot".to_string(),
            poll_interval_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StorageConfig {
    S3 {
        bucket: String,
        #[serde(default = "default_region")]
        region: String,
        endpoint: Option<String>,
        access_key_id: Option<String>,
        secret_access_key: Option<String>,
        public_base_url: Option<String>,
    },
    Local {
        directory: PathBuf,
        public_base_url: Option<String>,
    },
}

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

impl StorageConfig {
    /// Build the publisher this section describes.
    pub fn publisher(&self) -> Result<Box<dyn Publisher>> {
        Ok(match self {
            StorageConfig::S3 {
                bucket,
                region,
                endpoint,
                access_key_id,
                secret_access_key,
                public_base_url,
            } => {
                let credentials = match (access_key_id, secret_access_key) {
                    (Some(id), Some(secret)) => Credentials {
                        access_key_id: id.clone(),
                        secret_access_key: secret.clone(),
                        session_token: None,
                    },
                    _ => Credentials::from_env()?,
                };
                Box::new(
                    S3Bucket::new(bucket, region, endpoint.clone(), credentials)?
                        .with_public_base_url(public_base_url.clone()),
                )
            }
            StorageConfig::Local {
                directory,
                public_base_url,
            } => Box::new(LocalDirectory::new(directory, public_base_url.clone())),
        })
    }
}

impl BotConfig {
    pub fn from_toml(text: &str) -> Result<Self> {
        let mut config: BotConfig = toml::from_str(text)?;
        config.apply_env(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load from a path or an `s3://bucket/key` URL.
    ///
    /// Bucket access uses credentials from the environment and the region
    /// in `AWS_REGION`.
    pub fn load(location: &str) -> Result<Self> {
        let text = match location.strip_prefix("s3://") {
            Some(rest) => {
                let (bucket, key) = rest
                    .split_once('/')
                    .ok_or_else(|| Error::Config(format!("no object key in {location}")))?;
                let region = std::env::var("AWS_REGION").unwrap_or_else(|_| default_region());
                let bucket = S3Bucket::new(bucket, region, None, Credentials::from_env()?)?;
                let bytes = bucket.get_object(key)?;
                String::from_utf8(bytes)
                    .map_err(|_| Error::Config(format!("{location} is not UTF-8")))?
            }
            None => std::fs::read_to_string(location)?,
        };
        debug!(location, "read config");
        Self::from_toml(&text)
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(secret) = var("EPUBBOT_REDDIT_CLIENT_SECRET") {
            self.reddit.client_secret = secret;
        }
        if let Some(password) = var("EPUBBOT_REDDIT_PASSWORD") {
            self.reddit.password = password;
        }
    }

    fn validate(&self) -> Result<()> {
        if self.reddit.client_secret.is_empty() {
            return Err(Error::Config("reddit.client_secret is missing".into()));
        }
        if self.reddit.password.is_empty() {
            return Err(Error::Config("reddit.password is missing".into()));
        }
        if self.bot.invocation.trim().is_empty() {
            return Err(Error::Config("bot.invocation must not be empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
        [reddit]
        client_id = "id"
        client_secret = "secret"
        username = "epubBot"
        password = "hunter2"

        [bot]
        invocation = "u/otherBot"

        [storage]
        kind = "s3"
        bucket = "books"
        endpoint = "http://localhost:9000"
    "#;

    #[test]
    fn test_parse_full_config() {
        let config = BotConfig::from_toml(FULL).unwrap();
        assert_eq!(config.reddit.username, "epubBot");
        assert_eq!(config.bot.invocation, "u/otherBot");
        assert_eq!(config.bot.poll_interval_secs, 60);
        match config.storage {
            StorageConfig::S3 { bucket, region, endpoint, .. } => {
                assert_eq!(bucket, "books");
                assert_eq!(region, "us-east-1");
                assert_eq!(endpoint.as_deref(), Some("http://localhost:9000"));
            }
            other => panic!("unexpected storage {other:?}"),
        }
        assert!(config.reddit.user_agent().contains("(by /u/epubBot)"));
    }

    #[test]
    fn test_secrets_from_environment() {
        let text = r#"
            [reddit]
            client_id = "id"
            username = "epubBot"

            [storage]
            kind = "local"
            directory = "/srv/books"
        "#;
        let mut config: BotConfig = toml::from_str(text).unwrap();
        assert!(config.validate().is_err());

        config.apply_env(|name| match name {
            "EPUBBOT_REDDIT_CLIENT_SECRET" => Some("s".to_string()),
            "EPUBBOT_REDDIT_PASSWORD" => Some("p".to_string()),
            _ => None,
        });
        assert!(config.validate().is_ok());
        assert_eq!(config.reddit.password, "p");
        assert!(matches!(config.storage, StorageConfig::Local { .. }));
    }

    #[test]
    fn test_unknown_storage_kind_is_rejected() {
        let text = FULL.replace(r#"kind = "s3""#, r#"kind = "ftp""#);
        assert!(matches!(BotConfig::from_toml(&text), Err(Error::Toml(_))));
    }
}
