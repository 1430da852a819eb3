//! Error types for epubbot operations.

use thiserror::Error;

/// Errors that can occur while fetching posts, building books or publishing them.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Config(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("temporary failure: {0}")]
    Transient(String),

    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("unsupported link: {0}")]
    UnsupportedLink(String),

    #[error("failed to resolve link {url}: {source}")]
    LinkResolution {
        url: String,
        #[source]
        source: Box<Error>,
    },

    #[error("invalid command: {0}")]
    InvalidCommand(String),

    #[error("chapter break must not be empty")]
    InvalidChapterBreak,

    #[error("book has no chapters")]
    EmptyBook,

    #[error("upload failed: {0}")]
    Upload(String),
}

impl Error {
    /// Whether retrying the same operation later might succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Transient(_) => true,
            Error::Http(e) => e.is_timeout() || e.is_connect(),
            Error::LinkResolution { source, .. } => source.is_transient(),
            _ => false,
        }
    }

    /// Wrap a failure that happened while following `url`.
    pub(crate) fn link(url: &str, source: Error) -> Self {
        Error::LinkResolution {
            url: url.to_string(),
            source: Box::new(source),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
