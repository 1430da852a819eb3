//! Where finished books go.

mod s3;

pub use s3::{Credentials, S3Bucket};

use std::fs;
use std::path::PathBuf;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use tracing::info;

use crate::error::Result;

/// Stores a finished book and says where readers can fetch it.
pub trait Publisher {
    /// Store `bytes` under `key` and return the URL to hand out.
    fn publish(&self, key: &str, bytes: &[u8]) -> Result<String>;
}

impl<P: Publisher + ?Sized> Publisher for Box<P> {
    fn publish(&self, key: &str, bytes: &[u8]) -> Result<String> {
        (**self).publish(key, bytes)
    }
}

/// Publishes into a local directory, e.g. one served by a web server.
#[derive(Debug, Clone)]
pub struct LocalDirectory {
    root: PathBuf,
    public_base_url: Option<String>,
}

impl LocalDirectory {
    pub fn new(root: impl Into<PathBuf>, public_base_url: Option<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.map(|u| u.trim_end_matches('/').to_string()),
        }
    }
}

impl Publisher for LocalDirectory {
    fn publish(&self, key: &str, bytes: &[u8]) -> Result<String> {
        fs::create_dir_all(&self.root)?;
        let path = self.root.join(key);
        fs::write(&path, bytes)?;
        info!(path = %path.display(), "stored book");

        Ok(match &self.public_base_url {
            Some(base) => format!("{base}/{}", encode_key(key)),
            None => format!("file://{}", path.display()),
        })
    }
}

/// Characters left alone when encoding a key: RFC 3986 unreserved.
const KEY_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Percent-encode a key for use in a URL path, keeping `/` separators.
pub(crate) fn encode_key(key: &str) -> String {
    key.split('/')
        .map(|segment| utf8_percent_encode(segment, KEY_SEGMENT).to_string())
        .collect::<Vec<_>>()
        .join("/")
}

/// Object key for a book title: `<title>.epub` with path separators and
/// control or shell-hostile characters replaced.
pub fn object_key(title: &str) -> String {
    let cleaned: String = title
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "book.epub".to_string()
    } else {
        format!("{cleaned}.epub")
    }
}
