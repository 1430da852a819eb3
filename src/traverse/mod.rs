//! Walking a series of linked posts and cutting them into chapters.
//!
//! A serial on a discussion site is a chain of posts whose bodies link to
//! each other ("Previous | First | Next"). Building a book from any post
//! in the chain happens in two passes:
//!
//! - [`locate_first`] walks backwards until it finds the first post, either
//!   through a direct "first" link or by following "previous" links.
//! - [`Chapters`] walks forward through "next" links, one post per pull,
//!   and yields each post together with the chapters cut out of it.
//!
//! Links are untrusted: both walks remember the posts they have seen and
//! stop when a link leads back into the chain.

mod enumerate;
mod locate;
mod segment;

pub use enumerate::Chapters;
pub use locate::{Located, Termination, locate_first};
pub use segment::{ChapterBreak, Framing, chapters_of, split_segments};

use crate::error::Result;
use crate::markup::{find_link, render_markdown};
use crate::post::Post;

/// Fetches posts by link.
///
/// Implemented by the discussion-service client; tests use an in-memory map.
pub trait PostSource {
    /// Fetch the post a link points to.
    fn resolve(&self, url: &str) -> Result<Post>;
}

impl<S: PostSource + ?Sized> PostSource for &S {
    fn resolve(&self, url: &str) -> Result<Post> {
        (**self).resolve(url)
    }
}

/// Case-insensitive substrings identifying navigation links by their text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkPatterns {
    pub first: String,
    pub previous: String,
    pub next: String,
}

impl Default for LinkPatterns {
    fn default() -> Self {
        Self {
            first: "First".to_string(),
            previous: "Previous".to_string(),
            next: "Next".to_string(),
        }
    }
}

/// Parameters for one traversal. Never changes once the walk starts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TraversalConfig {
    pub links: LinkPatterns,
    pub chapter_break: ChapterBreak,
    pub framing: Framing,
    /// Maximum number of posts to consume. `None` follows the chain to its end.
    pub max_posts: Option<usize>,
}

/// Render a post and look for a link whose text contains `pattern`.
pub(crate) fn link_in(post: &Post, pattern: &str) -> Option<String> {
    let link = find_link(&render_markdown(&post.body), pattern);
    tracing::debug!(post = %post.id, pattern, link = ?link, "link lookup");
    link
}
