//! Forward walk over a series, one post per pull.

use std::collections::HashSet;

use tracing::{info, warn};

use super::{PostSource, TraversalConfig, chapters_of, link_in};
use crate::error::{Error, Result};
use crate::post::{Chapter, Post};

enum Cursor {
    /// Post already in hand (the first one).
    Ready(Post),
    /// Link to the next post, resolved only when asked for.
    Link(String),
    Done,
}

/// Lazy sequence of `(post, chapters)` pairs following "next" links.
///
/// Each call to [`Iterator::next`] fetches at most one post. The walk ends
/// when a post has no "next" link, when the post cap is reached, or when a
/// link leads back to a post already yielded. A failed fetch is yielded
/// once as an error, after which the sequence is exhausted.
///
/// ```
/// use epubbot::traverse::{Chapters, PostSource, TraversalConfig};
/// use epubbot::{Post, Result, Error};
///
/// struct Offline;
/// impl PostSource for Offline {
///     fn resolve(&self, url: &str) -> Result<Post> {
///         Err(Error::NotFound(url.to_string()))
///     }
/// }
///
/// let post = Post::new("a", "Only Part", "Intro\n---\nStory\n---\nOutro");
/// let config = TraversalConfig::default();
/// let all: Vec<_> = Chapters::new(&Offline, post, &config).collect::<Result<_>>().unwrap();
/// assert_eq!(all.len(), 1);
/// assert_eq!(all[0].1[0].title, "Only Part");
/// ```
pub struct Chapters<'a, S> {
    source: &'a S,
    config: &'a TraversalConfig,
    cursor: Cursor,
    visited: HashSet<String>,
    consumed: usize,
}

impl<'a, S: PostSource> Chapters<'a, S> {
    pub fn new(source: &'a S, first: Post, config: &'a TraversalConfig) -> Self {
        Self {
            source,
            config,
            cursor: Cursor::Ready(first),
            visited: HashSet::new(),
            consumed: 0,
        }
    }

    /// Number of posts consumed so far.
    pub fn posts_consumed(&self) -> usize {
        self.consumed
    }

    fn fetch(&mut self) -> Option<Result<Post>> {
        match std::mem::replace(&mut self.cursor, Cursor::Done) {
            Cursor::Ready(post) => Some(Ok(post)),
            Cursor::Link(url) => Some(self.source.resolve(&url).map_err(|e| Error::link(&url, e))),
            Cursor::Done => None,
        }
    }
}

impl<S: PostSource> Iterator for Chapters<'_, S> {
    type Item = Result<(Post, Vec<Chapter>)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.config.max_posts.is_some_and(|max| self.consumed >= max) {
            self.cursor = Cursor::Done;
            return None;
        }

        let post = match self.fetch()? {
            Ok(post) => post,
            Err(e) => return Some(Err(e)),
        };

        if !self.visited.insert(post.id.clone()) {
            warn!(post = %post.id, "next link leads back into the chain");
            return None;
        }
        self.consumed += 1;
        info!(post = %post.id, title = %post.title, number = self.consumed, "processing post");

        if let Some(url) = link_in(&post, &self.config.links.next) {
            self.cursor = Cursor::Link(url);
        }

        let chapters = chapters_of(&post, &self.config.chapter_break, self.config.framing);
        Some(Ok((post, chapters)))
    }
}
