//! Splitting a post body into chapter texts.

use crate::error::{Error, Result};
use crate::markup::render_markdown;
use crate::post::{Chapter, Post};

/// A non-empty token whose triple repetition separates chapters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterBreak {
    token: String,
    delimiter: String,
}

impl ChapterBreak {
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let token = token.into();
        if token.is_empty() {
            return Err(Error::InvalidChapterBreak);
        }
        let delimiter = token.repeat(3);
        Ok(Self { token, delimiter })
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// The literal separator (the token repeated three times).
    pub fn delimiter(&self) -> &str {
        &self.delimiter
    }
}

impl Default for ChapterBreak {
    fn default() -> Self {
        Self {
            token: "-".to_string(),
            delimiter: "---".to_string(),
        }
    }
}

/// Which framing segments of a post are kept.
///
/// Both default to `false`: a post is assumed to open with an introduction
/// and close with an outro, and both are dropped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Framing {
    pub keep_intro: bool,
    pub keep_outro: bool,
}

/// Split `body` on the chapter break, drop empty pieces, then drop the
/// intro and outro unless told to keep them.
///
/// Pieces holding only whitespace count as empty: a break written as
/// several delimiter lines in a row (`---\n---\n---`) is still one break.
pub fn split_segments<'a>(body: &'a str, brk: &ChapterBreak, framing: Framing) -> Vec<&'a str> {
    let mut segments: Vec<&str> = body
        .split(brk.delimiter())
        .filter(|s| !s.trim().is_empty())
        .collect();

    if !framing.keep_intro && !segments.is_empty() {
        segments.remove(0);
    }
    if !framing.keep_outro {
        segments.pop();
    }
    segments
}

/// Turn the kept segments of a post into titled chapters.
///
/// A post with a single chapter gives it the post title verbatim; otherwise
/// chapters are numbered from 1 in split order.
pub fn chapters_of(post: &Post, brk: &ChapterBreak, framing: Framing) -> Vec<Chapter> {
    let segments = split_segments(&post.body, brk, framing);
    let numbered = segments.len() > 1;

    segments
        .into_iter()
        .enumerate()
        .map(|(i, text)| {
            let title = if numbered {
                format!("{} {}", post.title, i + 1)
            } else {
                post.title.clone()
            };
            let body = render_markdown(&format!("# {title}\n\n{text}"));
            Chapter { title, body }
        })
        .collect()
}
