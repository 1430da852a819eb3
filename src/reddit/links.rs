//! Turning reddit links into submission ids.

use crate::error::{Error, Result};

/// Extract the submission id from a link to a reddit post.
///
/// Understands full links (`https://www.reddit.com/r/HFY/comments/f6iwyk/slug/`),
/// site-relative links (`/r/HFY/comments/f6iwyk`) and short links
/// (`https://redd.it/f6iwyk`). Anything else is [`Error::UnsupportedLink`].
pub fn submission_id(url: &str) -> Result<String> {
    let unsupported = || Error::UnsupportedLink(url.to_string());

    let trimmed = url.trim();
    let without_query = trimmed.split(['?', '#']).next().unwrap_or_default();
    let (host, path) = match without_query.split_once("://") {
        Some((_, rest)) => rest.split_once('/').unwrap_or((rest, "")),
        None if without_query.starts_with('/') => ("reddit.com", &without_query[1..]),
        None => without_query.split_once('/').unwrap_or((without_query, "")),
    };
    let host = host.to_ascii_lowercase();
    let mut segments = path.split('/').filter(|s| !s.is_empty());

    let id = if host == "redd.it" || host.ends_with(".redd.it") {
        segments.next()
    } else if host == "reddit.com" || host.ends_with(".reddit.com") {
        segments.skip_while(|s| *s != "comments").nth(1)
    } else {
        None
    };

    match id {
        Some(id) if id.chars().all(|c| c.is_ascii_alphanumeric()) => Ok(id.to_ascii_lowercase()),
        _ => Err(unsupported()),
    }
}
