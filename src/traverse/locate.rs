//! Finding the first post of a series.

use std::collections::HashSet;

use tracing::{debug, warn};

use super::{PostSource, TraversalConfig, link_in};
use crate::error::{Error, Result};
use crate::post::Post;

/// Why the backward walk stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The starting post linked directly to the first post.
    FirstLink,
    /// The returned post has no "previous" link.
    NoPrevious,
    /// A "previous" link led back to a post already visited. The returned
    /// post is the last new one found.
    CycleDetected,
}

/// Result of [`locate_first`].
#[derive(Debug, Clone)]
pub struct Located {
    pub post: Post,
    pub termination: Termination,
}

/// Walk backwards from `start` to the first post of its series.
///
/// A "first" link in the starting post wins outright; the post it points to
/// is returned without walking further. Otherwise "previous" links are
/// followed until a post has none, or until one points back to a post that
/// was already visited.
///
/// Failing to fetch a linked post aborts the walk with
/// [`Error::LinkResolution`].
pub fn locate_first<S: PostSource>(
    source: &S,
    start: Post,
    config: &TraversalConfig,
) -> Result<Located> {
    if let Some(url) = link_in(&start, &config.links.first) {
        debug!(from = %start.id, %url, "following first link");
        let post = source.resolve(&url).map_err(|e| Error::link(&url, e))?;
        return Ok(Located {
            post,
            termination: Termination::FirstLink,
        });
    }

    let mut visited = HashSet::from([start.id.clone()]);
    let mut current = start;

    while let Some(url) = link_in(&current, &config.links.previous) {
        let previous = source.resolve(&url).map_err(|e| Error::link(&url, e))?;
        if !visited.insert(previous.id.clone()) {
            warn!(post = %current.id, %url, "previous link leads back into the chain");
            return Ok(Located {
                post: current,
                termination: Termination::CycleDetected,
            });
        }
        debug!(from = %current.id, to = %previous.id, "followed previous link");
        current = previous;
    }

    Ok(Located {
        post: current,
        termination: Termination::NoPrevious,
    })
}
