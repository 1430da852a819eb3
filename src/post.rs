//! Posts fetched from the discussion service and the chapters cut out of them.

/// A text post as supplied by the discussion service.
///
/// The traversal core only ever reads posts; they are owned by whoever
/// fetched them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    /// Stable short identifier (e.g. `f6iwyk`).
    pub id: String,
    /// Type-prefixed identifier (e.g. `t3_f6iwyk`), used as the book identifier.
    pub fullname: String,
    pub title: String,
    /// Raw author-written markdown.
    pub body: String,
    /// Display name of the author.
    pub author: String,
    /// Type-prefixed author identifier, used for filing.
    pub author_fullname: Option<String>,
}

impl Post {
    pub fn new(id: impl Into<String>, title: impl Into<String>, body: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            fullname: format!("t3_{id}"),
            id,
            title: title.into(),
            body: body.into(),
            author: String::new(),
            author_fullname: None,
        }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }
}

/// One chapter produced from a post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chapter {
    pub title: String,
    /// HTML fragment: a heading with the title followed by the chapter text.
    pub body: String,
}
