//! Shared fakes for integration tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;

use epubbot::bot::{DiscussionService, Mention};
use epubbot::reddit::submission_id;
use epubbot::{Error, Post, PostSource, Result};

/// An in-memory reddit: posts by id, resolved from `https://redd.it/<id>` links.
#[derive(Default)]
pub struct FakeReddit {
    pub posts: HashMap<String, Post>,
    pub mentions: Vec<Mention>,
    pub fetched: RefCell<Vec<String>>,
    pub read: RefCell<Vec<String>>,
    pub replies: RefCell<Vec<(String, String)>>,
}

impl FakeReddit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, id: &str, title: &str, body: &str) -> &mut Self {
        self.posts
            .insert(id.to_string(), Post::new(id, title, body).with_author("writer"));
        self
    }

    pub fn post(&self, id: &str) -> Post {
        self.posts[id].clone()
    }

    pub fn mention(&mut self, fullname: &str, body: &str, on: &str) -> &mut Self {
        self.mentions.push(Mention {
            fullname: fullname.to_string(),
            body: body.to_string(),
            author: Some("reader".to_string()),
            submission_id: Some(on.to_string()),
        });
        self
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetched.borrow().clone()
    }
}

impl PostSource for FakeReddit {
    fn resolve(&self, url: &str) -> Result<Post> {
        let id = submission_id(url)?;
        self.submission(&id)
    }
}

impl DiscussionService for FakeReddit {
    fn unread_mentions(&self) -> Result<Vec<Mention>> {
        let read = self.read.borrow();
        Ok(self
            .mentions
            .iter()
            .filter(|m| !read.contains(&m.fullname))
            .cloned()
            .collect())
    }

    fn mark_read(&self, fullname: &str) -> Result<()> {
        self.read.borrow_mut().push(fullname.to_string());
        Ok(())
    }

    fn reply(&self, fullname: &str, text: &str) -> Result<()> {
        self.replies
            .borrow_mut()
            .push((fullname.to_string(), text.to_string()));
        Ok(())
    }

    fn submission(&self, id: &str) -> Result<Post> {
        self.fetched.borrow_mut().push(id.to_string());
        self.posts
            .get(id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("t3_{id}")))
    }
}

/// Markdown navigation line linking to the given post ids.
pub fn nav(previous: Option<&str>, first: Option<&str>, next: Option<&str>) -> String {
    let mut links = Vec::new();
    if let Some(id) = previous {
        links.push(format!("[Previous](https://redd.it/{id})"));
    }
    if let Some(id) = first {
        links.push(format!("[First](https://redd.it/{id})"));
    }
    if let Some(id) = next {
        links.push(format!("[Next](https://redd.it/{id})"));
    }
    links.join(" | ")
}

/// A series `p1 .. pN` where every post has one chapter between an intro and an outro.
///
/// The outro always carries text, so even a one-post series has a chapter.
pub fn series(n: usize) -> FakeReddit {
    let mut reddit = FakeReddit::new();
    for i in 1..=n {
        let id = format!("p{i}");
        let previous = (i > 1).then(|| format!("p{}", i - 1));
        let next = (i < n).then(|| format!("p{}", i + 1));
        let body = format!(
            "Thanks for reading!\n\n---\n\nStory text of part {i}.\n\n---\n\nMore soon.\n\n{}",
            nav(previous.as_deref(), None, next.as_deref())
        );
        reddit.add(&id, &format!("Serial Part {i}"), &body);
    }
    reddit
}
