//! The bot loop: read mentions, build books, publish them, reply.

use std::io::Cursor;

use tracing::{debug, error, info, warn};

use crate::book::{Book, BookBuilder};
use crate::command::{Parsed, Request, parse_command};
use crate::epub::write_epub_to_writer;
use crate::error::{Error, Result};
use crate::post::Post;
use crate::storage::{Publisher, object_key};
use crate::traverse::{Chapters, PostSource, locate_first};

pub const FAILURE_REPLY: &str = "Failed to create epub. Maybe one of your parameters is set wrong? \
Common mistakes are empty chapters.";

/// A comment in the inbox that mentions the bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mention {
    pub fullname: String,
    pub body: String,
    pub author: Option<String>,
    /// Id of the post the comment was made on.
    pub submission_id: Option<String>,
}

/// Everything the bot needs from the discussion service.
pub trait DiscussionService: PostSource {
    /// Mentions that have not been marked read yet.
    fn unread_mentions(&self) -> Result<Vec<Mention>>;
    fn mark_read(&self, fullname: &str) -> Result<()>;
    fn reply(&self, fullname: &str, text: &str) -> Result<()>;
    fn submission(&self, id: &str) -> Result<Post>;
}

/// A finished EPUB, ready to be stored.
#[derive(Debug)]
pub struct BuiltBook {
    pub book: Book,
    pub bytes: Vec<u8>,
    /// Number of posts the chapters came from.
    pub posts: usize,
}

impl BuiltBook {
    pub fn title(&self) -> &str {
        &self.book.metadata.title
    }

    pub fn file_name(&self) -> String {
        object_key(self.title())
    }
}

/// Build the book for the series containing `start`.
pub fn build_book<S: PostSource>(source: &S, start: Post, request: &Request) -> Result<BuiltBook> {
    let located = locate_first(source, start, &request.traversal)?;
    debug!(post = %located.post.id, termination = ?located.termination, "located first post");

    let mut builder = BookBuilder::new(request.book.metadata_for(&located.post));
    let mut chapters = Chapters::new(source, located.post, &request.traversal);
    for item in chapters.by_ref() {
        let (post, post_chapters) = item?;
        if post_chapters.is_empty() {
            debug!(post = %post.id, "post has no chapters after trimming");
        }
        builder.add_chapters(&post_chapters);
    }
    let posts = chapters.posts_consumed();

    let book = builder.finish();
    let mut out = Cursor::new(Vec::new());
    write_epub_to_writer(&book, &mut out)?;
    info!(title = %book.metadata.title, chapters = book.chapter_count(), posts, "built book");

    Ok(BuiltBook {
        book,
        bytes: out.into_inner(),
        posts,
    })
}

/// What happened to the mentions of one inbox pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct InboxSummary {
    pub published: usize,
    pub ignored: usize,
    pub invalid: usize,
    /// Mentions that asked for the usage text.
    pub helped: usize,
    pub failed: usize,
}

pub struct Bot<D, P> {
    service: D,
    publisher: P,
    invocation: String,
}

impl<D: DiscussionService, P: Publisher> Bot<D, P> {
    pub fn new(service: D, publisher: P, invocation: impl Into<String>) -> Self {
        Self {
            service,
            publisher,
            invocation: invocation.into(),
        }
    }

    pub fn service(&self) -> &D {
        &self.service
    }

    pub fn publisher(&self) -> &P {
        &self.publisher
    }

    /// Handle every unread mention once.
    ///
    /// Mentions are marked read before they are handled, so a request that
    /// keeps failing is answered once instead of on every pass. A failing
    /// request never stops the others.
    pub fn process_inbox(&self) -> Result<InboxSummary> {
        let mut summary = InboxSummary::default();

        for mention in self.service.unread_mentions()? {
            if let Err(e) = self.service.mark_read(&mention.fullname) {
                warn!(mention = %mention.fullname, "failed to mark read: {e}");
            }

            match parse_command(&mention.body, &self.invocation) {
                Parsed::NotInvocation => {
                    debug!(mention = %mention.fullname, "not an invocation");
                    summary.ignored += 1;
                }
                Parsed::Invalid { reason, help } => {
                    info!(mention = %mention.fullname, %reason, "invalid command");
                    summary.invalid += 1;
                    self.reply(&mention, &help_reply(&reason, &help));
                }
                Parsed::Help(help) => {
                    debug!(mention = %mention.fullname, "help requested");
                    summary.helped += 1;
                    self.reply(&mention, &code_block(&help));
                }
                Parsed::Request(request) => match self.handle(&mention, &request) {
                    Ok(url) => {
                        summary.published += 1;
                        self.reply(&mention, &format!("Here is your epub: {url}"));
                    }
                    Err(e) => {
                        error!(mention = %mention.fullname, "request failed: {e}");
                        summary.failed += 1;
                        self.reply(&mention, FAILURE_REPLY);
                    }
                },
            }
        }

        info!(?summary, "inbox processed");
        Ok(summary)
    }

    fn handle(&self, mention: &Mention, request: &Request) -> Result<String> {
        info!(mention = %mention.fullname, author = ?mention.author, "handling request");
        let id = mention
            .submission_id
            .as_deref()
            .ok_or_else(|| Error::NotFound(format!("post of {}", mention.fullname)))?;
        let start = self.service.submission(id)?;

        let built = build_book(&self.service, start, request)?;
        let url = self.publisher.publish(&built.file_name(), &built.bytes)?;
        info!(%url, "published book");
        Ok(url)
    }

    fn reply(&self, mention: &Mention, text: &str) {
        if let Err(e) = self.service.reply(&mention.fullname, text) {
            warn!(mention = %mention.fullname, "failed to reply: {e}");
        }
    }
}

fn help_reply(reason: &str, help: &str) -> String {
    let first_line = reason.lines().find(|l| !l.trim().is_empty()).unwrap_or(reason);
    format!("Sorry, I could not read that command: {first_line}\n\n{}", code_block(help))
}

/// Four-space indent renders as a code block.
fn code_block(text: &str) -> String {
    let mut block = String::with_capacity(text.len() + text.len() / 8);
    for line in text.lines() {
        block.push_str("    ");
        block.push_str(line);
        block.push('\n');
    }
    block
}
