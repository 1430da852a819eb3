//! # epubbot
//!
//! A reddit bot that turns serial stories into EPUB books.
//!
//! Serial writers post one part at a time and link the parts together with
//! "Previous" / "First" / "Next" links. When someone mentions the bot under
//! any part, it walks back to the first part, follows the "next" links to
//! the end of the series, cuts every post into chapters, and publishes the
//! resulting EPUB.
//!
//! ## Building a book
//!
//! ```no_run
//! use epubbot::bot::build_book;
//! use epubbot::command::Request;
//! use epubbot::reddit::RedditClient;
//! use epubbot::traverse::PostSource;
//! # fn run(client: RedditClient) -> epubbot::Result<()> {
//! let start = client.resolve("https://www.reddit.com/r/HFY/comments/f6iwyk/")?;
//! let built = build_book(&client, start, &Request::default())?;
//! std::fs::write(built.file_name(), &built.bytes)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Chapters
//!
//! Within a post, a chapter break token (default `-`) repeated three times
//! separates chapters. The first and last pieces are treated as the
//! author's introduction and outro and dropped unless the request says the
//! posts have none; see [`traverse::Framing`].

pub mod book;
pub mod bot;
pub mod command;
pub mod config;
pub mod epub;
pub mod error;
pub mod markup;
pub mod post;
pub mod reddit;
pub mod storage;
pub mod traverse;

pub use book::{Book, BookBuilder, Metadata};
pub use bot::{Bot, DiscussionService, Mention, build_book};
pub use command::{Parsed, Request, parse_command};
pub use epub::{write_epub, write_epub_to_writer};
pub use error::{Error, Result};
pub use post::{Chapter, Post};
pub use traverse::{Chapters, PostSource, TraversalConfig, locate_first};
