//! End-to-end inbox handling against an in-memory reddit and a local directory.

mod common;

use std::cell::RefCell;

use common::{FakeReddit, series};
use epubbot::Result;
use epubbot::bot::{Bot, FAILURE_REPLY, InboxSummary, build_book};
use epubbot::command::{Request, parse_args};
use epubbot::storage::{LocalDirectory, Publisher};
use tempfile::TempDir;

fn local_bot(reddit: FakeReddit) -> (Bot<FakeReddit, LocalDirectory>, TempDir) {
    let dir = TempDir::new().unwrap();
    let publisher = LocalDirectory::new(dir.path(), Some("https://books.example.com".into()));
    (Bot::new(reddit, publisher, "u/epubBot"), dir)
}

#[test]
fn test_mention_produces_book_and_link_reply() {
    let mut reddit = series(3);
    reddit.mention("t1_m1", "u/epubBot", "p2");
    let (bot, dir) = local_bot(reddit);

    let summary = bot.process_inbox().unwrap();
    assert_eq!(
        summary,
        InboxSummary {
            published: 1,
            ..Default::default()
        }
    );

    let replies = bot.service().replies.borrow();
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].0, "t1_m1");
    assert_eq!(replies[0].1, "Here is your epub: https://books.example.com/Serial%20Part%201.epub");
    assert!(dir.path().join("Serial Part 1.epub").exists());
    assert_eq!(*bot.service().read.borrow(), vec!["t1_m1"]);
}

#[test]
fn test_title_option_names_the_file() {
    let mut reddit = series(2);
    reddit.mention("t1_m1", "u/epubBot -t 'The Whole Serial'", "p1");
    let (bot, dir) = local_bot(reddit);

    bot.process_inbox().unwrap();
    assert!(dir.path().join("The Whole Serial.epub").exists());
}

#[test]
fn test_other_mentions_are_marked_read_and_ignored() {
    let mut reddit = series(1);
    reddit.mention("t1_m1", "nice story u/epubBot", "p1");
    let (bot, _dir) = local_bot(reddit);

    let summary = bot.process_inbox().unwrap();
    assert_eq!(summary.ignored, 1);
    assert!(bot.service().replies.borrow().is_empty());
    assert_eq!(bot.process_inbox().unwrap(), InboxSummary::default());
}

#[test]
fn test_invalid_command_gets_help() {
    let mut reddit = series(1);
    reddit.mention("t1_m1", "u/epubBot --max-chapters many", "p1");
    let (bot, _dir) = local_bot(reddit);

    let summary = bot.process_inbox().unwrap();
    assert_eq!(summary.invalid, 1);
    let replies = bot.service().replies.borrow();
    assert!(replies[0].1.starts_with("Sorry, I could not read that command"));
    assert!(replies[0].1.contains("    Usage:"));
}

#[test]
fn test_help_request_gets_usage_only() {
    let mut reddit = series(1);
    reddit.mention("t1_m1", "u/epubBot --help", "p1");
    let (bot, _dir) = local_bot(reddit);

    let summary = bot.process_inbox().unwrap();
    assert_eq!(
        summary,
        InboxSummary {
            helped: 1,
            ..Default::default()
        }
    );
    let replies = bot.service().replies.borrow();
    assert!(replies[0].1.starts_with("    A bot that creates epubs from reddit posts."));
    assert!(replies[0].1.contains("    Usage: u/epubBot [OPTIONS]"));
    assert!(!replies[0].1.contains("Sorry"));
}

#[test]
fn test_empty_link_pattern_gets_help() {
    let mut reddit = series(2);
    reddit.mention("t1_m1", "u/epubBot --next ''", "p1");
    let (bot, dir) = local_bot(reddit);

    let summary = bot.process_inbox().unwrap();
    assert_eq!(summary.invalid, 1);
    assert!(bot.service().replies.borrow()[0].1.contains("--next must not be empty"));
    assert!(bot.service().fetched().is_empty());
    assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
}

#[test]
fn test_failures_reply_generically_and_do_not_stop_the_pass() {
    let mut reddit = series(2);
    // p1 has no chapters once intro and outro are dropped with this break token.
    reddit
        .mention("t1_bad", "u/epubBot -c '#'", "p1")
        .mention("t1_missing", "u/epubBot", "deleted")
        .mention("t1_good", "u/epubBot", "p1");
    let (bot, _dir) = local_bot(reddit);

    let summary = bot.process_inbox().unwrap();
    assert_eq!(summary.failed, 2);
    assert_eq!(summary.published, 1);

    let replies = bot.service().replies.borrow();
    assert_eq!(replies[0], ("t1_bad".to_string(), FAILURE_REPLY.to_string()));
    assert_eq!(replies[1], ("t1_missing".to_string(), FAILURE_REPLY.to_string()));
    assert!(replies[2].1.starts_with("Here is your epub"));
}

struct FailingPublisher {
    attempts: RefCell<usize>,
}

impl Publisher for FailingPublisher {
    fn publish(&self, _key: &str, _bytes: &[u8]) -> Result<String> {
        *self.attempts.borrow_mut() += 1;
        Err(epubbot::Error::Upload("bucket unavailable".into()))
    }
}

#[test]
fn test_upload_failure_is_reported() {
    let mut reddit = series(1);
    reddit.mention("t1_m1", "u/epubBot", "p1");
    let bot = Bot::new(
        reddit,
        FailingPublisher {
            attempts: RefCell::new(0),
        },
        "u/epubBot",
    );

    let summary = bot.process_inbox().unwrap();
    assert_eq!(summary.failed, 1);
    // The book was built; only the upload failed.
    assert_eq!(*bot.publisher().attempts.borrow(), 1);
    assert_eq!(bot.service().replies.borrow()[0].1, FAILURE_REPLY);
}

#[test]
fn test_build_book_counts_posts_and_chapters() {
    let reddit = series(5);
    let request: Request = parse_args(["epubbot", "-m", "3"]).unwrap();

    let built = build_book(&reddit, reddit.post("p4"), &request).unwrap();
    assert_eq!(built.posts, 3);
    assert_eq!(built.book.chapter_count(), 3);
    assert_eq!(built.title(), "Serial Part 1");
    assert_eq!(built.book.metadata.identifier, "t3_p1");
    assert_eq!(built.book.metadata.authors[0].name, "writer");
    assert!(built.bytes.starts_with(b"PK"));
}
