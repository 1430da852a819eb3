//! Parsing bot invocations out of mention comments.
//!
//! A mention looks like a shell command line:
//!
//! ```text
//! u/epubBot --chapter-break '*' --no-outro -t "Of Men and Dragons"
//! ```
//!
//! The first word must name the bot; the rest is parsed with clap, so the
//! reply to a malformed command is ordinary `--help` output.

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};

use crate::book::BookOptions;
use crate::error::{Error, Result};
use crate::traverse::{ChapterBreak, Framing, LinkPatterns, TraversalConfig};

/// Options accepted in a mention.
#[derive(Parser, Debug)]
#[command(
    name = "u/epubBot",
    about = "A bot that creates epubs from reddit posts.",
    disable_version_flag = true
)]
pub struct CommandArgs {
    /// Link text of the link to the next chapter. Case insensitive, partial matches count.
    #[arg(short, long, default_value = "Next")]
    pub next: String,

    /// Link text of the link to the previous chapter. Case insensitive, partial matches count.
    #[arg(short, long, default_value = "Previous")]
    pub previous: String,

    /// Link text of the link to the first chapter. Case insensitive, partial matches count.
    #[arg(short, long, default_value = "First")]
    pub first: String,

    /// This sequence repeated three times separates chapters within a post.
    #[arg(short, long, default_value = "-")]
    pub chapter_break: String,

    /// Posts have no introduction; keep the first part of each post.
    #[arg(long)]
    pub no_intro: bool,

    /// Posts have no outro; keep the last part of each post.
    #[arg(long)]
    pub no_outro: bool,

    /// Follow at most this many posts.
    #[arg(short, long, value_name = "POSTS")]
    pub max_chapters: Option<usize>,

    /// The book's title. Defaults to the title of the first post.
    #[arg(short, long)]
    pub title: Option<String>,

    /// The book's language tag.
    #[arg(short, long, default_value = "en")]
    pub language: String,

    /// The book's author. Defaults to the poster's username.
    #[arg(short, long)]
    pub author: Option<String>,

    /// The author's name for filing purposes.
    #[arg(long)]
    pub file_as: Option<String>,
}

/// A fully validated book request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Request {
    pub traversal: TraversalConfig,
    pub book: BookOptions,
}

impl TryFrom<CommandArgs> for Request {
    type Error = Error;

    fn try_from(args: CommandArgs) -> Result<Self> {
        Ok(Request {
            traversal: TraversalConfig {
                links: LinkPatterns {
                    first: link_pattern("--first", args.first)?,
                    previous: link_pattern("--previous", args.previous)?,
                    next: link_pattern("--next", args.next)?,
                },
                chapter_break: ChapterBreak::new(args.chapter_break)?,
                framing: Framing {
                    keep_intro: args.no_intro,
                    keep_outro: args.no_outro,
                },
                max_posts: args.max_chapters,
            },
            book: BookOptions {
                title: args.title,
                language: args.language,
                author: args.author,
                file_as: args.file_as,
            },
        })
    }
}

/// An empty pattern would match every link in a post.
fn link_pattern(option: &str, pattern: String) -> Result<String> {
    if pattern.trim().is_empty() {
        return Err(Error::InvalidCommand(format!("{option} must not be empty")));
    }
    Ok(pattern)
}

/// Outcome of reading a mention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parsed {
    /// The comment does not start with the bot's name.
    NotInvocation,
    /// The bot was called with options it cannot use. `help` is the text to reply with.
    Invalid { reason: String, help: String },
    /// The bot was asked for its usage text.
    Help(String),
    Request(Request),
}

/// Parse a mention comment addressed to `invocation` (e.g. `u/epubBot`).
pub fn parse_command(body: &str, invocation: &str) -> Parsed {
    let words = match split_words(body.trim()) {
        Ok(words) => words,
        Err(e) => {
            return if names_bot(body.split_whitespace().next(), invocation) {
                Parsed::Invalid {
                    reason: e.to_string(),
                    help: help_text(),
                }
            } else {
                Parsed::NotInvocation
            };
        }
    };

    if !names_bot(words.first().map(String::as_str), invocation) {
        return Parsed::NotInvocation;
    }

    let args = match CommandArgs::try_parse_from(&words) {
        Ok(args) => args,
        Err(e) if e.kind() == ErrorKind::DisplayHelp => return Parsed::Help(help_text()),
        Err(e) => {
            return Parsed::Invalid {
                reason: e.render().to_string(),
                help: help_text(),
            };
        }
    };
    match Request::try_from(args) {
        Ok(request) => Parsed::Request(request),
        Err(e) => Parsed::Invalid {
            reason: e.to_string(),
            help: help_text(),
        },
    }
}

/// Parse command words; the first word is the program name and is ignored.
pub fn parse_args<I, T>(words: I) -> Result<Request>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let args = CommandArgs::try_parse_from(words)
        .map_err(|e| Error::InvalidCommand(e.render().to_string()))?;
    Request::try_from(args)
}

/// Usage text for replies.
pub fn help_text() -> String {
    CommandArgs::command().render_help().to_string()
}

fn names_bot(word: Option<&str>, invocation: &str) -> bool {
    let normalize = |s: &str| s.trim_start_matches('/').to_ascii_lowercase();
    word.is_some_and(|w| normalize(w) == normalize(invocation))
}

/// Split a command line into words, honoring quotes and backslash escapes.
pub fn split_words(line: &str) -> Result<Vec<String>> {
    let mut words = Vec::new();
    let mut word = String::new();
    let mut in_word = false;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match c {
            '\'' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(c) => word.push(c),
                        None => return Err(Error::InvalidCommand("unclosed single quote".into())),
                    }
                }
            }
            '"' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some(c @ ('"' | '\\' | '$' | '`')) => word.push(c),
                            Some(c) => {
                                word.push('\\');
                                word.push(c);
                            }
                            None => {
                                return Err(Error::InvalidCommand("unclosed double quote".into()));
                            }
                        },
                        Some(c) => word.push(c),
                        None => return Err(Error::InvalidCommand("unclosed double quote".into())),
                    }
                }
            }
            '\\' => {
                in_word = true;
                if let Some(c) = chars.next() {
                    word.push(c);
                }
            }
            c if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut word));
                    in_word = false;
                }
            }
            c => {
                in_word = true;
                word.push(c);
            }
        }
    }
    if in_word {
        words.push(word);
    }
    Ok(words)
}
