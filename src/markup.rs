//! Markup helpers: markdown rendering and anchor lookup.
//!
//! Post bodies are author-written markdown. Links between posts are found
//! the way a reader finds them: render the body, then look for an anchor
//! whose visible text mentions "next", "previous" and so on.

use std::cell::RefCell;

use html5ever::local_name;
use html5ever::tendril::StrTendril;
use html5ever::tokenizer::{
    BufferQueue, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
};
use pulldown_cmark::{Event, Options, Parser, html};

/// Render markdown to an HTML fragment suitable for an XHTML body.
///
/// Raw HTML in the source is emitted as escaped text so the output stays
/// well-formed regardless of what the author wrote.
pub fn render_markdown(text: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let parser = Parser::new_ext(text, options).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        other => other,
    });

    let mut out = String::with_capacity(text.len() + text.len() / 4);
    html::push_html(&mut out, parser);
    out
}

/// An `<a href>` element and its visible text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    pub href: String,
    pub text: String,
}

/// Find the first anchor (in document order) whose visible text contains
/// `pattern`, ignoring case, and return its target.
///
/// Anchors without an `href` are skipped.
pub fn find_link(html: &str, pattern: &str) -> Option<String> {
    let needle = pattern.to_lowercase();
    anchors(html)
        .into_iter()
        .find(|a| a.text.to_lowercase().contains(&needle))
        .map(|a| a.href)
}

/// Collect every anchor with an `href` in document order.
pub fn anchors(html: &str) -> Vec<Anchor> {
    let tokenizer = Tokenizer::new(AnchorSink::default(), TokenizerOpts::default());
    let input = BufferQueue::default();
    input.push_back(StrTendril::from(html));
    let _ = tokenizer.feed(&input);
    tokenizer.end();
    tokenizer.sink.anchors.into_inner()
}

/// Token sink that records anchors as the tokenizer streams past them.
#[derive(Default)]
struct AnchorSink {
    anchors: RefCell<Vec<Anchor>>,
    /// Anchor currently open, if any. Nested anchors are invalid HTML; a new
    /// `<a>` simply closes the previous one.
    open: RefCell<Option<Anchor>>,
}

impl AnchorSink {
    fn close(&self) {
        if let Some(anchor) = self.open.borrow_mut().take() {
            let text = anchor.text.split_whitespace().collect::<Vec<_>>().join(" ");
            self.anchors.borrow_mut().push(Anchor { text, ..anchor });
        }
    }
}

impl TokenSink for AnchorSink {
    type Handle = ();

    fn process_token(&self, token: Token, _line_number: u64) -> TokenSinkResult<()> {
        match token {
            Token::TagToken(tag) if tag.name == local_name!("a") => match tag.kind {
                TagKind::StartTag => {
                    self.close();
                    let href = tag
                        .attrs
                        .iter()
                        .find(|attr| attr.name.local == local_name!("href"))
                        .map(|attr| attr.value.trim().to_string());
                    if let Some(href) = href {
                        *self.open.borrow_mut() = Some(Anchor {
                            href,
                            text: String::new(),
                        });
                    }
                }
                TagKind::EndTag => self.close(),
            },
            Token::CharacterTokens(text) => {
                if let Some(anchor) = self.open.borrow_mut().as_mut() {
                    anchor.text.push_str(&text);
                }
            }
            Token::EOFToken => self.close(),
            _ => {}
        }
        TokenSinkResult::Continue
    }
}
