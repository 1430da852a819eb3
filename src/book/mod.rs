//! Format-agnostic book model and assembly from chapters.

use std::collections::BTreeMap;

use quick_xml::escape::escape;

use crate::post::{Chapter, Post};

pub const XHTML_MEDIA_TYPE: &str = "application/xhtml+xml";
pub const CSS_MEDIA_TYPE: &str = "text/css";
pub const NAV_HREF: &str = "nav.xhtml";
pub const STYLESHEET_HREF: &str = "style/book.css";

const STYLESHEET: &str = "body { margin: 0 5%; line-height: 1.4; }\n\
h1 { text-align: center; margin: 1em 0 1.5em; }\n\
nav ol { list-style-type: none; padding-left: 0; }\n";

/// In-memory representation of an ebook.
#[derive(Debug, Clone, Default)]
pub struct Book {
    pub metadata: Metadata,
    pub spine: Vec<SpineItem>,
    pub toc: Vec<TocEntry>,
    /// Resources keyed by href, relative to the package directory.
    pub resources: BTreeMap<String, Resource>,
}

/// Book metadata (Dublin Core subset)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    pub title: String,
    pub authors: Vec<Author>,
    pub language: String,
    pub identifier: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub name: String,
    /// Sort form of the name, e.g. "Doe, Jane".
    pub file_as: Option<String>,
}

/// An item in the reading order (spine)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpineItem {
    pub id: String,
    pub href: String,
}

/// A table of contents entry
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct TocEntry {
    pub title: String,
    pub href: String,
}

/// A resource (content document, stylesheet, ...)
#[derive(Debug, Clone)]
pub struct Resource {
    pub data: Vec<u8>,
    pub media_type: String,
    /// OPF manifest properties, e.g. `nav`.
    pub properties: Option<String>,
}

impl Book {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a resource to the book
    pub fn add_resource(
        &mut self,
        href: impl Into<String>,
        data: Vec<u8>,
        media_type: impl Into<String>,
    ) {
        self.resources.insert(
            href.into(),
            Resource {
                data,
                media_type: media_type.into(),
                properties: None,
            },
        );
    }

    /// Get a resource by href
    pub fn get_resource(&self, href: &str) -> Option<&Resource> {
        self.resources.get(href)
    }

    /// Add a spine item
    pub fn add_spine_item(&mut self, id: impl Into<String>, href: impl Into<String>) {
        self.spine.push(SpineItem {
            id: id.into(),
            href: href.into(),
        });
    }

    /// Number of chapters (TOC entries) in the book.
    pub fn chapter_count(&self) -> usize {
        self.toc.len()
    }
}

impl Metadata {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_author(mut self, name: impl Into<String>, file_as: Option<String>) -> Self {
        self.authors.push(Author {
            name: name.into(),
            file_as,
        });
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = identifier.into();
        self
    }
}

/// Metadata overrides requested by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookOptions {
    pub title: Option<String>,
    pub language: String,
    pub author: Option<String>,
    pub file_as: Option<String>,
}

impl Default for BookOptions {
    fn default() -> Self {
        Self {
            title: None,
            language: "en".to_string(),
            author: None,
            file_as: None,
        }
    }
}

impl BookOptions {
    /// Metadata for a book whose first post is `first`.
    pub fn metadata_for(&self, first: &Post) -> Metadata {
        let title = self.title.clone().unwrap_or_else(|| first.title.clone());
        let author = self.author.clone().unwrap_or_else(|| first.author.clone());
        let file_as = self.file_as.clone().or_else(|| first.author_fullname.clone());
        Metadata::new(title)
            .with_author(author, file_as)
            .with_language(&self.language)
            .with_identifier(&first.fullname)
    }
}

/// Accumulates chapters into a [`Book`].
///
/// Chapters become `text/chapter_NNNN.xhtml` documents in the order they are
/// added; [`BookBuilder::finish`] adds the navigation document in front.
#[derive(Debug)]
pub struct BookBuilder {
    book: Book,
}

impl BookBuilder {
    pub fn new(metadata: Metadata) -> Self {
        let mut book = Book::new();
        book.metadata = metadata;
        Self { book }
    }

    pub fn add_chapter(&mut self, chapter: &Chapter) {
        let number = self.book.toc.len() + 1;
        let id = format!("chapter_{number:04}");
        let href = format!("text/{id}.xhtml");
        let document =
            xhtml_document(&chapter.title, &self.book.metadata.language, "../", &chapter.body);

        self.book.add_resource(&href, document.into_bytes(), XHTML_MEDIA_TYPE);
        self.book.add_spine_item(id, &href);
        self.book.toc.push(TocEntry {
            title: chapter.title.clone(),
            href,
        });
    }

    pub fn add_chapters<'c>(&mut self, chapters: impl IntoIterator<Item = &'c Chapter>) {
        for chapter in chapters {
            self.add_chapter(chapter);
        }
    }

    pub fn chapter_count(&self) -> usize {
        self.book.toc.len()
    }

    pub fn finish(mut self) -> Book {
        let nav = nav_document(&self.book);
        self.book.add_resource(NAV_HREF, nav.into_bytes(), XHTML_MEDIA_TYPE);
        if let Some(resource) = self.book.resources.get_mut(NAV_HREF) {
            resource.properties = Some("nav".to_string());
        }
        self.book
            .add_resource(STYLESHEET_HREF, STYLESHEET.as_bytes().to_vec(), CSS_MEDIA_TYPE);
        self.book.spine.insert(
            0,
            SpineItem {
                id: "nav".to_string(),
                href: NAV_HREF.to_string(),
            },
        );
        self.book
    }
}

fn xhtml_document(title: &str, language: &str, root: &str, body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops" xml:lang="{lang}" lang="{lang}">
<head>
  <title>{title}</title>
  <link rel="stylesheet" type="text/css" href="{root}{css}"/>
</head>
<body>
{body}</body>
</html>
"#,
        lang = escape(language),
        title = escape(title),
        css = STYLESHEET_HREF,
    )
}

fn nav_document(book: &Book) -> String {
    let mut items = String::new();
    for entry in &book.toc {
        items.push_str(&format!(
            "      <li><a href=\"{}\">{}</a></li>\n",
            escape(entry.href.as_str()),
            escape(entry.title.as_str())
        ));
    }
    let body = format!(
        "<nav epub:type=\"toc\" id=\"toc\">\n    <h1>{}</h1>\n    <ol>\n{items}    </ol>\n  </nav>\n",
        escape(book.metadata.title.as_str())
    );
    xhtml_document(&book.metadata.title, &book.metadata.language, "", &body)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chapter(title: &str) -> Chapter {
        Chapter {
            title: title.to_string(),
            body: format!("<h1>{title}</h1>\n<p>text</p>\n"),
        }
    }

    #[test]
    fn test_metadata_defaults_come_from_first_post() {
        let mut post = Post::new("f6iwyk", "Of Men and Dragons", "").with_author("writer");
        post.author_fullname = Some("t2_abc".to_string());

        let meta = BookOptions::default().metadata_for(&post);
        assert_eq!(meta.title, "Of Men and Dragons");
        assert_eq!(meta.identifier, "t3_f6iwyk");
        assert_eq!(meta.language, "en");
        assert_eq!(
            meta.authors,
            vec![Author {
                name: "writer".into(),
                file_as: Some("t2_abc".into())
            }]
        );

        let options = BookOptions {
            title: Some("Dragons".into()),
            language: "de".into(),
            author: Some("Pen Name".into()),
            file_as: Some("Name, Pen".into()),
        };
        let meta = options.metadata_for(&post);
        assert_eq!(meta.title, "Dragons");
        assert_eq!(meta.language, "de");
        assert_eq!(meta.authors[0].name, "Pen Name");
        assert_eq!(meta.authors[0].file_as.as_deref(), Some("Name, Pen"));
    }

    #[test]
    fn test_builder_orders_chapters_after_nav() {
        let mut builder = BookBuilder::new(Metadata::new("Serial <1>").with_language("en"));
        builder.add_chapters(&[chapter("Part 1"), chapter("Part 2")]);
        let book = builder.finish();

        let hrefs: Vec<_> = book.spine.iter().map(|s| s.href.as_str()).collect();
        assert_eq!(hrefs, vec![NAV_HREF, "text/chapter_0001.xhtml", "text/chapter_0002.xhtml"]);
        assert_eq!(book.chapter_count(), 2);

        let nav = String::from_utf8(book.get_resource(NAV_HREF).unwrap().data.clone()).unwrap();
        assert!(nav.contains("<title>Serial &lt;1&gt;</title>"));
        assert!(nav.contains(r#"<a href="text/chapter_0002.xhtml">Part 2</a>"#));
        assert_eq!(book.get_resource(NAV_HREF).unwrap().properties.as_deref(), Some("nav"));

        let chapter = book.get_resource("text/chapter_0001.xhtml").unwrap();
        let doc = String::from_utf8(chapter.data.clone()).unwrap();
        assert!(doc.contains("href=\"../style/book.css\""));
        assert!(doc.contains("<h1>Part 1</h1>"));
    }

    #[test]
    fn test_same_titles_get_distinct_documents() {
        let mut builder = BookBuilder::new(Metadata::new("Book"));
        builder.add_chapter(&chapter("Same"));
        builder.add_chapter(&chapter("Same"));
        assert_eq!(builder.chapter_count(), 2);
        let book = builder.finish();
        assert!(book.get_resource("text/chapter_0001.xhtml").is_some());
        assert!(book.get_resource("text/chapter_0002.xhtml").is_some());
    }
}
