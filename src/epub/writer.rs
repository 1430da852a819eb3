use std::io::{Seek, Write};
use std::path::Path;

use quick_xml::escape::escape;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::book::{Book, TocEntry};
use crate::error::{Error, Result};

/// Write a [`Book`] to an EPUB file on disk.
///
/// # Example
///
/// ```no_run
/// use epubbot::book::{BookBuilder, Metadata};
/// use epubbot::{Chapter, write_epub};
///
/// let mut builder = BookBuilder::new(Metadata::new("My Book").with_author("Me", None));
/// builder.add_chapter(&Chapter { title: "One".into(), body: "<p>Hi</p>".into() });
/// write_epub(&builder.finish(), "output.epub")?;
/// # Ok::<(), epubbot::Error>(())
/// ```
pub fn write_epub<P: AsRef<Path>>(book: &Book, path: P) -> Result<()> {
    let file = std::fs::File::create(path)?;
    write_epub_to_writer(book, file)
}

/// Write a [`Book`] to any [`Write`] + [`Seek`] destination.
///
/// Produces an EPUB 3 package that also carries an NCX for EPUB 2 readers.
/// Books without chapters are rejected with [`Error::EmptyBook`].
pub fn write_epub_to_writer<W: Write + Seek>(book: &Book, writer: W) -> Result<()> {
    if book.toc.is_empty() {
        return Err(Error::EmptyBook);
    }

    let mut zip = ZipWriter::new(writer);

    // mimetype must be first and uncompressed
    let options_stored =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
    let options_deflate =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    zip.start_file("mimetype", options_stored)?;
    zip.write_all(b"application/epub+zip")?;

    zip.start_file("META-INF/container.xml", options_deflate)?;
    zip.write_all(CONTAINER_XML.as_bytes())?;

    // Same identifier in OPF and NCX
    let identifier = if book.metadata.identifier.is_empty() {
        format!("urn:uuid:{}", uuid::Uuid::new_v4())
    } else {
        book.metadata.identifier.clone()
    };

    zip.start_file("OEBPS/content.opf", options_deflate)?;
    zip.write_all(generate_opf(book, &identifier).as_bytes())?;

    zip.start_file("OEBPS/toc.ncx", options_deflate)?;
    zip.write_all(generate_ncx(book, &identifier).as_bytes())?;

    for (href, resource) in &book.resources {
        if href == "toc.ncx" || href == "content.opf" {
            continue;
        }
        zip.start_file(format!("OEBPS/{href}"), options_deflate)?;
        zip.write_all(&resource.data)?;
    }

    zip.finish()?;
    Ok(())
}

const CONTAINER_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#;

fn generate_opf(book: &Book, identifier: &str) -> String {
    let meta = &book.metadata;
    let mut opf = String::new();

    opf.push_str(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0" unique-identifier="BookId">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:opf="http://www.idpf.org/2007/opf">
"#,
    );

    opf.push_str(&format!("    <dc:title>{}</dc:title>\n", escape(meta.title.as_str())));
    opf.push_str(&format!(
        "    <dc:identifier id=\"BookId\">{}</dc:identifier>\n",
        escape(identifier)
    ));

    let language = if meta.language.is_empty() { "en" } else { &meta.language };
    opf.push_str(&format!("    <dc:language>{}</dc:language>\n", escape(language)));

    for (i, author) in meta.authors.iter().enumerate() {
        let id = format!("creator{}", i + 1);
        opf.push_str(&format!(
            "    <dc:creator id=\"{id}\">{}</dc:creator>\n",
            escape(author.name.as_str())
        ));
        if let Some(ref file_as) = author.file_as {
            opf.push_str(&format!(
                "    <meta refines=\"#{id}\" property=\"file-as\">{}</meta>\n",
                escape(file_as.as_str())
            ));
        }
    }

    opf.push_str(&format!(
        "    <meta property=\"dcterms:modified\">{}</meta>\n",
        chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ")
    ));

    opf.push_str("  </metadata>\n  <manifest>\n");
    opf.push_str("    <item id=\"ncx\" href=\"toc.ncx\" media-type=\"application/x-dtbncx+xml\"/>\n");

    for (href, resource) in &book.resources {
        let properties = resource
            .properties
            .as_deref()
            .map(|p| format!(" properties=\"{}\"", escape(p)))
            .unwrap_or_default();
        opf.push_str(&format!(
            "    <item id=\"{}\" href=\"{}\" media-type=\"{}\"{properties}/>\n",
            manifest_id(book, href),
            escape(href.as_str()),
            escape(resource.media_type.as_str())
        ));
    }

    opf.push_str("  </manifest>\n  <spine toc=\"ncx\">\n");
    for item in &book.spine {
        opf.push_str(&format!("    <itemref idref=\"{}\"/>\n", manifest_id(book, &item.href)));
    }
    opf.push_str("  </spine>\n</package>\n");
    opf
}

fn generate_ncx(book: &Book, identifier: &str) -> String {
    let mut ncx = String::new();

    ncx.push_str(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE ncx PUBLIC "-//NISO//DTD ncx 2005-1//EN" "http://www.daisy.org/z3986/2005/ncx-2005-1.dtd">
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1">
  <head>
    <meta name="dtb:uid" content=""#,
    );
    ncx.push_str(&escape(identifier));
    ncx.push_str(
        r#""/>
    <meta name="dtb:depth" content="1"/>
    <meta name="dtb:totalPageCount" content="0"/>
    <meta name="dtb:maxPageNumber" content="0"/>
  </head>
  <docTitle>
    <text>"#,
    );
    ncx.push_str(&escape(book.metadata.title.as_str()));
    ncx.push_str("</text>\n  </docTitle>\n  <navMap>\n");

    for (i, entry) in book.toc.iter().enumerate() {
        write_nav_point(&mut ncx, entry, i + 1);
    }

    ncx.push_str("  </navMap>\n</ncx>\n");
    ncx
}

fn write_nav_point(ncx: &mut String, entry: &TocEntry, play_order: usize) {
    ncx.push_str(&format!(
        "    <navPoint id=\"navpoint-{play_order}\" playOrder=\"{play_order}\">\n\
         \x20     <navLabel>\n\
         \x20       <text>{}</text>\n\
         \x20     </navLabel>\n\
         \x20     <content src=\"{}\"/>\n\
         \x20   </navPoint>\n",
        escape(entry.title.as_str()),
        escape(entry.href.as_str())
    ));
}

/// Manifest id for a resource; the spine refers to items by the same id.
fn manifest_id(book: &Book, href: &str) -> String {
    if book.get_resource(href).and_then(|r| r.properties.as_deref()) == Some("nav") {
        return "nav".to_string();
    }
    href.replace(['/', '.', ' ', '-'], "_")
}
