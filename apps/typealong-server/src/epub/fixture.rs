//! In-memory EPUB builder for tests

use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

pub(crate) const CONTAINER_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#;

/// Builds a small EPUB 3 with one XHTML file per chapter plus a
/// stylesheet, a cover image and an NCX.
///
/// Chapters are listed in the manifest in reverse order so that tests
/// notice when reading order comes from the manifest instead of the spine.
pub(crate) struct EpubBuilder {
    title: Option<String>,
    author: Option<String>,
    chapters: Vec<String>,
    container: bool,
}

impl EpubBuilder {
    pub fn new() -> Self {
        Self {
            title: None,
            author: None,
            chapters: Vec::new(),
            container: true,
        }
    }

    pub fn title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    pub fn author(mut self, author: &str) -> Self {
        self.author = Some(author.to_string());
        self
    }

    /// Add a chapter whose `<body>` contains `body`
    pub fn chapter(mut self, body: &str) -> Self {
        self.chapters.push(body.to_string());
        self
    }

    pub fn without_container(mut self) -> Self {
        self.container = false;
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        let deflated = SimpleFileOptions::default();

        writer.start_file("mimetype", stored).unwrap();
        writer.write_all(b"application/epub+zip").unwrap();

        if self.container {
            writer.start_file("META-INF/container.xml", deflated).unwrap();
            writer.write_all(CONTAINER_XML.as_bytes()).unwrap();
        }

        writer.start_file("OEBPS/content.opf", deflated).unwrap();
        writer.write_all(self.package_document().as_bytes()).unwrap();

        writer.start_file("OEBPS/styles/main.css", deflated).unwrap();
        writer.write_all(b"p { margin: 0; }").unwrap();

        writer.start_file("OEBPS/images/cover art.png", deflated).unwrap();
        writer.write_all(b"\x89PNG\r\n\x1a\nnot really").unwrap();

        writer.start_file("OEBPS/toc.ncx", deflated).unwrap();
        writer
            .write_all(b"<ncx xmlns=\"http://www.daisy.org/z3986/2005/ncx/\"><navMap/></ncx>")
            .unwrap();

        for (i, body) in self.chapters.iter().enumerate() {
            writer
                .start_file(format!("OEBPS/text/chapter{}.xhtml", i + 1), deflated)
                .unwrap();
            writer.write_all(chapter_document(body).as_bytes()).unwrap();
        }

        writer.finish().unwrap().into_inner()
    }

    fn package_document(&self) -> String {
        let mut metadata = String::new();
        if let Some(title) = &self.title {
            metadata.push_str(&format!("<dc:title>{}</dc:title>", title));
        }
        if let Some(author) = &self.author {
            metadata.push_str(&format!("<dc:creator>{}</dc:creator>", author));
        }
        metadata.push_str("<dc:language>en</dc:language>");

        let mut manifest = String::from(
            r#"<item id="css" href="styles/main.css" media-type="text/css"/>
    <item id="cover" href="images/cover%20art.png" media-type="image/png"/>
    <item id="ncx" href="toc.ncx" media-type="application/x-dtbncx+xml"/>"#,
        );
        for n in (1..=self.chapters.len()).rev() {
            manifest.push_str(&format!(
                "\n    <item id=\"chapter{n}\" href=\"text/chapter{n}.xhtml\" media-type=\"application/xhtml+xml\"/>"
            ));
        }

        let spine: String = (1..=self.chapters.len())
            .map(|n| format!("<itemref idref=\"chapter{n}\"/>"))
            .collect();

        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0" unique-identifier="uid">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">{metadata}</metadata>
  <manifest>
    {manifest}
  </manifest>
  <spine toc="ncx">{spine}</spine>
</package>"#
        )
    }
}

/// Wrap body markup in a complete XHTML document
pub(crate) fn chapter_document(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml">
<head><title>Chapter Title</title><link rel="stylesheet" href="../styles/main.css"/></head>
<body>{}</body>
</html>"#,
        body
    )
}

/// The two-page book used across the pagination tests
pub(crate) fn two_page_epub() -> Vec<u8> {
    EpubBuilder::new()
        .title("Two Pages")
        .author("A. Writer")
        .chapter("<p>Hello <b>World</b></p>")
        .chapter("<p>Second   Page</p>")
        .build()
}

/// A raw ZIP with the given entries
pub(crate) fn zip_entries(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in entries {
        writer
            .start_file(*name, SimpleFileOptions::default())
            .unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}
