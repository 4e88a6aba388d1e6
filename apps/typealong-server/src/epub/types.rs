//! EPUB data types
//!
//! Core types for representing an opened EPUB container.

use serde::{Deserialize, Serialize};

/// Media types treated as document-body content.
const DOCUMENT_MEDIA_TYPES: &[&str] = &[
    "application/xhtml+xml",
    "text/html",
    "application/x-dtbook+xml",
];

/// An opened EPUB container
///
/// Holds every manifest item plus the reading order of the document-body
/// sections. Read-only once loaded; each request owns its own instance.
#[derive(Debug, Clone)]
pub struct Archive {
    /// Book metadata
    pub metadata: BookMetadata,
    /// Every manifest item, in manifest order
    sections: Vec<ContentSection>,
    /// Indices into `sections` of the document-body items, in spine order
    reading_order: Vec<usize>,
}

impl Archive {
    pub(crate) fn new(
        metadata: BookMetadata,
        sections: Vec<ContentSection>,
        reading_order: Vec<usize>,
    ) -> Self {
        Self {
            metadata,
            sections,
            reading_order,
        }
    }

    /// All manifest items, including images and stylesheets
    pub fn sections(&self) -> &[ContentSection] {
        &self.sections
    }

    /// Document-body sections in reading order
    pub fn documents(&self) -> impl Iterator<Item = &ContentSection> + '_ {
        self.reading_order.iter().map(|&i| &self.sections[i])
    }

    /// Number of document-body sections in reading order
    pub fn document_count(&self) -> usize {
        self.reading_order.len()
    }

    /// Document-body section at a 0-based reading-order offset
    pub fn document(&self, offset: usize) -> Option<&ContentSection> {
        self.reading_order
            .get(offset)
            .and_then(|&i| self.sections.get(i))
    }
}

/// Book metadata extracted from the OPF package document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookMetadata {
    pub title: Option<String>,
    /// First `dc:creator`
    pub author: Option<String>,
    pub language: Option<String>,
    pub identifier: Option<String>,
}

/// Kind of a manifest item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionKind {
    /// XHTML/HTML markup making up the book's text
    Document,
    /// Images, stylesheets, fonts, navigation files
    Resource,
}

impl SectionKind {
    /// Classify a manifest `media-type` attribute
    pub fn from_media_type(media_type: &str) -> Self {
        let essence = media_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        if DOCUMENT_MEDIA_TYPES.contains(&essence.as_str()) {
            SectionKind::Document
        } else {
            SectionKind::Resource
        }
    }
}

/// One manifest item and, for reading-order documents, its payload
#[derive(Debug, Clone)]
pub struct ContentSection {
    /// Manifest id
    pub id: String,
    /// Path of the item inside the ZIP archive
    pub href: String,
    /// Declared MIME type
    pub media_type: String,
    pub kind: SectionKind,
    /// Position in the spine, `None` for items outside the reading order
    pub position: Option<usize>,
    /// Inflated bytes; empty for items outside the reading order
    pub data: Vec<u8>,
}

impl ContentSection {
    pub fn is_document(&self) -> bool {
        self.kind == SectionKind::Document
    }
}
