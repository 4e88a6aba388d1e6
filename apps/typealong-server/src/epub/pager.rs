//! Page lookup
//!
//! A page is the Nth document-body section in reading order, counted from 1.

use thiserror::Error;

use super::text;
use super::types::Archive;

#[derive(Debug, Error)]
pub enum PageError {
    #[error("Page {page} is out of range: the book has {available} pages")]
    OutOfRange { page: i64, available: usize },
}

/// Number of pages (document-body sections) in the archive
pub fn page_count(archive: &Archive) -> usize {
    archive.document_count()
}

/// Words of the 1-based `page`
pub fn page_words(archive: &Archive, page: i64) -> Result<Vec<String>, PageError> {
    let available = page_count(archive);
    let section = page_offset(page, available)
        .and_then(|offset| archive.document(offset))
        .ok_or(PageError::OutOfRange { page, available })?;

    let words = text::extract(&section.data);
    tracing::trace!(page, href = %section.href, words = ?words, "Extracted page words");

    Ok(words)
}

fn page_offset(page: i64, available: usize) -> Option<usize> {
    let offset = usize::try_from(page.checked_sub(1)?).ok()?;
    (offset < available).then_some(offset)
}
