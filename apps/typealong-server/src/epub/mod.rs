//! EPUB loading, text extraction and pagination
//!
//! Every request opens its own [`Archive`]; nothing here is cached or shared.
//!
//! ```rust,ignore
//! use typealong_server::epub;
//!
//! let archive = epub::load("uploaded_epubs/3f2c....epub")?;
//! let words = epub::page_words(&archive, 1)?;
//! ```

mod container;
mod pager;
mod text;
mod types;

#[cfg(test)]
pub(crate) mod fixture;

pub use container::{
    load, load_from_reader, load_from_reader_with_limit, load_with_limit, LoadError,
    DEFAULT_MAX_SECTION_BYTES,
};
pub use pager::{page_count, page_words, PageError};
pub use text::{extract, split_words};
pub use types::{Archive, BookMetadata, ContentSection, SectionKind};
