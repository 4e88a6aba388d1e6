//! TypeAlong Server Library
//!
//! Serves uploaded EPUB books one page of words at a time for typing
//! practice. The server binary is in main.rs.
//!
//! # Modules
//!
//! - `epub`: Container loading, text extraction and pagination
//! - `storage`: Upload store for submitted EPUB files
//! - `vocab`: Random practice words
//! - `proxy`: Remote EPUB download relay
//! - `routes`: HTTP endpoints

pub mod config;
pub mod epub;
pub mod error;
pub mod proxy;
pub mod routes;
pub mod state;
pub mod storage;
pub mod vocab;
