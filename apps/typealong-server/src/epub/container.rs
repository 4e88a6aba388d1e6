//! EPUB container loader
//!
//! Opens the ZIP container, follows `META-INF/container.xml` to the OPF
//! package document and reads its metadata, manifest and spine.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, ErrorKind, Read, Seek};
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;
use zip::result::ZipError;
use zip::ZipArchive;

use super::types::{Archive, BookMetadata, ContentSection, SectionKind};

const CONTAINER_PATH: &str = "META-INF/container.xml";

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("EPUB not found: {0}")]
    NotFound(String),
    #[error("Malformed EPUB: {0}")]
    Malformed(String),
}

impl From<ZipError> for LoadError {
    fn from(err: ZipError) -> Self {
        LoadError::Malformed(err.to_string())
    }
}

impl From<quick_xml::Error> for LoadError {
    fn from(err: quick_xml::Error) -> Self {
        LoadError::Malformed(format!("XML error: {}", err))
    }
}

/// Largest inflated size accepted for any single archive entry
pub const DEFAULT_MAX_SECTION_BYTES: usize = 16 * 1024 * 1024;

/// Open and parse the EPUB stored at `path`
pub fn load<P: AsRef<Path>>(path: P) -> Result<Archive, LoadError> {
    load_with_limit(path, DEFAULT_MAX_SECTION_BYTES)
}

/// Like [`load`], refusing any entry that inflates past `max_section_bytes`
pub fn load_with_limit<P: AsRef<Path>>(
    path: P,
    max_section_bytes: usize,
) -> Result<Archive, LoadError> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(LoadError::NotFound(path.display().to_string()));
    }

    let file = File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => LoadError::NotFound(path.display().to_string()),
        _ => LoadError::Malformed(format!("{}: {}", path.display(), e)),
    })?;

    let archive = load_from_reader_with_limit(BufReader::new(file), max_section_bytes)?;

    tracing::debug!(
        path = %path.display(),
        sections = archive.sections().len(),
        documents = archive.document_count(),
        "Loaded EPUB"
    );

    Ok(archive)
}

/// Parse an EPUB from any seekable reader (uploaded bytes, files)
pub fn load_from_reader<R: Read + Seek>(reader: R) -> Result<Archive, LoadError> {
    load_from_reader_with_limit(reader, DEFAULT_MAX_SECTION_BYTES)
}

/// Like [`load_from_reader`], refusing any entry that inflates past
/// `max_section_bytes`
///
/// Only document-body items in the reading order are inflated. Every other
/// manifest item is listed without a payload.
pub fn load_from_reader_with_limit<R: Read + Seek>(
    reader: R,
    max_section_bytes: usize,
) -> Result<Archive, LoadError> {
    let mut zip = ZipArchive::new(reader)?;

    let opf_path = locate_package(&mut zip, max_section_bytes)?;
    let opf_bytes = read_entry(&mut zip, &opf_path, max_section_bytes)?.ok_or_else(|| {
        LoadError::Malformed(format!("package document {} is missing", opf_path))
    })?;
    let package = parse_package(&decode_utf8(&opf_bytes, &opf_path)?)?;

    // Manifest hrefs are relative to the OPF directory
    let base = opf_path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("");

    let mut positions: HashMap<&str, usize> = HashMap::new();
    for (position, idref) in package.spine.iter().enumerate() {
        positions.entry(idref.as_str()).or_insert(position);
    }

    let mut sections = Vec::with_capacity(package.manifest.len());
    for item in &package.manifest {
        let href = resolve_href(base, &item.href);
        let kind = SectionKind::from_media_type(&item.media_type);
        let position = positions.get(item.id.as_str()).copied();

        let data = if kind == SectionKind::Document && position.is_some() {
            match read_entry(&mut zip, &href, max_section_bytes)? {
                Some(data) => data,
                None => {
                    tracing::warn!(id = %item.id, href = %href, "Manifest item missing from archive");
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        sections.push(ContentSection {
            id: item.id.clone(),
            href,
            media_type: item.media_type.clone(),
            kind,
            position,
            data,
        });
    }

    let index_by_id: HashMap<&str, usize> = sections
        .iter()
        .enumerate()
        .map(|(i, section)| (section.id.as_str(), i))
        .collect();

    let mut reading_order = Vec::with_capacity(package.spine.len());
    for idref in &package.spine {
        match index_by_id.get(idref.as_str()) {
            Some(&i) if sections[i].is_document() => reading_order.push(i),
            Some(_) => {}
            None => tracing::warn!(idref = %idref, "Spine item not in manifest, skipping"),
        }
    }

    Ok(Archive::new(package.metadata, sections, reading_order))
}

/// Find the OPF path, via container.xml or the first `.opf` entry
fn locate_package<R: Read + Seek>(
    zip: &mut ZipArchive<R>,
    max_bytes: usize,
) -> Result<String, LoadError> {
    if let Some(bytes) = read_entry(zip, CONTAINER_PATH, max_bytes)? {
        let xml = decode_utf8(&bytes, CONTAINER_PATH)?;
        return parse_container(&xml)?
            .ok_or_else(|| LoadError::Malformed("container.xml declares no rootfile".to_string()));
    }

    // Some producers omit container.xml entirely
    let fallback = zip
        .file_names()
        .filter(|name| name.to_ascii_lowercase().ends_with(".opf"))
        .min()
        .map(str::to_string);

    match fallback {
        Some(path) => {
            tracing::warn!(opf = %path, "No container.xml, using first package document");
            Ok(path)
        }
        None => Err(LoadError::Malformed(format!("missing {}", CONTAINER_PATH))),
    }
}

/// Inflate one entry, failing once more than `max_bytes` come out of it
///
/// The size in the ZIP header is only a hint; the read itself is bounded.
fn read_entry<R: Read + Seek>(
    zip: &mut ZipArchive<R>,
    name: &str,
    max_bytes: usize,
) -> Result<Option<Vec<u8>>, LoadError> {
    let entry = match zip.by_name(name) {
        Ok(entry) => entry,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let too_large = || {
        LoadError::Malformed(format!(
            "{} inflates past the {} byte section limit",
            name, max_bytes
        ))
    };

    let declared = entry.size();
    if declared > max_bytes as u64 {
        return Err(too_large());
    }

    let mut data = Vec::with_capacity(declared as usize);
    entry
        .take((max_bytes as u64).saturating_add(1))
        .read_to_end(&mut data)
        .map_err(|e| LoadError::Malformed(format!("failed to read {}: {}", name, e)))?;

    if data.len() > max_bytes {
        return Err(too_large());
    }

    Ok(Some(data))
}

fn decode_utf8(bytes: &[u8], name: &str) -> Result<String, LoadError> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    String::from_utf8(bytes.to_vec())
        .map_err(|e| LoadError::Malformed(format!("{} is not valid UTF-8: {}", name, e)))
}

fn parse_container(xml: &str) -> Result<Option<String>, LoadError> {
    let mut reader = Reader::from_str(xml);

    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"rootfile" => {
                if let Some(path) = attribute(&e, b"full-path")? {
                    let path = path.trim().trim_start_matches('/');
                    if !path.is_empty() {
                        return Ok(Some(path.to_string()));
                    }
                }
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
    }
}

/// The parts of the OPF package document the loader needs
struct PackageDocument {
    metadata: BookMetadata,
    manifest: Vec<ManifestEntry>,
    /// `idref`s in spine order
    spine: Vec<String>,
}

struct ManifestEntry {
    id: String,
    href: String,
    media_type: String,
}

#[derive(Debug, Clone, Copy)]
enum MetaField {
    Title,
    Creator,
    Language,
    Identifier,
}

impl MetaField {
    fn from_tag(name: &[u8]) -> Option<Self> {
        match name {
            b"title" => Some(MetaField::Title),
            b"creator" => Some(MetaField::Creator),
            b"language" => Some(MetaField::Language),
            b"identifier" => Some(MetaField::Identifier),
            _ => None,
        }
    }

    /// Record `value` unless the field is already set (first one wins)
    fn apply(self, metadata: &mut BookMetadata, value: &str) {
        let value = value.trim();
        if value.is_empty() {
            return;
        }
        let slot = match self {
            MetaField::Title => &mut metadata.title,
            MetaField::Creator => &mut metadata.author,
            MetaField::Language => &mut metadata.language,
            MetaField::Identifier => &mut metadata.identifier,
        };
        if slot.is_none() {
            *slot = Some(value.to_string());
        }
    }
}

fn parse_package(xml: &str) -> Result<PackageDocument, LoadError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut metadata = BookMetadata::default();
    let mut manifest = Vec::new();
    let mut spine = Vec::new();
    let mut has_manifest = false;
    let mut in_metadata = false;
    let mut field: Option<MetaField> = None;
    let mut text = String::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"metadata" => in_metadata = true,
                b"manifest" => has_manifest = true,
                b"item" => push_manifest_item(&e, &mut manifest)?,
                b"itemref" => push_spine_item(&e, &mut spine)?,
                name if in_metadata => {
                    field = MetaField::from_tag(name);
                    text.clear();
                }
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"manifest" => has_manifest = true,
                b"item" => push_manifest_item(&e, &mut manifest)?,
                b"itemref" => push_spine_item(&e, &mut spine)?,
                _ => {}
            },
            Event::Text(e) if field.is_some() => match e.unescape() {
                Ok(value) => text.push_str(&value),
                // HTML entities such as &nbsp; are not predefined in XML
                Err(_) => text.push_str(&html_escape::decode_html_entities(
                    &String::from_utf8_lossy(&e),
                )),
            },
            Event::CData(e) if field.is_some() => text.push_str(&String::from_utf8_lossy(&e)),
            Event::End(e) => {
                if e.local_name().as_ref() == b"metadata" {
                    in_metadata = false;
                }
                if let Some(field) = field.take() {
                    field.apply(&mut metadata, &text);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !has_manifest {
        return Err(LoadError::Malformed(
            "package document has no manifest".to_string(),
        ));
    }

    Ok(PackageDocument {
        metadata,
        manifest,
        spine,
    })
}

fn push_manifest_item(e: &BytesStart<'_>, manifest: &mut Vec<ManifestEntry>) -> Result<(), LoadError> {
    let id = attribute(e, b"id")?;
    let href = attribute(e, b"href")?;

    match (id, href) {
        (Some(id), Some(href)) => {
            let media_type = attribute(e, b"media-type")?.unwrap_or_default();
            manifest.push(ManifestEntry {
                id,
                href,
                media_type,
            });
        }
        (id, href) => {
            tracing::warn!(?id, ?href, "Manifest item without id or href, skipping");
        }
    }

    Ok(())
}

fn push_spine_item(e: &BytesStart<'_>, spine: &mut Vec<String>) -> Result<(), LoadError> {
    if let Some(idref) = attribute(e, b"idref")? {
        spine.push(idref);
    }
    Ok(())
}

/// Look up an attribute by local name and unescape its value
fn attribute(e: &BytesStart<'_>, name: &[u8]) -> Result<Option<String>, LoadError> {
    for attr in e.attributes() {
        let attr = attr.map_err(|err| LoadError::Malformed(format!("bad attribute: {}", err)))?;
        if attr.key.local_name().as_ref() == name {
            let value = match attr.unescape_value() {
                Ok(value) => value.into_owned(),
                Err(_) => html_escape::decode_html_entities(&String::from_utf8_lossy(&attr.value))
                    .into_owned(),
            };
            return Ok(Some(value));
        }
    }
    Ok(None)
}

/// Resolve a manifest href against the OPF directory into a ZIP entry name
fn resolve_href(base: &str, href: &str) -> String {
    let href = href.split('#').next().unwrap_or_default();
    let href = urlencoding::decode(href)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| href.to_string());

    let joined = if base.is_empty() || href.starts_with('/') {
        href.trim_start_matches('/').to_string()
    } else {
        format!("{}/{}", base, href)
    };

    let mut segments: Vec<&str> = Vec::new();
    for segment in joined.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            segment => segments.push(segment),
        }
    }

    segments.join("/")
}
