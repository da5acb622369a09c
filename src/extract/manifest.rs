//! Parser for archival files-listing documents (`*_files.xml`).
//!
//! The document shape is a `<files>` root holding `<file>` elements with
//! `name`/`source` attributes and optional metadata children:
//!
//! ```text
//! <files>
//!   <file name="item/page1.jp2" source="original">
//!     <mtime>1622133781</mtime>
//!     <size>102400</size>
//!     <md5>...</md5>
//!     <format>JPEG 2000</format>
//!   </file>
//! </files>
//! ```
//!
//! Parsing is a single conversion boundary: the raw markup is turned into
//! typed records here and never touched again downstream.

use thiserror::Error;
use tracing::debug;

/// Error type for manifest parsing. Fatal for the enclosing extraction.
#[derive(Debug, Error)]
pub enum ManifestParseError {
    #[error("manifest is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    #[error("malformed manifest: {0}")]
    Malformed(String),
}

/// One record of a files listing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ManifestFile {
    /// Path of the file relative to the item root.
    pub name: String,
    /// Provenance marker (`original`, `derivative`, `metadata`, ...).
    pub source: String,
    pub mtime: Option<String>,
    pub size: Option<u64>,
    pub md5: Option<String>,
    pub crc32: Option<String>,
    pub sha1: Option<String>,
    pub format: Option<String>,
}

/// The parsed representation of a files-listing document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionManifest {
    pub files: Vec<ManifestFile>,
}

/// Parse a files-listing document.
///
/// Records without a `name` attribute are dropped; a document without a
/// `<files>` root is malformed.
pub fn parse_files_manifest(content: &[u8]) -> Result<ExtractionManifest, ManifestParseError> {
    let text = std::str::from_utf8(content)?;

    if !text.contains("<files") {
        return Err(ManifestParseError::Malformed(
            "missing <files> root element".to_string(),
        ));
    }
    if !text.contains("</files>") {
        return Err(ManifestParseError::Malformed(
            "unterminated <files> element".to_string(),
        ));
    }

    let mut files = Vec::new();
    // "<file " (with a space) matches the entries but not the "<files>" root.
    for part in text.split("<file ").skip(1) {
        let fragment = match part.find("</file>") {
            Some(pos) => &part[..pos],
            None => {
                // Self-closing entries carry attributes only.
                match part.find("/>") {
                    Some(pos) => &part[..pos],
                    None => {
                        return Err(ManifestParseError::Malformed(
                            "unterminated <file> element".to_string(),
                        ))
                    }
                }
            }
        };

        let name = match extract_attribute(fragment, "name") {
            Some(name) if !name.is_empty() => name,
            _ => continue,
        };
        let source = extract_attribute(fragment, "source").unwrap_or_default();

        files.push(ManifestFile {
            name,
            source,
            mtime: extract_tag_content(fragment, "mtime"),
            size: extract_tag_content(fragment, "size").and_then(|s| s.parse().ok()),
            md5: extract_tag_content(fragment, "md5"),
            crc32: extract_tag_content(fragment, "crc32"),
            sha1: extract_tag_content(fragment, "sha1"),
            format: extract_tag_content(fragment, "format"),
        });
    }

    debug!(records = files.len(), "parsed files manifest");
    Ok(ExtractionManifest { files })
}

/// Extract an attribute value from an element fragment.
fn extract_attribute(fragment: &str, attr: &str) -> Option<String> {
    // The attribute section ends at the first '>'.
    let attrs = match fragment.find('>') {
        Some(pos) => &fragment[..pos],
        None => fragment,
    };
    for quote in ['"', '\''] {
        let pattern = format!("{}={}", attr, quote);
        if let Some(pos) = attrs.find(&pattern) {
            let after = &attrs[pos + pattern.len()..];
            if let Some(end) = after.find(quote) {
                return Some(xml_unescape(&after[..end]));
            }
        }
    }
    None
}

/// Extract the text content of the first matching child tag.
fn extract_tag_content(fragment: &str, tag: &str) -> Option<String> {
    let open = format!("<{}>", tag);
    let close = format!("</{}>", tag);
    let start = fragment.find(&open)? + open.len();
    let end = fragment[start..].find(&close)? + start;
    let value = fragment[start..end].trim();
    if value.is_empty() {
        None
    } else {
        Some(xml_unescape(value))
    }
}

/// Unescape standard XML entities.
fn xml_unescape(s: &str) -> String {
    s.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
}
