//! Extension-based entry classification.
//!
//! Confirming whether a directory entry is a file or a subdirectory costs a
//! store round trip per entry. Archival collections are dominated by files
//! with well-known extensions, so a name whose extension is in the table
//! below can be taken as a file without asking the store. Anything else stays
//! `Unknown` and must be confirmed by the caller.

/// Result of classifying an entry by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// The extension marks this as a file; no store lookup needed.
    KnownFile,
    /// The name marks this as a directory; no store lookup needed.
    KnownDirectory,
    /// The name alone is not enough; confirm via the store.
    Unknown,
}

/// File extensions that always denote leaf files, lowercase, sorted.
///
/// Drawn from the formats that appear in archival item listings: metadata
/// documents, text, images, audio, video, and container formats.
static KNOWN_FILE_EXTENSIONS: &[&str] = &[
    "7z", "avi", "bmp", "csv", "djvu", "epub", "flac", "gif", "gz", "htm", "html", "jp2", "jpeg",
    "jpg", "json", "log", "md", "mkv", "mobi", "mp3", "mp4", "mpeg", "mpg", "ogg", "ogv", "pdf",
    "png", "rar", "sqlite", "tar", "tif", "tiff", "torrent", "txt", "wav", "webm", "xml", "zip",
];

/// Classify an entry by its name.
///
/// With `force_check` set this always returns [`Classification::Unknown`],
/// forcing the caller down the exact (store-confirmed) path. Pure function of
/// its inputs and the static extension table.
pub fn classify(name: &str, force_check: bool) -> Classification {
    if force_check {
        return Classification::Unknown;
    }
    match extension_of(name) {
        Some(ext) if KNOWN_FILE_EXTENSIONS.binary_search(&ext.as_str()).is_ok() => {
            Classification::KnownFile
        }
        _ => Classification::Unknown,
    }
}

/// Extract the lowercase extension of a name, if it has one.
///
/// A trailing dot or a dotfile without a further dot yields `None`.
fn extension_of(name: &str) -> Option<String> {
    let idx = name.rfind('.')?;
    let ext = &name[idx + 1..];
    if ext.is_empty() || idx == 0 {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_extensions_are_files() {
        assert_eq!(classify("item_meta.xml", false), Classification::KnownFile);
        assert_eq!(classify("scan.jp2", false), Classification::KnownFile);
        assert_eq!(classify("audio.FLAC", false), Classification::KnownFile);
        assert_eq!(classify("book.pdf", false), Classification::KnownFile);
    }

    #[test]
    fn test_unrecognized_names_are_unknown() {
        assert_eq!(classify("subdir", false), Classification::Unknown);
        assert_eq!(classify("archive.xyz", false), Classification::Unknown);
        assert_eq!(classify("trailing.", false), Classification::Unknown);
        assert_eq!(classify(".hidden", false), Classification::Unknown);
    }

    #[test]
    fn test_force_check_overrides_heuristic() {
        assert_eq!(classify("item_meta.xml", true), Classification::Unknown);
        assert_eq!(classify("subdir", true), Classification::Unknown);
    }

    #[test]
    fn test_extension_table_is_sorted() {
        let mut sorted = KNOWN_FILE_EXTENSIONS.to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, KNOWN_FILE_EXTENSIONS);
    }
}
