//! Command-line argument definitions and helpers.

use std::path::PathBuf;

use clap::Args;
use thiserror::Error;

use crate::model::ContentId;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur during argument processing.
#[derive(Debug, Error)]
pub enum ArgsError {
    /// I/O error reading an input file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid argument combination.
    #[error("{0}")]
    InvalidArgs(String),

    /// An input file yielded no CIDs.
    #[error("no CIDs found in {0}")]
    EmptyInput(PathBuf),
}

/// Result type for argument operations.
pub type Result<T> = std::result::Result<T, ArgsError>;

// =============================================================================
// CID Input
// =============================================================================

/// Helper for commands that take root CIDs either directly or from a file.
///
/// Input files may be plain text (one CID per line) or delimited with a
/// header row naming a `cid` column. Lines starting with `#` are skipped in
/// both formats.
#[derive(Args, Debug, Default)]
pub struct CidInput {
    /// Root CIDs given directly on the command line.
    #[arg(value_name = "CID")]
    pub cids: Vec<String>,

    /// Read root CIDs from a file instead.
    #[arg(short = 'f', long = "file", value_name = "PATH")]
    pub file: Option<PathBuf>,
}

impl CidInput {
    /// Resolve the input to a list of CIDs.
    pub async fn resolve(&self) -> Result<Vec<ContentId>> {
        match (&self.cids[..], &self.file) {
            ([_, ..], Some(_)) => Err(ArgsError::InvalidArgs(
                "cannot specify both CID arguments and --file".to_string(),
            )),
            ([], None) => Err(ArgsError::InvalidArgs(
                "must specify CID arguments or --file".to_string(),
            )),
            (cids, None) => Ok(cids.to_vec()),
            ([], Some(path)) => {
                let content = tokio::fs::read_to_string(path).await?;
                let cids = parse_cid_lines(&content);
                if cids.is_empty() {
                    return Err(ArgsError::EmptyInput(path.clone()));
                }
                Ok(cids)
            }
        }
    }
}

/// Parse CIDs out of an input file's contents.
///
/// A first data line containing a delimiter with a case-insensitive `cid`
/// cell switches to delimited mode; otherwise every line is one CID.
pub fn parse_cid_lines(content: &str) -> Vec<ContentId> {
    let mut lines = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'));

    let first = match lines.next() {
        Some(first) => first,
        None => return Vec::new(),
    };

    if let Some(column) = cid_column(first) {
        lines
            .filter_map(|line| split_delimited(line).nth(column))
            .map(|cell| cell.trim().to_string())
            .filter(|cell| !cell.is_empty())
            .collect()
    } else {
        std::iter::once(first)
            .chain(lines)
            .map(str::to_string)
            .collect()
    }
}

/// Index of the `cid` column if the line looks like a header row.
fn cid_column(line: &str) -> Option<usize> {
    if !line.contains(',') && !line.contains('\t') {
        return None;
    }
    split_delimited(line).position(|cell| cell.trim().eq_ignore_ascii_case("cid"))
}

fn split_delimited(line: &str) -> impl Iterator<Item = &str> {
    line.split(|c| c == ',' || c == '\t')
}

// =============================================================================
// Output Location
// =============================================================================

/// Helper for commands that write archive files.
#[derive(Args, Debug)]
pub struct OutputArgs {
    /// Directory where archive files are written.
    #[arg(long = "output-dir", value_name = "DIR", default_value = ".")]
    pub output_dir: PathBuf,
}

impl Default for OutputArgs {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
        }
    }
}

impl OutputArgs {
    /// Write an archive file into the output directory.
    pub async fn write_archive(&self, filename: &str, data: &[u8]) -> Result<PathBuf> {
        let path = self.output_dir.join(filename);
        tokio::fs::write(&path, data).await?;
        Ok(path)
    }
}

/// Parse a name override from "cid=name" format.
pub fn parse_name_override(s: &str) -> std::result::Result<(String, String), String> {
    let (cid, name) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid name override '{}': expected cid=name", s))?;
    if cid.is_empty() || name.is_empty() {
        return Err(format!("invalid name override '{}': expected cid=name", s));
    }
    Ok((cid.to_string(), name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_lines() {
        let cids = parse_cid_lines("cid-one\ncid-two\n\n# comment\ncid-three\n");
        assert_eq!(cids, vec!["cid-one", "cid-two", "cid-three"]);
    }

    #[test]
    fn test_csv_with_cid_column() {
        let cids = parse_cid_lines("identifier,CID,size\nitem1,cid-a,10\nitem2,cid-b,20\n");
        assert_eq!(cids, vec!["cid-a", "cid-b"]);
    }

    #[test]
    fn test_tsv_with_cid_column() {
        let cids = parse_cid_lines("cid\tnote\ncid-a\tfirst\n");
        assert_eq!(cids, vec!["cid-a"]);
    }

    #[test]
    fn test_comments_inside_csv_are_skipped() {
        let cids = parse_cid_lines("cid,note\n# skip me\ncid-a,x\n");
        assert_eq!(cids, vec!["cid-a"]);
    }

    #[test]
    fn test_line_with_commas_but_no_cid_header_is_plain() {
        // No recognizable header, so the whole line is one entry.
        let cids = parse_cid_lines("cid-with,comma\n");
        assert_eq!(cids, vec!["cid-with,comma"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_cid_lines("# nothing here\n\n").is_empty());
    }

    #[test]
    fn test_parse_name_override() {
        assert_eq!(
            parse_name_override("cid-a=scans").unwrap(),
            ("cid-a".to_string(), "scans".to_string())
        );
        assert!(parse_name_override("no-equals").is_err());
        assert!(parse_name_override("=name").is_err());
    }

    #[tokio::test]
    async fn test_resolve_rejects_both_sources() {
        let input = CidInput {
            cids: vec!["cid-a".to_string()],
            file: Some(PathBuf::from("list.txt")),
        };
        assert!(matches!(
            input.resolve().await,
            Err(ArgsError::InvalidArgs(_))
        ));
    }

    #[tokio::test]
    async fn test_resolve_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("list.csv");
        tokio::fs::write(&path, "cid\ncid-a\ncid-b\n").await.unwrap();

        let input = CidInput {
            cids: vec![],
            file: Some(path),
        };
        assert_eq!(input.resolve().await.unwrap(), vec!["cid-a", "cid-b"]);
    }
}
