//! CSV manifest parsing
//!
//! The first row is a header naming the columns; every following row
//! describes one object. Rows are streamed, never loaded all at once.
//! Header names are trimmed and lowercased, cells are trimmed, and blank
//! cells are left out of the row's attributes.

use csv::{ReaderBuilder, StringRecordsIntoIter, Trim};
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

use crate::attributes::Attributes;
use crate::error::{ImportError, Result};

/// Reserved column selecting the model for a single row
pub const TYPE_COLUMN: &str = "type";

/// One data row of the manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowRecord {
    /// 1-based line number in the manifest (the header is line 1)
    pub line: u64,
    pub attributes: Attributes,
    type_override: Option<String>,
}

impl RowRecord {
    pub fn new(line: u64, attributes: Attributes, type_override: Option<String>) -> Self {
        Self {
            line,
            attributes,
            type_override,
        }
    }

    pub fn type_override(&self) -> Option<&str> {
        self.type_override.as_deref()
    }

    /// Remove and return the row's model override
    pub fn take_type_override(&mut self) -> Option<String> {
        self.type_override.take()
    }
}

/// Entry point for reading manifests
pub struct ManifestParser;

impl ManifestParser {
    /// Open a manifest file and read its header
    pub fn open(path: impl AsRef<Path>) -> Result<ManifestRows<File>> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ImportError::ManifestOpen {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "Opened manifest");
        Self::from_reader(file)
    }

    /// Read a manifest from any reader
    pub fn from_reader<R: Read>(reader: R) -> Result<ManifestRows<R>> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .trim(Trim::All)
            .from_reader(reader);

        let raw_headers = reader.headers().map_err(header_error)?.clone();
        if raw_headers.is_empty() {
            return Err(ImportError::ManifestFormat {
                line: None,
                reason: "manifest has no header row".to_string(),
            });
        }

        let mut seen = HashSet::new();
        let mut headers = Vec::with_capacity(raw_headers.len());
        for (index, header) in raw_headers.iter().enumerate() {
            let header = header.to_lowercase();
            if header.is_empty() {
                return Err(ImportError::ManifestFormat {
                    line: None,
                    reason: format!("header column {} has no name", index + 1),
                });
            }
            if !seen.insert(header.clone()) {
                return Err(ImportError::ManifestFormat {
                    line: None,
                    reason: format!("duplicate header column '{}'", header),
                });
            }
            headers.push(header);
        }

        let type_index = headers.iter().position(|h| h == TYPE_COLUMN);

        Ok(ManifestRows {
            headers,
            type_index,
            records: reader.into_records(),
        })
    }
}

/// Streaming iterator over manifest rows
pub struct ManifestRows<R> {
    headers: Vec<String>,
    type_index: Option<usize>,
    records: StringRecordsIntoIter<R>,
}

impl<R> ManifestRows<R> {
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.headers.iter().any(|h| h.eq_ignore_ascii_case(name))
    }
}

impl<R: Read> Iterator for ManifestRows<R> {
    type Item = Result<RowRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = match self.records.next()? {
            Ok(record) => record,
            Err(e) => return Some(Err(format_error(e))),
        };
        let line = record.position().map(|p| p.line()).unwrap_or_default();

        let mut attributes = Attributes::with_capacity(self.headers.len());
        let mut type_override = None;
        for (index, (header, value)) in self.headers.iter().zip(record.iter()).enumerate() {
            if value.is_empty() {
                continue;
            }
            if Some(index) == self.type_index {
                type_override = Some(value.to_string());
            } else {
                attributes.insert(header.clone(), value.to_string());
            }
        }

        Some(Ok(RowRecord::new(line, attributes, type_override)))
    }
}

/// Header problems are never tied to a data row
fn header_error(err: csv::Error) -> ImportError {
    let reason = match err.kind() {
        csv::ErrorKind::Utf8 { .. } => "header is not valid UTF-8".to_string(),
        _ => format!("could not read header: {}", err),
    };
    ImportError::ManifestFormat { line: None, reason }
}

fn format_error(err: csv::Error) -> ImportError {
    let line = err.position().map(|p| p.line());
    let reason = match err.kind() {
        csv::ErrorKind::UnequalLengths {
            expected_len, len, ..
        } => format!("expected {} columns, found {}", expected_len, len),
        csv::ErrorKind::Utf8 { .. } => "row is not valid UTF-8".to_string(),
        _ => err.to_string(),
    };
    ImportError::ManifestFormat { line, reason }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn rows(manifest: &str) -> Vec<Result<RowRecord>> {
        ManifestParser::from_reader(Cursor::new(manifest.to_string()))
            .unwrap()
            .collect()
    }

    #[test]
    fn test_rows_map_to_header_names() {
        let manifest = "title,type,file\n\"Sample Dataset\",Dataset,data.csv\n";
        let parsed = rows(manifest);
        assert_eq!(parsed.len(), 1);

        let row = parsed.into_iter().next().unwrap().unwrap();
        assert_eq!(row.line, 2);
        assert_eq!(row.type_override(), Some("Dataset"));
        assert_eq!(row.attributes.get("title").unwrap(), "Sample Dataset");
        assert_eq!(row.attributes.get("file").unwrap(), "data.csv");
        assert!(!row.attributes.contains_key(TYPE_COLUMN));
    }

    #[test]
    fn test_headers_are_normalized_and_cells_trimmed() {
        let manifest = " Title , Creator \n  A title ,  Someone  \n";
        let parser = ManifestParser::from_reader(Cursor::new(manifest)).unwrap();
        assert_eq!(parser.headers(), &["title".to_string(), "creator".to_string()]);
        assert!(parser.has_column("TITLE"));

        let row = parser.into_iter().next().unwrap().unwrap();
        assert_eq!(row.attributes.get("title").unwrap(), "A title");
        assert_eq!(row.attributes.get("creator").unwrap(), "Someone");
    }

    #[test]
    fn test_blank_cells_are_omitted() {
        let row = rows("title,type,creator\nOnly title,,\n")
            .into_iter()
            .next()
            .unwrap()
            .unwrap();
        assert_eq!(row.attributes.len(), 1);
        assert_eq!(row.type_override(), None);
    }

    #[test]
    fn test_take_type_override() {
        let mut row = rows("title,type\nT,Collection\n").remove(0).unwrap();
        assert_eq!(row.take_type_override().as_deref(), Some("Collection"));
        assert_eq!(row.take_type_override(), None);
    }

    #[test]
    fn test_empty_manifest_has_no_header() {
        let err = ManifestParser::from_reader(Cursor::new("")).err().unwrap();
        assert!(matches!(err, ImportError::ManifestFormat { line: None, .. }));
    }

    #[test]
    fn test_duplicate_and_blank_headers_are_rejected() {
        let err = ManifestParser::from_reader(Cursor::new("title,Title\na,b\n")).err().unwrap();
        assert!(err.to_string().contains("duplicate header column 'title'"));

        let err = ManifestParser::from_reader(Cursor::new("title,,file\na,b,c\n")).err().unwrap();
        assert!(err.to_string().contains("column 2 has no name"));
    }

    #[test]
    fn test_invalid_utf8_header_is_a_header_error() {
        let err = ManifestParser::from_reader(Cursor::new(&b"ti\xfftle,type\nA,Dataset\n"[..]))
            .err()
            .unwrap();
        match &err {
            ImportError::ManifestFormat { line, reason } => {
                assert_eq!(*line, None);
                assert_eq!(reason, "header is not valid UTF-8");
            },
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(err.kind(), crate::error::ErrorKind::Configuration);
        assert_eq!(err.kind().exit_code(), 2);
    }

    #[test]
    fn test_invalid_utf8_row_keeps_its_line() {
        let parsed: Vec<_> = ManifestParser::from_reader(Cursor::new(&b"title\nok\nba\xffd\n"[..]))
            .unwrap()
            .collect();
        assert!(parsed[0].is_ok());
        match &parsed[1] {
            Err(ImportError::ManifestFormat { line, reason }) => {
                assert_eq!(*line, Some(3));
                assert_eq!(reason, "row is not valid UTF-8");
            },
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_column_count_mismatch_reports_line() {
        let parsed = rows("title,file\nok,a.csv\ntoo,many,cells\n");
        assert!(parsed[0].is_ok());
        match &parsed[1] {
            Err(ImportError::ManifestFormat { line, reason }) => {
                assert_eq!(*line, Some(3));
                assert!(reason.contains("expected 2 columns, found 3"));
            },
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_header_only_manifest_yields_no_rows() {
        assert!(rows("title,type\n").is_empty());
    }

    #[test]
    fn test_open_missing_file() {
        let err = ManifestParser::open("/nonexistent/manifest.csv").err().unwrap();
        assert!(matches!(err, ImportError::ManifestOpen { .. }));
    }
}
