//! Tabular normalization: raw upload bytes to one canonical text form.
//!
//! Two uploads with the same cell contents must normalize to byte-identical
//! text, whatever their line endings, BOM, or trailing-newline situation.
//! Everything downstream (the fingerprint in particular) hashes the canonical
//! text, never the raw bytes.

use crate::error::AttestError;
use crate::models::RawUpload;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// A parsed table together with its canonical serialization.
///
/// Canonical form: every row re-serialized with `,` separators, quoting only
/// where a cell requires it, and a single `\n` terminating every row
/// including the last. The struct is only constructed by [`normalize`], so
/// holding one is proof the text is canonical.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalTable {
    rows: Vec<Vec<String>>,
    text: String,
}

impl CanonicalTable {
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// The canonical text. This is the fingerprint input.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Parse an upload and re-serialize it into canonical form.
///
/// The first row is data like any other; no header convention is assumed.
/// Rows with a differing field count and cells that are not valid UTF-8 are
/// rejected as malformed rather than papered over.
pub fn normalize(upload: &RawUpload) -> Result<CanonicalTable, AttestError> {
    let delimiter = delimiter_for(upload)?;
    let bytes = upload.bytes.strip_prefix(UTF8_BOM).unwrap_or(&upload.bytes);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .delimiter(delimiter)
        .from_reader(bytes);

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| AttestError::MalformedInput(e.to_string()))?;
        rows.push(record.iter().map(str::to_owned).collect::<Vec<String>>());
    }

    let text = serialize_canonical(&rows)?;
    Ok(CanonicalTable { rows, text })
}

/// Re-serialize parsed rows with `,`, minimal quoting, and `\n` after every
/// row. The writer is the single source of truth for the canonical form.
fn serialize_canonical(rows: &[Vec<String>]) -> Result<String, AttestError> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .quote_style(csv::QuoteStyle::Necessary)
        .from_writer(Vec::new());

    for row in rows {
        writer
            .write_record(row)
            .map_err(|e| AttestError::MalformedInput(e.to_string()))?;
    }

    let buf = writer
        .into_inner()
        .map_err(|e| AttestError::MalformedInput(e.to_string()))?;
    String::from_utf8(buf).map_err(|e| AttestError::MalformedInput(e.to_string()))
}

fn delimiter_for(upload: &RawUpload) -> Result<u8, AttestError> {
    match upload.extension().as_deref() {
        Some("csv") => Ok(b','),
        Some("tsv") => Ok(b'\t'),
        other => Err(AttestError::MalformedInput(format!(
            "unsupported upload type {:?} for {}",
            other, upload.file_name
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(bytes: &[u8]) -> RawUpload {
        RawUpload::new("dataset.csv", bytes.to_vec())
    }

    #[test]
    fn test_canonical_text_has_trailing_newline() {
        let table = normalize(&upload(b"a,b\n1,2")).unwrap();
        assert_eq!(table.text(), "a,b\n1,2\n");
    }

    #[test]
    fn test_line_endings_do_not_matter() {
        let unix = normalize(&upload(b"a,b\n1,2\n")).unwrap();
        let dos = normalize(&upload(b"a,b\r\n1,2\r\n")).unwrap();
        let bare_cr = normalize(&upload(b"a,b\r1,2\r")).unwrap();
        assert_eq!(unix.text(), dos.text());
        assert_eq!(unix.text(), bare_cr.text());
    }

    #[test]
    fn test_bom_is_stripped() {
        let plain = normalize(&upload(b"a,b\n1,2\n")).unwrap();
        let bom = normalize(&upload(b"\xEF\xBB\xBFa,b\n1,2\n")).unwrap();
        assert_eq!(plain.text(), bom.text());
        assert_eq!(bom.rows()[0][0], "a");
    }

    #[test]
    fn test_first_row_is_data_not_header() {
        let table = normalize(&upload(b"name,age\nalice,30\n")).unwrap();
        assert_eq!(table.rows().len(), 2);
        assert_eq!(table.rows()[0], vec!["name", "age"]);
    }

    #[test]
    fn test_quoted_cells_round_trip() {
        let table = normalize(&upload(b"a,\"b,c\"\n1,2\n")).unwrap();
        assert_eq!(table.rows()[0][1], "b,c");
        assert_eq!(table.text(), "a,\"b,c\"\n1,2\n");
    }

    #[test]
    fn test_unnecessary_quotes_are_dropped() {
        let bare = normalize(&upload(b"a,b\n")).unwrap();
        let quoted = normalize(&upload(b"\"a\",\"b\"\n")).unwrap();
        assert_eq!(bare.text(), quoted.text());
    }

    #[test]
    fn test_ragged_rows_are_malformed() {
        let err = normalize(&upload(b"a,b\n1,2,3\n")).unwrap_err();
        assert!(matches!(err, AttestError::MalformedInput(_)));
    }

    #[test]
    fn test_invalid_utf8_is_malformed() {
        let err = normalize(&upload(b"a,b\n\xFF\xFE,2\n")).unwrap_err();
        assert!(matches!(err, AttestError::MalformedInput(_)));
    }

    #[test]
    fn test_unknown_extension_is_rejected() {
        let err = normalize(&RawUpload::new("dataset.parquet", b"a,b\n".to_vec())).unwrap_err();
        assert!(matches!(err, AttestError::MalformedInput(_)));
    }

    #[test]
    fn test_tsv_normalizes_to_comma_form() {
        let tsv = normalize(&RawUpload::new("dataset.tsv", b"a\tb\n1\t2\n".to_vec())).unwrap();
        assert_eq!(tsv.text(), "a,b\n1,2\n");
    }

    #[test]
    fn test_empty_upload_yields_empty_table() {
        let table = normalize(&upload(b"")).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.text(), "");
    }
}
