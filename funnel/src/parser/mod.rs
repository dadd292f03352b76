//! CSV table reader with encoding and delimiter auto-detection.
//!
//! Turns raw bytes into a [`ParseResult`] (header + string cells), then into
//! typed [`EventLog`] rows or offer records ready for validation.

use serde_json::{Map, Number, Value};
use std::path::Path;

use crate::error::{CsvError, CsvResult};
use crate::models::{Event, EventKind, EventLog};

/// Result of parsing with metadata
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// Column headers, trimmed
    pub headers: Vec<String>,
    /// Data rows, each padded to the header width
    pub rows: Vec<Vec<String>>,
    /// Detected encoding
    pub encoding: String,
    /// Detected or used delimiter
    pub delimiter: char,
}

impl ParseResult {
    /// Index of the first header matching one of `names`, ignoring case.
    pub fn column(&self, names: &[&str]) -> Option<usize> {
        names.iter().find_map(|name| {
            self.headers
                .iter()
                .position(|h| h.eq_ignore_ascii_case(name))
        })
    }

    fn require(&self, table: &'static str, column: &'static str, aliases: &[&str]) -> CsvResult<usize> {
        let mut names = vec![column];
        names.extend_from_slice(aliases);
        self.column(&names)
            .ok_or(CsvError::MissingColumn { table, column })
    }
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        // chardet reports nothing for tiny inputs
        "" => "utf-8".to_string(),
        _ => charset,
    }
}

/// Decode bytes to string using the specified encoding
pub fn decode_content(bytes: &[u8], encoding: &str) -> CsvResult<String> {
    let content = match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => String::from_utf8_lossy(bytes).into_owned(),
        // latin1 labels map to windows-1252, as browsers decode them
        "iso-8859-1" | "latin-1" | "latin1" | "windows-1252" | "cp1252" => {
            encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned()
        }
        other => {
            let (decoded, _, had_errors) = encoding_rs::Encoding::for_label(other.as_bytes())
                .unwrap_or(encoding_rs::UTF_8)
                .decode(bytes);
            if had_errors && decoded.is_empty() {
                return Err(CsvError::EncodingError(format!("cannot decode as {}", other)));
            }
            decoded.into_owned()
        }
    };

    // A UTF-8 BOM would otherwise stick to the first header name.
    Ok(content.trim_start_matches('\u{feff}').to_string())
}

/// Detect the delimiter by counting occurrences in the first line
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [',', ';', '\t', '|'];
    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Parse CSV text with an explicit delimiter.
///
/// Quoted cells may contain the delimiter; event payloads usually do.
///
/// # Example
/// ```
/// use offer_funnel::parser::parse_str;
///
/// let csv = "customer_id,event,value\n1,offer received,\"{'offer id': 'a', 'x': 1}\"";
/// let table = parse_str(csv, ',').unwrap();
/// assert_eq!(table.rows[0][2], "{'offer id': 'a', 'x': 1}");
/// ```
pub fn parse_str(content: &str, delimiter: char) -> CsvResult<ParseResult> {
    parse_string_with_metadata(content, delimiter, "utf-8".to_string())
}

/// Parse CSV string with explicit delimiter and return metadata.
pub fn parse_string_with_metadata(
    content: &str,
    delimiter: char,
    encoding: String,
) -> CsvResult<ParseResult> {
    if content.trim().is_empty() {
        return Err(CsvError::EmptyFile);
    }

    let delimiter_byte = u8::try_from(delimiter)
        .map_err(|_| CsvError::EncodingError(format!("delimiter '{}' is not ASCII", delimiter)))?;

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter_byte)
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim_matches('"').to_string())
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(CsvError::NoHeaders);
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(|cell| cell.is_empty()) {
            continue;
        }

        let row = (0..headers.len())
            .map(|i| record.get(i).unwrap_or("").to_string())
            .collect();
        rows.push(row);
    }

    Ok(ParseResult {
        headers,
        rows,
        encoding,
        delimiter,
    })
}

/// Parse CSV bytes with auto-detection of encoding and delimiter.
pub fn parse_bytes_auto(bytes: &[u8]) -> CsvResult<ParseResult> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding)?;
    let delimiter = detect_delimiter(&content);
    parse_string_with_metadata(&content, delimiter, encoding)
}

/// Parse a CSV file with auto-detection of encoding and delimiter.
pub fn parse_file_auto<P: AsRef<Path>>(path: P) -> CsvResult<ParseResult> {
    let bytes = std::fs::read(path.as_ref())?;
    parse_bytes_auto(&bytes)
}

// =============================================================================
// Typed tables
// =============================================================================

/// Read the event log out of a parsed table.
///
/// Requires `customer_id` (or `person`), `event` and `value`; every other
/// column is carried along untouched.
pub fn events_from_table(table: ParseResult) -> CsvResult<EventLog> {
    let customer = table.require("events", "customer_id", &["person", "customer"])?;
    let event = table.require("events", "event", &[])?;
    let value = table.require("events", "value", &[])?;

    let events = table
        .rows
        .into_iter()
        .map(|columns| Event {
            customer_id: columns[customer].clone(),
            event: EventKind::from_label(&columns[event]),
            value: columns[value].clone(),
            columns,
        })
        .collect();

    Ok(EventLog {
        headers: table.headers,
        events,
    })
}

/// Column names of the offers table, in output order.
const OFFER_COLUMNS: [(&str, &[&str]); 5] = [
    ("offer_id", &["id"]),
    ("offer_type", &["type"]),
    ("difficulty", &[]),
    ("reward", &[]),
    ("duration", &[]),
];

/// Read offer rows as JSON objects, ready for schema validation.
///
/// Empty cells become `null`; numeric cells of the attribute columns
/// become numbers; anything else stays a string for the validator to flag.
pub fn offer_rows_from_table(table: &ParseResult) -> CsvResult<Vec<Value>> {
    let mut indices = Vec::with_capacity(OFFER_COLUMNS.len());
    for (column, aliases) in OFFER_COLUMNS {
        indices.push((column, table.require("offers", column, aliases)?));
    }

    let rows = table
        .rows
        .iter()
        .map(|row| {
            let mut obj = Map::new();
            for &(column, idx) in &indices {
                let raw = row[idx].as_str();
                let numeric = !matches!(column, "offer_id" | "offer_type");
                obj.insert(column.to_string(), cell_to_json(raw, numeric));
            }
            Value::Object(obj)
        })
        .collect();

    Ok(rows)
}

fn cell_to_json(raw: &str, numeric: bool) -> Value {
    if raw.is_empty() {
        return Value::Null;
    }
    if numeric {
        if let Some(n) = raw.parse::<f64>().ok().and_then(Number::from_f64) {
            return Value::Number(n);
        }
    }
    Value::String(raw.to_string())
}
