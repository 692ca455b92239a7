//! Loading scoring tables from JSON or CSV sources
//!
//! A source is either a local path or an http(s) URL. Both formats decode to
//! the same `RawRow` shape before normalization, so the rest of the pipeline
//! never knows which one it was.

use crate::index::GroupedIndex;
use crate::record::{normalize, RawRow, Record};
use anyhow::{anyhow, Context, Result};
use csv::{ReaderBuilder, StringRecord};
use serde_json::{Number, Value};
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// Encoding of a scoring table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Json,
    Csv,
}

impl SourceFormat {
    /// Guess the format from the location's extension (query strings ignored).
    pub fn detect(location: &str) -> Option<SourceFormat> {
        let path_part = location.split(['?', '#']).next().unwrap_or(location);
        let ext = Path::new(path_part)
            .extension()
            .and_then(|e| e.to_str())?
            .to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(SourceFormat::Json),
            "csv" => Some(SourceFormat::Csv),
            _ => None,
        }
    }
}

impl std::str::FromStr for SourceFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(SourceFormat::Json),
            "csv" => Ok(SourceFormat::Csv),
            other => Err(anyhow!("Unknown source format '{}' (expected json or csv)", other)),
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceFormat::Json => f.write_str("json"),
            SourceFormat::Csv => f.write_str("csv"),
        }
    }
}

/// Where to load a table from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub location: String,
    /// Explicit format; detected from the location when `None`
    pub format: Option<SourceFormat>,
}

impl Source {
    pub fn new(location: impl Into<String>) -> Self {
        Source {
            location: location.into(),
            format: None,
        }
    }

    pub fn with_format(mut self, format: Option<SourceFormat>) -> Self {
        self.format = format;
        self
    }

    pub fn is_remote(&self) -> bool {
        let lower = self.location.to_ascii_lowercase();
        lower.starts_with("http://") || lower.starts_with("https://")
    }

    pub fn resolved_format(&self) -> Result<SourceFormat> {
        self.format
            .or_else(|| SourceFormat::detect(&self.location))
            .ok_or_else(|| {
                anyhow!(
                    "Cannot tell the format of '{}'; use a .json or .csv file or pass a format",
                    self.location
                )
            })
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.location)
    }
}

/// Rows decoded from a document, plus the count of rows that could not be
/// turned into a `RawRow` at all
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedRows {
    pub rows: Vec<RawRow>,
    pub skipped: usize,
}

/// Counters gathered while loading one source
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    /// Rows found in the source, decodable or not
    pub rows: usize,
    /// Records placed in a gender bucket
    pub indexed: usize,
    /// Rows that failed to decode or were rejected by the normalizer
    pub malformed: usize,
    /// Records dropped for an unrecognized gender code
    pub unrecognized_gender: usize,
    /// Distinct disciplines in the index
    pub disciplines: usize,
}

impl LoadStats {
    pub fn dropped(&self) -> usize {
        self.malformed + self.unrecognized_gender
    }
}

/// A freshly built index together with how it was built
#[derive(Debug, Clone)]
pub struct LoadedData {
    pub index: GroupedIndex,
    pub stats: LoadStats,
}

/// Read, decode, normalize, and group a source.
///
/// Only whole-source problems (unreachable file, undecodable document) are
/// errors. Individual bad rows are dropped and counted.
pub fn load(source: &Source) -> Result<LoadedData> {
    let format = source.resolved_format()?;
    log::info!("Loading {} ({})", source, format);

    let bytes = read_source(&source.location)?;
    let decoded = decode(&bytes, format)
        .with_context(|| format!("Failed to parse {} data from {}", format, source))?;
    log::trace!("Parsed rows: {:?}", decoded.rows);

    let loaded = build_from_decoded(&decoded);
    log::trace!("Grouped data: {:?}", loaded.index);
    log::info!(
        "Loaded {} records in {} disciplines from {} ({} rows, {} dropped)",
        loaded.stats.indexed,
        loaded.stats.disciplines,
        source,
        loaded.stats.rows,
        loaded.stats.dropped()
    );
    Ok(loaded)
}

/// Normalize and group already-decoded rows.
pub fn build_from_rows(rows: &[RawRow]) -> LoadedData {
    build_counting(rows, 0)
}

/// Like `build_from_rows`, counting the rows the decoder skipped as malformed.
pub fn build_from_decoded(decoded: &DecodedRows) -> LoadedData {
    build_counting(&decoded.rows, decoded.skipped)
}

fn build_counting(rows: &[RawRow], undecodable: usize) -> LoadedData {
    let mut malformed = undecodable;
    let records: Vec<Record> = rows
        .iter()
        .enumerate()
        .filter_map(|(i, row)| match normalize(row) {
            Ok(rec) => Some(rec),
            Err(e) => {
                log::debug!("Row {}: dropped: {}", i + 1, e);
                malformed += 1;
                None
            }
        })
        .collect();

    let normalized = records.len();
    let (index, unrecognized_gender) = GroupedIndex::build_with_stats(records);

    let stats = LoadStats {
        rows: rows.len() + undecodable,
        indexed: normalized - unrecognized_gender,
        malformed,
        unrecognized_gender,
        disciplines: index.len(),
    };
    if stats.dropped() > 0 {
        log::warn!(
            "Dropped {} of {} rows ({} malformed, {} with unrecognized gender)",
            stats.dropped(),
            stats.rows,
            stats.malformed,
            stats.unrecognized_gender
        );
    }
    LoadedData { index, stats }
}

/// Fetch the raw bytes of a source from disk or over HTTP.
pub fn read_source(location: &str) -> Result<Vec<u8>> {
    let source = Source::new(location);
    if source.is_remote() {
        fetch_url(location)
    } else {
        std::fs::read(location).with_context(|| format!("Failed to read {}", location))
    }
}

fn fetch_url(url: &str) -> Result<Vec<u8>> {
    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .context("Failed to build HTTP client")?;
    let response = client
        .get(url)
        .send()
        .with_context(|| format!("Failed to fetch {}", url))?;
    let status = response.status();
    if !status.is_success() {
        return Err(anyhow!("Fetching {} returned HTTP {}", url, status));
    }
    let body = response
        .bytes()
        .with_context(|| format!("Failed to read response body from {}", url))?;
    Ok(body.to_vec())
}

/// Decode a document in the given format into raw rows.
pub fn decode(bytes: &[u8], format: SourceFormat) -> Result<DecodedRows> {
    match format {
        SourceFormat::Json => parse_json(bytes),
        SourceFormat::Csv => parse_csv(bytes),
    }
}

/// Parse a JSON array of row objects. Non-object elements are skipped.
pub fn parse_json(bytes: &[u8]) -> Result<DecodedRows> {
    let doc: Value = serde_json::from_slice(bytes).context("Invalid JSON")?;
    let items = match doc {
        Value::Array(items) => items,
        other => {
            return Err(anyhow!(
                "Expected a JSON array of rows, found {}",
                json_kind(&other)
            ))
        }
    };

    let mut decoded = DecodedRows {
        rows: Vec::with_capacity(items.len()),
        skipped: 0,
    };
    for (i, item) in items.into_iter().enumerate() {
        match item {
            Value::Object(map) => decoded.rows.push(map),
            other => {
                log::warn!(
                    "Element {}: expected an object, found {}; skipped",
                    i + 1,
                    json_kind(&other)
                );
                decoded.skipped += 1;
            }
        }
    }
    Ok(decoded)
}

/// Parse a header-row CSV. Header names are authoritative and fields are
/// typed the way a spreadsheet would read them (see `infer_value`).
///
/// Whitespace around fields is trimmed, so `" M"` reads as `"M"`. A row that
/// cannot be read (e.g. invalid UTF-8 in one cell) is skipped and counted;
/// only an unreadable header fails the whole document.
pub fn parse_csv(bytes: &[u8]) -> Result<DecodedRows> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);
    let headers = reader.headers().context("Failed to read CSV header")?.clone();

    let mut decoded = DecodedRows::default();
    for (row_num, result) in reader.byte_records().enumerate() {
        let record = match result
            .map_err(anyhow::Error::from)
            .and_then(|r| StringRecord::from_byte_record(r).map_err(anyhow::Error::from))
        {
            Ok(record) => record,
            Err(e) => {
                log::debug!("CSV row {}: unreadable, skipped: {}", row_num + 1, e);
                decoded.skipped += 1;
                continue;
            }
        };
        if record.iter().all(|f| f.is_empty()) {
            continue;
        }
        let mut row = RawRow::new();
        for (name, field) in headers.iter().zip(record.iter()) {
            if name.is_empty() {
                continue;
            }
            row.insert(name.to_string(), infer_value(field));
        }
        decoded.rows.push(row);
    }
    Ok(decoded)
}

/// Type a CSV field: numbers become numbers when that loses nothing of the
/// text ("7.50" and "007" stay text), `true`/`false` become booleans, empty
/// becomes null, anything else stays text.
pub fn infer_value(field: &str) -> Value {
    if field.is_empty() {
        return Value::Null;
    }
    if let Ok(i) = field.parse::<i64>() {
        if i.to_string() == field {
            return Value::Number(i.into());
        }
    } else if looks_numeric(field) {
        if let Some(n) = field.parse::<f64>().ok().and_then(Number::from_f64) {
            if n.to_string() == field {
                return Value::Number(n);
            }
        }
    }
    match field {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => Value::String(field.to_string()),
    }
}

/// Plain decimal notation only; keeps "inf", "NaN" and "1e5"-style text as text.
fn looks_numeric(field: &str) -> bool {
    let digits = field.strip_prefix('-').unwrap_or(field);
    !digits.is_empty()
        && digits.chars().any(|c| c.is_ascii_digit())
        && digits.chars().all(|c| c.is_ascii_digit() || c == '.')
        && digits.matches('.').count() <= 1
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a bool",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
