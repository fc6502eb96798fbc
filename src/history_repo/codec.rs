// History file encodings, tried in order: columnar wincode first, delimited text second.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use thiserror::Error;
use wincode::{SchemaRead, SchemaWrite};

use super::blob;
use crate::models::AggregateRecord;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("encode: {0}")]
    Encode(String),
    #[error("decode: {0}")]
    Decode(String),
    #[error("not a columnar history file")]
    MissingHeader,
    #[error("unsupported columnar format version {0}")]
    UnsupportedVersion(u8),
    #[error("column length mismatch: {0}")]
    ColumnLength(String),
    #[error("line {line}: {reason}")]
    Text { line: usize, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CodecKind {
    Columnar,
    Csv,
}

impl std::fmt::Display for CodecKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Columnar => f.write_str("columnar"),
            Self::Csv => f.write_str("csv"),
        }
    }
}

pub trait SnapshotCodec: Send + Sync {
    fn kind(&self) -> CodecKind;
    fn encode(&self, records: &[AggregateRecord]) -> Result<Vec<u8>, CodecError>;
    fn decode(&self, bytes: &[u8]) -> Result<Vec<AggregateRecord>, CodecError>;
}

/// Primary then fallback.
pub fn default_chain() -> Vec<Box<dyn SnapshotCodec>> {
    vec![Box::new(ColumnarCodec), Box::new(CsvCodec)]
}

#[derive(Debug, Default, SchemaRead, SchemaWrite)]
struct HistoryColumns {
    timestamp_micros: Vec<i64>,
    total_bikes: Vec<u64>,
    total_docks: Vec<u64>,
    active_stations: Vec<u64>,
    avg_percent_full: Vec<f64>,
}

pub struct ColumnarCodec;

impl SnapshotCodec for ColumnarCodec {
    fn kind(&self) -> CodecKind {
        CodecKind::Columnar
    }

    fn encode(&self, records: &[AggregateRecord]) -> Result<Vec<u8>, CodecError> {
        let mut cols = HistoryColumns::default();
        for r in records {
            cols.timestamp_micros.push(r.timestamp.timestamp_micros());
            cols.total_bikes.push(r.total_bikes);
            cols.total_docks.push(r.total_docks);
            cols.active_stations.push(r.active_stations);
            cols.avg_percent_full.push(r.avg_percent_full);
        }
        let payload = wincode::serialize(&cols).map_err(|e| CodecError::Encode(e.to_string()))?;
        Ok(blob::with_header(blob::FORMAT_VERSION, payload))
    }

    fn decode(&self, bytes: &[u8]) -> Result<Vec<AggregateRecord>, CodecError> {
        match blob::header_version(bytes) {
            None => return Err(CodecError::MissingHeader),
            Some(blob::FORMAT_VERSION) => {}
            Some(v) => return Err(CodecError::UnsupportedVersion(v)),
        }
        let cols: HistoryColumns = wincode::deserialize(blob::payload(bytes))
            .map_err(|e| CodecError::Decode(e.to_string()))?;

        let n = cols.timestamp_micros.len();
        if [
            cols.total_bikes.len(),
            cols.total_docks.len(),
            cols.active_stations.len(),
            cols.avg_percent_full.len(),
        ]
        .iter()
        .any(|&len| len != n)
        {
            return Err(CodecError::ColumnLength(format!(
                "timestamps={} bikes={} docks={} active={} fill={}",
                n,
                cols.total_bikes.len(),
                cols.total_docks.len(),
                cols.active_stations.len(),
                cols.avg_percent_full.len()
            )));
        }

        let mut out = Vec::with_capacity(n);
        for i in 0..n {
            let timestamp = DateTime::from_timestamp_micros(cols.timestamp_micros[i])
                .ok_or_else(|| {
                    CodecError::Decode(format!(
                        "timestamp out of range: {}",
                        cols.timestamp_micros[i]
                    ))
                })?;
            out.push(AggregateRecord {
                timestamp,
                total_bikes: cols.total_bikes[i],
                total_docks: cols.total_docks[i],
                active_stations: cols.active_stations[i],
                avg_percent_full: cols.avg_percent_full[i],
            });
        }
        Ok(out)
    }
}

pub const CSV_HEADER: &str = "timestamp,total_bikes,total_docks,active_stations,avg_percent_full";
/// Header written by earlier deployments.
const LEGACY_CSV_HEADER: &str = "ts,total_bikes,total_docks,active_stations,avg_percent_full";

pub struct CsvCodec;

impl SnapshotCodec for CsvCodec {
    fn kind(&self) -> CodecKind {
        CodecKind::Csv
    }

    fn encode(&self, records: &[AggregateRecord]) -> Result<Vec<u8>, CodecError> {
        let mut out = String::with_capacity(CSV_HEADER.len() + 1 + records.len() * 64);
        out.push_str(CSV_HEADER);
        out.push('\n');
        for r in records {
            out.push_str(&format!(
                "{},{},{},{},{}\n",
                r.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true),
                r.total_bikes,
                r.total_docks,
                r.active_stations,
                r.avg_percent_full
            ));
        }
        Ok(out.into_bytes())
    }

    fn decode(&self, bytes: &[u8]) -> Result<Vec<AggregateRecord>, CodecError> {
        let text = std::str::from_utf8(bytes).map_err(|e| CodecError::Text {
            line: 0,
            reason: e.to_string(),
        })?;
        let mut lines = text.lines().enumerate();
        let header = lines.next().map(|(_, l)| l.trim()).unwrap_or_default();
        if header != CSV_HEADER && header != LEGACY_CSV_HEADER {
            return Err(CodecError::Text {
                line: 1,
                reason: format!("unexpected header {:?}", truncate(header, 80)),
            });
        }

        let mut out = Vec::new();
        for (idx, line) in lines {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            out.push(parse_row(line).map_err(|reason| CodecError::Text {
                line: idx + 1,
                reason,
            })?);
        }
        Ok(out)
    }
}

fn parse_row(line: &str) -> Result<AggregateRecord, String> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    let [ts, bikes, docks, active, fill] = fields.as_slice() else {
        return Err(format!("expected 5 fields, got {}", fields.len()));
    };
    let timestamp = DateTime::parse_from_rfc3339(ts)
        .map_err(|e| format!("timestamp {:?}: {}", ts, e))?
        .with_timezone(&Utc);
    Ok(AggregateRecord {
        timestamp,
        total_bikes: parse_count(bikes, "total_bikes")?,
        total_docks: parse_count(docks, "total_docks")?,
        active_stations: parse_count(active, "active_stations")?,
        avg_percent_full: if fill.is_empty() {
            f64::NAN
        } else {
            fill.parse()
                .map_err(|e| format!("avg_percent_full {:?}: {}", fill, e))?
        },
    })
}

fn parse_count(field: &str, name: &str) -> Result<u64, String> {
    field
        .parse()
        .map_err(|e| format!("{} {:?}: {}", name, field, e))
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((i, _)) => &s[..i],
        None => s,
    }
}
