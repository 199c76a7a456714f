//! Streaming normalization of social-media CSV exports.
//!
//! - Detects the source platform from column headers (`Platform::identify`).
//! - Maps each raw row into the canonical share record
//!   `{account_id, content_id, object_id, timestamp_share}`.
//! - Streams arbitrarily large files; small files parse in one pass,
//!   large ones through a bounded chunked reader. Same output either way.
//!
//! Data shape:
//! - `PipelineOutput { csv, records, summary }`
//! - `ProcessingSummary { rows_seen, rows_kept, rows_skipped, .. }`
#![cfg_attr(docsrs, feature(doc_cfg))]
//
mod codec;
mod io;
mod mapping;
mod pipeline;
mod platform;
mod record;
mod transform;

pub use crate::io::{build_csv_reader, reader_from_path, UploadMeta};
pub use crate::mapping::{CanonicalField, ColumnMapping, MappingPlan};
pub use crate::pipeline::{
    apply_mapping_path, apply_mapping_stream, normalize_path, normalize_stream, read_headers,
    NormalizeOptions, PipelineOutput,
};
pub use crate::platform::Platform;
pub use crate::record::{HeaderIndex, RawRow, ShareRecord, CANONICAL_HEADERS};
pub use crate::transform::SourceOption;

use serde::Serialize;
use thiserror::Error;

/// Per-file counts, reported once per pipeline run. Transient; the
/// caller surfaces them to the user, nothing here is persisted.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProcessingSummary {
    pub rows_seen: usize,
    pub rows_kept: usize,
    pub rows_skipped: usize,
    /// Size of the serialized canonical CSV.
    pub output_bytes: usize,
    /// Set when the canonical CSV exceeds the configured ceiling. The
    /// data is still returned; downstream may reject it.
    pub oversized_output: bool,
}

/// Error type returned by this crate when not using `anyhow`.
///
/// Row-level problems never surface here; invalid rows are skipped and
/// counted. Only file-level failures (I/O, CSV parse, zero valid rows)
/// and up-front selection/mapping mistakes abort a run.
#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("no valid rows after normalization")]
    NoValidRows,
    #[error("{platform} has no account source '{id}'")]
    UnknownAccountSource { platform: Platform, id: String },
    #[error("{platform} has no object source '{id}'")]
    UnknownObjectSource { platform: Platform, id: String },
    #[error("{platform} offers multiple account sources; one must be selected")]
    AccountSourceRequired { platform: Platform },
    #[error("{platform} offers multiple object sources; one must be selected")]
    ObjectSourceRequired { platform: Platform },
    #[error("unrecognized exports need a manual column mapping")]
    UnmappedPlatform,
    #[error("canonical field '{0}' is targeted by more than one column mapping")]
    DuplicateMappingTarget(&'static str),
    #[error("canonical field '{0}' has no column mapping")]
    MissingMappingTarget(&'static str),
    #[error("chunk size must be non-zero")]
    ZeroChunkSize,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv_async::Error),
}

pub type NormalizeResult<T> = std::result::Result<T, NormalizeError>;
