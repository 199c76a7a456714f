//! The chunked CSV pipeline: stream a platform export, transform every
//! row, and serialize the survivors back to canonical CSV.
//!
//! Strategy is picked by file size. At or below the threshold the file
//! is read whole (through decompression) and parsed in one pass; above
//! it, rows stream through a bounded reader whose buffer capacity is
//! the configured chunk size, so memory tracks the chunk, not the
//! file. Both paths produce identical records in identical order.

use std::path::Path;

use csv_async::{AsyncReaderBuilder, AsyncWriterBuilder, ByteRecord};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, info, warn};

use crate::io::reader_from_path;
use crate::mapping::{ColumnMapping, MappingPlan};
use crate::platform::Platform;
use crate::record::{HeaderIndex, RawRow, ShareRecord, CANONICAL_HEADERS};
use crate::{NormalizeError, NormalizeResult, ProcessingSummary};

/// Pipeline tuning. Defaults match what the upload wizard ships with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizeOptions {
    /// Reader buffer capacity on the chunked path.
    pub chunk_size: usize,
    /// Files at or below this many bytes parse in a single pass.
    pub large_file_threshold: u64,
    /// Canonical CSV larger than this sets `oversized_output`; the data
    /// is still returned, downstream analysis may reject it.
    pub output_warn_bytes: usize,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            chunk_size: 1 << 20,
            large_file_threshold: 5 * 1024 * 1024,
            output_warn_bytes: 15 * 1024 * 1024,
        }
    }
}

impl NormalizeOptions {
    /// Cheap start-up check; call before handling live uploads.
    pub fn validate(&self) -> NormalizeResult<()> {
        if self.chunk_size == 0 {
            return Err(NormalizeError::ZeroChunkSize);
        }
        Ok(())
    }
}

/// Everything one pipeline run produces.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Canonical CSV text: header row plus one line per kept record.
    pub csv: String,
    /// Kept records in original row order.
    pub records: Vec<ShareRecord>,
    pub summary: ProcessingSummary,
}

enum RowHandler {
    Detected {
        platform: Platform,
        account: Option<&'static str>,
        object: Option<&'static str>,
    },
    Manual(MappingPlan),
}

impl RowHandler {
    fn for_platform(
        platform: Platform,
        account_source: Option<&str>,
        object_source: Option<&str>,
    ) -> NormalizeResult<Self> {
        if platform == Platform::Other {
            return Err(NormalizeError::UnmappedPlatform);
        }
        Ok(Self::Detected {
            platform,
            account: platform.resolve_account(account_source)?,
            object: platform.resolve_object(object_source)?,
        })
    }

    fn transform(&self, index: &HeaderIndex, record: &ByteRecord) -> Option<ShareRecord> {
        match self {
            RowHandler::Detected {
                platform,
                account,
                object,
            } => platform.transform_row(&RawRow::new(index, record), *account, *object),
            RowHandler::Manual(plan) => plan.transform_record(record),
        }
    }
}

/// Normalize a file on disk, choosing the single-pass or chunked
/// strategy by file size.
pub async fn normalize_path(
    path: &Path,
    platform: Platform,
    account_source: Option<&str>,
    object_source: Option<&str>,
    opts: &NormalizeOptions,
) -> NormalizeResult<PipelineOutput> {
    opts.validate()?;
    let handler = RowHandler::for_platform(platform, account_source, object_source)?;
    run_from_path(path, handler, opts).await
}

/// Normalize an already-open byte stream (chunked strategy).
pub async fn normalize_stream<R>(
    reader: R,
    platform: Platform,
    account_source: Option<&str>,
    object_source: Option<&str>,
    opts: &NormalizeOptions,
) -> NormalizeResult<PipelineOutput>
where
    R: AsyncRead + Unpin + Send,
{
    opts.validate()?;
    let handler = RowHandler::for_platform(platform, account_source, object_source)?;
    run_pipeline(reader, &handler, opts.chunk_size, opts).await
}

/// Normalize a file of unrecognized shape through a manual mapping.
pub async fn apply_mapping_path(
    path: &Path,
    mappings: &[ColumnMapping],
    opts: &NormalizeOptions,
) -> NormalizeResult<PipelineOutput> {
    opts.validate()?;
    let handler = RowHandler::Manual(MappingPlan::compile(mappings)?);
    run_from_path(path, handler, opts).await
}

/// Stream variant of [`apply_mapping_path`].
pub async fn apply_mapping_stream<R>(
    reader: R,
    mappings: &[ColumnMapping],
    opts: &NormalizeOptions,
) -> NormalizeResult<PipelineOutput>
where
    R: AsyncRead + Unpin + Send,
{
    opts.validate()?;
    let handler = RowHandler::Manual(MappingPlan::compile(mappings)?);
    run_pipeline(reader, &handler, opts.chunk_size, opts).await
}

/// Parse only the header row of a file, so the wizard can run platform
/// detection without paying for a full parse.
pub async fn read_headers(path: &Path) -> NormalizeResult<Vec<String>> {
    let (reader, _meta) = reader_from_path(path, 1 << 16).await?;
    let mut rdr = AsyncReaderBuilder::new()
        .has_headers(true)
        .create_reader(reader);
    let headers = rdr.headers().await?;
    Ok(headers.iter().map(|h| h.to_string()).collect())
}

async fn run_from_path(
    path: &Path,
    handler: RowHandler,
    opts: &NormalizeOptions,
) -> NormalizeResult<PipelineOutput> {
    let size = tokio::fs::metadata(path).await?.len();
    if size <= opts.large_file_threshold {
        debug!(bytes = size, "single-pass parse");
        let (mut reader, _meta) = reader_from_path(path, opts.chunk_size).await?;
        let mut buf = Vec::with_capacity(size as usize);
        reader.read_to_end(&mut buf).await?;
        let capacity = buf.len().max(1024);
        run_pipeline(&buf[..], &handler, capacity, opts).await
    } else {
        debug!(bytes = size, chunk = opts.chunk_size, "chunked parse");
        let (reader, _meta) = reader_from_path(path, opts.chunk_size).await?;
        run_pipeline(reader, &handler, opts.chunk_size, opts).await
    }
}

async fn run_pipeline<R>(
    reader: R,
    handler: &RowHandler,
    buffer_capacity: usize,
    opts: &NormalizeOptions,
) -> NormalizeResult<PipelineOutput>
where
    R: AsyncRead + Unpin + Send,
{
    let mut rdr = AsyncReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .buffer_capacity(buffer_capacity.max(1))
        .create_reader(reader);

    let headers = rdr.headers().await?.clone();
    let index = HeaderIndex::new(&headers);

    let mut records: Vec<ShareRecord> = Vec::new();
    let mut rows_seen = 0usize;
    let mut rows_skipped = 0usize;
    let mut record = ByteRecord::new();
    while rdr.read_byte_record(&mut record).await? {
        rows_seen += 1;
        // One bad row must never abort the file: any transform failure
        // reads as None and counts as a skip.
        match handler.transform(&index, &record) {
            Some(rec) => records.push(rec),
            None => rows_skipped += 1,
        }
        if rows_seen % 100_000 == 0 {
            debug!(rows = rows_seen, kept = records.len(), "normalizing");
        }
    }

    if records.is_empty() {
        warn!(rows_seen, "no rows survived normalization");
        return Err(NormalizeError::NoValidRows);
    }

    let csv = serialize_records(&records).await?;
    let oversized = csv.len() > opts.output_warn_bytes;
    if oversized {
        warn!(
            bytes = csv.len(),
            ceiling = opts.output_warn_bytes,
            "canonical csv exceeds output ceiling"
        );
    }
    let summary = ProcessingSummary {
        rows_seen,
        rows_kept: records.len(),
        rows_skipped,
        output_bytes: csv.len(),
        oversized_output: oversized,
    };
    info!(
        rows_seen,
        kept = summary.rows_kept,
        skipped = rows_skipped,
        "normalization complete"
    );
    Ok(PipelineOutput {
        csv,
        records,
        summary,
    })
}

async fn serialize_records(records: &[ShareRecord]) -> NormalizeResult<String> {
    let mut wtr = AsyncWriterBuilder::new().create_writer(std::io::Cursor::new(Vec::new()));
    wtr.write_record(&CANONICAL_HEADERS).await?;
    for rec in records {
        let ts = rec.timestamp_share.to_string();
        wtr.write_record(&[
            rec.account_id.as_str(),
            rec.content_id.as_str(),
            rec.object_id.as_str(),
            ts.as_str(),
        ])
        .await?;
    }
    let cursor = wtr
        .into_inner()
        .await
        .map_err(|e| NormalizeError::Io(std::io::Error::other(e.to_string())))?;
    String::from_utf8(cursor.into_inner())
        .map_err(|e| NormalizeError::Io(std::io::Error::other(e)))
}
