use std::path::Path;

use async_compression::tokio::bufread::{GzipDecoder, ZstdDecoder};
use tokio::fs::File;
use tokio::io::{AsyncRead, BufReader};
use tokio_util::codec::FramedRead;
use tokio_util::io::StreamReader;

use crate::codec::CharsetTranscoder;
use crate::NormalizeResult;

/// What the upload step tells us about a file, best-effort. Drives
/// decompression and charset handling ahead of the CSV parser.
#[derive(Debug, Clone)]
pub struct UploadMeta {
    /// e.g. "application/gzip" or "text/csv"
    pub content_type: String,
    /// e.g. "gzip", "zstd", or empty
    pub content_encoding: String,
    /// Original filename, used as an extension fallback.
    pub name_hint: String,
    /// Charset of the decompressed bytes; exports from localized
    /// desktop tooling are occasionally not UTF-8.
    pub charset: &'static encoding_rs::Encoding,
}

impl Default for UploadMeta {
    fn default() -> Self {
        Self {
            content_type: String::new(),
            content_encoding: String::new(),
            name_hint: String::new(),
            charset: encoding_rs::UTF_8,
        }
    }
}

impl UploadMeta {
    fn wants_gzip(&self) -> bool {
        self.content_encoding
            .split(',')
            .any(|enc| enc.trim().eq_ignore_ascii_case("gzip"))
            || matches!(
                self.content_type.to_ascii_lowercase().as_str(),
                "application/gzip" | "application/x-gzip"
            )
            || self.name_hint.ends_with(".gz")
    }

    fn wants_zstd(&self) -> bool {
        self.content_encoding
            .split(',')
            .any(|enc| enc.trim().eq_ignore_ascii_case("zstd"))
            || self.content_type.eq_ignore_ascii_case("application/zstd")
            || self.name_hint.ends_with(".zst")
    }
}

/// Wrap a raw byte stream with whatever decompression and transcoding
/// the metadata calls for. The result feeds straight into the CSV
/// reader; `buffer_capacity` bounds the read-ahead on the chunked path.
pub fn build_csv_reader<R>(
    raw: R,
    meta: UploadMeta,
    buffer_capacity: usize,
) -> (impl AsyncRead + Unpin + Send, UploadMeta)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let buffered = BufReader::with_capacity(buffer_capacity.max(1), raw);

    // Decompression choice: encoding header, then type, then extension.
    let decompressed: Box<dyn AsyncRead + Unpin + Send> = if meta.wants_gzip() {
        Box::new(GzipDecoder::new(buffered))
    } else if meta.wants_zstd() {
        Box::new(ZstdDecoder::new(buffered))
    } else {
        Box::new(buffered)
    };

    // UTF-8 input skips the transcoder entirely; that is the common
    // case and it avoids an extra copy per chunk.
    let reader: Box<dyn AsyncRead + Unpin + Send> = if meta.charset == encoding_rs::UTF_8 {
        decompressed
    } else {
        let frames = FramedRead::new(decompressed, CharsetTranscoder::new(meta.charset));
        Box::new(StreamReader::new(frames))
    };

    (reader, meta)
}

/// Open a local file, inferring compression from its extension.
pub async fn reader_from_path(
    path: &Path,
    buffer_capacity: usize,
) -> NormalizeResult<(impl AsyncRead + Unpin + Send, UploadMeta)> {
    let file = File::open(path).await?;
    let name_hint = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string();

    let mut meta = UploadMeta {
        name_hint,
        ..Default::default()
    };
    match path.extension().and_then(|s| s.to_str()) {
        Some("gz") => {
            meta.content_type = "application/gzip".into();
            meta.content_encoding = "gzip".into();
        }
        Some("zst") => {
            meta.content_type = "application/zstd".into();
            meta.content_encoding = "zstd".into();
        }
        _ => {
            meta.content_type = "text/csv".into();
        }
    }

    Ok(build_csv_reader(file, meta, buffer_capacity))
}
