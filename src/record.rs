use std::collections::HashMap;

use csv_async::{ByteRecord, StringRecord};
use serde::{Deserialize, Serialize};

/// Header row of every canonical CSV this crate emits.
pub const CANONICAL_HEADERS: [&str; 4] =
    ["account_id", "content_id", "object_id", "timestamp_share"];

/// The normalized edge record all platform exports converge on: one
/// account sharing one object at one instant.
///
/// Invariant: the three string fields are trimmed and non-empty, and
/// `timestamp_share` is whole seconds since the UNIX epoch. Rows that
/// cannot satisfy this are dropped upstream, never half-built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareRecord {
    pub account_id: String,
    pub content_id: String,
    pub object_id: String,
    pub timestamp_share: i64,
}

/// Lower-cased header name -> column index for one parsed file.
///
/// Lookup is case-insensitive to match detection, and a UTF-8 BOM on
/// the first header (Excel exports) is stripped before indexing.
#[derive(Debug, Clone)]
pub struct HeaderIndex {
    by_name: HashMap<String, usize>,
}

impl HeaderIndex {
    pub fn new(headers: &StringRecord) -> Self {
        let mut by_name = HashMap::with_capacity(headers.len());
        for (idx, name) in headers.iter().enumerate() {
            let name = name.trim_start_matches('\u{feff}').trim();
            // First writer wins on duplicate headers, same as keyed
            // row objects in the exports we mirror.
            by_name
                .entry(name.to_ascii_lowercase())
                .or_insert(idx);
        }
        Self { by_name }
    }

    pub fn get(&self, column: &str) -> Option<usize> {
        self.by_name.get(&column.to_ascii_lowercase()).copied()
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

/// Borrowed, header-aware view over one CSV row.
///
/// Fields decode lazily: only the columns a transformer touches pay
/// for UTF-8 validation. A missing column, a row too short to hold it,
/// or invalid UTF-8 all read as `None` and end up as a skipped row.
#[derive(Debug, Clone, Copy)]
pub struct RawRow<'a> {
    index: &'a HeaderIndex,
    fields: &'a ByteRecord,
}

impl<'a> RawRow<'a> {
    pub fn new(index: &'a HeaderIndex, fields: &'a ByteRecord) -> Self {
        Self { index, fields }
    }

    pub fn get(&self, column: &str) -> Option<&'a str> {
        let idx = self.index.get(column)?;
        let raw = self.fields.get(idx)?;
        std::str::from_utf8(raw).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_of(headers: &[&str]) -> HeaderIndex {
        HeaderIndex::new(&StringRecord::from(headers.to_vec()))
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let idx = index_of(&["videoId", "channelTitle"]);
        assert_eq!(idx.get("videoid"), Some(0));
        assert_eq!(idx.get("VIDEOID"), Some(0));
        assert_eq!(idx.get("channeltitle"), Some(1));
        assert_eq!(idx.get("missing"), None);
    }

    #[test]
    fn bom_on_first_header_is_stripped() {
        let idx = index_of(&["\u{feff}account_id", "content_id"]);
        assert_eq!(idx.get("account_id"), Some(0));
    }

    #[test]
    fn row_reads_by_header_name() {
        let idx = index_of(&["video_id", "author_name"]);
        let rec = ByteRecord::from(vec!["v1", "alice"]);
        let row = RawRow::new(&idx, &rec);
        assert_eq!(row.get("author_name"), Some("alice"));
        assert_eq!(row.get("region_code"), None);
    }

    #[test]
    fn short_row_reads_missing_fields_as_none() {
        let idx = index_of(&["a", "b", "c"]);
        let rec = ByteRecord::from(vec!["only"]);
        let row = RawRow::new(&idx, &rec);
        assert_eq!(row.get("a"), Some("only"));
        assert_eq!(row.get("c"), None);
    }

    #[test]
    fn invalid_utf8_field_reads_as_none() {
        let idx = index_of(&["a", "b"]);
        let mut rec = ByteRecord::new();
        rec.push_field(b"ok");
        rec.push_field(&[0xff, 0xfe]);
        let row = RawRow::new(&idx, &rec);
        assert_eq!(row.get("a"), Some("ok"));
        assert_eq!(row.get("b"), None);
    }
}
