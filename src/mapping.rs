//! Manual column mapping, the fallback when detection returns `Other`.
//!
//! The wizard sends `{column_index, field}` pairs; we compile them into
//! a plan before touching any row so a bad mapping set fails fast with
//! a typed error instead of silently dropping an entire file.

use csv_async::ByteRecord;
use serde::{Deserialize, Serialize};

use crate::record::ShareRecord;
use crate::transform::{non_empty, parse_timestamp};
use crate::{NormalizeError, NormalizeResult};

/// The four fields of the canonical share record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    AccountId,
    ContentId,
    ObjectId,
    TimestampShare,
}

impl CanonicalField {
    pub fn as_str(self) -> &'static str {
        match self {
            CanonicalField::AccountId => "account_id",
            CanonicalField::ContentId => "content_id",
            CanonicalField::ObjectId => "object_id",
            CanonicalField::TimestampShare => "timestamp_share",
        }
    }
}

/// One user-chosen assignment: raw column N supplies canonical field F.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub column_index: usize,
    pub field: CanonicalField,
}

/// Compiled mapping set: exactly one source column per canonical field.
///
/// Compilation rejects a field targeted twice and a field not targeted
/// at all. Validity per row matches the automatic transformers: every
/// field trimmed and non-empty, timestamp parsed, else the row drops.
#[derive(Debug, Clone)]
pub struct MappingPlan {
    account: usize,
    content: usize,
    object: usize,
    timestamp: usize,
}

impl MappingPlan {
    pub fn compile(mappings: &[ColumnMapping]) -> NormalizeResult<Self> {
        let mut slots: [Option<usize>; 4] = [None; 4];
        for mapping in mappings {
            let slot = &mut slots[mapping.field as usize];
            if slot.is_some() {
                return Err(NormalizeError::DuplicateMappingTarget(mapping.field.as_str()));
            }
            *slot = Some(mapping.column_index);
        }
        let require = |field: CanonicalField| {
            slots[field as usize].ok_or(NormalizeError::MissingMappingTarget(field.as_str()))
        };
        Ok(Self {
            account: require(CanonicalField::AccountId)?,
            content: require(CanonicalField::ContentId)?,
            object: require(CanonicalField::ObjectId)?,
            timestamp: require(CanonicalField::TimestampShare)?,
        })
    }

    pub(crate) fn transform_record(&self, record: &ByteRecord) -> Option<ShareRecord> {
        let field = |index: usize| {
            record
                .get(index)
                .and_then(|raw| std::str::from_utf8(raw).ok())
        };
        let account_id = non_empty(field(self.account)?)?.to_owned();
        let content_id = non_empty(field(self.content)?)?.to_owned();
        let object_id = non_empty(field(self.object)?)?.to_owned();
        let timestamp_share = parse_timestamp(field(self.timestamp)?)?;
        Some(ShareRecord {
            account_id,
            content_id,
            object_id,
            timestamp_share,
        })
    }
}
