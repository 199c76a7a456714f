//! Per-platform row transformers.
//!
//! One arm per `Platform`, all dispatched through a single exhaustive
//! match so an unhandled platform is a compile error, not a silent
//! `undefined` at runtime. Every arm feeds the same validity gate: the
//! three string fields trimmed and non-empty, the timestamp parsed to
//! epoch seconds, or the row is skipped.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::platform::Platform;
use crate::record::{RawRow, ShareRecord};
use crate::{NormalizeError, NormalizeResult};

/// One selectable raw-column source for the canonical `account_id` or
/// `object_id`. Identifiers are stable; the wizard round-trips them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SourceOption {
    pub id: &'static str,
    pub label: &'static str,
}

const POST_OWNER_FACEBOOK: &str = "post_owner_facebook";
const SURFACE_FACEBOOK: &str = "surface_facebook";
const TEXT_FACEBOOK: &str = "text_facebook";
const LINK_ATTACHMENT_FACEBOOK: &str = "link_attachment_facebook";
const POST_OWNER_INSTAGRAM: &str = "post_owner_instagram";
const TEXT_INSTAGRAM: &str = "text_instagram";
const CHANNEL_YOUTUBE: &str = "channel_youtube";
const TITLE_YOUTUBE: &str = "title_youtube";
const DESCRIPTION_YOUTUBE: &str = "description_youtube";
const TAGS_YOUTUBE: &str = "tags_youtube";
const AUTHOR_TIKTOK: &str = "author_tiktok";
const VIDEO_DESCRIPTION_TIKTOK: &str = "video_description_tiktok";
const VOICE_TO_TEXT_TIKTOK: &str = "voice_to_text_tiktok";
const VIDEO_URL_TIKTOK: &str = "video_url_tiktok";
const EFFECT_IDS_TIKTOK: &str = "effect_ids_tiktok";
const MUSIC_ID_TIKTOK: &str = "music_id_tiktok";
const HASHTAG_NAMES_TIKTOK: &str = "hashtag_names_tiktok";
const USERNAME_BLUESKY: &str = "username_bluesky";
const TEXT_BLUESKY: &str = "text_bluesky";
const CHANNEL_TELEGRAM: &str = "channel_telegram";
const AUTHOR_TELEGRAM: &str = "author_telegram";
const MESSAGE_TEXT_TELEGRAM: &str = "message_text_telegram";

const FACEBOOK_ACCOUNT: &[SourceOption] = &[
    SourceOption { id: POST_OWNER_FACEBOOK, label: "Post owner (name + id)" },
    SourceOption { id: SURFACE_FACEBOOK, label: "Surface (name + id)" },
];
const FACEBOOK_OBJECT: &[SourceOption] = &[
    SourceOption { id: TEXT_FACEBOOK, label: "Post text" },
    SourceOption { id: LINK_ATTACHMENT_FACEBOOK, label: "Link attachment URL" },
];
const INSTAGRAM_ACCOUNT: &[SourceOption] =
    &[SourceOption { id: POST_OWNER_INSTAGRAM, label: "Post owner id" }];
const INSTAGRAM_OBJECT: &[SourceOption] =
    &[SourceOption { id: TEXT_INSTAGRAM, label: "Post text" }];
const YOUTUBE_ACCOUNT: &[SourceOption] =
    &[SourceOption { id: CHANNEL_YOUTUBE, label: "Channel (title + id)" }];
const YOUTUBE_OBJECT: &[SourceOption] = &[
    SourceOption { id: TITLE_YOUTUBE, label: "Video title" },
    SourceOption { id: DESCRIPTION_YOUTUBE, label: "Video description" },
    SourceOption { id: TAGS_YOUTUBE, label: "Video tags" },
];
const TIKTOK_ACCOUNT: &[SourceOption] =
    &[SourceOption { id: AUTHOR_TIKTOK, label: "Author (name + region)" }];
const TIKTOK_OBJECT: &[SourceOption] = &[
    SourceOption { id: VIDEO_DESCRIPTION_TIKTOK, label: "Video description" },
    SourceOption { id: VOICE_TO_TEXT_TIKTOK, label: "Voice-to-text transcript" },
    SourceOption { id: VIDEO_URL_TIKTOK, label: "Video URL" },
    SourceOption { id: EFFECT_IDS_TIKTOK, label: "Effect ids" },
    SourceOption { id: MUSIC_ID_TIKTOK, label: "Music id" },
    SourceOption { id: HASHTAG_NAMES_TIKTOK, label: "Hashtag names" },
];
const BLUESKY_ACCOUNT: &[SourceOption] =
    &[SourceOption { id: USERNAME_BLUESKY, label: "Username" }];
const BLUESKY_OBJECT: &[SourceOption] =
    &[SourceOption { id: TEXT_BLUESKY, label: "Post text" }];
const TELEGRAM_ACCOUNT: &[SourceOption] = &[
    SourceOption { id: CHANNEL_TELEGRAM, label: "Channel (name + id)" },
    SourceOption { id: AUTHOR_TELEGRAM, label: "Author (name + sender id)" },
];
const TELEGRAM_OBJECT: &[SourceOption] =
    &[SourceOption { id: MESSAGE_TEXT_TELEGRAM, label: "Message text" }];

impl Platform {
    /// Selectable sources for the canonical `account_id`. Empty when the
    /// platform is a pass-through (`Preprocessed`) or unmapped (`Other`).
    pub fn account_options(self) -> &'static [SourceOption] {
        match self {
            Platform::Preprocessed | Platform::Other => &[],
            Platform::Facebook => FACEBOOK_ACCOUNT,
            Platform::Instagram => INSTAGRAM_ACCOUNT,
            Platform::YouTube => YOUTUBE_ACCOUNT,
            Platform::TikTok => TIKTOK_ACCOUNT,
            Platform::BlueSky => BLUESKY_ACCOUNT,
            Platform::Telegram => TELEGRAM_ACCOUNT,
        }
    }

    /// Selectable sources for the canonical `object_id`.
    pub fn object_options(self) -> &'static [SourceOption] {
        match self {
            Platform::Preprocessed | Platform::Other => &[],
            Platform::Facebook => FACEBOOK_OBJECT,
            Platform::Instagram => INSTAGRAM_OBJECT,
            Platform::YouTube => YOUTUBE_OBJECT,
            Platform::TikTok => TIKTOK_OBJECT,
            Platform::BlueSky => BLUESKY_OBJECT,
            Platform::Telegram => TELEGRAM_OBJECT,
        }
    }

    /// Validate a requested account source against this platform's
    /// options. A single option auto-selects; multiple options need an
    /// explicit choice. Fails before any row is read.
    pub fn resolve_account(self, requested: Option<&str>) -> NormalizeResult<Option<&'static str>> {
        match resolve_selection(self.account_options(), requested) {
            Ok(resolved) => Ok(resolved),
            Err(Selection::Required) => Err(NormalizeError::AccountSourceRequired { platform: self }),
            Err(Selection::Unknown(id)) => {
                Err(NormalizeError::UnknownAccountSource { platform: self, id })
            }
        }
    }

    /// Validate a requested object source. Same rules as accounts.
    pub fn resolve_object(self, requested: Option<&str>) -> NormalizeResult<Option<&'static str>> {
        match resolve_selection(self.object_options(), requested) {
            Ok(resolved) => Ok(resolved),
            Err(Selection::Required) => Err(NormalizeError::ObjectSourceRequired { platform: self }),
            Err(Selection::Unknown(id)) => {
                Err(NormalizeError::UnknownObjectSource { platform: self, id })
            }
        }
    }

    /// Map one raw row to a canonical record, or `None` to skip it.
    ///
    /// `account` / `object` are ids from `resolve_account` /
    /// `resolve_object`. An id that doesn't belong to this platform
    /// skips the row rather than panicking; the pipeline validates
    /// selections up-front so that arm is unreachable in normal use.
    pub fn transform_row(
        self,
        row: &RawRow<'_>,
        account: Option<&str>,
        object: Option<&str>,
    ) -> Option<ShareRecord> {
        match self {
            Platform::Preprocessed => finish(
                row.get("account_id").map(str::to_owned),
                row.get("content_id"),
                row.get("object_id"),
                row.get("timestamp_share"),
            ),
            Platform::Facebook => {
                let account = match account? {
                    POST_OWNER_FACEBOOK => {
                        labeled(row.get("post_owner.name"), row.get("post_owner.id"))
                    }
                    SURFACE_FACEBOOK => labeled(row.get("surface.name"), row.get("surface.id")),
                    _ => None,
                };
                let object = match object? {
                    TEXT_FACEBOOK => row.get("text"),
                    LINK_ATTACHMENT_FACEBOOK => row.get("link_attachment.link"),
                    _ => None,
                };
                finish(account, row.get("id"), object, row.get("creation_time"))
            }
            Platform::Instagram => {
                // Owner name must be present in the export even though
                // only the id lands in the record.
                row.get("post_owner.name")?;
                finish(
                    row.get("post_owner.id").map(str::to_owned),
                    row.get("id"),
                    row.get("text"),
                    row.get("creation_time"),
                )
            }
            Platform::YouTube => {
                let account = labeled(row.get("channelTitle"), row.get("channelId"));
                let object = match object? {
                    TITLE_YOUTUBE => row.get("title"),
                    DESCRIPTION_YOUTUBE => row.get("description"),
                    TAGS_YOUTUBE => row.get("tags"),
                    _ => None,
                };
                finish(account, row.get("videoId"), object, row.get("publishedAt"))
            }
            Platform::TikTok => {
                let author = non_empty(row.get("author_name")?)?;
                let region = row.get("region_code").and_then(non_empty).unwrap_or("unknown");
                let account = Some(format!("{author} ({region})"));
                let object = match object? {
                    VIDEO_DESCRIPTION_TIKTOK => row.get("video_description"),
                    VOICE_TO_TEXT_TIKTOK => row.get("voice_to_text"),
                    VIDEO_URL_TIKTOK => row.get("video_url"),
                    EFFECT_IDS_TIKTOK => row.get("effect_ids"),
                    MUSIC_ID_TIKTOK => row.get("music_id"),
                    HASHTAG_NAMES_TIKTOK => row.get("hashtag_names"),
                    _ => None,
                };
                finish(account, row.get("video_id"), object, row.get("create_time"))
            }
            Platform::BlueSky => finish(
                row.get("username").map(str::to_owned),
                row.get("id"),
                row.get("text"),
                row.get("date"),
            ),
            Platform::Telegram => {
                let account = match account? {
                    CHANNEL_TELEGRAM => spaced(row.get("channel_name"), row.get("channel_id")),
                    AUTHOR_TELEGRAM => spaced(row.get("post_author"), row.get("sender_id")),
                    _ => None,
                };
                finish(
                    account,
                    row.get("message_id"),
                    row.get("message_text"),
                    row.get("date"),
                )
            }
            Platform::Other => None,
        }
    }
}

enum Selection {
    Required,
    Unknown(String),
}

fn resolve_selection(
    options: &'static [SourceOption],
    requested: Option<&str>,
) -> Result<Option<&'static str>, Selection> {
    if options.is_empty() {
        return Ok(None);
    }
    match requested {
        Some(id) => options
            .iter()
            .find(|opt| opt.id == id)
            .map(|opt| Some(opt.id))
            .ok_or_else(|| Selection::Unknown(id.to_string())),
        None if options.len() == 1 => Ok(Some(options[0].id)),
        None => Err(Selection::Required),
    }
}

pub(crate) fn non_empty(s: &str) -> Option<&str> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

/// `"{name} ({id})"`, both parts required non-empty.
fn labeled(name: Option<&str>, id: Option<&str>) -> Option<String> {
    let name = non_empty(name?)?;
    let id = non_empty(id?)?;
    Some(format!("{name} ({id})"))
}

/// `"{name} {id}"`, the Telegram shape.
fn spaced(name: Option<&str>, id: Option<&str>) -> Option<String> {
    let name = non_empty(name?)?;
    let id = non_empty(id?)?;
    Some(format!("{name} {id}"))
}

/// The shared validity gate: every canonical field present and
/// non-empty after trimming, timestamp parsed, else skip the row.
fn finish(
    account: Option<String>,
    content: Option<&str>,
    object: Option<&str>,
    timestamp_raw: Option<&str>,
) -> Option<ShareRecord> {
    let account_id = trimmed_owned(account?)?;
    let content_id = non_empty(content?)?.to_owned();
    let object_id = non_empty(object?)?.to_owned();
    let timestamp_share = parse_timestamp(timestamp_raw?)?;
    Some(ShareRecord {
        account_id,
        content_id,
        object_id,
        timestamp_share,
    })
}

fn trimmed_owned(s: String) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else if trimmed.len() == s.len() {
        Some(s)
    } else {
        Some(trimmed.to_owned())
    }
}

/// Integer values pass through as epoch seconds. Anything else parses
/// as a calendar date/time and floor-divides milliseconds to whole
/// seconds, so pre-epoch instants round toward minus infinity.
pub(crate) fn parse_timestamp(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(seconds) = raw.parse::<i64>() {
        return Some(seconds);
    }
    parse_calendar(raw).map(|millis| millis.div_euclid(1000))
}

fn parse_calendar(raw: &str) -> Option<i64> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.timestamp_millis());
    }
    // Offset timestamps with a space separator (Telegram exports).
    for fmt in ["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%z"] {
        if let Ok(dt) = DateTime::parse_from_str(raw, fmt) {
            return Some(dt.timestamp_millis());
        }
    }
    // Naive timestamps are taken as UTC.
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.and_utc().timestamp_millis());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc().timestamp_millis());
    }
    None
}
