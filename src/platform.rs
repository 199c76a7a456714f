use std::fmt;

use serde::{Deserialize, Serialize};

use crate::record::CANONICAL_HEADERS;

/// Source platform of an uploaded CSV, classified from its header row.
///
/// `Other` is the catch-all for exports nothing matched; those rows can
/// only be normalized through a manual column mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Preprocessed,
    YouTube,
    TikTok,
    Facebook,
    Instagram,
    Telegram,
    BlueSky,
    Other,
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Platform::Preprocessed => "preprocessed",
            Platform::YouTube => "youtube",
            Platform::TikTok => "tiktok",
            Platform::Facebook => "facebook",
            Platform::Instagram => "instagram",
            Platform::Telegram => "telegram",
            Platform::BlueSky => "bluesky",
            Platform::Other => "other",
        };
        f.write_str(name)
    }
}

impl Platform {
    /// Classify a header set. Pure and deterministic; comparisons are
    /// case-insensitive and tolerate a UTF-8 BOM on the first header.
    ///
    /// The rules run in a fixed priority order because some signatures
    /// are subsets of others:
    /// - Facebook "Surface" exports also carry `post_owner.*`, so the
    ///   surface check must win before Instagram is considered.
    /// - The BlueSky rule (`username` + `id`, at most 4 headers) keeps
    ///   its narrow header bound so generic exports that happen to have
    ///   both names don't match. One extra column pushes a real BlueSky
    ///   export to `Other`; kept for compatibility with existing uploads.
    pub fn identify<S: AsRef<str>>(headers: &[S]) -> Platform {
        let names: Vec<String> = headers
            .iter()
            .map(|h| {
                h.as_ref()
                    .trim_start_matches('\u{feff}')
                    .trim()
                    .to_ascii_lowercase()
            })
            .collect();
        let has = |name: &str| names.iter().any(|h| h == name);

        if CANONICAL_HEADERS.iter().all(|h| has(h)) {
            Platform::Preprocessed
        } else if has("videoid") {
            Platform::YouTube
        } else if has("video_id") && has("author_name") {
            Platform::TikTok
        } else if has("surface.id") || has("surface.name") {
            Platform::Facebook
        } else if has("post_owner.id")
            && has("post_owner.name")
            && !has("surface.id")
            && !has("surface.name")
        {
            Platform::Instagram
        } else if has("channel_id") || has("channel_name") {
            Platform::Telegram
        } else if has("username") && has("id") && names.len() <= 4 {
            Platform::BlueSky
        } else {
            Platform::Other
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_headers_are_other() {
        let none: [&str; 0] = [];
        assert_eq!(Platform::identify(&none), Platform::Other);
    }

    #[test]
    fn preprocessed_wins_regardless_of_extras_and_order() {
        let headers = [
            "extra_col",
            "timestamp_share",
            "object_id",
            "account_id",
            "content_id",
        ];
        assert_eq!(Platform::identify(&headers), Platform::Preprocessed);
    }

    #[test]
    fn detection_is_case_insensitive() {
        assert_eq!(
            Platform::identify(&["videoId", "channelTitle"]),
            Platform::YouTube
        );
        assert_eq!(
            Platform::identify(&["Video_ID", "Author_Name", "Create_Time"]),
            Platform::TikTok
        );
    }

    #[test]
    fn facebook_beats_instagram_when_both_signatures_present() {
        let headers = ["surface.id", "post_owner.id", "post_owner.name", "id"];
        assert_eq!(Platform::identify(&headers), Platform::Facebook);
    }

    #[test]
    fn instagram_needs_both_owner_fields() {
        let headers = ["post_owner.id", "post_owner.name", "id", "creation_time"];
        assert_eq!(Platform::identify(&headers), Platform::Instagram);
        let partial = ["post_owner.id", "id", "creation_time"];
        assert_eq!(Platform::identify(&partial), Platform::Other);
    }

    #[test]
    fn telegram_matches_on_either_channel_field() {
        assert_eq!(
            Platform::identify(&["channel_name", "message_id", "date"]),
            Platform::Telegram
        );
        assert_eq!(
            Platform::identify(&["channel_id", "message_id", "date"]),
            Platform::Telegram
        );
    }

    #[test]
    fn bluesky_header_bound_is_exact() {
        assert_eq!(
            Platform::identify(&["username", "id", "text", "date"]),
            Platform::BlueSky
        );
        // One column past the bound and the heuristic refuses.
        assert_eq!(
            Platform::identify(&["username", "id", "text", "date", "likes"]),
            Platform::Other
        );
    }

    #[test]
    fn identify_is_deterministic() {
        let headers = ["video_id", "author_name", "create_time"];
        let first = Platform::identify(&headers);
        for _ in 0..8 {
            assert_eq!(Platform::identify(&headers), first);
        }
    }

    #[test]
    fn bom_on_first_header_does_not_defeat_detection() {
        assert_eq!(
            Platform::identify(&["\u{feff}videoId", "publishedAt"]),
            Platform::YouTube
        );
    }
}
