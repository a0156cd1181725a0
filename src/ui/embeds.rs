use regex::{Captures, Regex};
use std::sync::LazyLock;
use tracing::debug;

use crate::sources::youtube::{VideoId, YOUTUBE_URL_PATTERN};

/// Playback route served by the chat server's YouTube plugin
pub const DEFAULT_PLAY_ENDPOINT: &str = "/api/plugins/youtube/play/";

static VIDEO_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("@{}", YOUTUBE_URL_PATTERN)).unwrap());

static MARKDOWN_META_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\\`*_{}\[\]()#+\-.!]").unwrap());

/// Replaces every `@<youtube link>` in `text` with an inline `<video>` element
/// pointing at the default playback route.
pub fn rewrite_video_links(text: &str) -> String {
    rewrite_video_links_with(text, DEFAULT_PLAY_ENDPOINT)
}

/// Same as [`rewrite_video_links`] with a custom playback route.
pub fn rewrite_video_links_with(text: &str, play_endpoint: &str) -> String {
    VIDEO_LINK_RE
        .replace_all(text, |caps: &Captures| {
            let id = VideoId::new(&caps[4]);
            debug!("🎬 Found YouTube video: {}", id);
            video_element(play_endpoint, &id)
        })
        .into_owned()
}

/// `<video>` markup with controls, autoplay, full width and proportional height.
pub fn video_element(play_endpoint: &str, id: &VideoId) -> String {
    format!(
        r#"<video src="{}{}" controls="" autoplay="" style="width: 100%; height: auto;"></video>"#,
        play_endpoint,
        urlencoding::encode(&id.canonical_url())
    )
}

/// Backslash-escapes Markdown metacharacters: ``\ ` * _ { } [ ] ( ) # + - . !``
pub fn escape_markdown(text: &str) -> String {
    MARKDOWN_META_RE
        .replace_all(text, |caps: &Captures| format!("\\{}", &caps[0]))
        .into_owned()
}

/// `M:SS`, minutes are not folded into hours.
pub fn format_duration(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// `YYYYMMDD` to `YYYY-MM-DD` by position, the digits are not checked as a
/// calendar date. Anything that is not 8 ASCII digits is returned untouched.
pub fn format_upload_date(raw: &str) -> String {
    if raw.len() == 8 && raw.bytes().all(|b| b.is_ascii_digit()) {
        format!("{}-{}-{}", &raw[..4], &raw[4..6], &raw[6..])
    } else {
        raw.to_string()
    }
}

/// Markdown image with the chat UI's `=240x*` size hint.
pub fn thumbnail_image(title: &str, thumbnail: &str) -> String {
    format!("![{}]({} =240x*)", escape_markdown(title), thumbnail)
}
