use regex::Regex;
use std::{fmt, sync::LazyLock};

/// Canonical short-link prefix used as cache key and fetch argument.
pub const CANONICAL_PREFIX: &str = "https://youtu.be/";

/// Host and path grammar shared by the id extractor and the `@link` rewriter.
///
/// Groups: 1 scheme, 2 host with any subdomains (greedy up to the last `/`
/// of the token), 3 path prefix, 4 video id.
///
/// The id also stops at whitespace so a link never swallows the text after it.
pub(crate) const YOUTUBE_URL_PATTERN: &str =
    r"(https?://)?((?:[\w-]+\.)*youtu\S*be\S*)/(watch\?v=|embed/|v/|shorts/|)([^&#?/\s]+)";

static VIDEO_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(YOUTUBE_URL_PATTERN).unwrap());

/// Identifier of a YouTube video, either a raw 11 character id or the
/// segment parsed out of a URL. No further validation is applied.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VideoId(String);

impl VideoId {
    pub(crate) fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `https://youtu.be/<id>`
    pub fn canonical_url(&self) -> String {
        format!("{}{}", CANONICAL_PREFIX, self.0)
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for VideoId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Extracts a video id from a bare id or a youtube/youtu.be style URL.
///
/// Anything exactly 11 characters long is taken as an id as-is. Otherwise the
/// id is the path segment after `watch?v=`, `embed/`, `v/`, `shorts/` (or the
/// bare short-link path), cut at the first `&`, `#` or `?`.
pub fn extract_video_id(input: &str) -> Option<VideoId> {
    if input.chars().count() == 11 {
        return Some(VideoId::new(input));
    }

    VIDEO_URL_RE
        .captures(input)
        .and_then(|captures| captures.get(4))
        .map(|id| VideoId::new(id.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(input: &str) -> Option<String> {
        extract_video_id(input).map(|id| id.to_string())
    }

    #[test]
    fn test_bare_id_is_returned_unchanged() {
        assert_eq!(id("dQw4w9WgXcQ").as_deref(), Some("dQw4w9WgXcQ"));
        // Any 11 characters count, no validation is done.
        assert_eq!(id("not a url!!").as_deref(), Some("not a url!!"));
    }

    #[test]
    fn test_url_forms() {
        assert_eq!(id("https://youtu.be/dQw4w9WgXcQ").as_deref(), Some("dQw4w9WgXcQ"));
        assert_eq!(
            id("https://www.youtube.com/watch?v=dQw4w9WgXcQ&foo=bar").as_deref(),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(
            id("youtube.com/embed/dQw4w9WgXcQ?start=10").as_deref(),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(
            id("http://m.youtube.com/shorts/abcDEF12345#t").as_deref(),
            Some("abcDEF12345")
        );
        assert_eq!(id("https://youtube.com/v/vXyZ1234567").as_deref(), Some("vXyZ1234567"));
        assert_eq!(id("https://youtu.be/vXyZ1234567").as_deref(), Some("vXyZ1234567"));
    }

    #[test]
    fn test_trailing_slash_is_not_part_of_the_id() {
        assert_eq!(id("https://youtu.be/dQw4w9WgXcQ/").as_deref(), Some("dQw4w9WgXcQ"));
        assert_eq!(
            id("https://www.youtube.com/shorts/abcDEF12345/").as_deref(),
            Some("abcDEF12345")
        );
        assert_eq!(id("https://youtu.be/abc def").as_deref(), Some("abc"));
    }

    #[test]
    fn test_unrecognised_input() {
        assert_eq!(id("https://example.com/video"), None);
        assert_eq!(id("https://youtu.be/"), None);
        assert_eq!(id(""), None);
    }

    #[test]
    fn test_canonical_url() {
        let video = extract_video_id("https://youtu.be/dQw4w9WgXcQ").unwrap();
        assert_eq!(video.canonical_url(), "https://youtu.be/dQw4w9WgXcQ");
    }
}
