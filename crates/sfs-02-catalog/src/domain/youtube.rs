//! YouTube URL helpers.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Captures the 11-character video id from watch, embed, short and
    /// `youtu.be` links.
    static ref VIDEO_ID: Regex = Regex::new(
        r#"(?:youtube\.com/(?:[^/]+/.+/|(?:v|e(?:mbed)?)/|.*[?&]v=)|youtu\.be/)([^"&?/\s]{11})"#
    )
    .expect("video id pattern is valid");

    /// Accepted host shapes for submitted YouTube links.
    static ref YOUTUBE_URL: Regex =
        Regex::new(r"^(https?://)?(www\.)?(youtube\.com|youtu\.be)/.+")
            .expect("youtube url pattern is valid");
}

/// Extracts the video id, if the URL carries one.
pub fn youtube_video_id(url: &str) -> Option<&str> {
    VIDEO_ID
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Medium-quality thumbnail for a video URL.
pub fn youtube_thumbnail(url: &str) -> Option<String> {
    youtube_video_id(url).map(|id| format!("https://img.youtube.com/vi/{id}/mqdefault.jpg"))
}

pub fn is_valid_youtube_url(url: &str) -> bool {
    YOUTUBE_URL.is_match(url)
}
