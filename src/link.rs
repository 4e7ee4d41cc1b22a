//! YouTube link validation, run before anything is downloaded.

use url::Url;

use crate::error::{CaptionError, Result};

const YOUTUBE_HOSTS: &[&str] = &[
    "youtube.com",
    "www.youtube.com",
    "m.youtube.com",
    "youtu.be",
];

/// Check that `raw` looks like a single-video YouTube URL.
///
/// Rejects non-YouTube hosts, non-http(s) schemes, and playlist links.
/// Duration is checked later, once the container metadata is available.
pub(crate) fn validate_youtube_link(raw: &str) -> Result<()> {
    let url = Url::parse(raw)
        .map_err(|_| CaptionError::invalid_link("not a valid URL, please paste a YouTube link"))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(CaptionError::invalid_link("only http(s) links are supported"));
    }

    let host = url
        .host_str()
        .ok_or_else(|| CaptionError::invalid_link("link has no host"))?;
    if !YOUTUBE_HOSTS.contains(&host) {
        return Err(CaptionError::invalid_link(format!(
            "{host} is not a YouTube host"
        )));
    }

    let is_playlist = url.path().contains("playlist")
        || url.query_pairs().any(|(key, _)| key == "list");
    if is_playlist {
        return Err(CaptionError::invalid_link(
            "link is a playlist, please paste a single video URL",
        ));
    }

    if url.path() == "/" && url.query().is_none() {
        return Err(CaptionError::invalid_link("link does not point at a video"));
    }

    Ok(())
}

/// Reject sources longer than `max_secs`, when the duration is known.
pub(crate) fn check_duration(duration_secs: Option<f64>, max_secs: u64) -> Result<()> {
    match duration_secs {
        Some(secs) if secs > max_secs as f64 => Err(CaptionError::DurationExceeded {
            limit_secs: max_secs,
        }),
        _ => Ok(()),
    }
}
