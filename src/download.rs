//! Video download using yt-dlp.

use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;
use tracing::info;

use crate::error::{CaptionError, Result};

/// Download a YouTube video to `output_path` as MP4.
///
/// The link must already have passed [`crate::link::validate_youtube_link`].
pub(crate) async fn download_video(url: &str, output_path: &Path) -> Result<()> {
    info!(url, output = %output_path.display(), "downloading video");

    let output = Command::new("yt-dlp")
        .arg("--no-playlist")
        .arg("-f")
        .arg("bestvideo[ext=mp4]+bestaudio[ext=m4a]/best[ext=mp4]/best")
        .arg("--merge-output-format")
        .arg("mp4")
        .arg("-o")
        .arg(output_path)
        .arg(url)
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| CaptionError::download_failed(format!("failed to run yt-dlp: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(CaptionError::download_failed(format!(
            "yt-dlp exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }

    if !output_path.exists() {
        return Err(CaptionError::download_failed(
            "yt-dlp reported success but produced no file",
        ));
    }

    Ok(())
}
