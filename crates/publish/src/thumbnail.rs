//! Video cover derivation via ffmpeg.

use std::{
    path::{Path, PathBuf},
    process::Stdio,
};

use {tokio::process::Command, tracing::debug};

use crate::error::{PublishError, Result};

/// Where a derived cover for `video` lands.
fn thumbnail_path_for(video: &Path) -> PathBuf {
    PathBuf::from(format!("{}_thumbnail.jpg", video.display()))
}

/// Sample a single frame one second into the video and write it next to the
/// source as a JPEG cover. The caller owns (and deletes) the result.
pub async fn derive_thumbnail(ffmpeg_binary: &str, video: &Path) -> Result<PathBuf> {
    let output_path = thumbnail_path_for(video);
    debug!(video = %video.display(), cover = %output_path.display(), "deriving video cover");

    let output = Command::new(ffmpeg_binary)
        .arg("-y")
        .arg("-ss")
        .arg("00:00:01")
        .arg("-i")
        .arg(video)
        .arg("-frames:v")
        .arg("1")
        .arg("-vf")
        .arg("scale=1080:1080:force_original_aspect_ratio=decrease")
        .arg(&output_path)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| PublishError::thumbnail(format!("failed to run {ffmpeg_binary}: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let tail: String = stderr
            .lines()
            .rev()
            .take(3)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect::<Vec<_>>()
            .join("; ");
        return Err(PublishError::thumbnail(format!(
            "{ffmpeg_binary} exited with {}: {tail}",
            output.status
        )));
    }

    Ok(output_path)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cover_lands_next_to_the_source() {
        let path = thumbnail_path_for(Path::new("uploads/clip.mp4"));
        assert_eq!(path, PathBuf::from("uploads/clip.mp4_thumbnail.jpg"));
    }

    #[tokio::test]
    async fn missing_binary_is_a_thumbnail_error() {
        let err = derive_thumbnail("definitely-not-ffmpeg", Path::new("clip.mp4"))
            .await
            .unwrap_err();
        assert!(matches!(err, PublishError::Thumbnail { .. }));
    }
}
