//! Still-frame extraction for continuity chaining.

use std::path::{Path, PathBuf};

use crate::command::ToolCommand;
use crate::tools::ToolRegistry;

/// Extract the last frame of `video` into `output` (an image path).
///
/// Seeks one second before end-of-file and keeps overwriting a single
/// output frame, so whatever frame decodes last wins.
///
/// # Errors
///
/// Returns [`tf_core::Error::Tool`] if ffmpeg is missing or the extraction
/// fails. Callers chaining continuity frames treat this as non-fatal.
pub async fn extract_last_frame(
    tools: &ToolRegistry,
    video: &Path,
    output: &Path,
) -> tf_core::Result<PathBuf> {
    let ffmpeg = tools.require("ffmpeg")?;

    tracing::debug!("extracting last frame of {} -> {}", video.display(), output.display());

    ToolCommand::new(ffmpeg.clone())
        .args(["-y", "-sseof", "-1", "-i"])
        .arg_path(video)
        .args(["-update", "1", "-frames:v", "1", "-q:v", "2"])
        .arg_path(output)
        .execute()
        .await?;

    if !output.exists() {
        return Err(tf_core::Error::tool(
            "ffmpeg",
            format!("no frame written to {}", output.display()),
        ));
    }

    Ok(output.to_path_buf())
}
