//! ffprobe-backed clip inspection.
//!
//! Shells out to `ffprobe -v quiet -print_format json -show_format
//! -show_streams` and maps the JSON output into a [`ClipInfo`].

use std::path::Path;

use serde::Deserialize;

use crate::command::ToolCommand;
use crate::tools::ToolRegistry;

/// Summary of a video clip's technical properties.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipInfo {
    /// Duration in seconds.
    pub duration_secs: f64,
    pub width: u32,
    pub height: u32,
    /// Average frame rate.
    pub fps: f64,
    /// Video codec name (e.g. "h264").
    pub codec: String,
}

/// Probe a clip with ffprobe.
///
/// # Errors
///
/// Returns [`tf_core::Error::Tool`] if ffprobe is missing or fails, and an
/// internal error if its output lacks a video stream or a duration.
pub async fn probe_clip(tools: &ToolRegistry, path: &Path) -> tf_core::Result<ClipInfo> {
    let ffprobe = tools.require("ffprobe")?;
    let output = ToolCommand::new(ffprobe.clone())
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg_path(path)
        .execute()
        .await?;

    let ff: FfprobeOutput = serde_json::from_str(&output.stdout).map_err(|e| {
        tf_core::Error::tool("ffprobe", format!("JSON parse error: {e}"))
    })?;

    let video = ff
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| {
            tf_core::Error::tool(
                "ffprobe",
                format!("no video stream in {}", path.display()),
            )
        })?;

    let duration_secs = ff
        .format
        .duration
        .as_deref()
        .and_then(|d| d.parse::<f64>().ok())
        .ok_or_else(|| {
            tf_core::Error::tool(
                "ffprobe",
                format!("no duration reported for {}", path.display()),
            )
        })?;

    Ok(ClipInfo {
        duration_secs,
        width: video.width.unwrap_or(0),
        height: video.height.unwrap_or(0),
        fps: video
            .avg_frame_rate
            .as_deref()
            .and_then(parse_frame_rate)
            .unwrap_or(0.0),
        codec: video.codec_name.clone().unwrap_or_default(),
    })
}

/// Parse ffprobe's fractional frame rate ("30000/1001") into a float.
fn parse_frame_rate(s: &str) -> Option<f64> {
    match s.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.parse().ok()?;
            let den: f64 = den.parse().ok()?;
            if den == 0.0 {
                None
            } else {
                Some(num / den)
            }
        }
        None => s.parse().ok(),
    }
}

// ---------------------------------------------------------------------------
// JSON structures
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    avg_frame_rate: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_rate_fraction() {
        assert_eq!(parse_frame_rate("30/1"), Some(30.0));
        let ntsc = parse_frame_rate("30000/1001").unwrap();
        assert!((ntsc - 29.97).abs() < 0.01);
    }

    #[test]
    fn frame_rate_zero_denominator() {
        assert_eq!(parse_frame_rate("0/0"), None);
    }

    #[test]
    fn frame_rate_plain_number() {
        assert_eq!(parse_frame_rate("25"), Some(25.0));
    }

    #[test]
    fn ffprobe_json_mapping() {
        let json = r#"{
            "format": {"duration": "8.008000"},
            "streams": [
                {"codec_type": "audio", "codec_name": "aac"},
                {
                    "codec_type": "video",
                    "codec_name": "h264",
                    "width": 1080,
                    "height": 1920,
                    "avg_frame_rate": "30/1"
                }
            ]
        }"#;
        let ff: FfprobeOutput = serde_json::from_str(json).unwrap();
        assert_eq!(ff.streams.len(), 2);
        assert_eq!(ff.format.duration.as_deref(), Some("8.008000"));
        let video = ff
            .streams
            .iter()
            .find(|s| s.codec_type.as_deref() == Some("video"))
            .unwrap();
        assert_eq!(video.width, Some(1080));
        assert_eq!(video.codec_name.as_deref(), Some("h264"));
    }
}
