//! Ordered clip concatenation with optional normalization and crossfades.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::command::ToolCommand;
use crate::probe::probe_clip;
use crate::tools::ToolRegistry;

/// Transition applied between adjacent clips.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transition {
    /// Hard cut.
    Cut,
    /// Crossfade with the given duration in seconds.
    Crossfade { duration_secs: f32 },
}

/// Common profile all clips are normalized to before concatenation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizeProfile {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

/// Options for [`concat_clips`].
#[derive(Debug, Clone)]
pub struct ConcatOptions {
    pub transition: Transition,
    /// When set, every clip is scaled/padded/retimed to this profile.
    pub normalize: Option<NormalizeProfile>,
}

/// Concatenate `inputs` in order into `output`.
///
/// - Plain cuts without normalization use the concat demuxer with stream
///   copy (no re-encode).
/// - Normalization and crossfades build a filter graph and re-encode.
///   Crossfade offsets are derived by probing each input's duration.
///
/// Audio is dropped; generated clips carry none.
///
/// # Errors
///
/// Returns [`tf_core::Error::Tool`] on any ffmpeg/ffprobe failure, or an
/// internal error when `inputs` is empty.
pub async fn concat_clips(
    tools: &ToolRegistry,
    inputs: &[PathBuf],
    output: &Path,
    opts: &ConcatOptions,
) -> tf_core::Result<PathBuf> {
    if inputs.is_empty() {
        return Err(tf_core::Error::Internal(
            "concat_clips called with no inputs".into(),
        ));
    }

    tracing::info!(
        clips = inputs.len(),
        transition = ?opts.transition,
        "assembling {}",
        output.display()
    );

    match (opts.transition, &opts.normalize) {
        (Transition::Cut, None) => concat_demuxer(tools, inputs, output).await?,
        _ => concat_filter_graph(tools, inputs, output, opts).await?,
    }

    Ok(output.to_path_buf())
}

/// Stream-copy concatenation via the concat demuxer.
async fn concat_demuxer(
    tools: &ToolRegistry,
    inputs: &[PathBuf],
    output: &Path,
) -> tf_core::Result<()> {
    let ffmpeg = tools.require("ffmpeg")?;

    let mut list = String::new();
    for input in inputs {
        // The concat demuxer's quoting rule: single quotes, escaped inline.
        let escaped = input.to_string_lossy().replace('\'', "'\\''");
        let _ = writeln!(list, "file '{escaped}'");
    }
    let list_path = output.with_extension("concat.txt");
    std::fs::write(&list_path, list)?;

    let result = ToolCommand::new(ffmpeg.clone())
        .args(["-y", "-f", "concat", "-safe", "0", "-i"])
        .arg_path(&list_path)
        .args(["-c", "copy", "-an"])
        .arg_path(output)
        .execute()
        .await;

    let _ = std::fs::remove_file(&list_path);
    result.map(|_| ())
}

/// Re-encoding concatenation through a filter graph, with optional
/// per-input normalization and xfade transitions.
async fn concat_filter_graph(
    tools: &ToolRegistry,
    inputs: &[PathBuf],
    output: &Path,
    opts: &ConcatOptions,
) -> tf_core::Result<()> {
    let ffmpeg = tools.require("ffmpeg")?;

    // Crossfades need every clip's duration for the xfade offsets.
    let durations = match opts.transition {
        Transition::Crossfade { .. } if inputs.len() > 1 => {
            let mut durations = Vec::with_capacity(inputs.len());
            for input in inputs {
                durations.push(probe_clip(tools, input).await?.duration_secs);
            }
            durations
        }
        _ => Vec::new(),
    };

    let filter = build_filter_graph(inputs.len(), opts, &durations);

    let mut cmd = ToolCommand::new(ffmpeg.clone()).arg("-y");
    for input in inputs {
        cmd = cmd.arg("-i").arg_path(input);
    }
    cmd = cmd
        .args(["-filter_complex", &filter, "-map", "[vout]"])
        .args(["-c:v", "libx264", "-pix_fmt", "yuv420p", "-movflags", "+faststart", "-an"])
        .arg_path(output);

    cmd.execute().await.map(|_| ())
}

/// Build the `-filter_complex` expression for `n` inputs.
fn build_filter_graph(n: usize, opts: &ConcatOptions, durations: &[f64]) -> String {
    let mut filter = String::new();

    // Per-input normalization (or a bare passthrough label).
    for i in 0..n {
        match opts.normalize {
            Some(p) => {
                let _ = write!(
                    filter,
                    "[{i}:v]scale={w}:{h}:force_original_aspect_ratio=decrease,\
                     pad={w}:{h}:(ow-iw)/2:(oh-ih)/2,fps={fps},setsar=1[v{i}];",
                    w = p.width,
                    h = p.height,
                    fps = p.fps,
                );
            }
            None => {
                let _ = write!(filter, "[{i}:v]null[v{i}];");
            }
        }
    }

    if n == 1 {
        filter.push_str("[v0]null[vout]");
        return filter;
    }

    match opts.transition {
        Transition::Cut => {
            for i in 0..n {
                let _ = write!(filter, "[v{i}]");
            }
            let _ = write!(filter, "concat=n={n}:v=1:a=0[vout]");
        }
        Transition::Crossfade { duration_secs } => {
            let d = f64::from(duration_secs);
            // Chain xfades: each offset is the running visible length of
            // everything already joined, minus one fade.
            let mut offset = durations[0] - d;
            let mut prev = "v0".to_string();
            for i in 1..n {
                let out = if i == n - 1 {
                    "vout".to_string()
                } else {
                    format!("vx{i}")
                };
                let _ = write!(
                    filter,
                    "[{prev}][v{i}]xfade=transition=fade:duration={d}:offset={offset:.3}[{out}];",
                );
                offset += durations[i] - d;
                prev = out;
            }
            // Drop the trailing semicolon.
            filter.pop();
        }
    }

    filter
}

#[cfg(test)]
mod tests {
    use super::*;
    use tf_core::config::ToolsConfig;

    fn profile() -> NormalizeProfile {
        NormalizeProfile {
            width: 1080,
            height: 1920,
            fps: 30,
        }
    }

    #[test]
    fn cut_graph_uses_concat_filter() {
        let opts = ConcatOptions {
            transition: Transition::Cut,
            normalize: Some(profile()),
        };
        let filter = build_filter_graph(3, &opts, &[]);
        assert!(filter.contains("scale=1080:1920"));
        assert!(filter.contains("concat=n=3:v=1:a=0[vout]"));
    }

    #[test]
    fn crossfade_graph_chains_xfades_with_offsets() {
        let opts = ConcatOptions {
            transition: Transition::Crossfade { duration_secs: 0.5 },
            normalize: None,
        };
        let filter = build_filter_graph(3, &opts, &[4.0, 4.0, 4.0]);
        // First fade starts at 4.0 - 0.5, second at 3.5 + 4.0 - 0.5.
        assert!(filter.contains("offset=3.500"), "filter: {filter}");
        assert!(filter.contains("offset=7.000"), "filter: {filter}");
        assert!(filter.ends_with("[vout]"), "filter: {filter}");
        assert!(!filter.contains("concat="));
    }

    #[test]
    fn single_input_is_a_passthrough() {
        let opts = ConcatOptions {
            transition: Transition::Crossfade { duration_secs: 0.5 },
            normalize: Some(profile()),
        };
        let filter = build_filter_graph(1, &opts, &[]);
        assert!(filter.ends_with("[v0]null[vout]"));
    }

    #[tokio::test]
    async fn empty_inputs_is_an_error() {
        let tools = ToolRegistry::discover(&ToolsConfig::default());
        let dir = tempfile::tempdir().unwrap();
        let opts = ConcatOptions {
            transition: Transition::Cut,
            normalize: None,
        };
        let result = concat_clips(&tools, &[], &dir.path().join("out.mp4"), &opts).await;
        assert!(result.is_err());
    }
}
