//! Application configuration.
//!
//! All components receive an explicit [`WallConfig`] value; nothing reads
//! configuration through globals. The recognized options are enumerated
//! here and wired together at the CLI composition root.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{WallcastError, WallcastResult};

/// Global application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WallConfig {
    /// Base directory for relative paths (layout files, journals).
    pub base_dir: PathBuf,

    /// Directory served to viewers; broadcast output and loudness
    /// snapshots land here.
    pub static_dir: PathBuf,

    /// Path to the ffmpeg executable.
    pub ffmpeg_path: PathBuf,

    /// Arguments prepended to every encoder invocation.
    pub ffmpeg_global_args: Vec<String>,

    /// Path to the ffprobe executable.
    pub ffprobe_path: PathBuf,

    /// Arguments prepended to every probe invocation.
    pub ffprobe_args: Vec<String>,

    /// Per-source probe timeout in seconds.
    pub probe_timeout_secs: u64,

    /// Width of the layout grid in cells.
    pub layout_map_width: u32,

    /// Meter channel count assumed for audio streams that do not report one.
    pub audio_meter_channels: u32,

    /// Per-frame rendering defaults.
    pub frame_defaults: FrameDefaults,

    /// Encoder output settings.
    pub encoder: EncoderSettings,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Defaults applied to layout frames that omit the optional keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameDefaults {
    /// Target height of the scaled source video in pixels.
    pub video_height: u32,

    /// Font file used for meter channel labels.
    pub meter_label_font: String,

    /// Font size for meter channel labels.
    pub meter_label_font_size: u32,
}

/// Encoder output and per-source file settings.
///
/// The `{index}` placeholder in each template expands to the zero-based
/// source index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncoderSettings {
    /// Arguments appended after the filter graph (codecs, muxer).
    pub output_args: Vec<String>,

    /// Output target template, relative to `static_dir`.
    pub output_template: String,

    /// Journal (log) file template, relative to `base_dir`.
    pub journal_template: String,

    /// Loudness snapshot file template, relative to `static_dir`.
    pub snapshot_template: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "wallcast=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,
}

impl Default for WallConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("."),
            static_dir: PathBuf::from("static"),
            ffmpeg_path: PathBuf::from("/usr/bin/ffmpeg"),
            ffmpeg_global_args: vec!["-hide_banner".to_string(), "-nostats".to_string()],
            ffprobe_path: PathBuf::from("/usr/bin/ffprobe"),
            ffprobe_args: vec!["-hide_banner".to_string()],
            probe_timeout_secs: 5,
            layout_map_width: 6,
            audio_meter_channels: 2,
            frame_defaults: FrameDefaults::default(),
            encoder: EncoderSettings::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for FrameDefaults {
    fn default() -> Self {
        Self {
            video_height: 480,
            meter_label_font: "/usr/share/fonts/truetype/dejavu/DejaVuSansMono.ttf".to_string(),
            meter_label_font_size: 12,
        }
    }
}

impl Default for EncoderSettings {
    fn default() -> Self {
        Self {
            output_args: vec![
                "-c:v".to_string(),
                "libx264".to_string(),
                "-preset".to_string(),
                "veryfast".to_string(),
                "-an".to_string(),
                "-f".to_string(),
                "hls".to_string(),
                "-hls_time".to_string(),
                "2".to_string(),
                "-hls_list_size".to_string(),
                "5".to_string(),
                "-hls_flags".to_string(),
                "delete_segments".to_string(),
            ],
            output_template: "wall-{index}/live.m3u8".to_string(),
            journal_template: "logs/encoder-{index}.log".to_string(),
            snapshot_template: "loudness-{index}.txt".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl WallConfig {
    /// Load config from an explicit path, or the standard location,
    /// falling back to defaults when no file exists.
    pub fn load(path: Option<&Path>) -> WallcastResult<Self> {
        let (config_path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (config_file_path(), false),
        };

        if !config_path.exists() {
            if explicit {
                return Err(WallcastError::FileNotFound { path: config_path });
            }
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&config_path)?;
        let config: Self = serde_json::from_str(&content).map_err(|e| {
            WallcastError::config(format!(
                "config file {} is not valid: {e}",
                config_path.display()
            ))
        })?;
        Ok(config)
    }

    /// Resolve a possibly-relative path against `base_dir`.
    pub fn resolve(&self, raw: &str) -> PathBuf {
        let path = Path::new(raw);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    /// Journal file path for one source.
    pub fn journal_path(&self, index: usize) -> PathBuf {
        self.base_dir
            .join(expand_index(&self.encoder.journal_template, index))
    }

    /// Loudness snapshot file path for one source.
    pub fn snapshot_path(&self, index: usize) -> PathBuf {
        self.static_dir
            .join(expand_index(&self.encoder.snapshot_template, index))
    }

    /// Broadcast output target for one source.
    pub fn output_target(&self, index: usize) -> PathBuf {
        self.static_dir
            .join(expand_index(&self.encoder.output_template, index))
    }

    /// Check directories, files, and scalar sanity.
    ///
    /// The executable `-version` handshakes are driven separately by the
    /// CLI because they need the timeout-bounded prober.
    pub fn verify_paths(&self) -> WallcastResult<()> {
        for (name, dir) in [("base_dir", &self.base_dir), ("static_dir", &self.static_dir)] {
            if !dir.is_dir() {
                return Err(WallcastError::config(format!(
                    "{name} (\"{}\") is not an existing directory",
                    dir.display()
                )));
            }
        }
        for (name, file) in [
            ("ffmpeg_path", &self.ffmpeg_path),
            ("ffprobe_path", &self.ffprobe_path),
        ] {
            if !file.is_file() {
                return Err(WallcastError::config(format!(
                    "{name} (\"{}\") is not an existing file",
                    file.display()
                )));
            }
        }
        for (name, value) in [
            ("layout_map_width", u64::from(self.layout_map_width)),
            ("probe_timeout_secs", self.probe_timeout_secs),
            (
                "audio_meter_channels",
                u64::from(self.audio_meter_channels),
            ),
            (
                "frame_defaults.video_height",
                u64::from(self.frame_defaults.video_height),
            ),
        ] {
            if value == 0 {
                return Err(WallcastError::config(format!("{name} must be positive")));
            }
        }
        Ok(())
    }
}

/// Expand the `{index}` placeholder in a path template.
pub fn expand_index(template: &str, index: usize) -> String {
    template.replace("{index}", &index.to_string())
}

/// Standard config file location.
fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("wallcast").join("config.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expand_index_replaces_placeholder() {
        assert_eq!(expand_index("wall-{index}/live.m3u8", 3), "wall-3/live.m3u8");
        assert_eq!(expand_index("plain.log", 7), "plain.log");
    }

    #[test]
    fn resolve_keeps_absolute_paths() {
        let config = WallConfig {
            base_dir: PathBuf::from("/srv/wall"),
            ..WallConfig::default()
        };
        assert_eq!(config.resolve("/etc/layout.json"), PathBuf::from("/etc/layout.json"));
        assert_eq!(
            config.resolve("layouts/main.json"),
            PathBuf::from("/srv/wall/layouts/main.json")
        );
    }

    #[test]
    fn verify_paths_rejects_zero_scalars() {
        let config = WallConfig {
            layout_map_width: 0,
            ..WallConfig::default()
        };
        let err = config.verify_paths().unwrap_err();
        assert!(err.to_string().contains("directory") || err.to_string().contains("positive"));
    }
}
