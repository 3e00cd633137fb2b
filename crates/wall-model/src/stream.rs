//! Probed stream descriptors.
//!
//! One `ffprobe -of json -show_streams` call per source yields a
//! [`SourceMedia`]: the source's audio and video streams, classified by
//! codec type with the reported order preserved. Descriptors are built
//! once at startup and read-only thereafter.

use serde_json::Value;

use wallcast_common::error::{WallcastError, WallcastResult};

/// Stream classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Audio,
    Video,
}

/// One media stream as reported by the prober.
#[derive(Debug, Clone)]
pub struct StreamDescriptor {
    /// Stream index in prober ordering; the first half of a channel id.
    pub index: u32,
    pub kind: StreamKind,
    /// Audio channel count; 0 when the prober does not report one.
    pub channels: u32,
    /// Audio channel layout name, when reported.
    pub channel_layout: Option<String>,
    /// Video sample aspect ratio as a "W:H" string, when reported.
    pub sample_aspect_ratio: Option<String>,
    /// Video width in pixels; 0 for audio streams.
    pub width: u32,
    /// Video height in pixels; 0 for audio streams.
    pub height: u32,
}

/// All usable streams of one source, in reported order.
#[derive(Debug, Clone, Default)]
pub struct SourceMedia {
    pub audio: Vec<StreamDescriptor>,
    pub video: Vec<StreamDescriptor>,
}

impl SourceMedia {
    /// Parse the prober's JSON document (expects a top-level `streams`
    /// array). Streams of unknown codec type are ignored.
    pub fn from_probe_json(doc: &Value) -> WallcastResult<SourceMedia> {
        let streams = doc
            .get("streams")
            .and_then(|s| s.as_array())
            .ok_or_else(|| {
                WallcastError::probe("probe output carries no \"streams\" array".to_string())
            })?;

        let mut media = SourceMedia::default();
        for stream in streams {
            let Some(kind) = stream
                .get("codec_type")
                .and_then(|t| t.as_str())
                .and_then(|t| match t {
                    "audio" => Some(StreamKind::Audio),
                    "video" => Some(StreamKind::Video),
                    _ => None,
                })
            else {
                continue;
            };

            let descriptor = StreamDescriptor {
                index: stream
                    .get("index")
                    .and_then(|i| i.as_u64())
                    .unwrap_or(0) as u32,
                kind,
                channels: stream
                    .get("channels")
                    .and_then(|c| c.as_u64())
                    .unwrap_or(0) as u32,
                channel_layout: stream
                    .get("channel_layout")
                    .and_then(|l| l.as_str())
                    .map(String::from),
                sample_aspect_ratio: stream
                    .get("sample_aspect_ratio")
                    .and_then(|r| r.as_str())
                    .map(String::from),
                width: stream.get("width").and_then(|w| w.as_u64()).unwrap_or(0) as u32,
                height: stream.get("height").and_then(|h| h.as_u64()).unwrap_or(0) as u32,
            };

            match kind {
                StreamKind::Audio => media.audio.push(descriptor),
                StreamKind::Video => media.video.push(descriptor),
            }
        }

        Ok(media)
    }

    /// The authoritative video stream: the first one reported.
    pub fn primary_video(&self) -> Option<&StreamDescriptor> {
        self.video.first()
    }
}
