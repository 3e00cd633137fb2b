//! Loudness snapshots.
//!
//! One plain-text file per source, one line per channel:
//! `"{channelId} {momentary} {shortTerm} {integrated} {loudnessRange}"`.
//! The file always holds a complete measurement cycle: writes go through
//! a temp file and rename, so a reader on the static side never sees a
//! half-written cycle.

use std::path::{Path, PathBuf};

/// One channel's measurements within a cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelLoudness {
    pub channel: String,
    pub momentary: f64,
    pub short_term: f64,
    pub integrated: f64,
    pub range: f64,
}

/// One complete measurement cycle, in channel-id order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoudnessSnapshot {
    pub channels: Vec<ChannelLoudness>,
}

impl LoudnessSnapshot {
    pub fn render(&self) -> String {
        let mut out = String::new();
        for c in &self.channels {
            out.push_str(&format!(
                "{} {} {} {} {}\n",
                c.channel, c.momentary, c.short_term, c.integrated, c.range
            ));
        }
        out
    }

    /// Parse a rendered snapshot; `None` on any malformed line.
    pub fn parse(text: &str) -> Option<LoudnessSnapshot> {
        let mut channels = Vec::new();
        for line in text.lines() {
            let fields: Vec<&str> = line.split_whitespace().collect();
            let [channel, momentary, short_term, integrated, range] = fields.as_slice() else {
                return None;
            };
            channels.push(ChannelLoudness {
                channel: (*channel).to_string(),
                momentary: momentary.parse().ok()?,
                short_term: short_term.parse().ok()?,
                integrated: integrated.parse().ok()?,
                range: range.parse().ok()?,
            });
        }
        Some(LoudnessSnapshot { channels })
    }
}

/// Whole-file snapshot writer for one source.
pub struct SnapshotSink {
    path: PathBuf,
}

impl SnapshotSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the file with a freshly completed cycle.
    pub fn replace(&self, snapshot: &LoudnessSnapshot) -> std::io::Result<()> {
        let staged = self.path.with_extension("tmp");
        std::fs::write(&staged, snapshot.render())?;
        std::fs::rename(&staged, &self.path)
    }

    /// Drop the current snapshot, if any; missing files are fine.
    pub fn discard(&self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "snapshot discard failed");
            }
        }
    }
}
