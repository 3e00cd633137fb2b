//! Loudness telemetry extraction from the encoder's diagnostic stream.
//!
//! The loudness analyzer tags its report lines with a recognizable log
//! prefix. Reports from the per-channel analyzers arrive in instance
//! order, which matches the canonical channel-id list: one report per
//! channel per interval. The extractor walks a cursor across the channel
//! ids and publishes a snapshot each time a full cycle accumulates.
//!
//! The stream starts with one decorative-scale summary before any
//! steady-state report; that warm-up summary is skipped. This is a
//! contract with the external tool, revalidated when the tool changes,
//! not an internal invariant.

use crate::snapshot::{ChannelLoudness, LoudnessSnapshot, SnapshotSink};

/// Log prefix of the loudness analyzer's report lines.
const ANALYZER_TAG: &str = "[Parsed_ebur128_";

/// Classification of one diagnostic line.
#[derive(Debug, PartialEq)]
pub(crate) enum DiagnosticLine<'a> {
    /// Not a loudness line at all (progress spam, codec chatter, ...).
    Unrelated,
    /// The analyzer's summary header.
    Summary,
    /// A steady-state report; the tail after the analyzer tag.
    Report(&'a str),
}

pub(crate) fn classify(line: &str) -> DiagnosticLine<'_> {
    let Some(tag) = line.find(ANALYZER_TAG) else {
        return DiagnosticLine::Unrelated;
    };
    let Some(close) = line[tag..].find("] ") else {
        return DiagnosticLine::Unrelated;
    };
    let tail = line[tag + close + 2..].trim_start();

    if tail.starts_with("Summary:") {
        DiagnosticLine::Summary
    } else if tail.starts_with("t:") {
        DiagnosticLine::Report(tail)
    } else {
        DiagnosticLine::Unrelated
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct LoudnessReport {
    pub momentary: f64,
    pub short_term: f64,
    pub integrated: f64,
    pub range: f64,
}

/// Parse a steady-state report tail. The `M:`, `S:`, `I:` and `LRA:`
/// fields must appear in that order.
pub(crate) fn parse_report(tail: &str) -> Option<LoudnessReport> {
    let (momentary, rest) = field_after(tail, "M:")?;
    let (short_term, rest) = field_after(rest, "S:")?;
    let (integrated, rest) = field_after(rest, "I:")?;
    let (range, _) = field_after(rest, "LRA:")?;
    Some(LoudnessReport {
        momentary,
        short_term,
        integrated,
        range,
    })
}

fn field_after<'a>(text: &'a str, marker: &str) -> Option<(f64, &'a str)> {
    let at = text.find(marker)?;
    let rest = text[at + marker.len()..].trim_start();
    let token = rest.split_whitespace().next()?;
    let value: f64 = token.parse().ok()?;
    Some((value, &rest[token.len()..]))
}

/// Per-source telemetry state for one encoder lifetime.
pub struct TelemetryExtractor {
    channel_ids: Vec<String>,
    sink: SnapshotSink,
    enabled: bool,
    steady_seen: bool,
    cursor: usize,
    cycle: Vec<ChannelLoudness>,
}

impl TelemetryExtractor {
    /// A source with no meter channels keeps a permanently idle extractor.
    pub fn new(channel_ids: Vec<String>, sink: SnapshotSink) -> Self {
        let enabled = !channel_ids.is_empty();
        Self {
            channel_ids,
            sink,
            enabled,
            steady_seen: false,
            cursor: 0,
            cycle: Vec::new(),
        }
    }

    /// Feed one diagnostic line, in arrival order.
    pub fn observe(&mut self, line: &str) {
        if !self.enabled {
            return;
        }

        match classify(line) {
            DiagnosticLine::Unrelated => {}
            DiagnosticLine::Summary => {
                if self.steady_seen {
                    // The analyzer's closing summary at stream end.
                    tracing::debug!("loudness summary after steady state, ignoring");
                }
            }
            DiagnosticLine::Report(tail) => match parse_report(tail) {
                Some(report) => self.accumulate(report),
                None => self.disable(line),
            },
        }
    }

    /// Re-arm for the next encoder lifetime.
    pub fn reset(&mut self) {
        self.enabled = !self.channel_ids.is_empty();
        self.steady_seen = false;
        self.cursor = 0;
        self.cycle.clear();
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn accumulate(&mut self, report: LoudnessReport) {
        self.steady_seen = true;
        self.cycle.push(ChannelLoudness {
            channel: self.channel_ids[self.cursor].clone(),
            momentary: report.momentary,
            short_term: report.short_term,
            integrated: report.integrated,
            range: report.range,
        });
        self.cursor += 1;

        if self.cursor == self.channel_ids.len() {
            let snapshot = LoudnessSnapshot {
                channels: std::mem::take(&mut self.cycle),
            };
            if let Err(e) = self.sink.replace(&snapshot) {
                tracing::warn!(
                    path = %self.sink.path().display(),
                    error = %e,
                    "snapshot write failed"
                );
            }
            self.cursor = 0;
        }
    }

    /// An unparsable report desynchronizes channel correlation for good;
    /// stop extracting until the next lifetime and drop the stale file.
    fn disable(&mut self, line: &str) {
        self.enabled = false;
        self.cursor = 0;
        self.cycle.clear();
        self.sink.discard();
        tracing::warn!(line, "unparsable loudness report, telemetry disabled for this lifetime");
    }
}
