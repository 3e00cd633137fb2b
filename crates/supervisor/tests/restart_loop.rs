//! Supervision loop behavior with scripted encoder lifetimes.

use std::collections::VecDeque;

use wallcast_common::clock::FixedTimestamps;
use wallcast_common::error::{WallcastError, WallcastResult};
use wallcast_supervisor::backend::{EncoderBackend, EncoderRun};
use wallcast_supervisor::journal::Journal;
use wallcast_supervisor::snapshot::{LoudnessSnapshot, SnapshotSink};
use wallcast_supervisor::supervisor::{BoundedRestarts, EncoderSupervisor};
use wallcast_supervisor::TelemetryExtractor;

/// One scripted encoder lifetime: its diagnostic lines, then an exit.
struct ScriptedRun {
    lines: VecDeque<String>,
    status: String,
}

impl EncoderRun for ScriptedRun {
    fn next_line(&mut self) -> Option<String> {
        self.lines.pop_front()
    }

    fn wait(&mut self) -> String {
        self.status.clone()
    }
}

/// Backend that replays scripted lifetimes; launching past the script
/// yields empty lifetimes (immediate exit).
struct ScriptedEncoder {
    lifetimes: VecDeque<Vec<String>>,
    launches: std::sync::Arc<std::sync::atomic::AtomicU64>,
}

impl ScriptedEncoder {
    fn new(lifetimes: Vec<Vec<String>>) -> (Self, std::sync::Arc<std::sync::atomic::AtomicU64>) {
        let launches = std::sync::Arc::new(std::sync::atomic::AtomicU64::new(0));
        (
            Self {
                lifetimes: lifetimes.into(),
                launches: launches.clone(),
            },
            launches,
        )
    }
}

impl EncoderBackend for ScriptedEncoder {
    fn launch(&mut self) -> WallcastResult<Box<dyn EncoderRun>> {
        self.launches
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        let lines = self.lifetimes.pop_front().unwrap_or_default();
        Ok(Box::new(ScriptedRun {
            lines: lines.into(),
            status: "exit status: 1".to_string(),
        }))
    }
}

/// Backend whose spawn always fails.
struct BrokenEncoder;

impl EncoderBackend for BrokenEncoder {
    fn launch(&mut self) -> WallcastResult<Box<dyn EncoderRun>> {
        Err(WallcastError::supervision("no such executable".to_string()))
    }
}

fn report_line(m: f64) -> String {
    format!(
        "[Parsed_ebur128_0 @ 0x55d1c2a40e80] t: 2.10238    TARGET:-23 LUFS    \
         M: {m} S: -19.1     I: -19.3 LUFS       LRA: 1.5 LU"
    )
}

const SUMMARY_LINE: &str = "[Parsed_ebur128_0 @ 0x55d1c2a40e80] Summary:";

fn fixtures(
    dir: &tempfile::TempDir,
    channel_ids: &[&str],
) -> (Journal, TelemetryExtractor, std::path::PathBuf) {
    let journal_path = dir.path().join("encoder-0.log");
    let snapshot_path = dir.path().join("loudness-0.txt");
    let journal = Journal::open(
        &journal_path,
        Box::new(FixedTimestamps("2026-08-07 12:00:00".to_string())),
    )
    .unwrap();
    let telemetry = TelemetryExtractor::new(
        channel_ids.iter().map(|s| s.to_string()).collect(),
        SnapshotSink::new(&snapshot_path),
    );
    (journal, telemetry, snapshot_path)
}

#[test]
fn immediately_exiting_encoder_is_respawned() {
    let dir = tempfile::tempdir().unwrap();
    let (journal, telemetry, _) = fixtures(&dir, &[]);
    let journal_path = journal.path().clone();
    let (backend, launches) = ScriptedEncoder::new(vec![]);

    EncoderSupervisor::new("source-0", backend, journal, telemetry, BoundedRestarts(4)).run();

    assert_eq!(launches.load(std::sync::atomic::Ordering::SeqCst), 4);

    let content = std::fs::read_to_string(&journal_path).unwrap();
    let starts = content.matches("encoder starting").count();
    let ends = content.matches("encoder exited").count();
    assert_eq!(starts, 4);
    assert_eq!(ends, 4);
}

#[test]
fn journal_end_marker_carries_the_last_five_lines() {
    let dir = tempfile::tempdir().unwrap();
    let (journal, telemetry, _) = fixtures(&dir, &[]);
    let journal_path = journal.path().clone();
    let lifetime: Vec<String> = (0..7).map(|i| format!("noise {i}")).collect();
    let (backend, _) = ScriptedEncoder::new(vec![lifetime]);

    EncoderSupervisor::new("source-0", backend, journal, telemetry, BoundedRestarts(1)).run();

    let content = std::fs::read_to_string(&journal_path).unwrap();
    assert!(!content.contains("> noise 1"));
    for i in 2..7 {
        assert!(content.contains(&format!("> noise {i}")), "missing noise {i}");
    }
}

#[test]
fn full_cycle_across_a_lifetime_writes_one_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let (journal, telemetry, snapshot_path) = fixtures(&dir, &["3:0", "3:1", "5:0"]);
    let lifetime = vec![
        SUMMARY_LINE.to_string(),
        "frame=  100 fps= 25".to_string(),
        report_line(-18.6),
        report_line(-20.0),
        report_line(-21.0),
    ];
    let (backend, _) = ScriptedEncoder::new(vec![lifetime]);

    EncoderSupervisor::new("source-0", backend, journal, telemetry, BoundedRestarts(1)).run();

    let snapshot =
        LoudnessSnapshot::parse(&std::fs::read_to_string(&snapshot_path).unwrap()).unwrap();
    let ids: Vec<&str> = snapshot.channels.iter().map(|c| c.channel.as_str()).collect();
    assert_eq!(ids, ["3:0", "3:1", "5:0"]);
    assert_eq!(snapshot.channels[0].momentary, -18.6);
}

#[test]
fn telemetry_rearms_on_the_next_lifetime() {
    let dir = tempfile::tempdir().unwrap();
    let (journal, telemetry, snapshot_path) = fixtures(&dir, &["0:0"]);
    let poisoned = vec![
        "[Parsed_ebur128_0 @ 0x55d1c2a40e80] t: broken".to_string(),
        report_line(-18.6),
    ];
    let healthy = vec![report_line(-23.5)];
    let (backend, _) = ScriptedEncoder::new(vec![poisoned, healthy]);

    EncoderSupervisor::new("source-0", backend, journal, telemetry, BoundedRestarts(2)).run();

    let snapshot =
        LoudnessSnapshot::parse(&std::fs::read_to_string(&snapshot_path).unwrap()).unwrap();
    assert_eq!(snapshot.channels.len(), 1);
    assert_eq!(snapshot.channels[0].momentary, -23.5);
}

#[test]
fn spawn_failures_are_journaled_and_bounded_by_the_gate() {
    let dir = tempfile::tempdir().unwrap();
    let (journal, telemetry, _) = fixtures(&dir, &[]);
    let journal_path = journal.path().clone();

    EncoderSupervisor::new(
        "source-0",
        BrokenEncoder,
        journal,
        telemetry,
        BoundedRestarts(2),
    )
    .run();

    let content = std::fs::read_to_string(&journal_path).unwrap();
    assert_eq!(content.matches("encoder failed to start").count(), 2);
}
