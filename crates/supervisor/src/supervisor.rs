//! The perpetual encoder supervision loop.
//!
//! One supervisor occupies one OS thread per source and never returns in
//! production: spawn, drain the diagnostic stream, journal the exit,
//! respawn. No delay, no restart cap: an encoder exit of any kind is an
//! event to log, never an error to propagate. Tests bound the loop with a
//! [`RestartGate`].

use std::collections::VecDeque;

use crate::backend::EncoderBackend;
use crate::journal::Journal;
use crate::telemetry::TelemetryExtractor;

/// Diagnostic lines kept for the journal's end marker.
const RING_CAPACITY: usize = 5;

/// Decides whether another encoder lifetime begins.
pub trait RestartGate: Send {
    /// Called after each completed lifetime.
    fn another_round(&mut self, completed: u64) -> bool;
}

/// Production gate: supervise for the process's entire lifetime.
pub struct RunForever;

impl RestartGate for RunForever {
    fn another_round(&mut self, _completed: u64) -> bool {
        true
    }
}

/// Bounded gate for tests and supervised drills.
pub struct BoundedRestarts(pub u64);

impl RestartGate for BoundedRestarts {
    fn another_round(&mut self, completed: u64) -> bool {
        completed < self.0
    }
}

/// Fixed-capacity ring of the most recent diagnostic lines.
struct RecentLines {
    lines: VecDeque<String>,
}

impl RecentLines {
    fn new() -> Self {
        Self {
            lines: VecDeque::with_capacity(RING_CAPACITY),
        }
    }

    fn push(&mut self, line: String) {
        if self.lines.len() == RING_CAPACITY {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
    }

    fn iter(&self) -> impl Iterator<Item = &String> {
        self.lines.iter()
    }
}

/// One source's supervision unit.
pub struct EncoderSupervisor<B, G> {
    label: String,
    backend: B,
    journal: Journal,
    telemetry: TelemetryExtractor,
    gate: G,
}

impl<B: EncoderBackend, G: RestartGate> EncoderSupervisor<B, G> {
    pub fn new(
        label: impl Into<String>,
        backend: B,
        journal: Journal,
        telemetry: TelemetryExtractor,
        gate: G,
    ) -> Self {
        Self {
            label: label.into(),
            backend,
            journal,
            telemetry,
            gate,
        }
    }

    /// Run the supervision loop. Blocking; with [`RunForever`] this only
    /// ends when the hosting process does.
    pub fn run(mut self) {
        let mut completed: u64 = 0;
        loop {
            self.journal.record("encoder starting");
            tracing::info!(unit = %self.label, "encoder starting");

            match self.backend.launch() {
                Ok(mut run) => {
                    let mut recent = RecentLines::new();
                    while let Some(line) = run.next_line() {
                        recent.push(line.clone());
                        self.telemetry.observe(&line);
                    }

                    let status = run.wait();
                    tracing::warn!(unit = %self.label, %status, "encoder exited");
                    self.journal
                        .record(&format!("encoder exited ({status}); last output:"));
                    for line in recent.iter() {
                        self.journal.record(&format!("  > {line}"));
                    }
                }
                Err(err) => {
                    tracing::error!(unit = %self.label, error = %err, "encoder failed to start");
                    self.journal.record(&format!("encoder failed to start: {err}"));
                }
            }

            self.telemetry.reset();
            completed += 1;
            if !self.gate.another_round(completed) {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ring_keeps_only_the_last_five_lines() {
        let mut recent = RecentLines::new();
        for i in 0..8 {
            recent.push(format!("line {i}"));
        }
        let kept: Vec<&String> = recent.iter().collect();
        assert_eq!(kept.len(), 5);
        assert_eq!(kept[0], "line 3");
        assert_eq!(kept[4], "line 7");
    }

    #[test]
    fn bounded_gate_stops_at_the_limit() {
        let mut gate = BoundedRestarts(3);
        assert!(gate.another_round(1));
        assert!(gate.another_round(2));
        assert!(!gate.another_round(3));
    }
}
