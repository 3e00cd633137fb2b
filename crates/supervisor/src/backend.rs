//! Encoder process backends.
//!
//! The supervisor drives encoder lifetimes through a trait seam so the
//! restart machinery can be exercised without spawning real processes.
//! Production wraps ffmpeg: diagnostics arrive on stderr, video goes to
//! the muxer, stdin and stdout stay closed.

use std::io::{BufRead, BufReader, Lines};
use std::process::{Child, ChildStderr, Command, Stdio};

use wallcast_common::error::{WallcastError, WallcastResult};
use wallcast_graph::invocation::EncoderInvocation;

/// One live encoder lifetime.
pub trait EncoderRun: Send {
    /// Next diagnostic line; `None` once the stream closes.
    fn next_line(&mut self) -> Option<String>;

    /// Collect the exit status after the stream has closed.
    fn wait(&mut self) -> String;
}

/// Spawns encoder lifetimes on demand.
pub trait EncoderBackend: Send {
    fn launch(&mut self) -> WallcastResult<Box<dyn EncoderRun>>;
}

/// Production backend: one ffmpeg process per lifetime.
pub struct FfmpegEncoder {
    invocation: EncoderInvocation,
}

impl FfmpegEncoder {
    pub fn new(invocation: EncoderInvocation) -> Self {
        Self { invocation }
    }
}

impl EncoderBackend for FfmpegEncoder {
    fn launch(&mut self) -> WallcastResult<Box<dyn EncoderRun>> {
        let mut child = Command::new(&self.invocation.program)
            .args(&self.invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                WallcastError::supervision(format!(
                    "failed to spawn \"{}\": {e}",
                    self.invocation.program.display()
                ))
            })?;

        let stderr = child.stderr.take().ok_or_else(|| {
            WallcastError::supervision("encoder diagnostic stream unavailable".to_string())
        })?;

        Ok(Box::new(FfmpegRun {
            child,
            lines: BufReader::new(stderr).lines(),
        }))
    }
}

struct FfmpegRun {
    child: Child,
    lines: Lines<BufReader<ChildStderr>>,
}

impl EncoderRun for FfmpegRun {
    fn next_line(&mut self) -> Option<String> {
        match self.lines.next() {
            Some(Ok(line)) => Some(line),
            Some(Err(e)) => {
                tracing::warn!(error = %e, "diagnostic stream read failed, treating as closed");
                None
            }
            None => None,
        }
    }

    fn wait(&mut self) -> String {
        match self.child.wait() {
            Ok(status) => status.to_string(),
            Err(e) => format!("status unavailable: {e}"),
        }
    }
}
