//! Wallcast Probe
//!
//! Timeout-bounded invocation of the external stream prober (`ffprobe`)
//! and the `-version` handshakes used by the configuration check. Every
//! call is bounded: a hung tool fails the one source (or check) that
//! asked, never the whole process.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use wallcast_common::config::WallConfig;
use wallcast_common::error::{WallcastError, WallcastResult};
use wallcast_wall_model::stream::SourceMedia;

/// Run an external tool and capture its stdout, bounded by `timeout`.
///
/// The child is killed when the timeout expires or the future is dropped.
pub async fn capture_output(
    program: &Path,
    args: &[String],
    timeout: Duration,
) -> WallcastResult<String> {
    let child = tokio::process::Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| {
            WallcastError::probe(format!("failed to run \"{}\": {e}", program.display()))
        })?;

    let output = tokio::time::timeout(timeout, child.wait_with_output())
        .await
        .map_err(|_| {
            WallcastError::probe(format!(
                "\"{}\" did not finish within {}s",
                program.display(),
                timeout.as_secs_f64()
            ))
        })?
        .map_err(|e| {
            WallcastError::probe(format!("failed to collect \"{}\": {e}", program.display()))
        })?;

    if !output.status.success() {
        return Err(WallcastError::probe(format!(
            "\"{}\" exited with {}",
            program.display(),
            output.status
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Query one source's stream topology.
pub async fn probe_source(config: &WallConfig, source: &str) -> WallcastResult<SourceMedia> {
    let mut args = config.ffprobe_args.clone();
    args.extend([
        "-of".to_string(),
        "json".to_string(),
        "-show_streams".to_string(),
        source.to_string(),
    ]);

    tracing::debug!(source, "probing stream topology");

    let stdout = capture_output(
        &config.ffprobe_path,
        &args,
        Duration::from_secs(config.probe_timeout_secs),
    )
    .await
    .map_err(|e| WallcastError::probe(format!("failed to fetch info from \"{source}\": {e}")))?;

    let doc: serde_json::Value = serde_json::from_str(&stdout).map_err(|e| {
        WallcastError::probe(format!("probe output for \"{source}\" is not valid JSON: {e}"))
    })?;

    SourceMedia::from_probe_json(&doc)
}

/// Verify that an executable answers `-version` with the expected banner
/// within one second.
pub async fn check_version_banner(program: &Path, expected_prefix: &str) -> WallcastResult<()> {
    let stdout = capture_output(
        program,
        &["-version".to_string()],
        Duration::from_secs(1),
    )
    .await
    .map_err(|e| WallcastError::config(format!("\"{}\" check failed: {e}", program.display())))?;

    if !stdout.starts_with(expected_prefix) {
        return Err(WallcastError::config(format!(
            "\"{}\" is not a {} executable",
            program.display(),
            expected_prefix.trim_end_matches(" version")
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[tokio::test]
    async fn missing_program_is_a_probe_error() {
        let err = capture_output(
            &PathBuf::from("/nonexistent/ffprobe"),
            &[],
            Duration::from_secs(1),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, WallcastError::Probe { .. }));
    }

    #[tokio::test]
    async fn hung_program_times_out() {
        let err = capture_output(
            &PathBuf::from("/bin/sleep"),
            &["5".to_string()],
            Duration::from_millis(50),
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("did not finish"));
    }
}
