//! Check that the configuration is usable.

use wallcast_common::config::WallConfig;

/// Verify directories, files, scalars, and the tool handshakes.
///
/// Shared with `run`, which refuses to start on an unusable configuration.
pub async fn verify(config: &WallConfig) -> anyhow::Result<()> {
    tracing::debug!("checking configuration");
    config.verify_paths()?;
    wallcast_probe::check_version_banner(&config.ffmpeg_path, "ffmpeg version").await?;
    wallcast_probe::check_version_banner(&config.ffprobe_path, "ffprobe version").await?;
    Ok(())
}

pub async fn run(config: &WallConfig) -> anyhow::Result<()> {
    verify(config).await?;
    println!("OK");
    Ok(())
}
