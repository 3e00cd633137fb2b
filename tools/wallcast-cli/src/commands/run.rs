//! Run the video wall: validate, probe, build graphs, supervise forever.

use anyhow::Context;

use wallcast_common::clock::SystemTimestamps;
use wallcast_common::config::WallConfig;
use wallcast_common::error::WallcastResult;
use wallcast_graph::composite::build_composite;
use wallcast_graph::invocation::EncoderInvocation;
use wallcast_graph::meter::MeterStyle;
use wallcast_supervisor::backend::FfmpegEncoder;
use wallcast_supervisor::journal::Journal;
use wallcast_supervisor::snapshot::SnapshotSink;
use wallcast_supervisor::supervisor::{EncoderSupervisor, RunForever};
use wallcast_supervisor::TelemetryExtractor;
use wallcast_wall_model::layout::{Frame, Layout};

type WallUnit = EncoderSupervisor<FfmpegEncoder, RunForever>;

pub async fn run(config: &WallConfig, layout_arg: &str) -> anyhow::Result<()> {
    super::confcheck::verify(config)
        .await
        .context("configuration check failed")?;

    let layout = Layout::load(layout_arg, &config.base_dir, config.layout_map_width)?;
    tracing::info!(
        frames = layout.frames().len(),
        map_width = layout.map_width(),
        map_height = layout.map_height(),
        "layout accepted"
    );
    for row in layout.map_rendering().lines() {
        tracing::debug!(map = row);
    }

    // Build every pipeline before spawning any supervision unit.
    // Per-source setup failures are isolated: a wall that loses one camera
    // keeps broadcasting the rest.
    let mut units: Vec<(usize, WallUnit)> = Vec::new();
    for (index, frame) in layout.frames().iter().enumerate() {
        match prepare_source(config, index, frame).await {
            Ok(unit) => units.push((index, unit)),
            Err(e) if e.is_fatal() => return Err(e.into()),
            Err(e) => {
                tracing::error!(
                    index,
                    source = %frame.source,
                    error = %e,
                    "source pipeline setup failed, skipping"
                );
            }
        }
    }

    if units.is_empty() {
        anyhow::bail!("no source pipeline survived setup");
    }

    let mut handles = Vec::with_capacity(units.len());
    for (index, unit) in units {
        let handle = std::thread::Builder::new()
            .name(format!("supervise-{index}"))
            .spawn(move || unit.run())?;
        handles.push(handle);
    }
    tracing::info!(units = handles.len(), "video wall is live");

    // Supervision units run for the process's entire lifetime; joining
    // only parks this thread so the binary stays up.
    for handle in handles {
        let _ = handle.join();
    }
    Ok(())
}

/// Probe one source and assemble its supervision unit.
async fn prepare_source(
    config: &WallConfig,
    index: usize,
    frame: &Frame,
) -> WallcastResult<WallUnit> {
    let media = wallcast_probe::probe_source(config, &frame.source).await?;
    tracing::info!(
        index,
        name = %frame.name,
        video_streams = media.video.len(),
        audio_streams = media.audio.len(),
        "source probed"
    );

    let style = MeterStyle {
        label_font: frame
            .meter_label_font
            .clone()
            .unwrap_or_else(|| config.frame_defaults.meter_label_font.clone()),
        label_font_size: frame
            .meter_label_font_size
            .unwrap_or(config.frame_defaults.meter_label_font_size),
    };
    let target_height = frame
        .video_height
        .unwrap_or(config.frame_defaults.video_height);

    let composite = build_composite(
        index,
        &media,
        target_height,
        &style,
        config.audio_meter_channels,
    )?;
    tracing::info!(
        index,
        canvas_width = composite.width,
        canvas_height = composite.height,
        channels = composite.channel_ids.len(),
        "composite graph built"
    );

    let output_target = config.output_target(index);
    if let Some(parent) = output_target.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let snapshot_path = config.snapshot_path(index);
    if let Some(parent) = snapshot_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let invocation = EncoderInvocation::assemble(
        &config.ffmpeg_path,
        &config.ffmpeg_global_args,
        &frame.source,
        &composite,
        &config.encoder.output_args,
        &output_target,
    );
    tracing::debug!(index, args = ?invocation.args, "encoder invocation assembled");

    let journal = Journal::open(config.journal_path(index), Box::new(SystemTimestamps))?;
    let telemetry = TelemetryExtractor::new(
        composite.channel_ids.clone(),
        SnapshotSink::new(snapshot_path),
    );

    Ok(EncoderSupervisor::new(
        format!("source-{index}"),
        FfmpegEncoder::new(invocation),
        journal,
        telemetry,
        RunForever,
    ))
}
