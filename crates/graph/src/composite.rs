//! Per-source composite graph: scaled video, border, meter panel, canvas.

use wallcast_common::error::{WallcastError, WallcastResult};
use wallcast_wall_model::stream::SourceMedia;

use crate::meter::{build_meter_panel, MeterStyle};
use crate::segment::{Filter, FilterGraph, FilterSegment};

/// Border drawn around the scaled video, in pixels per side.
pub const BORDER_PX: u32 = 2;

/// Gutter between the bordered video and the meter panel.
pub const METER_GUTTER_PX: u32 = 2;

const BORDER_COLOR: &str = "gray";

/// The full per-source encode graph.
#[derive(Debug, Clone)]
pub struct CompositeGraph {
    pub graph: FilterGraph,
    /// Final output pad label (mapped by the encoder invocation).
    pub out_label: String,
    /// Channel ids in correlation order, passed through from the panel.
    pub channel_ids: Vec<String>,
    /// Final canvas size.
    pub width: u32,
    pub height: u32,
}

/// Build the composite graph for one source.
///
/// All geometry is derived from the probed stream properties and the
/// target video height; the only constants are the border and gutter.
pub fn build_composite(
    source_index: usize,
    media: &SourceMedia,
    target_height: u32,
    style: &MeterStyle,
    fallback_channels: u32,
) -> WallcastResult<CompositeGraph> {
    let video = media.primary_video().ok_or_else(|| {
        WallcastError::graph(format!("source {source_index} has no video stream"))
    })?;
    if video.width == 0 || video.height == 0 {
        return Err(WallcastError::graph(format!(
            "source {source_index} video stream reports no dimensions"
        )));
    }

    let sar = parse_sample_aspect_ratio(video.sample_aspect_ratio.as_deref(), source_index);
    let effective_width = f64::from(video.width) * sar;
    let scale_factor = f64::from(target_height) / f64::from(video.height);
    // Truncation, not rounding: the wall's geometry must be reproducible
    // bit-for-bit from the probed properties.
    let scaled_width = (effective_width * scale_factor).floor() as u32;

    let bordered_width = scaled_width + 2 * BORDER_PX;
    let bordered_height = target_height + 2 * BORDER_PX;

    let panel = build_meter_panel(source_index, &media.audio, style, fallback_channels);
    let meter_width = (f64::from(target_height) * panel.ratio).floor() as u32;

    let canvas_width = bordered_width + METER_GUTTER_PX + meter_width;
    let canvas_height = bordered_height;

    let prefix = format!("w{source_index}");
    let out_label = format!("wall{source_index}");
    let mut graph = FilterGraph::new();

    graph.push(
        FilterSegment::new()
            .input(format!("0:{}", video.index))
            .filter(Filter::new("scale").pos(scaled_width).pos(target_height))
            .filter(Filter::new("setsar").pos(1))
            .output(format!("{prefix}scaled")),
    );
    graph.push(
        FilterSegment::new()
            .filter(
                Filter::new("color")
                    .kv("c", BORDER_COLOR)
                    .kv("s", format!("{bordered_width}x{bordered_height}")),
            )
            .output(format!("{prefix}frame")),
    );
    graph.push(
        FilterSegment::new()
            .input(format!("{prefix}frame"))
            .input(format!("{prefix}scaled"))
            .filter(Filter::new("overlay").pos(BORDER_PX).pos(BORDER_PX))
            .output(format!("{prefix}framed")),
    );

    graph.append(panel.graph);
    graph.push(
        FilterSegment::new()
            .input(panel.out_label)
            .filter(Filter::new("scale").pos(meter_width).pos(bordered_height))
            .output(format!("{prefix}meter")),
    );

    graph.push(
        FilterSegment::new()
            .filter(
                Filter::new("color")
                    .kv("c", "black")
                    .kv("s", format!("{canvas_width}x{canvas_height}")),
            )
            .output(format!("{prefix}canvas")),
    );
    graph.push(
        FilterSegment::new()
            .input(format!("{prefix}canvas"))
            .input(format!("{prefix}meter"))
            .filter(
                Filter::new("overlay")
                    .pos(bordered_width + METER_GUTTER_PX)
                    .pos(0),
            )
            .output(format!("{prefix}stage")),
    );
    graph.push(
        FilterSegment::new()
            .input(format!("{prefix}stage"))
            .input(format!("{prefix}framed"))
            .filter(Filter::new("overlay").pos(0).pos(0))
            .output(out_label.clone()),
    );

    Ok(CompositeGraph {
        graph,
        out_label,
        channel_ids: panel.channel_ids,
        width: canvas_width,
        height: canvas_height,
    })
}

/// Parse a `"W:H"` sample-aspect-ratio string.
///
/// Unparsable or non-positive ratios fall back to square pixels with a
/// warning; a bad ratio must not kill the source's pipeline.
fn parse_sample_aspect_ratio(raw: Option<&str>, source_index: usize) -> f64 {
    let parsed = raw.and_then(|text| {
        let (w, h) = text.split_once(':')?;
        let w: f64 = w.trim().parse().ok()?;
        let h: f64 = h.trim().parse().ok()?;
        let ratio = w / h;
        (ratio.is_finite() && ratio > 0.0).then_some(ratio)
    });

    match parsed {
        Some(ratio) => ratio,
        None => {
            tracing::warn!(
                source_index,
                sample_aspect_ratio = raw.unwrap_or("<missing>"),
                "unusable sample aspect ratio, assuming square pixels"
            );
            1.0
        }
    }
}
