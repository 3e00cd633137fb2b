//! Loudness meter panel construction.
//!
//! The panel sits beside each source's video: a decorative loudness scale
//! on the left, then one fixed-size meter cell per physical audio
//! channel. The ordered channel-id list produced here is the canonical
//! correlation order: position `i` must equal the `i`-th measurement the
//! encoder later emits on its diagnostic stream.

use wallcast_wall_model::stream::StreamDescriptor;

use crate::segment::{escape_text, Filter, FilterGraph, FilterSegment};

/// Decorative scale geometry, cropped out of the analyzer's video output.
pub const SCALE_WIDTH: u32 = 24;
pub const SCALE_HEIGHT: u32 = 456;
const SCALE_CROP_X: u32 = 8;
const SCALE_CROP_Y: u32 = 22;

/// Gutter between the scale and the first meter cell.
const SCALE_GUTTER: u32 = 2;

/// Meter cell geometry.
pub const METER_CELL_WIDTH: u32 = 22;
const METER_CELL_HEIGHT: u32 = 456;

/// Level bar cropped out of the analyzer's video output.
const BAR_WIDTH: u32 = 20;
const BAR_HEIGHT: u32 = 432;
const BAR_CROP_X: u32 = 612;
const BAR_CROP_Y: u32 = 40;

/// Bar and label placement inside a cell.
const BAR_INSET_X: u32 = 1;
const BAR_INSET_Y: u32 = 12;
const LABEL_X: u32 = 3;
const LABEL_Y: u32 = 444;

/// The scale's silent source is kept shorter than the analyzer's
/// reporting interval: it must contribute exactly one warm-up summary to
/// the diagnostic stream and no periodic reports. Its last video frame
/// persists through the overlay's repeat-on-EOF behavior.
const SCALE_SOURCE_DURATION: &str = "0.05";

/// Label styling for meter cells.
#[derive(Debug, Clone)]
pub struct MeterStyle {
    pub label_font: String,
    pub label_font_size: u32,
}

/// The built panel: graph fragments, geometry, and the canonical
/// channel-id order.
#[derive(Debug, Clone)]
pub struct MeterPanel {
    pub graph: FilterGraph,
    pub out_label: String,
    /// Panel width in analyzer pixels (height is always `SCALE_HEIGHT`).
    pub width: u32,
    /// width:height ratio used when scaling the panel onto the canvas.
    pub ratio: f64,
    /// Channel ids `"{streamIndex}:{channelIndex}"` in correlation order.
    pub channel_ids: Vec<String>,
}

/// Build the meter panel for one source's ordered audio streams.
///
/// `fallback_channels` substitutes for streams that report no channel
/// count. Zero audio streams degrade to the scale alone.
pub fn build_meter_panel(
    source_index: usize,
    audio: &[StreamDescriptor],
    style: &MeterStyle,
    fallback_channels: u32,
) -> MeterPanel {
    let prefix = format!("m{source_index}");
    let mut graph = FilterGraph::new();

    // Decorative scale from a silent measurement source.
    let scale_label = format!("{prefix}scale");
    graph.push(
        FilterSegment::new()
            .filter(Filter::new("aevalsrc").pos(0).kv("d", SCALE_SOURCE_DURATION))
            .output(format!("{prefix}silent")),
    );
    graph.push(
        FilterSegment::new()
            .input(format!("{prefix}silent"))
            .filter(Filter::new("ebur128").kv("video", 1))
            .output(format!("{prefix}scalev"))
            .output(format!("{prefix}scalea")),
    );
    graph.push(
        FilterSegment::new()
            .input(format!("{prefix}scalea"))
            .filter(Filter::new("anullsink")),
    );
    graph.push(
        FilterSegment::new()
            .input(format!("{prefix}scalev"))
            .filter(
                Filter::new("crop")
                    .pos(SCALE_WIDTH)
                    .pos(SCALE_HEIGHT)
                    .pos(SCALE_CROP_X)
                    .pos(SCALE_CROP_Y),
            )
            .output(scale_label.clone()),
    );

    // One mono leg per physical channel, ids in declared order.
    let mut legs: Vec<(String, String)> = Vec::new();
    for stream in audio {
        let channels = if stream.channels > 0 {
            stream.channels
        } else {
            fallback_channels
        };
        if channels <= 1 {
            legs.push((format!("{}:0", stream.index), format!("0:{}", stream.index)));
            continue;
        }

        let layout = stream
            .channel_layout
            .clone()
            .unwrap_or_else(|| default_layout(channels));
        let mut split = FilterSegment::new()
            .input(format!("0:{}", stream.index))
            .filter(Filter::new("channelsplit").kv("channel_layout", layout));
        for channel in 0..channels {
            let leg = format!("{prefix}s{}c{channel}", stream.index);
            split = split.output(leg.clone());
            legs.push((format!("{}:{channel}", stream.index), leg));
        }
        graph.push(split);
    }

    // One meter cell per leg: black cell, level bar, channel-id label.
    let mut cell_labels = Vec::with_capacity(legs.len());
    for (position, (channel_id, leg)) in legs.iter().enumerate() {
        let bg = format!("{prefix}bg{position}");
        let vid = format!("{prefix}vid{position}");
        let aud = format!("{prefix}aud{position}");
        let bar = format!("{prefix}bar{position}");
        let cell = format!("{prefix}cell{position}");

        graph.push(
            FilterSegment::new()
                .filter(
                    Filter::new("color")
                        .kv("c", "black")
                        .kv("s", format!("{METER_CELL_WIDTH}x{METER_CELL_HEIGHT}")),
                )
                .output(bg.clone()),
        );
        graph.push(
            FilterSegment::new()
                .input(leg.clone())
                .filter(Filter::new("ebur128").kv("video", 1))
                .output(vid.clone())
                .output(aud.clone()),
        );
        graph.push(FilterSegment::new().input(aud).filter(Filter::new("anullsink")));
        graph.push(
            FilterSegment::new()
                .input(vid)
                .filter(
                    Filter::new("crop")
                        .pos(BAR_WIDTH)
                        .pos(BAR_HEIGHT)
                        .pos(BAR_CROP_X)
                        .pos(BAR_CROP_Y),
                )
                .output(bar.clone()),
        );
        graph.push(
            FilterSegment::new()
                .input(bg)
                .input(bar)
                .filter(Filter::new("overlay").pos(BAR_INSET_X).pos(BAR_INSET_Y))
                .filter(
                    Filter::new("drawtext")
                        .kv("fontfile", escape_text(&style.label_font))
                        .kv("fontsize", style.label_font_size)
                        .kv("fontcolor", "white")
                        .kv("x", LABEL_X)
                        .kv("y", LABEL_Y)
                        .kv("text", escape_text(channel_id)),
                )
                .output(cell.clone()),
        );
        cell_labels.push(cell);
    }

    // Horizontal assembly: scale, then cells left to right.
    let channel_count = cell_labels.len() as u32;
    let total_width = SCALE_WIDTH + SCALE_GUTTER + channel_count * METER_CELL_WIDTH;

    graph.push(
        FilterSegment::new()
            .filter(
                Filter::new("color")
                    .kv("c", "black")
                    .kv("s", format!("{total_width}x{SCALE_HEIGHT}")),
            )
            .output(format!("{prefix}panel0")),
    );
    graph.push(
        FilterSegment::new()
            .input(format!("{prefix}panel0"))
            .input(scale_label)
            .filter(Filter::new("overlay").pos(0).pos(0))
            .output(format!("{prefix}panel1")),
    );

    let mut stage = format!("{prefix}panel1");
    for (position, cell) in cell_labels.iter().enumerate() {
        let next = format!("{prefix}panel{}", position + 2);
        let x = SCALE_WIDTH + SCALE_GUTTER + position as u32 * METER_CELL_WIDTH;
        graph.push(
            FilterSegment::new()
                .input(stage)
                .input(cell.clone())
                .filter(Filter::new("overlay").pos(x).pos(0))
                .output(next.clone()),
        );
        stage = next;
    }

    MeterPanel {
        graph,
        out_label: stage,
        width: total_width,
        ratio: f64::from(total_width) / f64::from(SCALE_HEIGHT),
        channel_ids: legs.into_iter().map(|(id, _)| id).collect(),
    }
}

/// Default channel layout name for streams that report only a count.
fn default_layout(channels: u32) -> String {
    match channels {
        1 => "mono".to_string(),
        2 => "stereo".to_string(),
        3 => "2.1".to_string(),
        4 => "4.0".to_string(),
        5 => "5.0".to_string(),
        6 => "5.1".to_string(),
        7 => "6.1".to_string(),
        8 => "7.1".to_string(),
        n => format!("{n}c"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wallcast_wall_model::stream::StreamKind;

    fn audio_stream(index: u32, channels: u32, layout: Option<&str>) -> StreamDescriptor {
        StreamDescriptor {
            index,
            kind: StreamKind::Audio,
            channels,
            channel_layout: layout.map(String::from),
            sample_aspect_ratio: None,
            width: 0,
            height: 0,
        }
    }

    fn style() -> MeterStyle {
        MeterStyle {
            label_font: "/fonts/mono.ttf".to_string(),
            label_font_size: 12,
        }
    }

    #[test]
    fn channel_ids_preserve_declared_order() {
        let streams = [
            audio_stream(3, 2, Some("stereo")),
            audio_stream(5, 1, Some("mono")),
        ];
        let panel = build_meter_panel(0, &streams, &style(), 2);
        assert_eq!(panel.channel_ids, vec!["3:0", "3:1", "5:0"]);
    }

    #[test]
    fn panel_width_grows_per_channel() {
        let streams = [
            audio_stream(3, 2, Some("stereo")),
            audio_stream(5, 1, Some("mono")),
        ];
        let panel = build_meter_panel(0, &streams, &style(), 2);
        assert_eq!(panel.width, SCALE_WIDTH + 2 + 3 * METER_CELL_WIDTH);
        assert!((panel.ratio - f64::from(panel.width) / 456.0).abs() < 1e-12);
    }

    #[test]
    fn zero_audio_streams_degrade_to_the_scale_alone() {
        let panel = build_meter_panel(1, &[], &style(), 2);
        assert!(panel.channel_ids.is_empty());
        assert_eq!(panel.width, SCALE_WIDTH + 2);
        let rendered = panel.graph.render();
        assert_eq!(rendered.matches("ebur128").count(), 1);
        assert!(rendered.contains("crop=24:456:8:22"));
        assert!(rendered.ends_with(&format!("[{}]", panel.out_label)));
    }

    #[test]
    fn unreported_channel_count_uses_the_fallback() {
        let streams = [audio_stream(2, 0, None)];
        let panel = build_meter_panel(0, &streams, &style(), 2);
        assert_eq!(panel.channel_ids, vec!["2:0", "2:1"]);
        assert!(panel.graph.render().contains("channelsplit=channel_layout=stereo"));
    }

    #[test]
    fn labels_escape_the_channel_id_colon() {
        let streams = [audio_stream(3, 1, Some("mono"))];
        let panel = build_meter_panel(0, &streams, &style(), 2);
        assert!(panel.graph.render().contains("text=3\\:0"));
    }

    #[test]
    fn cells_land_at_cumulative_offsets() {
        let streams = [audio_stream(1, 2, Some("stereo"))];
        let panel = build_meter_panel(0, &streams, &style(), 2);
        let rendered = panel.graph.render();
        assert!(rendered.contains("overlay=26:0"));
        assert!(rendered.contains("overlay=48:0"));
    }
}
