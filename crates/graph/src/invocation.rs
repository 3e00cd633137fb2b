//! Encoder invocation assembly.
//!
//! The argument order is part of the external contract: global args, the
//! rendered filter graph, the mapped output pad, per-source output args,
//! then the output target.

use std::path::{Path, PathBuf};

use crate::composite::CompositeGraph;

/// One ready-to-spawn encoder command line.
#[derive(Debug, Clone)]
pub struct EncoderInvocation {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl EncoderInvocation {
    pub fn assemble(
        program: &Path,
        global_args: &[String],
        source: &str,
        composite: &CompositeGraph,
        output_args: &[String],
        output_target: &Path,
    ) -> Self {
        let mut args: Vec<String> = global_args.to_vec();
        args.push("-i".to_string());
        args.push(source.to_string());
        args.push("-filter_complex".to_string());
        args.push(composite.graph.render());
        args.push("-map".to_string());
        args.push(format!("[{}]", composite.out_label));
        args.extend(output_args.iter().cloned());
        args.push(output_target.display().to_string());

        Self {
            program: program.to_path_buf(),
            args,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composite::build_composite;
    use crate::meter::MeterStyle;
    use wallcast_wall_model::stream::{SourceMedia, StreamDescriptor, StreamKind};

    #[test]
    fn arguments_keep_the_contract_order() {
        let media = SourceMedia {
            video: vec![StreamDescriptor {
                index: 0,
                kind: StreamKind::Video,
                channels: 0,
                channel_layout: None,
                sample_aspect_ratio: Some("1:1".to_string()),
                width: 1280,
                height: 720,
            }],
            audio: vec![],
        };
        let style = MeterStyle {
            label_font: "/fonts/mono.ttf".to_string(),
            label_font_size: 12,
        };
        let composite = build_composite(4, &media, 480, &style, 2).unwrap();

        let invocation = EncoderInvocation::assemble(
            Path::new("/usr/bin/ffmpeg"),
            &["-hide_banner".to_string(), "-nostats".to_string()],
            "rtsp://cam-4/stream",
            &composite,
            &["-f".to_string(), "hls".to_string()],
            Path::new("/srv/static/wall-4/live.m3u8"),
        );

        assert_eq!(invocation.program, PathBuf::from("/usr/bin/ffmpeg"));
        assert_eq!(&invocation.args[..2], ["-hide_banner", "-nostats"]);
        let i = invocation.args.iter().position(|a| a == "-i").unwrap();
        assert_eq!(invocation.args[i + 1], "rtsp://cam-4/stream");
        let fc = invocation
            .args
            .iter()
            .position(|a| a == "-filter_complex")
            .unwrap();
        assert!(fc > i);
        let map = invocation.args.iter().position(|a| a == "-map").unwrap();
        assert_eq!(invocation.args[map + 1], "[wall4]");
        assert_eq!(invocation.args.last().unwrap(), "/srv/static/wall-4/live.m3u8");
    }
}
