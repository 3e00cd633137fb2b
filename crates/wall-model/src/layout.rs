//! Video-wall layout: frames, validation, and the occupancy grid.
//!
//! A layout file is a JSON array of frame objects. Validation is strict
//! and ordered: document shape, required keys, per-field types, bounds,
//! and finally grid collision detection. Every error names the offending
//! field and frame index so a broken layout is diagnosable from the
//! message alone.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use wallcast_common::error::{WallcastError, WallcastResult};

/// Fields every frame object must carry.
const REQUIRED_FIELDS: [&str; 6] = ["name", "x", "y", "width", "height", "source"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldType {
    Text,
    Unsigned,
}

impl FieldType {
    fn describe(self) -> &'static str {
        match self {
            FieldType::Text => "string",
            FieldType::Unsigned => "non-negative integer",
        }
    }
}

/// Field → type table; covers required and optional keys alike.
const FIELD_TYPES: [(&str, FieldType); 9] = [
    ("name", FieldType::Text),
    ("x", FieldType::Unsigned),
    ("y", FieldType::Unsigned),
    ("width", FieldType::Unsigned),
    ("height", FieldType::Unsigned),
    ("source", FieldType::Text),
    ("video_height", FieldType::Unsigned),
    ("meter_label_font", FieldType::Text),
    ("meter_label_font_size", FieldType::Unsigned),
];

/// One rectangular cell of the wall, bound to one source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Frame {
    pub name: String,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub source: String,
    pub video_height: Option<u32>,
    pub meter_label_font: Option<String>,
    pub meter_label_font_size: Option<u32>,
}

/// A validated, collision-free arrangement of frames.
#[derive(Debug, Clone)]
pub struct Layout {
    frames: Vec<Frame>,
    map_width: u32,
    map_height: u32,
    map_text: String,
}

impl Layout {
    /// Load and validate a layout file.
    ///
    /// A relative path is resolved against `base_dir` (the original CLI
    /// contract: layouts live next to the deployment by default).
    pub fn load(provided: &str, base_dir: &Path, map_width: u32) -> WallcastResult<Layout> {
        let path = resolve_layout_path(provided, base_dir);
        if !path.is_file() {
            return Err(WallcastError::layout(format!(
                "layout must be a path to an existing file, (provided): \"{provided}\", \
                 (normalized): \"{}\"",
                path.display()
            )));
        }
        let raw = std::fs::read_to_string(&path)?;
        Self::from_json(&raw, map_width)
    }

    /// Validate a raw layout document against a map width.
    ///
    /// Pure and idempotent: validating the same document twice yields the
    /// same layout or the same error.
    pub fn from_json(raw: &str, map_width: u32) -> WallcastResult<Layout> {
        let doc: Value = serde_json::from_str(raw).map_err(|e| {
            WallcastError::layout(format!("layout is not a valid JSON document: {e}"))
        })?;

        let items = doc.as_array().ok_or_else(|| {
            WallcastError::layout(format!(
                "layout must be a JSON array of frame objects - {} given",
                json_type_name(&doc)
            ))
        })?;

        let mut frames = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            frames.push(frame_from_value(index, item)?);
        }

        for (index, frame) in frames.iter().enumerate() {
            if u64::from(frame.x) + u64::from(frame.width) > u64::from(map_width) {
                return Err(WallcastError::layout(format!(
                    "frame width exceeds layout map width (frame {index})"
                )));
            }
        }

        for (index, frame) in frames.iter().enumerate() {
            if frame.video_height == Some(0) {
                return Err(WallcastError::layout(format!(
                    "field \"video_height\" must be positive (frame {index})"
                )));
            }
        }

        let (map_height, map_text) = build_occupancy_map(&frames, map_width)?;

        Ok(Layout {
            frames,
            map_width,
            map_height,
            map_text,
        })
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn map_width(&self) -> u32 {
        self.map_width
    }

    pub fn map_height(&self) -> u32 {
        self.map_height
    }

    /// Row-major textual rendering of the occupancy grid, for diagnostics.
    pub fn map_rendering(&self) -> &str {
        &self.map_text
    }
}

fn resolve_layout_path(provided: &str, base_dir: &Path) -> PathBuf {
    let path = Path::new(provided);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn frame_from_value(index: usize, item: &Value) -> WallcastResult<Frame> {
    let object = item.as_object().ok_or_else(|| {
        WallcastError::layout(format!(
            "frame description must be a JSON object - {} given (frame {index})",
            json_type_name(item)
        ))
    })?;

    for field in REQUIRED_FIELDS {
        if !object.contains_key(field) {
            return Err(WallcastError::layout(format!(
                "missing required field \"{field}\" (frame {index})"
            )));
        }
    }

    for (field, expected) in FIELD_TYPES {
        let Some(value) = object.get(field) else {
            continue;
        };
        let matches = match expected {
            FieldType::Text => value.is_string(),
            FieldType::Unsigned => value.is_u64(),
        };
        if !matches {
            return Err(WallcastError::layout(format!(
                "field \"{field}\" must be a {} - {} given (frame {index})",
                expected.describe(),
                json_type_name(value)
            )));
        }
    }

    let text = |field: &str| -> Option<String> {
        object.get(field).and_then(|v| v.as_str()).map(String::from)
    };
    let cell = |field: &str| -> Option<u32> {
        object.get(field).and_then(|v| v.as_u64()).map(|n| n as u32)
    };

    for field in ["x", "y", "width", "height", "video_height", "meter_label_font_size"] {
        if let Some(value) = object.get(field).and_then(|v| v.as_u64()) {
            if value > u64::from(u32::MAX) {
                return Err(WallcastError::layout(format!(
                    "field \"{field}\" is out of range (frame {index})"
                )));
            }
        }
    }

    Ok(Frame {
        name: text("name").unwrap_or_default(),
        x: cell("x").unwrap_or_default(),
        y: cell("y").unwrap_or_default(),
        width: cell("width").unwrap_or_default(),
        height: cell("height").unwrap_or_default(),
        source: text("source").unwrap_or_default(),
        video_height: cell("video_height"),
        meter_label_font: text("meter_label_font"),
        meter_label_font_size: cell("meter_label_font_size"),
    })
}

/// Mark every frame's rectangle on a fresh grid, rejecting any collision.
///
/// Overlap is always an error, never first-writer-wins.
fn build_occupancy_map(frames: &[Frame], map_width: u32) -> WallcastResult<(u32, String)> {
    let mut map_height: u64 = 0;
    for (index, frame) in frames.iter().enumerate() {
        let bottom = u64::from(frame.y) + u64::from(frame.height);
        if bottom > u64::from(u32::MAX) {
            return Err(WallcastError::layout(format!(
                "frame extends beyond the representable grid (frame {index})"
            )));
        }
        map_height = map_height.max(bottom);
    }
    let map_height = map_height as u32;

    let width = map_width as usize;
    let height = map_height as usize;
    let mut cells: Vec<Vec<Option<usize>>> = vec![vec![None; height]; width];

    for (index, frame) in frames.iter().enumerate() {
        for x in frame.x..frame.x + frame.width {
            for y in frame.y..frame.y + frame.height {
                let cell = &mut cells[x as usize][y as usize];
                if cell.is_some() {
                    return Err(WallcastError::layout(format!(
                        "frame intersection detected (({x}, {y}), frame {index})"
                    )));
                }
                *cell = Some(index);
            }
        }
    }

    let mut rows = Vec::with_capacity(height);
    for y in 0..height {
        let row: Vec<String> = (0..width)
            .map(|x| match cells[x][y] {
                Some(index) => index.to_string(),
                None => ".".to_string(),
            })
            .collect();
        rows.push(row.join(" "));
    }

    Ok((map_height, rows.join("\n")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn frame_json(x: u32, y: u32, width: u32, height: u32) -> String {
        format!(
            r#"{{"name": "f", "x": {x}, "y": {y}, "width": {width}, "height": {height}, "source": "rtsp://cam"}}"#
        )
    }

    #[test]
    fn stacked_full_width_frames_are_accepted() {
        let raw = format!("[{}, {}]", frame_json(0, 0, 6, 4), frame_json(0, 4, 6, 4));
        let layout = Layout::from_json(&raw, 6).unwrap();
        assert_eq!(layout.frames().len(), 2);
        assert_eq!(layout.map_height(), 8);
    }

    #[test]
    fn overlapping_frames_are_rejected_with_coordinates() {
        let raw = format!("[{}, {}]", frame_json(0, 0, 4, 4), frame_json(2, 2, 4, 4));
        let err = Layout::from_json(&raw, 6).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("(2, 2)"), "got: {message}");
        assert!(message.contains("frame 1"), "got: {message}");
    }

    #[test]
    fn frame_wider_than_the_map_is_rejected() {
        let raw = format!("[{}]", frame_json(4, 0, 3, 2));
        let err = Layout::from_json(&raw, 6).unwrap_err();
        assert!(err.to_string().contains("exceeds layout map width"));
        assert!(err.to_string().contains("frame 0"));
    }

    #[test]
    fn non_array_document_is_rejected() {
        let err = Layout::from_json(r#"{"name": "nope"}"#, 6).unwrap_err();
        assert!(err.to_string().contains("object given") || err.to_string().contains("- object"));
    }

    #[test]
    fn missing_required_field_names_field_and_frame() {
        let raw = r#"[{"name": "f", "x": 0, "y": 0, "width": 2, "height": 2}]"#;
        let err = Layout::from_json(raw, 6).unwrap_err();
        assert!(err.to_string().contains("\"source\""));
        assert!(err.to_string().contains("frame 0"));
    }

    #[test]
    fn wrongly_typed_field_names_field_and_frame() {
        let raw = r#"[{"name": "f", "x": "zero", "y": 0, "width": 2, "height": 2, "source": "s"}]"#;
        let err = Layout::from_json(raw, 6).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("\"x\""), "got: {message}");
        assert!(message.contains("string given"), "got: {message}");
        assert!(message.contains("frame 0"), "got: {message}");
    }

    #[test]
    fn negative_coordinates_fail_the_type_check() {
        let raw = r#"[{"name": "f", "x": -1, "y": 0, "width": 2, "height": 2, "source": "s"}]"#;
        let err = Layout::from_json(raw, 6).unwrap_err();
        assert!(err.to_string().contains("\"x\""));
    }

    #[test]
    fn zero_video_height_is_rejected() {
        let raw = r#"[{"name": "f", "x": 0, "y": 0, "width": 2, "height": 2, "source": "s", "video_height": 0}]"#;
        let err = Layout::from_json(raw, 6).unwrap_err();
        assert!(err.to_string().contains("video_height"));
    }

    #[test]
    fn map_rendering_is_row_major() {
        let raw = format!("[{}, {}]", frame_json(0, 0, 2, 1), frame_json(2, 0, 1, 2));
        let layout = Layout::from_json(&raw, 3).unwrap();
        assert_eq!(layout.map_rendering(), "0 0 1\n. . 1");
    }

    #[test]
    fn validation_is_idempotent() {
        let raw = format!("[{}]", frame_json(0, 0, 2, 2));
        let first = Layout::from_json(&raw, 6).unwrap();
        let second = Layout::from_json(&raw, 6).unwrap();
        assert_eq!(first.map_rendering(), second.map_rendering());
        assert_eq!(first.map_height(), second.map_height());
    }

    fn rectangles_intersect(a: &(u32, u32, u32, u32), b: &(u32, u32, u32, u32)) -> bool {
        let (ax, ay, aw, ah) = *a;
        let (bx, by, bw, bh) = *b;
        ax < bx + bw && bx < ax + aw && ay < by + bh && by < ay + ah
    }

    proptest! {
        /// Acceptance iff every frame fits the map width and no two
        /// rectangles intersect.
        #[test]
        fn acceptance_matches_geometry(
            rects in proptest::collection::vec((0u32..8, 0u32..8, 1u32..5, 1u32..5), 0..6)
        ) {
            let map_width = 8u32;
            let raw = format!(
                "[{}]",
                rects
                    .iter()
                    .map(|(x, y, w, h)| frame_json(*x, *y, *w, *h))
                    .collect::<Vec<_>>()
                    .join(", ")
            );

            let in_bounds = rects.iter().all(|(x, _, w, _)| x + w <= map_width);
            let disjoint = rects.iter().enumerate().all(|(i, a)| {
                rects.iter().skip(i + 1).all(|b| !rectangles_intersect(a, b))
            });

            let accepted = Layout::from_json(&raw, map_width).is_ok();
            prop_assert_eq!(accepted, in_bounds && disjoint);
        }
    }
}
