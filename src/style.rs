use serde::Serialize;

use crate::line::Line;

pub const DELETED_COLOR: Color = Color::rgb(16, 16, 16);
pub const EDITED_COLOR: Color = Color::rgb(0xff, 0xcc, 0x54);
pub const ANNOTATED_COLOR: Color = Color::rgb(0x02, 0x87, 0x00);
const RAMP_GREEN: u8 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Red-to-blue ramp; `t = 0` is the worst line, `t = 1` fully confident.
    pub fn confidence_ramp(t: f64) -> Self {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        Self::rgb(channel((1.0 - t) * 255.0), RAMP_GREEN, channel(t * 255.0))
    }
}

impl Serialize for Color {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

fn channel(value: f64) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolygonStyle {
    pub color: Color,
    pub opacity: f64,
    pub fill_color: Color,
    pub fill_opacity: f64,
    pub weight: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowStyle {
    pub border: Option<String>,
    pub border_radius_px: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineStyle {
    pub polygon: PolygonStyle,
    pub row: RowStyle,
}

/// Normalized position of a confidence between the session's worst line and 1.
pub fn normalized_confidence(confidence: f64, worst_confidence: f64) -> f64 {
    let span = 1.0 - worst_confidence;
    if span <= 0.0 {
        return 1.0;
    }
    ((confidence - worst_confidence) / span).clamp(0.0, 1.0)
}

/// Deleted > edited > annotated > confidence ramp.
pub fn line_color(line: &Line, worst_confidence: f64) -> Color {
    if !line.valid {
        DELETED_COLOR
    } else if line.edited {
        EDITED_COLOR
    } else if line.annotated {
        ANNOTATED_COLOR
    } else {
        Color::confidence_ramp(normalized_confidence(
            line.line_confidence(),
            worst_confidence,
        ))
    }
}

pub fn line_style(line: &Line, worst_confidence: f64) -> LineStyle {
    let color = line_color(line, worst_confidence);
    if line.focus {
        LineStyle {
            polygon: PolygonStyle {
                color,
                opacity: 1.0,
                fill_color: color,
                fill_opacity: 0.15,
                weight: 2,
            },
            row: RowStyle {
                border: Some("solid teal".to_string()),
                border_radius_px: 10,
            },
        }
    } else {
        LineStyle {
            polygon: PolygonStyle {
                color,
                opacity: 0.5,
                fill_color: color,
                fill_opacity: 0.1,
                weight: 1,
            },
            row: RowStyle {
                border: None,
                border_radius_px: 0,
            },
        }
    }
}
