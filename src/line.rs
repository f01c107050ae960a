use serde::{Deserialize, Serialize};

use crate::geometry::Point;
use crate::remote::LineRecord;

/// Confidence reported for a line that carries no per-character values.
pub const EMPTY_LINE_CONFIDENCE: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    #[default]
    Text,
    Image,
    Photo,
    Graph,
    Initial,
    Map,
    DecorativeText,
    Stamp,
    Code,
    Schema,
    Music,
    #[serde(other)]
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Text => "text",
            Category::Image => "image",
            Category::Photo => "photo",
            Category::Graph => "graph",
            Category::Initial => "initial",
            Category::Map => "map",
            Category::DecorativeText => "decorative_text",
            Category::Stamp => "stamp",
            Category::Code => "code",
            Category::Schema => "schema",
            Category::Music => "music",
            Category::Other => "other",
        }
    }

    /// Non-text regions that need more surrounding context when focused.
    pub fn is_visual(&self) -> bool {
        matches!(
            self,
            Category::Image
                | Category::Photo
                | Category::Graph
                | Category::Initial
                | Category::Map
                | Category::Stamp
                | Category::Code
                | Category::Schema
                | Category::Other
        )
    }
}

/// Opaque handle of a polygon drawn on a viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PolygonId(pub u64);

#[derive(Debug, Clone)]
pub struct Line {
    pub id: String,
    pub image_id: String,
    pub points: Vec<Point>,
    pub heights: [f64; 2],
    pub text: String,
    pub confidences: Vec<f64>,
    pub category: Category,
    pub ligatures: Vec<Vec<usize>>,
    pub rtl: bool,
    pub valid: bool,
    pub annotated: bool,
    pub for_training: bool,
    pub edited: bool,
    pub focus: bool,
    pub polygon: Option<PolygonId>,
    pub row: usize,
    line_confidence: f64,
}

impl Line {
    pub fn from_record(record: LineRecord, image_id: &str, row: usize) -> Self {
        let line_confidence = min_confidence(&record.confidences);
        Self {
            id: record.id,
            image_id: image_id.to_string(),
            points: record
                .points
                .into_iter()
                .map(|[x, y]| Point::new(x, y))
                .collect(),
            heights: record.heights,
            text: record.text,
            confidences: record.confidences,
            category: record.category.unwrap_or_default(),
            ligatures: record.ligatures,
            rtl: record.rtl,
            valid: true,
            annotated: record.annotated,
            for_training: record.for_training,
            edited: false,
            focus: false,
            polygon: None,
            row,
            line_confidence,
        }
    }

    pub fn line_confidence(&self) -> f64 {
        self.line_confidence
    }

    pub fn line_height(&self) -> f64 {
        self.heights[0] + self.heights[1]
    }

    /// Whether the low-confidence walk should stop on this line.
    pub fn needs_review(&self, threshold: f64) -> bool {
        self.valid && !self.annotated && self.line_confidence < threshold
    }
}

fn min_confidence(values: &[f64]) -> f64 {
    values
        .iter()
        .copied()
        .fold(None, |acc: Option<f64>, value| {
            Some(acc.map_or(value, |current| current.min(value)))
        })
        .unwrap_or(EMPTY_LINE_CONFIDENCE)
}
