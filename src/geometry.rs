use serde::Serialize;

use crate::line::Category;

pub const TEXT_FOCUS_HEIGHT: f64 = 50.0;
pub const VISUAL_FOCUS_HEIGHT: f64 = 300.0;
pub const FOCUS_BOTTOM_PAD: f64 = 100.0;

/// Point in image pixel coordinates (row 0 at the top).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Projects onto the viewport plane, whose vertical axis grows upward.
    pub fn to_map(self) -> MapPoint {
        MapPoint {
            x: self.x,
            y: -self.y,
        }
    }
}

/// Point in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MapPoint {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MapBounds {
    pub south_west: MapPoint,
    pub north_east: MapPoint,
}

impl MapBounds {
    /// Viewport bounds covering a whole image of the given pixel size.
    pub fn for_image(width: f64, height: f64) -> Self {
        Self {
            south_west: MapPoint { x: 0.0, y: -height },
            north_east: MapPoint { x: width, y: 0.0 },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportSize {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    pub fn of(points: &[Point]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut bbox = BoundingBox {
            min_x: first.x,
            min_y: first.y,
            max_x: first.x,
            max_y: first.y,
        };
        for point in rest {
            bbox.min_x = bbox.min_x.min(point.x);
            bbox.min_y = bbox.min_y.min(point.y);
            bbox.max_x = bbox.max_x.max(point.x);
            bbox.max_y = bbox.max_y.max(point.y);
        }
        Some(bbox)
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }
}

/// Image-space heights used when framing a focused line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub text_height: f64,
    pub visual_height: f64,
    pub bottom_pad: f64,
}

impl Default for Placement {
    fn default() -> Self {
        Self {
            text_height: TEXT_FOCUS_HEIGHT,
            visual_height: VISUAL_FOCUS_HEIGHT,
            bottom_pad: FOCUS_BOTTOM_PAD,
        }
    }
}

impl Placement {
    pub fn target_height(&self, category: Category) -> f64 {
        if category.is_visual() {
            self.visual_height
        } else {
            self.text_height
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FocusRegion {
    pub start_x: f64,
    pub end_x: f64,
    pub focus_y: f64,
}

impl FocusRegion {
    pub fn to_map_bounds(&self) -> MapBounds {
        MapBounds {
            south_west: MapPoint {
                x: self.start_x,
                y: -self.focus_y,
            },
            north_east: MapPoint {
                x: self.end_x,
                y: -self.focus_y,
            },
        }
    }
}

/// Computes the horizontal span and vertical center to show around a line.
///
/// The span is scaled so that the line, once the viewport width is mapped
/// onto it, renders at the category's target height. A too-tall rendering
/// widens the span on both sides; a too-short one trims it from the right so
/// the start of the line stays anchored. The center is shifted by the bottom
/// pad so the line sits in the lower half of the viewport.
pub fn focus_region(
    points: &[Point],
    heights: [f64; 2],
    category: Category,
    viewport: ViewportSize,
    placement: &Placement,
) -> Option<FocusRegion> {
    let bbox = BoundingBox::of(points)?;
    let target = placement.target_height(category);
    let viewport_width = viewport.width.max(1.0);
    let viewport_height = viewport.height.max(1.0);

    let line_height = heights[0] + heights[1];
    let line_width = bbox.width();
    let mut start_x = bbox.min_x;
    let mut end_x = bbox.max_x;

    let expected_height = line_height * (viewport_width / line_width);
    let new_width = (line_height * viewport_width) / target;
    if expected_height > target {
        let grow = (new_width - line_width) / 2.0;
        start_x -= grow;
        end_x += grow;
    }
    if expected_height < target {
        end_x -= line_width - new_width;
    }

    let y = bbox.min_y + line_height;
    let show_offset = viewport_height / 2.0 - placement.bottom_pad;
    let height_offset = show_offset / (viewport_width / new_width);
    Some(FocusRegion {
        start_x,
        end_x,
        focus_y: y - height_offset,
    })
}
