use crate::geometry::{MapBounds, MapPoint, ViewportSize};
use crate::line::{Category, PolygonId};
use crate::style::{PolygonStyle, RowStyle};

/// What a freshly created viewport displays.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageOverlay {
    pub image_id: String,
    pub url: String,
    pub bounds: MapBounds,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlyOptions {
    pub animate: bool,
    pub duration_secs: f64,
}

impl FlyOptions {
    pub fn animated(duration_secs: f64) -> Self {
        Self {
            animate: true,
            duration_secs,
        }
    }

    pub fn instant() -> Self {
        Self {
            animate: false,
            duration_secs: 0.0,
        }
    }
}

/// Pannable, zoomable map showing one image and its line polygons.
pub trait Viewport {
    fn size(&self) -> ViewportSize;
    fn add_polygon(&mut self, points: &[MapPoint]) -> PolygonId;
    fn set_polygon_style(&mut self, polygon: PolygonId, style: &PolygonStyle);
    /// Cancels a running fly animation.
    fn stop(&mut self);
    fn fly_to_bounds(&mut self, bounds: MapBounds, options: FlyOptions);
    fn hit_test(&self, point: MapPoint) -> Option<PolygonId>;
    fn focus_input(&mut self);
    /// Detaches listeners and removes the widget.
    fn teardown(&mut self);
}

pub trait ViewportFactory {
    fn create(&mut self, overlay: &ImageOverlay) -> Box<dyn Viewport>;
}

/// Text of one editing row in the panel.
#[derive(Debug, Clone, PartialEq)]
pub struct LineRow {
    pub line_id: String,
    pub text: String,
    pub rtl: bool,
    pub for_training: bool,
    pub category: Category,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    Training,
    Delete,
}

/// State the delete and ignore buttons reflect for the focused line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineControls {
    pub valid: bool,
    pub for_training: bool,
}

pub trait TextPanel {
    fn clear(&mut self);
    fn append_row(&mut self, row: &LineRow);
    fn set_row_style(&mut self, row: usize, style: &RowStyle);
    fn set_row_training(&mut self, row: usize, for_training: bool);
    fn scroll_to(&mut self, row: usize, duration_secs: f64);
    fn focus_row(&mut self, row: usize);
    fn set_control_enabled(&mut self, control: Control, enabled: bool);
    fn show_line_controls(&mut self, controls: LineControls);
}

pub trait Notifier {
    fn alert(&mut self, message: &str);
    fn confirm(&mut self, message: &str) -> bool;
}

/// Outer page controller; the editor only ever moves it forward.
pub trait PageFlow {
    fn advance(&mut self);
    fn retreat(&mut self);
    fn reset(&mut self);
}

/// Collaborators the editor drives.
pub struct EditorHost {
    pub viewports: Box<dyn ViewportFactory>,
    pub panel: Box<dyn TextPanel>,
    pub notifier: Box<dyn Notifier>,
    pub flow: Box<dyn PageFlow>,
}
