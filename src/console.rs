use tracing::{debug, info, warn};

use crate::editor::{
    Control, EditorHost, FlyOptions, ImageOverlay, LineControls, LineRow, Notifier, TextPanel,
    Viewport, ViewportFactory,
};
use crate::flow::PageController;
use crate::geometry::{MapBounds, MapPoint, ViewportSize};
use crate::line::PolygonId;
use crate::style::{PolygonStyle, RowStyle};

const CONSOLE_VIEWPORT: ViewportSize = ViewportSize {
    width: 1280.0,
    height: 720.0,
};

/// Viewport stand-in for terminal use; it only traces what would be drawn.
struct ConsoleViewport {
    image_id: String,
    polygons: u64,
}

impl Viewport for ConsoleViewport {
    fn size(&self) -> ViewportSize {
        CONSOLE_VIEWPORT
    }

    fn add_polygon(&mut self, points: &[MapPoint]) -> PolygonId {
        self.polygons += 1;
        debug!(
            "{}: polygon {} with {} points",
            self.image_id,
            self.polygons,
            points.len()
        );
        PolygonId(self.polygons)
    }

    fn set_polygon_style(&mut self, polygon: PolygonId, style: &PolygonStyle) {
        debug!(
            "{}: polygon {} color {}",
            self.image_id,
            polygon.0,
            style.color.to_hex()
        );
    }

    fn stop(&mut self) {}

    fn fly_to_bounds(&mut self, bounds: MapBounds, options: FlyOptions) {
        debug!(
            "{}: fly to x {:.1}..{:.1} y {:.1} ({:.1}s)",
            self.image_id,
            bounds.south_west.x,
            bounds.north_east.x,
            bounds.south_west.y,
            options.duration_secs
        );
    }

    fn hit_test(&self, _point: MapPoint) -> Option<PolygonId> {
        None
    }

    fn focus_input(&mut self) {}

    fn teardown(&mut self) {
        debug!("{}: viewport removed", self.image_id);
    }
}

struct ConsoleViewports;

impl ViewportFactory for ConsoleViewports {
    fn create(&mut self, overlay: &ImageOverlay) -> Box<dyn Viewport> {
        debug!("viewport for {} from {}", overlay.image_id, overlay.url);
        Box::new(ConsoleViewport {
            image_id: overlay.image_id.clone(),
            polygons: 0,
        })
    }
}

struct ConsolePanel;

impl TextPanel for ConsolePanel {
    fn clear(&mut self) {}

    fn append_row(&mut self, row: &LineRow) {
        debug!("row {}: {}", row.line_id, row.text);
    }

    fn set_row_style(&mut self, _row: usize, _style: &RowStyle) {}

    fn set_row_training(&mut self, row: usize, for_training: bool) {
        debug!("row {} training {}", row, for_training);
    }

    fn scroll_to(&mut self, _row: usize, _duration_secs: f64) {}

    fn focus_row(&mut self, _row: usize) {}

    fn set_control_enabled(&mut self, control: Control, enabled: bool) {
        debug!("{:?} control enabled: {}", control, enabled);
    }

    fn show_line_controls(&mut self, _controls: LineControls) {}
}

struct ConsoleNotifier {
    assume_yes: bool,
}

impl Notifier for ConsoleNotifier {
    fn alert(&mut self, message: &str) {
        warn!("{}", message);
        eprintln!("{}", message);
    }

    fn confirm(&mut self, message: &str) -> bool {
        info!("{} -> {}", message, if self.assume_yes { "yes" } else { "no" });
        self.assume_yes
    }
}

/// Host for running the editor without a display.
pub fn host(assume_yes: bool) -> EditorHost {
    let flow = PageController::new()
        .on_enter(crate::flow::Page::Results, |page| debug!("showing {:?}", page));
    EditorHost {
        viewports: Box::new(ConsoleViewports),
        panel: Box::new(ConsolePanel),
        notifier: Box::new(ConsoleNotifier { assume_yes }),
        flow: Box::new(flow),
    }
}
