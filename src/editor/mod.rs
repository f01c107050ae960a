use anyhow::{Context, Result};
use futures_util::future::join_all;
use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::geometry::{MapBounds, MapPoint, Placement, focus_region};
use crate::line::{Line, PolygonId};
use crate::remote::{AnnotationService, LinesPage, ServiceFuture};
use crate::settings::Settings;
use crate::style::line_style;

mod commit;
pub mod host;

pub use commit::CommitOutcome;
pub use host::{
    Control, EditorHost, FlyOptions, ImageOverlay, LineControls, LineRow, Notifier, PageFlow,
    TextPanel, Viewport, ViewportFactory,
};

pub const LOW_CONFIDENCE_THRESHOLD: f64 = 0.8;
pub const WORST_CONFIDENCE_CAP: f64 = 0.95;
pub const FLY_DURATION_SECS: f64 = 0.5;
pub(crate) const SAVE_PROMPT: &str = "Save changes?";

#[derive(Debug, Clone, PartialEq)]
pub struct EditorOptions {
    pub placement: Placement,
    pub low_confidence: f64,
    pub worst_confidence_cap: f64,
    pub fly_duration_secs: f64,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            placement: Placement::default(),
            low_confidence: LOW_CONFIDENCE_THRESHOLD,
            worst_confidence_cap: WORST_CONFIDENCE_CAP,
            fly_duration_secs: FLY_DURATION_SECS,
        }
    }
}

impl EditorOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            placement: Placement {
                text_height: settings.focus_text_height,
                visual_height: settings.focus_visual_height,
                bottom_pad: settings.focus_bottom_pad,
            },
            low_confidence: settings.low_confidence,
            worst_confidence_cap: settings.worst_confidence_cap,
            fly_duration_secs: settings.fly_duration_secs,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadedImage {
    pub image_id: String,
    pub width: f64,
    pub height: f64,
}

/// Ticket for a line-set fetch started by [`LineEditor::prepare_load`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    pub image_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied {
        lines: usize,
        focused: Option<String>,
    },
    /// A newer load superseded this response; nothing changed.
    Stale { image_id: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    Focused(String),
    NextImage,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveReport {
    pub saved: Vec<String>,
    pub failed: Vec<String>,
}

#[derive(Debug, Clone)]
struct PendingLoad {
    image_id: String,
    focus_line: Option<String>,
}

/// Coordinates the lines of the loaded image with the viewport, the text
/// panel and the annotation store.
pub struct LineEditor<S: AnnotationService> {
    service: S,
    host: EditorHost,
    options: EditorOptions,
    viewport: Option<Box<dyn Viewport>>,
    image: Option<LoadedImage>,
    lines: Vec<Line>,
    focused: Option<usize>,
    worst_confidence: f64,
    latest_request: Option<PendingLoad>,
    busy: HashSet<Control>,
}

impl<S: AnnotationService> LineEditor<S> {
    pub fn new(service: S, host: EditorHost, options: EditorOptions) -> Self {
        let worst_confidence = options.worst_confidence_cap;
        Self {
            service,
            host,
            options,
            viewport: None,
            image: None,
            lines: Vec::new(),
            focused: None,
            worst_confidence,
            latest_request: None,
            busy: HashSet::new(),
        }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn options(&self) -> &EditorOptions {
        &self.options
    }

    pub fn flow_mut(&mut self) -> &mut dyn PageFlow {
        self.host.flow.as_mut()
    }

    pub fn notifier_mut(&mut self) -> &mut dyn Notifier {
        self.host.notifier.as_mut()
    }

    pub fn image(&self) -> Option<&LoadedImage> {
        self.image.as_ref()
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn line(&self, line_id: &str) -> Option<&Line> {
        self.index_of(line_id).map(|index| &self.lines[index])
    }

    pub fn focused_line(&self) -> Option<&Line> {
        self.focused.map(|index| &self.lines[index])
    }

    pub fn worst_confidence(&self) -> f64 {
        self.worst_confidence
    }

    pub fn has_unsaved_edits(&self) -> bool {
        self.lines.iter().any(|line| line.edited)
    }

    pub fn is_busy(&self, control: Control) -> bool {
        self.busy.contains(&control)
    }

    pub async fn load(&mut self, image_id: &str, focus_line: Option<&str>) -> Result<LoadOutcome> {
        let request = self.prepare_load(image_id, focus_line).await;
        let page = self
            .fetch(&request)
            .await
            .with_context(|| format!("failed to load lines for image {}", image_id))?;
        Ok(self.apply_load(page))
    }

    /// Offers to save pending edits and records `image_id` as the latest
    /// requested image. Responses for any other image are dropped afterwards.
    pub async fn prepare_load(&mut self, image_id: &str, focus_line: Option<&str>) -> LoadRequest {
        if self.has_unsaved_edits() && self.host.notifier.confirm(SAVE_PROMPT) {
            let report = self.save_edited().await;
            if !report.failed.is_empty() {
                warn!(
                    "loading image {} with {} unsaved line(s)",
                    image_id,
                    report.failed.len()
                );
            }
        }
        self.latest_request = Some(PendingLoad {
            image_id: image_id.to_string(),
            focus_line: focus_line.map(str::to_string),
        });
        LoadRequest {
            image_id: image_id.to_string(),
        }
    }

    pub fn fetch(&self, request: &LoadRequest) -> ServiceFuture<LinesPage> {
        self.service.fetch_lines(&request.image_id)
    }

    pub fn apply_load(&mut self, page: LinesPage) -> LoadOutcome {
        let Some(pending) = self
            .latest_request
            .as_ref()
            .filter(|pending| pending.image_id == page.image_id)
        else {
            debug!("discarding stale lines for image {}", page.image_id);
            return LoadOutcome::Stale {
                image_id: page.image_id,
            };
        };
        let focus_to = pending.focus_line.clone();

        self.discard_collection();
        self.host.panel.clear();

        let overlay = ImageOverlay {
            image_id: page.image_id.clone(),
            url: self.service.image_url(&page.image_id),
            bounds: MapBounds::for_image(page.width, page.height),
        };
        let mut viewport = self.host.viewports.create(&overlay);

        for (row, record) in page.lines.into_iter().enumerate() {
            let mut line = Line::from_record(record, &page.image_id, row);
            let points = line
                .points
                .iter()
                .map(|point| point.to_map())
                .collect::<Vec<MapPoint>>();
            line.polygon = Some(viewport.add_polygon(&points));
            self.host.panel.append_row(&LineRow {
                line_id: line.id.clone(),
                text: line.text.clone(),
                rtl: line.rtl,
                for_training: line.for_training,
                category: line.category,
            });
            self.lines.push(line);
        }
        self.viewport = Some(viewport);
        self.image = Some(LoadedImage {
            image_id: page.image_id.clone(),
            width: page.width,
            height: page.height,
        });

        self.worst_confidence = self
            .lines
            .iter()
            .map(Line::line_confidence)
            .fold(self.options.worst_confidence_cap, f64::min);
        for index in 0..self.lines.len() {
            self.restyle(index);
        }

        let focused = focus_to.and_then(|line_id| self.index_of(&line_id));
        match focused {
            Some(index) => {
                self.focus_index(index, FlyOptions::animated(self.options.fly_duration_secs))
            }
            None => {
                if let Some(viewport) = self.viewport.as_mut() {
                    viewport.focus_input();
                }
            }
        }

        info!(
            "loaded {} lines for image {} (worst confidence {:.3})",
            self.lines.len(),
            page.image_id,
            self.worst_confidence
        );
        LoadOutcome::Applied {
            lines: self.lines.len(),
            focused: focused.map(|index| self.lines[index].id.clone()),
        }
    }

    /// Navigates away: drops the collection and the viewport, and ignores
    /// any load still in flight.
    pub fn close(&mut self) {
        self.latest_request = None;
        self.discard_collection();
        self.host.panel.clear();
    }

    pub fn focus_line(&mut self, line_id: &str) -> bool {
        let Some(index) = self.index_of(line_id) else {
            return false;
        };
        self.focus_index(index, FlyOptions::animated(self.options.fly_duration_secs));
        true
    }

    pub fn polygon_clicked(&mut self, polygon: PolygonId) -> Option<String> {
        let index = self
            .lines
            .iter()
            .position(|line| line.polygon == Some(polygon))?;
        self.focus_index(index, FlyOptions::animated(self.options.fly_duration_secs));
        Some(self.lines[index].id.clone())
    }

    pub fn click_map(&mut self, point: MapPoint) -> Option<String> {
        let polygon = self.viewport.as_ref()?.hit_test(point)?;
        self.polygon_clicked(polygon)
    }

    /// Enter in the text panel: move to the following row.
    pub fn focus_next_row(&mut self) -> Option<String> {
        let next = self.focused? + 1;
        if next >= self.lines.len() {
            return None;
        }
        self.focus_index(next, FlyOptions::animated(self.options.fly_duration_secs));
        Some(self.lines[next].id.clone())
    }

    /// Re-frames the focused line without animation, e.g. after a resize.
    pub fn refresh_view(&mut self) {
        if let Some(index) = self.focused {
            self.fly_to(index, FlyOptions::instant());
        }
    }

    pub fn edit_text(&mut self, line_id: &str, text: &str) -> bool {
        let Some(index) = self.index_of(line_id) else {
            return false;
        };
        let line = &mut self.lines[index];
        if line.text != text {
            line.text = text.to_string();
            line.edited = true;
            self.restyle(index);
        }
        true
    }

    pub fn advance_to_low_confidence(&mut self) -> Advance {
        let start = self.focused.map_or(0, |index| index + 1);
        let threshold = self.options.low_confidence;
        let next = self
            .lines
            .iter()
            .enumerate()
            .skip(start)
            .find(|(_, line)| line.needs_review(threshold))
            .map(|(index, _)| index);
        match next {
            Some(index) => {
                self.focus_index(index, FlyOptions::animated(self.options.fly_duration_secs));
                Advance::Focused(self.lines[index].id.clone())
            }
            None => {
                info!("no low-confidence lines left; advancing to next image");
                self.host.flow.advance();
                Advance::NextImage
            }
        }
    }

    pub async fn save_edited(&mut self) -> SaveReport {
        let (indices, calls): (Vec<usize>, Vec<ServiceFuture<()>>) = self
            .lines
            .iter()
            .enumerate()
            .filter(|(_, line)| line.edited)
            .map(|(index, line)| (index, self.service.save_line_text(&line.id, &line.text)))
            .unzip();
        if indices.is_empty() {
            return SaveReport::default();
        }

        let results = join_all(calls).await;
        let mut report = SaveReport::default();
        for (index, result) in indices.into_iter().zip(results) {
            let line = &mut self.lines[index];
            match result {
                Ok(()) => {
                    line.edited = false;
                    line.annotated = true;
                    report.saved.push(line.id.clone());
                }
                Err(err) => {
                    warn!("failed to save line {}: {:#}", line.id, err);
                    report.failed.push(line.id.clone());
                }
            }
            self.restyle(index);
        }
        if !report.failed.is_empty() {
            self.host.notifier.alert(&format!(
                "Unable to save {} line(s). Check your remote connection.",
                report.failed.len()
            ));
        }
        report
    }

    fn index_of(&self, line_id: &str) -> Option<usize> {
        self.lines.iter().position(|line| line.id == line_id)
    }

    fn discard_collection(&mut self) {
        if let Some(mut viewport) = self.viewport.take() {
            viewport.teardown();
        }
        self.lines.clear();
        self.focused = None;
        self.image = None;
        self.busy.clear();
    }

    fn focus_index(&mut self, index: usize, fly: FlyOptions) {
        if let Some(previous) = self.focused.take() {
            if let Some(line) = self.lines.get_mut(previous) {
                line.focus = false;
            }
            self.restyle(previous);
        }

        self.fly_to(index, fly);
        self.lines[index].focus = true;
        self.focused = Some(index);
        self.restyle(index);

        self.refresh_controls();
        let row = self.lines[index].row;
        self.host
            .panel
            .scroll_to(row, self.options.fly_duration_secs);
        self.host.panel.focus_row(row);
    }

    fn fly_to(&mut self, index: usize, fly: FlyOptions) {
        let (Some(viewport), Some(line)) = (self.viewport.as_mut(), self.lines.get(index)) else {
            return;
        };
        let Some(region) = focus_region(
            &line.points,
            line.heights,
            line.category,
            viewport.size(),
            &self.options.placement,
        ) else {
            return;
        };
        viewport.stop();
        viewport.fly_to_bounds(region.to_map_bounds(), fly);
    }

    fn refresh_controls(&mut self) {
        if let Some(line) = self.focused.and_then(|index| self.lines.get(index)) {
            self.host.panel.show_line_controls(LineControls {
                valid: line.valid,
                for_training: line.for_training,
            });
        }
    }

    fn restyle(&mut self, index: usize) {
        let Some(line) = self.lines.get(index) else {
            return;
        };
        let style = line_style(line, self.worst_confidence);
        if let (Some(viewport), Some(polygon)) = (self.viewport.as_mut(), line.polygon) {
            viewport.set_polygon_style(polygon, &style.polygon);
        }
        self.host.panel.set_row_style(line.row, &style.row);
    }
}
