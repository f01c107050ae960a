use anyhow::anyhow;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::rc::Rc;
use std::sync::{Arc, Mutex};

use crate::editor::{
    Control, EditorHost, FlyOptions, ImageOverlay, LineControls, LineRow, Notifier, PageFlow,
    TextPanel, Viewport, ViewportFactory,
};
use crate::geometry::{MapBounds, MapPoint, ViewportSize};
use crate::line::PolygonId;
use crate::remote::{
    AnnotationService, EncodedImage, LineRecord, LinesPage, RequestStatus, ServiceFuture,
};
use crate::style::{PolygonStyle, RowStyle};

pub(crate) fn with_temp_home<F, R>(func: F) -> R
where
    F: FnOnce(&std::path::Path) -> R,
{
    static HOME_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());
    let _guard = HOME_MUTEX.lock().expect("home lock");
    let dir = tempfile::tempdir().expect("tempdir");
    let old_home = std::env::var("HOME").ok();
    // SAFETY: HOME is only touched by tests holding HOME_MUTEX.
    unsafe { std::env::set_var("HOME", dir.path()) };
    let result = func(dir.path());
    match old_home {
        // SAFETY: as above.
        Some(old) => unsafe { std::env::set_var("HOME", old) },
        None => unsafe { std::env::remove_var("HOME") },
    }
    result
}

pub(crate) fn record(id: &str, confidences: &[f64]) -> LineRecord {
    LineRecord {
        id: id.to_string(),
        text: format!("text of {}", id),
        confidences: confidences.to_vec(),
        points: vec![
            [10.0, 100.0],
            [210.0, 100.0],
            [210.0, 120.0],
            [10.0, 120.0],
        ],
        heights: [15.0, 5.0],
        ..LineRecord::default()
    }
}

pub(crate) fn page(image_id: &str, lines: Vec<LineRecord>) -> LinesPage {
    LinesPage {
        image_id: image_id.to_string(),
        width: 1000.0,
        height: 1400.0,
        lines,
    }
}

#[derive(Debug, Default)]
pub(crate) struct ServiceState {
    pub(crate) pages: HashMap<String, LinesPage>,
    pub(crate) fail_writes: bool,
    pub(crate) failing_lines: HashSet<String>,
    pub(crate) stalled_lines: HashSet<String>,
    pub(crate) statuses: VecDeque<RequestStatus>,
    pub(crate) calls: Vec<String>,
}

/// In-memory annotation service recording every call.
#[derive(Debug, Clone, Default)]
pub(crate) struct FakeService {
    pub(crate) state: Arc<Mutex<ServiceState>>,
}

impl FakeService {
    pub(crate) fn with_pages(pages: Vec<LinesPage>) -> Self {
        let service = Self::default();
        {
            let mut state = service.state.lock().expect("service state");
            for page in pages {
                state.pages.insert(page.image_id.clone(), page);
            }
        }
        service
    }

    pub(crate) fn fail_writes(&self, fail: bool) {
        self.state.lock().expect("service state").fail_writes = fail;
    }

    pub(crate) fn fail_line(&self, line_id: &str) {
        self.state
            .lock()
            .expect("service state")
            .failing_lines
            .insert(line_id.to_string());
    }

    /// Writes for `line_id` never complete until the line is released.
    pub(crate) fn stall_line(&self, line_id: &str, stalled: bool) {
        let mut state = self.state.lock().expect("service state");
        if stalled {
            state.stalled_lines.insert(line_id.to_string());
        } else {
            state.stalled_lines.remove(line_id);
        }
    }

    pub(crate) fn push_status(&self, status: RequestStatus) {
        self.state
            .lock()
            .expect("service state")
            .statuses
            .push_back(status);
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.state.lock().expect("service state").calls.clone()
    }

    fn write(&self, call: String, line_id: &str) -> ServiceFuture<()> {
        let state = self.state.clone();
        let line_id = line_id.to_string();
        Box::pin(async move {
            let stalled = {
                let mut state = state.lock().expect("service state");
                state.calls.push(call.clone());
                if state.fail_writes || state.failing_lines.contains(&line_id) {
                    return Err(anyhow!("service unavailable: {}", call));
                }
                state.stalled_lines.contains(&line_id)
            };
            if stalled {
                std::future::pending::<()>().await;
            }
            Ok(())
        })
    }
}

impl AnnotationService for FakeService {
    fn fetch_lines(&self, image_id: &str) -> ServiceFuture<LinesPage> {
        let state = self.state.clone();
        let image_id = image_id.to_string();
        Box::pin(async move {
            let mut state = state.lock().expect("service state");
            state.calls.push(format!("fetch_lines {}", image_id));
            state
                .pages
                .get(&image_id)
                .cloned()
                .ok_or_else(|| anyhow!("no lines for image {}", image_id))
        })
    }

    fn fetch_image(&self, image_id: &str) -> ServiceFuture<Vec<u8>> {
        let image_id = image_id.to_string();
        Box::pin(async move { Ok(image_id.into_bytes()) })
    }

    fn image_url(&self, image_id: &str) -> String {
        format!("fake://image/{}", image_id)
    }

    fn set_training_flag(&self, line_id: &str, included: bool) -> ServiceFuture<()> {
        self.write(format!("training {} {}", line_id, included), line_id)
    }

    fn set_delete_flag(&self, line_id: &str, deleted: bool) -> ServiceFuture<()> {
        self.write(format!("delete {} {}", line_id, deleted), line_id)
    }

    fn save_line_text(&self, line_id: &str, text: &str) -> ServiceFuture<()> {
        self.write(format!("save {} {}", line_id, text), line_id)
    }

    fn compute_scores(&self, document_id: &str) -> ServiceFuture<()> {
        self.write(format!("scores {}", document_id), "")
    }

    fn upload_image(&self, image: &EncodedImage) -> ServiceFuture<String> {
        let state = self.state.clone();
        let call = format!("upload {} {}", image.mime, image.bytes.len());
        Box::pin(async move {
            let mut state = state.lock().expect("service state");
            state.calls.push(call);
            if state.fail_writes {
                return Err(anyhow!("upload rejected"));
            }
            Ok("req-1".to_string())
        })
    }

    fn request_status(&self, request_id: &str) -> ServiceFuture<RequestStatus> {
        let state = self.state.clone();
        let request_id = request_id.to_string();
        Box::pin(async move {
            let mut state = state.lock().expect("service state");
            state.calls.push(format!("status {}", request_id));
            Ok(state
                .statuses
                .pop_front()
                .unwrap_or(RequestStatus::Unknown))
        })
    }
}

/// Everything the fake host collaborators observed.
#[derive(Debug, Default)]
pub(crate) struct HostLog {
    pub(crate) overlays: Vec<ImageOverlay>,
    pub(crate) teardowns: usize,
    pub(crate) polygons: Vec<Vec<MapPoint>>,
    pub(crate) polygon_styles: HashMap<PolygonId, PolygonStyle>,
    pub(crate) flights: Vec<(MapBounds, FlyOptions)>,
    pub(crate) stops: usize,
    pub(crate) input_focus: usize,
    pub(crate) hit: Option<PolygonId>,
    pub(crate) rows: Vec<LineRow>,
    pub(crate) row_styles: HashMap<usize, RowStyle>,
    pub(crate) row_training: HashMap<usize, bool>,
    pub(crate) scrolls: Vec<usize>,
    pub(crate) focused_rows: Vec<usize>,
    pub(crate) control_events: Vec<(Control, bool)>,
    pub(crate) controls: Option<LineControls>,
    pub(crate) alerts: Vec<String>,
    pub(crate) confirms: Vec<String>,
    pub(crate) confirm_answer: bool,
    pub(crate) advances: usize,
    pub(crate) retreats: usize,
    pub(crate) resets: usize,
}

pub(crate) type SharedLog = Rc<RefCell<HostLog>>;

struct FakeViewport {
    log: SharedLog,
    next_polygon: u64,
}

impl Viewport for FakeViewport {
    fn size(&self) -> ViewportSize {
        ViewportSize {
            width: 1000.0,
            height: 600.0,
        }
    }

    fn add_polygon(&mut self, points: &[MapPoint]) -> PolygonId {
        self.next_polygon += 1;
        self.log.borrow_mut().polygons.push(points.to_vec());
        PolygonId(self.next_polygon)
    }

    fn set_polygon_style(&mut self, polygon: PolygonId, style: &PolygonStyle) {
        self.log
            .borrow_mut()
            .polygon_styles
            .insert(polygon, style.clone());
    }

    fn stop(&mut self) {
        self.log.borrow_mut().stops += 1;
    }

    fn fly_to_bounds(&mut self, bounds: MapBounds, options: FlyOptions) {
        self.log.borrow_mut().flights.push((bounds, options));
    }

    fn hit_test(&self, _point: MapPoint) -> Option<PolygonId> {
        self.log.borrow().hit
    }

    fn focus_input(&mut self) {
        self.log.borrow_mut().input_focus += 1;
    }

    fn teardown(&mut self) {
        self.log.borrow_mut().teardowns += 1;
    }
}

struct FakeViewports(SharedLog);

impl ViewportFactory for FakeViewports {
    fn create(&mut self, overlay: &ImageOverlay) -> Box<dyn Viewport> {
        let mut log = self.0.borrow_mut();
        log.overlays.push(overlay.clone());
        log.polygons.clear();
        log.polygon_styles.clear();
        Box::new(FakeViewport {
            log: self.0.clone(),
            next_polygon: 0,
        })
    }
}

struct FakePanel(SharedLog);

impl TextPanel for FakePanel {
    fn clear(&mut self) {
        let mut log = self.0.borrow_mut();
        log.rows.clear();
        log.row_styles.clear();
    }

    fn append_row(&mut self, row: &LineRow) {
        self.0.borrow_mut().rows.push(row.clone());
    }

    fn set_row_style(&mut self, row: usize, style: &RowStyle) {
        self.0.borrow_mut().row_styles.insert(row, style.clone());
    }

    fn set_row_training(&mut self, row: usize, for_training: bool) {
        self.0.borrow_mut().row_training.insert(row, for_training);
    }

    fn scroll_to(&mut self, row: usize, _duration_secs: f64) {
        self.0.borrow_mut().scrolls.push(row);
    }

    fn focus_row(&mut self, row: usize) {
        self.0.borrow_mut().focused_rows.push(row);
    }

    fn set_control_enabled(&mut self, control: Control, enabled: bool) {
        self.0.borrow_mut().control_events.push((control, enabled));
    }

    fn show_line_controls(&mut self, controls: LineControls) {
        self.0.borrow_mut().controls = Some(controls);
    }
}

struct FakeNotifier(SharedLog);

impl Notifier for FakeNotifier {
    fn alert(&mut self, message: &str) {
        self.0.borrow_mut().alerts.push(message.to_string());
    }

    fn confirm(&mut self, message: &str) -> bool {
        let mut log = self.0.borrow_mut();
        log.confirms.push(message.to_string());
        log.confirm_answer
    }
}

struct FakeFlow(SharedLog);

impl PageFlow for FakeFlow {
    fn advance(&mut self) {
        self.0.borrow_mut().advances += 1;
    }

    fn retreat(&mut self) {
        self.0.borrow_mut().retreats += 1;
    }

    fn reset(&mut self) {
        self.0.borrow_mut().resets += 1;
    }
}

pub(crate) fn recording_host() -> (EditorHost, SharedLog) {
    let log: SharedLog = Rc::new(RefCell::new(HostLog::default()));
    let host = EditorHost {
        viewports: Box::new(FakeViewports(log.clone())),
        panel: Box::new(FakePanel(log.clone())),
        notifier: Box::new(FakeNotifier(log.clone())),
        flow: Box::new(FakeFlow(log.clone())),
    };
    (host, log)
}
