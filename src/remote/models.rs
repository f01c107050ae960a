use serde::{Deserialize, Serialize};

use crate::line::Category;

fn default_true() -> bool {
    true
}

/// Response of the lines-for-image call.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LinesPage {
    pub image_id: String,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub lines: Vec<LineRecord>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LineRecord {
    pub id: String,
    #[serde(default)]
    pub annotated: bool,
    #[serde(default)]
    pub text: String,
    #[serde(rename = "np_confidences", default)]
    pub confidences: Vec<f64>,
    #[serde(rename = "ligatures_mapping", default)]
    pub ligatures: Vec<Vec<usize>>,
    #[serde(rename = "arabic", default)]
    pub rtl: bool,
    #[serde(default = "default_true")]
    pub for_training: bool,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(rename = "np_points", default)]
    pub points: Vec<[f64; 2]>,
    #[serde(rename = "np_heights", default)]
    pub heights: [f64; 2],
}

impl Default for LineRecord {
    fn default() -> Self {
        Self {
            id: String::new(),
            annotated: false,
            text: String::new(),
            confidences: Vec::new(),
            ligatures: Vec::new(),
            rtl: false,
            for_training: true,
            category: None,
            points: Vec::new(),
            heights: [0.0, 0.0],
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct TrainingFlagRequest<'a> {
    pub(crate) line_id: &'a str,
    pub(crate) training_flag: u8,
}

#[derive(Debug, Serialize)]
pub(crate) struct DeleteFlagRequest<'a> {
    pub(crate) line_id: &'a str,
    pub(crate) delete_flag: u8,
}

#[derive(Debug, Serialize)]
pub(crate) struct SaveLineRequest<'a> {
    pub(crate) text: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct UploadRequest<'a> {
    pub(crate) image: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UploadResponse {
    pub(crate) request_id: String,
}

/// Processing state of an uploaded request, as reported by its status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStatus {
    Ready,
    Pending,
    Unknown,
    Failed,
    Unexpected(u16),
}

impl RequestStatus {
    pub fn from_code(code: u16) -> Self {
        match code {
            200 => RequestStatus::Ready,
            202 => RequestStatus::Pending,
            404 => RequestStatus::Unknown,
            500 => RequestStatus::Failed,
            other => RequestStatus::Unexpected(other),
        }
    }
}
