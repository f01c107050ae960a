use anyhow::{Result, anyhow};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use std::future::Future;
use std::pin::Pin;

mod http;
mod models;

pub use http::HttpService;
pub use models::{LineRecord, LinesPage, RequestStatus};

pub type ServiceFuture<T> = Pin<Box<dyn Future<Output = Result<T>> + Send>>;

/// Encoded still image produced by the capture front end.
#[derive(Debug, Clone)]
pub struct EncodedImage {
    pub mime: String,
    pub bytes: Vec<u8>,
}

const UPLOAD_MIMES: [&str; 2] = ["image/png", "image/jpeg"];

impl EncodedImage {
    /// Sniffs the image type; the recognizer accepts PNG and JPEG only.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let mime = infer::get(&bytes)
            .map(|kind| kind.mime_type())
            .ok_or_else(|| anyhow!("unrecognized image data ({} bytes)", bytes.len()))?;
        if !UPLOAD_MIMES.contains(&mime) {
            return Err(anyhow!(
                "unsupported image type '{}' (expected PNG or JPEG)",
                mime
            ));
        }
        Ok(Self {
            mime: mime.to_string(),
            bytes,
        })
    }

    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime, BASE64.encode(&self.bytes))
    }
}

/// Remote OCR and annotation store.
///
/// Every call returns an owned future so that the caller does not keep the
/// service borrowed while the request is in flight.
pub trait AnnotationService: Clone + Send + Sync + 'static {
    fn fetch_lines(&self, image_id: &str) -> ServiceFuture<LinesPage>;
    fn fetch_image(&self, image_id: &str) -> ServiceFuture<Vec<u8>>;
    /// Address the viewport loads the backing raster from.
    fn image_url(&self, image_id: &str) -> String;
    fn set_training_flag(&self, line_id: &str, included: bool) -> ServiceFuture<()>;
    fn set_delete_flag(&self, line_id: &str, deleted: bool) -> ServiceFuture<()>;
    fn save_line_text(&self, line_id: &str, text: &str) -> ServiceFuture<()>;
    fn compute_scores(&self, document_id: &str) -> ServiceFuture<()>;
    fn upload_image(&self, image: &EncodedImage) -> ServiceFuture<String>;
    fn request_status(&self, request_id: &str) -> ServiceFuture<RequestStatus>;
}
