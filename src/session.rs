use anyhow::{Context, Result};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::editor::{LineEditor, LoadOutcome};
use crate::remote::{AnnotationService, EncodedImage, RequestStatus};

pub const POLL_INTERVAL: Duration = Duration::from_millis(2000);

/// Client state of one submitted or reopened recognition request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    request_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestResult {
    Loaded(LoadOutcome),
    Abandoned(RequestStatus),
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Session for a request id taken from an address or the command line.
    pub fn resume(request_id: impl Into<String>) -> Self {
        Self {
            request_id: Some(request_id.into()),
        }
    }

    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    pub fn clear(&mut self) {
        self.request_id = None;
    }

    /// Uploads a captured image and moves the flow on to processing.
    pub async fn submit<S: AnnotationService>(
        &mut self,
        editor: &mut LineEditor<S>,
        image: &EncodedImage,
    ) -> Result<String> {
        let request_id = editor
            .service()
            .upload_image(image)
            .await
            .with_context(|| "failed to upload image")?;
        info!("uploaded image as request {}", request_id);
        self.request_id = Some(request_id.clone());
        editor.flow_mut().advance();
        Ok(request_id)
    }

    /// Waits until the current request is processed, then opens it in the
    /// editor. Any terminal non-ready state alerts and resets the flow.
    pub async fn check_request<S: AnnotationService>(
        &mut self,
        editor: &mut LineEditor<S>,
        interval: Duration,
    ) -> Result<RequestResult> {
        let request_id = self
            .request_id
            .clone()
            .with_context(|| "no request to check")?;
        let status = wait_for_result(editor.service(), &request_id, interval).await?;
        if status == RequestStatus::Ready {
            let outcome = editor.load(&request_id, None).await?;
            editor.flow_mut().advance();
            return Ok(RequestResult::Loaded(outcome));
        }

        warn!("request {} ended with {:?}", request_id, status);
        editor
            .notifier_mut()
            .alert(&status_message(status, &request_id));
        self.clear();
        editor.flow_mut().reset();
        Ok(RequestResult::Abandoned(status))
    }
}

/// Polls the processing status until it is no longer pending.
pub async fn wait_for_result<S: AnnotationService>(
    service: &S,
    request_id: &str,
    interval: Duration,
) -> Result<RequestStatus> {
    loop {
        let status = service
            .request_status(request_id)
            .await
            .with_context(|| format!("failed to query status of request {}", request_id))?;
        if status != RequestStatus::Pending {
            return Ok(status);
        }
        sleep(interval).await;
    }
}

fn status_message(status: RequestStatus, request_id: &str) -> String {
    match status {
        RequestStatus::Unknown => format!("Unknown request. ID: {}", request_id),
        RequestStatus::Failed => format!(
            "Processing of your request failed. Please try again. ID: {}",
            request_id
        ),
        RequestStatus::Unexpected(code) => format!(
            "Unexpected request state ({}). ID: {}",
            code, request_id
        ),
        RequestStatus::Ready | RequestStatus::Pending => {
            format!("Request {} is {:?}", request_id, status)
        }
    }
}
