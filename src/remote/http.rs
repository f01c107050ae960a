use anyhow::{Context, Result, anyhow};
use reqwest::{Client, Response};
use std::time::Duration;
use tracing::debug;

use super::models::{
    DeleteFlagRequest, SaveLineRequest, TrainingFlagRequest, UploadRequest, UploadResponse,
};
use super::{AnnotationService, EncodedImage, LinesPage, RequestStatus, ServiceFuture};

pub(crate) const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Annotation service reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpService {
    client: Client,
    base_url: String,
}

impl HttpService {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let base_url = base_url.into().trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(anyhow!("annotation service base url is empty"));
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .with_context(|| "failed to build http client")?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

async fn ensure_success(response: Response, action: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(anyhow!(
        "annotation service error while {} ({}): {}",
        action,
        status,
        body.trim()
    ))
}

fn flag(value: bool) -> u8 {
    u8::from(value)
}

impl AnnotationService for HttpService {
    fn fetch_lines(&self, image_id: &str) -> ServiceFuture<LinesPage> {
        let client = self.client.clone();
        let url = self.url(&format!("/get_lines/{}", image_id));
        Box::pin(async move {
            debug!("fetching lines from {}", url);
            let response = client.get(&url).send().await?;
            let response = ensure_success(response, "fetching lines").await?;
            response
                .json::<LinesPage>()
                .await
                .with_context(|| "failed to decode lines response")
        })
    }

    fn fetch_image(&self, image_id: &str) -> ServiceFuture<Vec<u8>> {
        let client = self.client.clone();
        let url = self.image_url(image_id);
        Box::pin(async move {
            let response = client.get(&url).send().await?;
            let response = ensure_success(response, "fetching image").await?;
            Ok(response.bytes().await?.to_vec())
        })
    }

    fn image_url(&self, image_id: &str) -> String {
        self.url(&format!("/get_image/{}", image_id))
    }

    fn set_training_flag(&self, line_id: &str, included: bool) -> ServiceFuture<()> {
        let client = self.client.clone();
        let training_flag = flag(included);
        let url = self.url(&format!("/ocr/training_line/{}/{}", line_id, training_flag));
        let line_id = line_id.to_string();
        Box::pin(async move {
            let body = TrainingFlagRequest {
                line_id: &line_id,
                training_flag,
            };
            let response = client.post(&url).json(&body).send().await?;
            ensure_success(response, "setting training flag").await?;
            Ok(())
        })
    }

    fn set_delete_flag(&self, line_id: &str, deleted: bool) -> ServiceFuture<()> {
        let client = self.client.clone();
        let delete_flag = flag(deleted);
        let url = self.url(&format!("/ocr/delete_line/{}/{}", line_id, delete_flag));
        let line_id = line_id.to_string();
        Box::pin(async move {
            let body = DeleteFlagRequest {
                line_id: &line_id,
                delete_flag,
            };
            let response = client.post(&url).json(&body).send().await?;
            ensure_success(response, "setting delete flag").await?;
            Ok(())
        })
    }

    fn save_line_text(&self, line_id: &str, text: &str) -> ServiceFuture<()> {
        let client = self.client.clone();
        let url = self.url(&format!("/ocr/save_line/{}", line_id));
        let text = text.to_string();
        Box::pin(async move {
            let body = SaveLineRequest { text: &text };
            let response = client.post(&url).json(&body).send().await?;
            ensure_success(response, "saving line text").await?;
            Ok(())
        })
    }

    fn compute_scores(&self, document_id: &str) -> ServiceFuture<()> {
        let client = self.client.clone();
        let url = self.url(&format!("/document/compute_scores/{}", document_id));
        Box::pin(async move {
            let response = client.get(&url).send().await?;
            ensure_success(response, "computing scores").await?;
            Ok(())
        })
    }

    fn upload_image(&self, image: &EncodedImage) -> ServiceFuture<String> {
        let client = self.client.clone();
        let url = self.url("/upload_image");
        let data_url = image.data_url();
        Box::pin(async move {
            let body = UploadRequest { image: &data_url };
            let response = client
                .post(&url)
                .header("accept", "application/json")
                .json(&body)
                .send()
                .await?;
            let response = ensure_success(response, "uploading image").await?;
            let parsed = response
                .json::<UploadResponse>()
                .await
                .with_context(|| "failed to decode upload response")?;
            Ok(parsed.request_id)
        })
    }

    fn request_status(&self, request_id: &str) -> ServiceFuture<RequestStatus> {
        let client = self.client.clone();
        let url = self.url(&format!("/get_status/{}", request_id));
        Box::pin(async move {
            let response = client.get(&url).send().await?;
            Ok(RequestStatus::from_code(response.status().as_u16()))
        })
    }
}
