use anyhow::{Context, Result, anyhow};
use std::fs;
use std::path::Path;

mod console;
pub mod editor;
pub mod flow;
pub mod geometry;
pub mod line;
pub mod logging;
pub mod remote;
pub mod session;
pub mod settings;
pub mod style;
#[cfg(test)]
mod test_util;

pub use editor::{Advance, EditorHost, EditorOptions, LineEditor, LoadOutcome};
pub use remote::{AnnotationService, EncodedImage, HttpService, RequestStatus};
pub use session::{RequestResult, Session};

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub server: Option<String>,
    pub settings_path: Option<String>,
    pub upload: Option<String>,
    pub image: Option<String>,
    pub focus_line: Option<String>,
    pub scores: Option<String>,
    pub status: Option<String>,
    pub assume_yes: bool,
}

/// One line the review walk stopped on.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewEntry {
    pub row: usize,
    pub line_id: String,
    pub confidence: f64,
    pub text: String,
}

pub async fn run(config: Config) -> Result<String> {
    let settings_path = config.settings_path.as_deref().map(Path::new);
    let settings = settings::load_settings(settings_path)?;
    let base_url = config
        .server
        .clone()
        .unwrap_or_else(|| settings.base_url.clone());
    let service = HttpService::with_timeout(base_url, settings.timeout)?;

    if let Some(request_id) = config.status.as_deref() {
        let status = service.request_status(request_id).await?;
        return Ok(format!("{}\t{:?}", request_id, status));
    }
    if let Some(document_id) = config.scores.as_deref() {
        service
            .compute_scores(document_id)
            .await
            .with_context(|| format!("failed to compute scores for {}", document_id))?;
        return Ok(format!("scores computed for document {}", document_id));
    }

    let mut editor = LineEditor::new(
        service,
        console::host(config.assume_yes),
        EditorOptions::from_settings(&settings),
    );

    if let Some(path) = config.upload.as_deref() {
        let bytes = fs::read(path).with_context(|| format!("failed to read image: {}", path))?;
        let image = EncodedImage::from_bytes(bytes)?;
        let mut session = Session::new();
        session.submit(&mut editor, &image).await?;
        match session
            .check_request(&mut editor, settings.poll_interval)
            .await?
        {
            RequestResult::Loaded(_) => {}
            RequestResult::Abandoned(status) => {
                return Err(anyhow!("request ended without result: {:?}", status));
            }
        }
    } else if let Some(image_id) = config.image.as_deref() {
        let outcome = editor.load(image_id, config.focus_line.as_deref()).await?;
        if let LoadOutcome::Stale { image_id } = outcome {
            return Err(anyhow!("server answered for a different image: {}", image_id));
        }
    } else {
        return Err(anyhow!(
            "nothing to do: pass --upload, --image, --status or --scores"
        ));
    }

    let entries = review_queue(&mut editor);
    Ok(format_review(&editor, &entries))
}

/// Walks every low-confidence line of the loaded image in order.
pub fn review_queue<S: AnnotationService>(editor: &mut LineEditor<S>) -> Vec<ReviewEntry> {
    let mut entries = Vec::new();
    while let Advance::Focused(line_id) = editor.advance_to_low_confidence() {
        if let Some(line) = editor.line(&line_id) {
            entries.push(ReviewEntry {
                row: line.row,
                line_id,
                confidence: line.line_confidence(),
                text: line.text.clone(),
            });
        }
    }
    entries
}

fn format_review<S: AnnotationService>(editor: &LineEditor<S>, entries: &[ReviewEntry]) -> String {
    let mut lines = Vec::new();
    if let Some(image) = editor.image() {
        lines.push(format!(
            "image {}: {} lines, worst confidence {:.3}, {} to review",
            image.image_id,
            editor.lines().len(),
            editor.worst_confidence(),
            entries.len()
        ));
    }
    for entry in entries {
        lines.push(format!(
            "{}\t{}\t{:.3}\t{}",
            entry.row, entry.line_id, entry.confidence, entry.text
        ));
    }
    lines.join("\n")
}
