use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

const DEFAULT_SETTINGS_TOML: &str = include_str!("../settings.toml");

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub base_url: String,
    pub timeout: Duration,
    pub low_confidence: f64,
    pub worst_confidence_cap: f64,
    pub focus_text_height: f64,
    pub focus_visual_height: f64,
    pub focus_bottom_pad: f64,
    pub fly_duration_secs: f64,
    pub poll_interval: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            timeout: Duration::from_secs(30),
            low_confidence: 0.8,
            worst_confidence_cap: 0.95,
            focus_text_height: 50.0,
            focus_visual_height: 300.0,
            focus_bottom_pad: 100.0,
            fly_duration_secs: 0.5,
            poll_interval: Duration::from_millis(2000),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    server: Option<ServerSettings>,
    review: Option<ReviewSettings>,
    focus: Option<FocusSettings>,
    processing: Option<ProcessingSettings>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerSettings {
    base_url: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ReviewSettings {
    low_confidence: Option<f64>,
    worst_confidence_cap: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct FocusSettings {
    text_height: Option<f64>,
    visual_height: Option<f64>,
    bottom_pad: Option<f64>,
    fly_duration: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct ProcessingSettings {
    poll_interval_ms: Option<u64>,
}

pub fn load_settings(extra_path: Option<&Path>) -> Result<Settings> {
    let mut settings = Settings::default();
    let defaults = Path::new("<defaults>");
    merge_from(
        &mut settings,
        parse_settings(DEFAULT_SETTINGS_TOML, defaults)?,
        defaults,
    );
    ensure_home_settings_file()?;

    let mut ordered_paths = Vec::new();
    ordered_paths.push(PathBuf::from("settings.toml"));
    ordered_paths.push(PathBuf::from("settings.local.toml"));

    if let Some(home) = home_dir() {
        ordered_paths.push(home.join("settings.toml"));
        ordered_paths.push(home.join("settings.local.toml"));
    }

    if let Some(extra) = extra_path {
        if !extra.exists() {
            return Err(anyhow!("settings file not found: {}", extra.display()));
        }
        ordered_paths.push(extra.to_path_buf());
    }

    for path in ordered_paths {
        if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("failed to read settings: {}", path.display()))?;
            merge_from(&mut settings, parse_settings(&content, &path)?, &path);
        }
    }

    Ok(settings)
}

fn parse_settings(content: &str, path: &Path) -> Result<SettingsFile> {
    toml::from_str(content)
        .with_context(|| format!("failed to parse settings: {}", path.display()))
}

impl Settings {
    /// Applies every present value; returns the keys ignored as out of range.
    fn merge(&mut self, incoming: SettingsFile) -> Vec<&'static str> {
        let mut rejected = Vec::new();
        if let Some(server) = incoming.server {
            if let Some(url) = server.base_url {
                if url.trim().is_empty() {
                    rejected.push("server.base_url");
                } else {
                    self.base_url = url.trim().to_string();
                }
            }
            if let Some(secs) = server.timeout_secs {
                match secs {
                    0 => rejected.push("server.timeout_secs"),
                    secs => self.timeout = Duration::from_secs(secs),
                }
            }
        }
        if let Some(review) = incoming.review {
            apply(
                &mut self.low_confidence,
                review.low_confidence,
                |value| (0.0..=1.0).contains(&value),
                "review.low_confidence",
                &mut rejected,
            );
            apply(
                &mut self.worst_confidence_cap,
                review.worst_confidence_cap,
                |value| (0.0..1.0).contains(&value),
                "review.worst_confidence_cap",
                &mut rejected,
            );
        }
        if let Some(focus) = incoming.focus {
            apply(
                &mut self.focus_text_height,
                focus.text_height,
                |value| value > 0.0,
                "focus.text_height",
                &mut rejected,
            );
            apply(
                &mut self.focus_visual_height,
                focus.visual_height,
                |value| value > 0.0,
                "focus.visual_height",
                &mut rejected,
            );
            apply(
                &mut self.focus_bottom_pad,
                focus.bottom_pad,
                |value| value >= 0.0,
                "focus.bottom_pad",
                &mut rejected,
            );
            apply(
                &mut self.fly_duration_secs,
                focus.fly_duration,
                |value| value >= 0.0,
                "focus.fly_duration",
                &mut rejected,
            );
        }
        if let Some(processing) = incoming.processing {
            match processing.poll_interval_ms {
                Some(0) => rejected.push("processing.poll_interval_ms"),
                Some(ms) => self.poll_interval = Duration::from_millis(ms),
                None => {}
            }
        }
        rejected
    }
}

fn apply(
    target: &mut f64,
    value: Option<f64>,
    valid: impl Fn(f64) -> bool,
    key: &'static str,
    rejected: &mut Vec<&'static str>,
) {
    match value {
        Some(value) if valid(value) => *target = value,
        Some(_) => rejected.push(key),
        None => {}
    }
}

fn merge_from(settings: &mut Settings, incoming: SettingsFile, path: &Path) {
    for key in settings.merge(incoming) {
        warn!("{}: ignoring out-of-range setting {}", path.display(), key);
    }
}

fn ensure_home_settings_file() -> Result<()> {
    let Some(home) = home_dir() else {
        return Ok(());
    };
    fs::create_dir_all(&home)
        .with_context(|| format!("failed to create settings directory: {}", home.display()))?;
    let path = home.join("settings.toml");
    if !path.exists() {
        fs::write(&path, DEFAULT_SETTINGS_TOML)
            .with_context(|| format!("failed to write settings: {}", path.display()))?;
    }
    Ok(())
}

fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME").ok().and_then(|home| {
        let home = home.trim();
        if home.is_empty() {
            None
        } else {
            Some(Path::new(home).join(".ocr-line-editor"))
        }
    })
}
