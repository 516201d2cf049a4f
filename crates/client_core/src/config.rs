use std::{collections::HashMap, fs, path::Path};

use anyhow::{bail, Context};
use url::Url;

use crate::file_ingest::MAX_UPLOAD_BYTES;

pub const SETTINGS_FILE: &str = "admin.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub api_base_url: String,
    pub api_token: Option<String>,
    pub page_size: u32,
    pub file_page_size: u32,
    pub max_upload_bytes: u64,
    pub request_timeout_secs: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:8080/api".into(),
            api_token: None,
            page_size: 10,
            file_page_size: 10,
            max_upload_bytes: MAX_UPLOAD_BYTES,
            request_timeout_secs: 30,
        }
    }
}

pub fn load_settings() -> ClientSettings {
    load_settings_from(Path::new(SETTINGS_FILE), |key| std::env::var(key).ok())
}

/// Defaults, then `file` (if readable), then environment variables looked up
/// through `env`. Values that fail to parse are skipped.
pub fn load_settings_from<F>(file: &Path, env: F) -> ClientSettings
where
    F: Fn(&str) -> Option<String>,
{
    let mut settings = ClientSettings::default();

    if let Ok(raw) = fs::read_to_string(file) {
        match toml::from_str::<HashMap<String, toml::Value>>(&raw) {
            Ok(file_cfg) => {
                let get = |key: &str| file_cfg.get(key).and_then(toml_scalar);
                apply(&mut settings, "api_base_url", get("api_base_url"));
                apply(&mut settings, "api_token", get("api_token"));
                apply(&mut settings, "page_size", get("page_size"));
                apply(&mut settings, "file_page_size", get("file_page_size"));
                apply(&mut settings, "max_upload_bytes", get("max_upload_bytes"));
                apply(&mut settings, "request_timeout_secs", get("request_timeout_secs"));
            }
            Err(err) => {
                tracing::warn!(path = %file.display(), error = %err, "ignoring unreadable settings file");
            }
        }
    }

    apply(&mut settings, "api_base_url", env("ADMIN_API_URL"));
    apply(&mut settings, "api_base_url", env("APP__API_BASE_URL"));
    apply(&mut settings, "api_token", env("ADMIN_API_TOKEN"));
    apply(&mut settings, "api_token", env("APP__API_TOKEN"));
    apply(&mut settings, "page_size", env("APP__PAGE_SIZE"));
    apply(&mut settings, "file_page_size", env("APP__FILE_PAGE_SIZE"));
    apply(&mut settings, "max_upload_bytes", env("APP__MAX_UPLOAD_BYTES"));
    apply(&mut settings, "request_timeout_secs", env("APP__REQUEST_TIMEOUT_SECS"));

    settings
}

fn toml_scalar(value: &toml::Value) -> Option<String> {
    match value {
        toml::Value::String(s) => Some(s.clone()),
        toml::Value::Integer(i) => Some(i.to_string()),
        _ => None,
    }
}

fn apply(settings: &mut ClientSettings, key: &str, value: Option<String>) {
    let Some(value) = value else {
        return;
    };
    let value = value.trim();
    match key {
        "api_base_url" => settings.api_base_url = value.to_string(),
        "api_token" => {
            settings.api_token = (!value.is_empty()).then(|| value.to_string());
        }
        "page_size" => {
            if let Some(parsed) = value.parse::<u32>().ok().filter(|v| *v > 0) {
                settings.page_size = parsed;
            }
        }
        "file_page_size" => {
            if let Some(parsed) = value.parse::<u32>().ok().filter(|v| *v > 0) {
                settings.file_page_size = parsed;
            }
        }
        "max_upload_bytes" => {
            if let Ok(parsed) = value.parse::<u64>() {
                settings.max_upload_bytes = parsed;
            }
        }
        "request_timeout_secs" => {
            if let Ok(parsed) = value.parse::<u64>() {
                settings.request_timeout_secs = parsed;
            }
        }
        _ => {}
    }
}

/// Parses the API base URL, accepting only http(s), and drops trailing slashes so
/// paths can be appended with a single `/`.
pub fn validate_base_url(raw: &str) -> anyhow::Result<String> {
    let parsed = Url::parse(raw.trim())
        .with_context(|| format!("invalid API base url '{raw}'"))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        bail!("API base url must be http or https, got '{}'", parsed.scheme());
    }
    Ok(parsed.as_str().trim_end_matches('/').to_string())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
