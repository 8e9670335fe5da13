use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use serde::Deserialize;

pub const DEFAULT_NOTIFY_TO: &str = "owner@example.com";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server_bind: String,
    pub database_url: Option<String>,
    pub database_service_key: Option<String>,
    pub email_api_key: Option<String>,
    pub email_api_url: String,
    pub email_from: String,
    pub notify_to: String,
    pub sink_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "127.0.0.1:3000".into(),
            database_url: None,
            database_service_key: None,
            email_api_key: None,
            email_api_url: mailer::DEFAULT_API_URL.into(),
            email_from: mailer::DEFAULT_FROM.into(),
            notify_to: DEFAULT_NOTIFY_TO.into(),
            sink_timeout_secs: intake::DEFAULT_SINK_TIMEOUT.as_secs(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileSettings {
    bind_addr: Option<String>,
    database_url: Option<String>,
    database_service_key: Option<String>,
    email_api_key: Option<String>,
    email_api_url: Option<String>,
    email_from: Option<String>,
    notify_to: Option<String>,
    sink_timeout_secs: Option<u64>,
}

/// Where validated submissions are persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreTarget {
    Sqlite(String),
    Rest { url: String, service_key: String },
}

/// Defaults, then `server.toml`, then the process environment.
pub fn load_settings() -> Settings {
    let file = fs::read_to_string("server.toml").ok();
    load_settings_from(file.as_deref(), |key| std::env::var(key).ok())
}

pub fn load_settings_from(
    file_contents: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> Settings {
    let mut settings = Settings::default();

    if let Some(raw) = file_contents {
        match toml::from_str::<FileSettings>(raw) {
            Ok(file_cfg) => apply_file(&mut settings, file_cfg),
            Err(error) => tracing::warn!(%error, "ignoring unreadable server.toml"),
        }
    }

    // Empty variables count as unset; later names win.
    let env = |key: &str| env(key).filter(|v| !v.trim().is_empty());

    if let Some(v) = env("SERVER_BIND") {
        settings.server_bind = v;
    }
    if let Some(v) = env("APP__BIND_ADDR") {
        settings.server_bind = v;
    }

    for key in ["NEXT_PUBLIC_SUPABASE_URL", "SUPABASE_URL", "DATABASE_URL"] {
        if let Some(v) = env(key) {
            settings.database_url = Some(v);
        }
    }
    if let Some(v) = env("SUPABASE_SERVICE_ROLE_KEY") {
        settings.database_service_key = Some(v);
    }

    if let Some(v) = env("RESEND_API_KEY") {
        settings.email_api_key = Some(v);
    }
    if let Some(v) = env("RESEND_API_URL") {
        settings.email_api_url = v;
    }
    if let Some(v) = env("RESEND_FROM_EMAIL") {
        settings.email_from = v;
    }
    if let Some(v) = env("NOTIFY_TO") {
        settings.notify_to = v;
    }

    if let Some(v) = env("SINK_TIMEOUT_SECS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.sink_timeout_secs = parsed;
        }
    }

    settings
}

fn apply_file(settings: &mut Settings, file_cfg: FileSettings) {
    let non_empty = |v: Option<String>| v.filter(|v| !v.trim().is_empty());

    if let Some(v) = non_empty(file_cfg.bind_addr) {
        settings.server_bind = v;
    }
    if let Some(v) = non_empty(file_cfg.database_url) {
        settings.database_url = Some(v);
    }
    if let Some(v) = non_empty(file_cfg.database_service_key) {
        settings.database_service_key = Some(v);
    }
    if let Some(v) = non_empty(file_cfg.email_api_key) {
        settings.email_api_key = Some(v);
    }
    if let Some(v) = non_empty(file_cfg.email_api_url) {
        settings.email_api_url = v;
    }
    if let Some(v) = non_empty(file_cfg.email_from) {
        settings.email_from = v;
    }
    if let Some(v) = non_empty(file_cfg.notify_to) {
        settings.notify_to = v;
    }
    if let Some(v) = file_cfg.sink_timeout_secs {
        settings.sink_timeout_secs = v;
    }
}

/// Resolves the configured store, if any.
///
/// An http(s) url needs a service key; without one the store stays disabled.
pub fn store_target(settings: &Settings) -> anyhow::Result<Option<StoreTarget>> {
    let Some(raw) = settings.database_url.as_deref() else {
        return Ok(None);
    };
    let raw = raw.trim();

    if raw.starts_with("http://") || raw.starts_with("https://") {
        return Ok(match settings.database_service_key.as_deref() {
            Some(key) => Some(StoreTarget::Rest {
                url: raw.to_string(),
                service_key: key.to_string(),
            }),
            None => {
                tracing::warn!(
                    url = raw,
                    "database url set without a service key; persistence disabled"
                );
                None
            }
        });
    }

    Ok(Some(StoreTarget::Sqlite(prepare_database_url(raw)?)))
}

pub fn prepare_database_url(raw_database_url: &str) -> anyhow::Result<String> {
    let database_url = normalize_database_url(raw_database_url);
    ensure_parent_dir_exists(&database_url)?;
    Ok(database_url)
}

fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.starts_with("sqlite::memory:")
        || raw_database_url.starts_with("sqlite://")
        || raw_database_url.contains("://")
    {
        return raw_database_url.to_string();
    }

    if let Some(path) = raw_database_url.strip_prefix("sqlite:") {
        let path = path.replace('\\', "/");
        return format!("sqlite://{path}");
    }

    format!("sqlite://{}", raw_database_url.replace('\\', "/"))
}

fn ensure_parent_dir_exists(database_url: &str) -> anyhow::Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url.starts_with("sqlite::memory:") || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
