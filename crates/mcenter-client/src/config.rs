use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

use crate::error::ClientError;
use crate::ClientResult;

pub const DEFAULT_SCRIPT_URL: &str = "https://script.google.com/macros/s/mcenter-production/exec";
pub const DEFAULT_SHEETS_ID: &str = "mcenter-diagnosis-sheet";
pub const DEFAULT_BASE_URL: &str = "https://m-center.co.kr";
pub const DEFAULT_BACKUP_DIR: &str = ".mcenter_backup";
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

const GEMINI_KEY_PREFIX: &str = "AIza";
const GEMINI_KEY_LEN: usize = 39;

/// Runtime settings, read from the same variables the web front end uses.
#[derive(Debug, Clone, Serialize)]
pub struct AppConfig {
    pub script_url: String,
    pub sheets_id: String,
    pub base_url: String,
    #[serde(skip_serializing)]
    pub gemini_api_key: Option<String>,
    pub backup_dir: PathBuf,
    #[serde(with = "secs")]
    pub timeout: Duration,
}

mod secs {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            script_url: DEFAULT_SCRIPT_URL.into(),
            sheets_id: DEFAULT_SHEETS_ID.into(),
            base_url: DEFAULT_BASE_URL.into(),
            gemini_api_key: None,
            backup_dir: PathBuf::from(DEFAULT_BACKUP_DIR),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> ClientResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Bare names win over their
    /// `NEXT_PUBLIC_` counterparts; anything unset falls back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ClientResult<Self> {
        let get = |name: &str| {
            lookup(name)
                .or_else(|| lookup(&format!("NEXT_PUBLIC_{name}")))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut cfg = AppConfig::default();
        if let Some(url) = get("GOOGLE_SCRIPT_URL") {
            cfg.script_url = url;
        }
        if let Some(id) = get("GOOGLE_SHEETS_ID") {
            cfg.sheets_id = id;
        }
        if let Some(url) = get("BASE_URL") {
            cfg.base_url = url;
        }
        if let Some(dir) = lookup("MCENTER_BACKUP_DIR").filter(|v| !v.trim().is_empty()) {
            cfg.backup_dir = PathBuf::from(dir);
        }
        if let Some(raw) = lookup("MCENTER_HTTP_TIMEOUT_SECS") {
            let secs: u64 = raw.trim().parse().map_err(|_| ClientError::Config {
                key: "MCENTER_HTTP_TIMEOUT_SECS".into(),
                reason: format!("not a whole number of seconds: {raw}"),
            })?;
            cfg.timeout = Duration::from_secs(secs.max(1));
        }
        cfg.gemini_api_key = lookup("GEMINI_API_KEY").and_then(|key| {
            if validate_gemini_key(&key) {
                Some(key.trim().to_string())
            } else {
                warn!("GEMINI_API_KEY is set but malformed; ignoring it");
                None
            }
        });

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> ClientResult<()> {
        check_url("GOOGLE_SCRIPT_URL", &self.script_url)?;
        check_url("BASE_URL", &self.base_url)?;
        if self.script_url.starts_with("http://") {
            warn!(url = %self.script_url, "script endpoint is not using https");
        }
        Ok(())
    }
}

fn check_url(key: &str, url: &str) -> ClientResult<()> {
    if url.starts_with("https://") || url.starts_with("http://") {
        Ok(())
    } else {
        Err(ClientError::Config {
            key: key.into(),
            reason: format!("expected an http(s) URL, got '{url}'"),
        })
    }
}

/// A Google API key: `AIza` followed by 35 URL-safe characters.
pub fn validate_gemini_key(key: &str) -> bool {
    let key = key.trim();
    key.len() == GEMINI_KEY_LEN
        && key.starts_with(GEMINI_KEY_PREFIX)
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
