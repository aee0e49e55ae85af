pub mod backups;
pub mod diagnosis;
pub mod investment;
pub mod submit;
pub mod tax;

use clap::Args;
use mcenter_client::{AppConfig, BackupStore, ScriptClient};
use serde_json::{json, Value};
use std::path::PathBuf;

/// Connection settings shared by the submission commands
#[derive(Args, Debug, Clone, Default)]
pub struct ClientOpts {
    /// Apps Script web app URL
    #[arg(long, env = "GOOGLE_SCRIPT_URL", global = true)]
    pub script_url: Option<String>,

    /// Directory for payloads that could not be delivered
    #[arg(long, env = "MCENTER_BACKUP_DIR", global = true)]
    pub backup_dir: Option<PathBuf>,
}

impl ClientOpts {
    /// Environment configuration with command-line overrides applied.
    pub fn config(&self) -> Result<AppConfig, Box<dyn std::error::Error>> {
        let mut cfg = AppConfig::from_env()?;
        if let Some(url) = &self.script_url {
            cfg.script_url = url.clone();
        }
        if let Some(dir) = &self.backup_dir {
            cfg.backup_dir = dir.clone();
        }
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn connect(&self) -> Result<(ScriptClient, BackupStore), Box<dyn std::error::Error>> {
        let cfg = self.config()?;
        let client = ScriptClient::from_config(&cfg)?;
        Ok((client, BackupStore::new(cfg.backup_dir)))
    }
}

pub fn run_config(opts: &ClientOpts) -> Result<Value, Box<dyn std::error::Error>> {
    let cfg = opts.config()?;
    let mut value = serde_json::to_value(&cfg)?;
    if let Value::Object(map) = &mut value {
        map.insert(
            "gemini_api_key_configured".into(),
            json!(cfg.gemini_api_key.is_some()),
        );
    }
    Ok(value)
}
