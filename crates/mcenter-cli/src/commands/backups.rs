use clap::{Args, Subcommand};
use serde_json::{json, Value};
use std::path::PathBuf;
use tracing::warn;

use super::ClientOpts;

#[derive(Args)]
pub struct BackupsArgs {
    #[command(subcommand)]
    pub action: BackupsAction,
}

#[derive(Subcommand)]
pub enum BackupsAction {
    /// List payloads waiting to be re-sent
    List,
    /// Re-send one backup, or every backup with --all
    Resend {
        /// Backup file to re-send
        path: Option<PathBuf>,

        #[arg(long, conflicts_with = "path")]
        all: bool,
    },
}

pub fn run_backups(
    args: BackupsArgs,
    opts: &ClientOpts,
) -> Result<Value, Box<dyn std::error::Error>> {
    match args.action {
        BackupsAction::List => list(opts),
        BackupsAction::Resend { path, all } => resend(opts, path, all),
    }
}

fn list(opts: &ClientOpts) -> Result<Value, Box<dyn std::error::Error>> {
    let cfg = opts.config()?;
    let store = mcenter_client::BackupStore::new(cfg.backup_dir);
    let rows: Vec<Value> = store
        .list()?
        .into_iter()
        .map(|(path, entry)| {
            json!({
                "file": path.display().to_string(),
                "type": entry.kind,
                "action": entry.action,
                "saved_at": entry.saved_at.to_rfc3339(),
                "reason": entry.reason,
            })
        })
        .collect();
    Ok(Value::Array(rows))
}

fn resend(
    opts: &ClientOpts,
    path: Option<PathBuf>,
    all: bool,
) -> Result<Value, Box<dyn std::error::Error>> {
    let (client, store) = opts.connect()?;
    let targets: Vec<PathBuf> = match (path, all) {
        (Some(path), _) => vec![path],
        (None, true) => store.list()?.into_iter().map(|(p, _)| p).collect(),
        (None, false) => return Err("give a backup file or --all".into()),
    };

    let mut rows = Vec::with_capacity(targets.len());
    for target in targets {
        let file = target.display().to_string();
        match client.resend_backup(&store, &target) {
            Ok(_) => rows.push(json!({ "file": file, "resent": true, "error": null })),
            Err(e) => {
                warn!(file = %file, error = %e, "resend failed; backup kept");
                rows.push(json!({ "file": file, "resent": false, "error": e.to_string() }));
            }
        }
    }
    Ok(Value::Array(rows))
}
