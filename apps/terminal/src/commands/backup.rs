//! # Backup Commands
//!
//! `:export` writes the whole store to a JSON file; `:import` restores one.
//!
//! ```text
//! :export ──► backup::export(store) ──► <backup dir>/pdv-backup-20240307-140500.json
//! :import f ─► read f ──► backup::restore_json(store) ──► session.reload()
//!                              │
//!                     invalid document: nothing written
//! ```

use std::path::{Path, PathBuf};

use chrono::Local;
use pdv_core::backup::{self, RestoreReport};
use pdv_core::CollectionStore;
use tracing::info;

use crate::error::CommandError;
use crate::state::Session;

/// Exports to `path`, or to a timestamped file in the backup directory.
pub async fn export<S: CollectionStore>(
    session: &Session<S>,
    path: Option<PathBuf>,
) -> Result<String, CommandError> {
    let path = match path {
        Some(path) => path,
        None => {
            let dir = session
                .config()
                .backup_dir()
                .map_err(|e| CommandError::usage(e.to_string()))?;
            dir.join(default_file_name())
        }
    };

    let document = backup::export(session.store().as_ref()).await?;
    let json = document.to_json()?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| CommandError::io(parent, e))?;
    }
    tokio::fs::write(&path, json)
        .await
        .map_err(|e| CommandError::io(&path, e))?;

    info!(path = %path.display(), "Backup written");
    Ok(format!(
        "Backup salvo em {} ({} produtos, {} vendas, {} clientes)",
        path.display(),
        document.products.as_ref().map_or(0, Vec::len),
        document.sales.as_ref().map_or(0, Vec::len),
        document.customers.len()
    ))
}

/// Restores the backup at `path` and reloads the session.
pub async fn import<S: CollectionStore>(
    session: &mut Session<S>,
    path: &Path,
) -> Result<String, CommandError> {
    let json = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| CommandError::io(path, e))?;

    let report = backup::restore_json(session.store().as_ref(), &json).await?;
    session.reload().await?;

    info!(path = %path.display(), "Backup imported");
    Ok(describe(&report))
}

fn default_file_name() -> String {
    format!("pdv-backup-{}.json", Local::now().format("%Y%m%d-%H%M%S"))
}

fn describe(report: &RestoreReport) -> String {
    let mut parts = vec![
        format!("{} usuários", report.users),
        format!("{} clientes", report.customers),
    ];
    if let Some(n) = report.products {
        parts.push(format!("{} produtos", n));
    }
    if let Some(n) = report.sales {
        parts.push(format!("{} vendas", n));
    }
    if let Some(n) = report.groups {
        parts.push(format!("{} grupos", n));
    }
    format!("Backup restaurado: {}", parts.join(", "))
}
