use super::Store;
use crate::output::Output;
use color_eyre::eyre::{eyre, Context};
use color_eyre::Result;
use moviebite_core::Snapshot;
use std::path::{Path, PathBuf};
use tracing::info;

pub fn run_export(store: &Store, file: Option<PathBuf>, output: &Output) -> Result<()> {
    let snapshot = store.snapshot();

    match file {
        Some(path) => {
            let json = serde_json::to_string_pretty(&snapshot)?;
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .wrap_err_with(|| format!("Failed to create {}", parent.display()))?;
            }
            std::fs::write(&path, json).wrap_err_with(|| format!("Failed to write {}", path.display()))?;
            info!(operation = "export", path = %path.display(), "Exported personalization snapshot");
            output.success(format!(
                "Exported {} watch later, {} history and {} resume entries to {}",
                snapshot.watch_later.len(),
                snapshot.watch_history.len(),
                snapshot.resume_progress.len(),
                path.display()
            ));
        }
        // Always JSON on stdout so the result can be piped into `import`
        None => println!("{}", serde_json::to_string_pretty(&snapshot)?),
    }
    Ok(())
}

pub fn run_import(store: &mut Store, file: &Path, output: &Output) -> Result<()> {
    let content = std::fs::read_to_string(file)
        .wrap_err_with(|| format!("Failed to read {}", file.display()))?;
    let snapshot = Snapshot::from_json_str(&content)
        .map_err(|e| eyre!("{} is not a valid snapshot: {}", file.display(), e))?;

    if snapshot.is_empty() {
        output.warn("Snapshot contains no watch later, history or resume entries; nothing imported");
        return Ok(());
    }

    store
        .import_snapshot(snapshot)
        .wrap_err("Failed to save imported data")?;
    output.success(format!(
        "Imported {} watch later, {} history and {} resume entries",
        store.watch_later().len(),
        store.watch_history().len(),
        store.resume_progress().len()
    ));
    Ok(())
}
