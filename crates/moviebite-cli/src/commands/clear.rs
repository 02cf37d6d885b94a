use super::Store;
use crate::output::Output;
use color_eyre::eyre::Context;
use color_eyre::Result;
use dialoguer::Confirm;

pub fn run_clear(store: &mut Store, yes: bool, output: &Output) -> Result<()> {
    if store.snapshot().is_empty() {
        output.info("Nothing to clear");
        return Ok(());
    }

    if !yes {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Delete {} watch later, {} history and {} resume entries?",
                store.watch_later().len(),
                store.watch_history().len(),
                store.resume_progress().len()
            ))
            .default(false)
            .interact()
            .wrap_err("Failed to read confirmation")?;
        if !confirmed {
            output.info("Clear cancelled");
            return Ok(());
        }
    }

    store.clear_all().wrap_err("Failed to clear stored data")?;
    output.success("Cleared watch later, watch history and resume progress");
    Ok(())
}
