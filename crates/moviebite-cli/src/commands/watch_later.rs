use super::{styled_table, Store};
use crate::output::Output;
use crate::WatchLaterCommands;
use color_eyre::eyre::Context;
use color_eyre::Result;
use moviebite_models::MediaRef;
use serde_json::json;

pub fn run_watch_later(cmd: WatchLaterCommands, store: &mut Store, output: &Output) -> Result<()> {
    match cmd {
        WatchLaterCommands::Add { id, media_type, title, poster } => {
            let mut item = MediaRef::new(id, title.clone());
            if let Some(poster) = poster {
                item = item.with_poster(poster);
            }
            let added = store
                .add_to_watch_later(item, media_type)
                .wrap_err("Failed to save watch later list")?;
            if added {
                output.success(format!("Added {} ({} {}) to watch later", title, media_type, id));
            } else {
                output.info(format!("{} ({} {}) is already in watch later", title, media_type, id));
            }
        }
        WatchLaterCommands::Remove { id, media_type } => {
            let removed = store
                .remove_from_watch_later(id, media_type)
                .wrap_err("Failed to save watch later list")?;
            if removed > 0 {
                output.success(format!("Removed {} entr{} for id {}", removed, if removed == 1 { "y" } else { "ies" }, id));
            } else {
                output.info(format!("Nothing in watch later with id {}", id));
            }
        }
        WatchLaterCommands::Check { id, media_type } => {
            let present = store.is_in_watch_later(id, media_type);
            if output.is_human() {
                output.info(if present { "yes" } else { "no" });
            } else {
                output.json(&json!({ "id": id, "media_type": media_type, "in_watch_later": present }));
            }
        }
        WatchLaterCommands::List => {
            let entries = store.watch_later();
            if !output.is_human() {
                output.json(&serde_json::to_value(entries)?);
                return Ok(());
            }
            if entries.is_empty() {
                output.info("Watch later is empty");
                return Ok(());
            }

            let mut table = styled_table(&["ID", "Type", "Title", "Added"]);
            for entry in entries {
                table.add_row(vec![
                    entry.id.to_string(),
                    entry.media_type.to_string(),
                    entry.title.clone(),
                    entry.added_at.format("%Y-%m-%d %H:%M").to_string(),
                ]);
            }
            output.println(table.to_string());
            output.info(format!("{} item{} saved", entries.len(), if entries.len() == 1 { "" } else { "s" }));
        }
    }
    Ok(())
}
