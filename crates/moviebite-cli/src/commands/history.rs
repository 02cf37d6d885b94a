use super::{styled_table, Store};
use crate::output::Output;
use crate::HistoryCommands;
use chrono::Utc;
use color_eyre::eyre::Context;
use color_eyre::Result;
use moviebite_core::top_genres;
use moviebite_models::WatchHistoryEntry;
use serde_json::json;

pub fn run_history(cmd: HistoryCommands, store: &mut Store, output: &Output) -> Result<()> {
    match cmd {
        HistoryCommands::Add { id, media_type, title, poster, genres } => {
            let mut entry = WatchHistoryEntry::new(id, title.clone(), media_type, Utc::now()).with_genres(genres);
            if let Some(poster) = poster {
                entry = entry.with_poster(poster);
            }
            store
                .add_to_watch_history(entry)
                .wrap_err("Failed to save watch history")?;
            output.success(format!("Recorded {} ({} {}) in watch history", title, media_type, id));
        }
        HistoryCommands::List { limit } => {
            let history = store.watch_history();
            let shown = &history[..limit.unwrap_or(history.len()).min(history.len())];

            if !output.is_human() {
                output.json(&serde_json::to_value(shown)?);
                return Ok(());
            }
            if shown.is_empty() {
                output.info("Watch history is empty");
                return Ok(());
            }

            let mut table = styled_table(&["ID", "Type", "Title", "Watched", "Genres"]);
            for entry in shown {
                let genres: Vec<String> = entry.genres.iter().map(u32::to_string).collect();
                table.add_row(vec![
                    entry.id.to_string(),
                    entry.media_type.to_string(),
                    entry.title.clone(),
                    entry.watched_at.format("%Y-%m-%d %H:%M").to_string(),
                    genres.join(", "),
                ]);
            }
            output.println(table.to_string());
        }
        HistoryCommands::TopGenres { count } => {
            let genres = top_genres(store.watch_history(), count);
            if output.is_human() {
                if genres.is_empty() {
                    output.info("No genres recorded yet");
                } else {
                    let ids: Vec<String> = genres.iter().map(u32::to_string).collect();
                    output.info(format!("Top genres: {}", ids.join(", ")));
                }
            } else {
                output.json(&json!({ "top_genres": genres }));
            }
        }
    }
    Ok(())
}
