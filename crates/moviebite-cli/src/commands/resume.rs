use super::{styled_table, Store};
use crate::output::Output;
use crate::ResumeCommands;
use color_eyre::eyre::Context;
use color_eyre::Result;
use moviebite_config::ResumeConfig;
use moviebite_core::{continue_watching, format_resume_time, ResumePrompt, ResumeWrite};
use serde_json::json;

pub fn run_resume(cmd: ResumeCommands, store: &mut Store, config: &ResumeConfig, output: &Output) -> Result<()> {
    match cmd {
        ResumeCommands::Save { locator, timestamp, duration } => {
            let write = store
                .save_resume_progress(&locator, timestamp, duration)
                .wrap_err("Failed to save resume progress")?;
            match write {
                ResumeWrite::Saved => output.success(format!(
                    "Saved {} at {}",
                    locator,
                    format_resume_time(timestamp)
                )),
                ResumeWrite::Stale => output.warn(format!("Newer progress already stored for {}", locator)),
                ResumeWrite::Invalid => output.error("Timestamp and duration must be non-negative numbers"),
            }
        }
        ResumeCommands::Get { locator } => {
            let point = store.get_resume_progress(&locator);
            if !output.is_human() {
                output.json(&json!({ "locator": locator, "progress": point }));
                return Ok(());
            }
            match point {
                None => output.info(format!("No resume point for {}", locator)),
                Some(point) => match ResumePrompt::from_point(&point, config.min_visible_seconds) {
                    Some(prompt) => {
                        let percent = prompt
                            .percent_complete
                            .map(|p| format!(" ({:.0}%)", p))
                            .unwrap_or_default();
                        output.info(format!("{}: {}{}", locator, prompt.label, percent));
                    }
                    None => output.info(format!(
                        "{}: {:.0}s stored, below the {:.0}s resume threshold",
                        locator, point.timestamp_seconds, config.min_visible_seconds
                    )),
                },
            }
        }
        ResumeCommands::List { all } => {
            let threshold = if all { 0.0 } else { config.min_visible_seconds };
            let rows = continue_watching(store.resume_progress(), threshold);

            if !output.is_human() {
                let items: Vec<serde_json::Value> = rows
                    .iter()
                    .map(|(key, progress, prompt)| {
                        json!({
                            "locator": key,
                            "timestamp": progress.timestamp_seconds,
                            "duration": progress.duration_seconds,
                            "lastWatched": progress.last_watched_at,
                            "percent_complete": prompt.percent_complete,
                        })
                    })
                    .collect();
                output.json(&serde_json::Value::Array(items));
                return Ok(());
            }
            if rows.is_empty() {
                output.info("Nothing to continue watching");
                return Ok(());
            }

            let mut table = styled_table(&["Locator", "Position", "Progress", "Last watched"]);
            for (key, progress, prompt) in &rows {
                table.add_row(vec![
                    key.clone(),
                    format_resume_time(progress.timestamp_seconds),
                    prompt
                        .percent_complete
                        .map(|p| format!("{:.0}%", p))
                        .unwrap_or_else(|| "-".to_string()),
                    progress.last_watched_at.format("%Y-%m-%d %H:%M").to_string(),
                ]);
            }
            output.println(table.to_string());
        }
        ResumeCommands::Clear { locator } => {
            let cleared = store
                .clear_resume_progress(&locator)
                .wrap_err("Failed to save resume progress")?;
            if cleared {
                output.success(format!("Cleared resume point for {}", locator));
            } else {
                output.info(format!("No resume point for {}", locator));
            }
        }
    }
    Ok(())
}
