use crate::output::Output;
use crate::ConfigCommands;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use comfy_table::{Cell, Table};
use moviebite_config::{Config, WriteFailurePolicy};
use std::path::Path;

pub fn run_config(cmd: ConfigCommands, config: &Config, config_path: &Path, output: &Output) -> Result<()> {
    match cmd {
        ConfigCommands::Show => show_config(config, config_path, output),
        ConfigCommands::Init { force } => {
            if config_path.exists() && !force {
                output.warn(format!(
                    "Config file already exists at {} (use --force to overwrite)",
                    config_path.display()
                ));
                return Ok(());
            }
            Config::default()
                .save_to_file(config_path)
                .map_err(|e| eyre!("Failed to write config to {}: {}", config_path.display(), e))?;
            output.success(format!("Wrote default config to {}", config_path.display()));
            Ok(())
        }
    }
}

fn show_config(config: &Config, config_path: &Path, output: &Output) -> Result<()> {
    if !output.is_human() {
        output.json(&serde_json::json!({
            "config_file": config_path.display().to_string(),
            "exists": config_path.exists(),
            "store": {
                "history_limit": config.store.history_limit,
                "write_failure_policy": policy_name(config.store.write_failure_policy),
                "enforce_unique_watch_later": config.store.enforce_unique_watch_later,
            },
            "resume": {
                "min_visible_seconds": config.resume.min_visible_seconds,
                "save_interval_seconds": config.resume.save_interval_seconds,
            },
            "logging": {
                "level": config.logging.level,
                "file": config.logging.file.as_ref().map(|p| p.display().to_string()),
            },
        }));
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec![
        Cell::new("Setting").add_attribute(comfy_table::Attribute::Bold),
        Cell::new("Value").add_attribute(comfy_table::Attribute::Bold),
    ]);
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);

    let file_note = if config_path.exists() { "" } else { " (not created, using defaults)" };
    table.add_row(vec![
        Cell::new("Config File"),
        Cell::new(format!("{}{}", config_path.display(), file_note)),
    ]);
    table.add_row(vec![Cell::new("store.history_limit"), Cell::new(config.store.history_limit)]);
    table.add_row(vec![
        Cell::new("store.write_failure_policy"),
        Cell::new(policy_name(config.store.write_failure_policy)),
    ]);
    table.add_row(vec![
        Cell::new("store.enforce_unique_watch_later"),
        Cell::new(config.store.enforce_unique_watch_later),
    ]);
    table.add_row(vec![
        Cell::new("resume.min_visible_seconds"),
        Cell::new(config.resume.min_visible_seconds),
    ]);
    table.add_row(vec![
        Cell::new("resume.save_interval_seconds"),
        Cell::new(config.resume.save_interval_seconds),
    ]);
    table.add_row(vec![Cell::new("logging.level"), Cell::new(&config.logging.level)]);
    table.add_row(vec![
        Cell::new("logging.file"),
        Cell::new(
            config
                .logging
                .file
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "stderr".to_string()),
        ),
    ]);

    output.println(table.to_string());
    Ok(())
}

fn policy_name(policy: WriteFailurePolicy) -> &'static str {
    match policy {
        WriteFailurePolicy::Propagate => "propagate",
        WriteFailurePolicy::RetryOnce => "retry-once",
        WriteFailurePolicy::LogAndDrop => "log-and-drop",
    }
}
